use serde::{Deserialize, Serialize};

/// Classification of one line in a unit's edit script.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTag {
    /// Present only on the prod side.
    Added,
    /// Present only on the dev side.
    Removed,
    /// Present on both sides.
    Unchanged,
    /// Intraline hint under a paired removed/added line.
    ChangeMarker,
}

impl LineTag {
    /// The two-character prefix used when printing a diff.
    pub fn prefix(&self) -> &'static str {
        match self {
            LineTag::Added => "+ ",
            LineTag::Removed => "- ",
            LineTag::Unchanged => "  ",
            LineTag::ChangeMarker => "? ",
        }
    }
}

/// A single classified line of diff output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub tag: LineTag,
    pub text: String,
}

impl DiffLine {
    pub fn new(tag: LineTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }

    pub fn added(text: impl Into<String>) -> Self {
        Self::new(LineTag::Added, text)
    }

    pub fn removed(text: impl Into<String>) -> Self {
        Self::new(LineTag::Removed, text)
    }

    pub fn unchanged(text: impl Into<String>) -> Self {
        Self::new(LineTag::Unchanged, text)
    }

    pub fn marker(text: impl Into<String>) -> Self {
        Self::new(LineTag::ChangeMarker, text)
    }
}

impl std::fmt::Display for DiffLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.tag.prefix(), self.text)
    }
}
