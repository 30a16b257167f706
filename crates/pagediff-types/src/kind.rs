use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The source format a document pair was extracted from.
///
/// Extraction branches on this; the diff and aggregation core never does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Page-oriented text (one unit per page when pages are known).
    Pdf,
    /// Spreadsheet rows, one page per sheet.
    Excel,
    /// Plain text, chunked into fixed-size units.
    Text,
}

impl FileKind {
    /// All supported kinds, in display order.
    pub const ALL: [FileKind; 3] = [FileKind::Pdf, FileKind::Excel, FileKind::Text];

    /// Whether the format carries intrinsic pagination (pages or sheets).
    pub fn is_paginated(&self) -> bool {
        matches!(self, FileKind::Pdf | FileKind::Excel)
    }

    /// Lowercase name used in snapshots and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Excel => "excel",
            FileKind::Text => "text",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "excel" | "xlsx" | "xls" => Ok(FileKind::Excel),
            "text" | "txt" => Ok(FileKind::Text),
            other => Err(TypeError::UnknownFileKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_aliases() {
        assert_eq!("PDF".parse::<FileKind>().unwrap(), FileKind::Pdf);
        assert_eq!("xlsx".parse::<FileKind>().unwrap(), FileKind::Excel);
        assert_eq!(" txt ".parse::<FileKind>().unwrap(), FileKind::Text);
    }

    #[test]
    fn parse_unknown_kind() {
        let err = "docx".parse::<FileKind>().unwrap_err();
        assert_eq!(err, TypeError::UnknownFileKind("docx".into()));
    }

    #[test]
    fn pagination() {
        assert!(FileKind::Pdf.is_paginated());
        assert!(FileKind::Excel.is_paginated());
        assert!(!FileKind::Text.is_paginated());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for kind in FileKind::ALL {
            assert_eq!(kind.to_string().parse::<FileKind>().unwrap(), kind);
        }
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&FileKind::Excel).unwrap();
        assert_eq!(json, "\"excel\"");
    }
}
