//! Line-level edit scripts with intraline change hints.
//!
//! The line alignment comes from the `similar` crate. Every replaced block is
//! then refined: the most similar removed/added pair is located with a
//! character-level [`SequenceMatcher`], emitted as a modification with `? `
//! hint lines, and the lines on either side of it are refined recursively.

use std::mem::take;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffTag};

use pagediff_types::DiffLine;

use crate::matcher::{OpTag, SequenceMatcher};

/// A pair scores as "close" only above this character ratio.
const CLOSE_CUTOFF: f64 = 0.75;

/// Starting bar for the best pair; just under the cutoff.
const BEST_RATIO_FLOOR: f64 = 0.74;

/// Line alignment algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    #[default]
    Myers,
    Patience,
    Lcs,
}

impl From<DiffAlgorithm> for Algorithm {
    fn from(algorithm: DiffAlgorithm) -> Self {
        match algorithm {
            DiffAlgorithm::Myers => Algorithm::Myers,
            DiffAlgorithm::Patience => Algorithm::Patience,
            DiffAlgorithm::Lcs => Algorithm::Lcs,
        }
    }
}

impl std::str::FromStr for DiffAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "myers" => Ok(DiffAlgorithm::Myers),
            "patience" => Ok(DiffAlgorithm::Patience),
            "lcs" => Ok(DiffAlgorithm::Lcs),
            other => Err(format!("unknown diff algorithm: {other}")),
        }
    }
}

/// Spaces and tabs never anchor a character match.
fn is_character_junk(c: &char) -> bool {
    matches!(c, ' ' | '\t')
}

/// Compute the edit script turning `dev` into `prod`.
///
/// Each output line is tagged removed, added, unchanged, or change marker.
/// Marker lines only ever follow a removed or added line of a close pair.
pub fn diff_lines(dev: &[String], prod: &[String], algorithm: DiffAlgorithm) -> Vec<DiffLine> {
    let mut out = Vec::new();
    let ops = capture_diff_slices(algorithm.into(), dev, prod);
    let refiner = FancyReplace::new(dev, prod);

    // Adjacent deletes and inserts are folded into one replaced block.
    let mut pending_dev = 0..0;
    let mut pending_prod = 0..0;
    let flush = |dev_range: Range<usize>, prod_range: Range<usize>, out: &mut Vec<DiffLine>| {
        if !dev_range.is_empty() || !prod_range.is_empty() {
            refiner.helper(dev_range.start, dev_range.end, prod_range.start, prod_range.end, out);
        }
    };

    for op in &ops {
        let (tag, old, new) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                flush(take(&mut pending_dev), take(&mut pending_prod), &mut out);
                out.extend(dev[old].iter().map(DiffLine::unchanged));
            }
            DiffTag::Delete | DiffTag::Insert | DiffTag::Replace => {
                if !old.is_empty() {
                    pending_dev = extend_range(&pending_dev, &old);
                }
                if !new.is_empty() {
                    pending_prod = extend_range(&pending_prod, &new);
                }
            }
        }
    }
    flush(pending_dev, pending_prod, &mut out);
    out
}

fn extend_range(current: &Range<usize>, next: &Range<usize>) -> Range<usize> {
    if current.is_empty() {
        next.clone()
    } else {
        current.start..next.end
    }
}

/// Refines replaced line blocks into modifications plus plain changes.
struct FancyReplace<'a> {
    dev: &'a [String],
    prod: &'a [String],
    dev_chars: Vec<Vec<char>>,
    prod_chars: Vec<Vec<char>>,
}

impl<'a> FancyReplace<'a> {
    fn new(dev: &'a [String], prod: &'a [String]) -> Self {
        Self {
            dev,
            prod,
            dev_chars: dev.iter().map(|l| l.chars().collect()).collect(),
            prod_chars: prod.iter().map(|l| l.chars().collect()).collect(),
        }
    }

    fn helper(&self, alo: usize, ahi: usize, blo: usize, bhi: usize, out: &mut Vec<DiffLine>) {
        if alo < ahi {
            if blo < bhi {
                self.replace(alo, ahi, blo, bhi, out);
            } else {
                out.extend(self.dev[alo..ahi].iter().map(DiffLine::removed));
            }
        } else if blo < bhi {
            out.extend(self.prod[blo..bhi].iter().map(DiffLine::added));
        }
    }

    fn replace(&self, alo: usize, ahi: usize, blo: usize, bhi: usize, out: &mut Vec<DiffLine>) {
        let mut best_ratio = BEST_RATIO_FLOOR;
        let mut best = None;
        let mut identical = None;

        for j in blo..bhi {
            let cruncher = SequenceMatcher::with_junk(&self.prod_chars[j], is_character_junk);
            for i in alo..ahi {
                if self.dev[i] == self.prod[j] {
                    identical.get_or_insert((i, j));
                    continue;
                }
                let a = &self.dev_chars[i];
                if cruncher.real_quick_ratio(a) > best_ratio
                    && cruncher.quick_ratio(a) > best_ratio
                {
                    let ratio = cruncher.ratio(a);
                    if ratio > best_ratio {
                        best_ratio = ratio;
                        best = Some((i, j));
                    }
                }
            }
        }

        let (best_i, best_j, close) = match best {
            Some((i, j)) if best_ratio >= CLOSE_CUTOFF => (i, j, true),
            _ => match identical {
                Some((i, j)) => (i, j, false),
                None => {
                    self.plain_replace(alo, ahi, blo, bhi, out);
                    return;
                }
            },
        };

        self.helper(alo, best_i, blo, best_j, out);
        if close {
            self.emit_modified(best_i, best_j, out);
        } else {
            out.push(DiffLine::unchanged(self.dev[best_i].as_str()));
        }
        self.helper(best_i + 1, ahi, best_j + 1, bhi, out);
    }

    /// The shorter block is emitted first.
    fn plain_replace(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
        out: &mut Vec<DiffLine>,
    ) {
        let removed = self.dev[alo..ahi].iter().map(DiffLine::removed);
        let added = self.prod[blo..bhi].iter().map(DiffLine::added);
        if bhi - blo < ahi - alo {
            out.extend(added);
            out.extend(removed);
        } else {
            out.extend(removed);
            out.extend(added);
        }
    }

    fn emit_modified(&self, i: usize, j: usize, out: &mut Vec<DiffLine>) {
        let a = &self.dev_chars[i];
        let b = &self.prod_chars[j];
        let mut atags = String::new();
        let mut btags = String::new();
        for op in SequenceMatcher::with_junk(b, is_character_junk).opcodes(a) {
            let la = op.a_end - op.a_start;
            let lb = op.b_end - op.b_start;
            let (ac, bc) = match op.tag {
                OpTag::Replace => ('^', '^'),
                OpTag::Delete => ('-', ' '),
                OpTag::Insert => (' ', '+'),
                OpTag::Equal => (' ', ' '),
            };
            if op.tag != OpTag::Insert {
                atags.extend(std::iter::repeat(ac).take(la));
            }
            if op.tag != OpTag::Delete {
                btags.extend(std::iter::repeat(bc).take(lb));
            }
        }

        out.push(DiffLine::removed(self.dev[i].as_str()));
        let ahint = hint_line(a, &atags);
        if !ahint.is_empty() {
            out.push(DiffLine::marker(ahint));
        }
        out.push(DiffLine::added(self.prod[j].as_str()));
        let bhint = hint_line(b, &btags);
        if !bhint.is_empty() {
            out.push(DiffLine::marker(bhint));
        }
    }
}

/// Whitespace under an unchanged column is kept as-is so the hint lines up
/// with tabs in the source line; trailing blanks are dropped.
fn hint_line(line: &[char], tags: &str) -> String {
    let hint: String = line
        .iter()
        .zip(tags.chars())
        .map(|(&c, tag)| if tag == ' ' && c.is_whitespace() { c } else { tag })
        .collect();
    hint.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use pagediff_types::LineTag;

    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn render(diff: &[DiffLine]) -> Vec<String> {
        diff.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn single_line_substitution() {
        let diff = diff_lines(
            &lines(&["a", "b", "c"]),
            &lines(&["a", "x", "c"]),
            DiffAlgorithm::Myers,
        );
        assert_eq!(render(&diff), vec!["  a", "- b", "+ x", "  c"]);
    }

    #[test]
    fn separated_replacements_are_refined_separately() {
        let diff = diff_lines(
            &lines(&["a", "b", "c", "d", "e"]),
            &lines(&["a", "x", "c", "y", "e", "f"]),
            DiffAlgorithm::Myers,
        );
        assert_eq!(
            render(&diff),
            vec!["  a", "- b", "+ x", "  c", "- d", "+ y", "  e", "+ f"]
        );
    }

    #[test]
    fn close_pair_gets_hints() {
        let diff = diff_lines(
            &lines(&["the quick brown fox"]),
            &lines(&["the quick brown fix"]),
            DiffAlgorithm::Myers,
        );
        assert_eq!(
            render(&diff),
            vec![
                "- the quick brown fox",
                "?                  ^",
                "+ the quick brown fix",
                "?                  ^",
            ]
        );
    }

    #[test]
    fn inserted_characters_only_mark_prod_line() {
        let diff = diff_lines(
            &lines(&["private Thread currentThread;"]),
            &lines(&["private volatile Thread currentThread;"]),
            DiffAlgorithm::Myers,
        );
        let tags: Vec<LineTag> = diff.iter().map(|l| l.tag).collect();
        assert_eq!(
            tags,
            vec![LineTag::Removed, LineTag::Added, LineTag::ChangeMarker]
        );
        assert_eq!(diff[2].text, "        +++++++++");
    }

    #[test]
    fn unrelated_lines_shorter_block_first() {
        let diff = diff_lines(
            &lines(&["alpha", "beta"]),
            &lines(&["zzzzzzzz"]),
            DiffAlgorithm::Myers,
        );
        assert_eq!(render(&diff), vec!["+ zzzzzzzz", "- alpha", "- beta"]);
    }

    #[test]
    fn identical_inputs_are_all_unchanged() {
        let text = lines(&["one", "two", "three"]);
        for algorithm in [DiffAlgorithm::Myers, DiffAlgorithm::Patience, DiffAlgorithm::Lcs] {
            let diff = diff_lines(&text, &text, algorithm);
            assert!(diff.iter().all(|l| l.tag == LineTag::Unchanged));
            assert_eq!(diff.len(), 3);
        }
    }

    #[test]
    fn empty_prod_removes_everything() {
        let diff = diff_lines(&lines(&["a", "b"]), &[], DiffAlgorithm::Myers);
        assert_eq!(render(&diff), vec!["- a", "- b"]);
    }

    #[test]
    fn hint_keeps_tabs() {
        let line: Vec<char> = "\tab c".chars().collect();
        assert_eq!(hint_line(&line, "   ^  "), "\t  ^");
    }

    #[test]
    fn algorithm_parses() {
        assert_eq!("Patience".parse::<DiffAlgorithm>(), Ok(DiffAlgorithm::Patience));
        assert!("fast".parse::<DiffAlgorithm>().is_err());
    }
}
