//! Longest-matching-block sequence matcher.
//!
//! Finds the longest contiguous matching block between two sequences, then
//! recurses on the pieces to its left and right (Ratcliff/Obershelp). The
//! resulting blocks drive both the similarity ratio
//! (`2 * matches / (len(a) + len(b))`) and the intraline hint opcodes.
//!
//! The matcher indexes the second sequence (`b`) once and can then be queried
//! against any number of first sequences (`a`). Elements for which the junk
//! predicate returns `true` never start a match but may extend one. When `b`
//! has 200 or more elements, elements occurring in more than 1% of it are
//! treated as popular and likewise never start a match.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Minimum length of `b` before popular elements are dropped from the index.
const POPULAR_MIN_LEN: usize = 200;

/// A matching block: `a[a..a + size] == b[b..b + size]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

/// Kind of an edit opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// Turns `a[a_start..a_end]` into `b[b_start..b_end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpTag,
    pub a_start: usize,
    pub a_end: usize,
    pub b_start: usize,
    pub b_end: usize,
}

/// Sequence matcher over a fixed `b` sequence.
pub struct SequenceMatcher<'b, T: Hash + Eq> {
    b: &'b [T],
    b2j: HashMap<&'b T, Vec<usize>>,
    junk: HashSet<&'b T>,
    full_count: HashMap<&'b T, usize>,
}

impl<'b, T: Hash + Eq> SequenceMatcher<'b, T> {
    /// Index `b` with no junk elements.
    pub fn new(b: &'b [T]) -> Self {
        Self::with_junk(b, |_| false)
    }

    /// Index `b`, excluding elements matching `is_junk` from match starts.
    pub fn with_junk(b: &'b [T], is_junk: impl Fn(&T) -> bool) -> Self {
        let mut b2j: HashMap<&T, Vec<usize>> = HashMap::new();
        for (j, elt) in b.iter().enumerate() {
            b2j.entry(elt).or_default().push(j);
        }
        let full_count = b2j.iter().map(|(elt, js)| (*elt, js.len())).collect();

        let mut junk = HashSet::new();
        b2j.retain(|elt, _| {
            if is_junk(*elt) {
                junk.insert(*elt);
                false
            } else {
                true
            }
        });

        if b.len() >= POPULAR_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, js| js.len() <= limit);
        }

        Self {
            b,
            b2j,
            junk,
            full_count,
        }
    }

    /// The indexed sequence.
    pub fn b(&self) -> &'b [T] {
        self.b
    }

    fn is_junk(&self, elt: &T) -> bool {
        self.junk.contains(elt)
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Among equally long blocks the one starting earliest in `a`, then
    /// earliest in `b`, wins. Returns a zero-size match if nothing matches.
    pub fn find_longest_match(
        &self,
        a: &[T],
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> Match {
        let b = self.b;
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);

        // j2len[j] = length of the match ending at a[i - 1], b[j].
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for (i, elt) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(js) = self.b2j.get(elt) {
                for &j in js {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next;
        }

        // Extend with popular (non-junk) elements first, then with junk.
        while best_i > alo
            && best_j > blo
            && !self.is_junk(&b[best_j - 1])
            && a[best_i - 1] == b[best_j - 1]
        {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && !self.is_junk(&b[best_j + best_size])
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }
        while best_i > alo
            && best_j > blo
            && self.is_junk(&b[best_j - 1])
            && a[best_i - 1] == b[best_j - 1]
        {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.is_junk(&b[best_j + best_size])
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        Match {
            a: best_i,
            b: best_j,
            size: best_size,
        }
    }

    /// All matching blocks between `a` and `b`, ordered, with adjacent blocks
    /// merged. The last entry is always the sentinel `(len(a), len(b), 0)`.
    pub fn matching_blocks(&self, a: &[T]) -> Vec<Match> {
        let (la, lb) = (a.len(), self.b.len());
        let mut pending = vec![(0, la, 0, lb)];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let m = self.find_longest_match(a, alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            if alo < m.a && blo < m.b {
                pending.push((alo, m.a, blo, m.b));
            }
            if m.a + m.size < ahi && m.b + m.size < bhi {
                pending.push((m.a + m.size, ahi, m.b + m.size, bhi));
            }
            blocks.push(m);
        }
        blocks.sort_by_key(|m| (m.a, m.b));

        let mut merged: Vec<Match> = Vec::with_capacity(blocks.len() + 1);
        for m in blocks {
            if let Some(last) = merged.last_mut() {
                if last.a + last.size == m.a && last.b + last.size == m.b {
                    last.size += m.size;
                    continue;
                }
            }
            merged.push(m);
        }
        merged.push(Match {
            a: la,
            b: lb,
            size: 0,
        });
        merged
    }

    /// Total number of elements in matching blocks.
    pub fn matched_elements(&self, a: &[T]) -> usize {
        self.matching_blocks(a).iter().map(|m| m.size).sum()
    }

    /// Similarity ratio in `[0, 1]`. Two empty sequences score 1.0.
    pub fn ratio(&self, a: &[T]) -> f64 {
        ratio_of(self.matched_elements(a), a.len() + self.b.len())
    }

    /// Upper bound on [`ratio`](Self::ratio) from element multiset overlap.
    pub fn quick_ratio(&self, a: &[T]) -> f64 {
        let mut avail: HashMap<&T, usize> = HashMap::new();
        let mut matches = 0;
        for elt in a {
            let left = avail
                .entry(elt)
                .or_insert_with(|| self.full_count.get(elt).copied().unwrap_or(0));
            if *left > 0 {
                *left -= 1;
                matches += 1;
            }
        }
        ratio_of(matches, a.len() + self.b.len())
    }

    /// Upper bound on [`quick_ratio`](Self::quick_ratio) from lengths alone.
    pub fn real_quick_ratio(&self, a: &[T]) -> f64 {
        ratio_of(a.len().min(self.b.len()), a.len() + self.b.len())
    }

    /// Edit opcodes turning `a` into `b`.
    pub fn opcodes(&self, a: &[T]) -> Vec<Opcode> {
        let mut ops = Vec::new();
        let (mut i, mut j) = (0, 0);
        for m in self.matching_blocks(a) {
            let tag = match (i < m.a, j < m.b) {
                (true, true) => Some(OpTag::Replace),
                (true, false) => Some(OpTag::Delete),
                (false, true) => Some(OpTag::Insert),
                (false, false) => None,
            };
            if let Some(tag) = tag {
                ops.push(Opcode {
                    tag,
                    a_start: i,
                    a_end: m.a,
                    b_start: j,
                    b_end: m.b,
                });
            }
            i = m.a + m.size;
            j = m.b + m.size;
            if m.size > 0 {
                ops.push(Opcode {
                    tag: OpTag::Equal,
                    a_start: m.a,
                    a_end: i,
                    b_start: m.b,
                    b_end: j,
                });
            }
        }
        ops
    }
}

/// `2 * matches / total`, or 1.0 when `total` is zero.
pub fn ratio_of(matches: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        2.0 * matches as f64 / total as f64
    }
}
