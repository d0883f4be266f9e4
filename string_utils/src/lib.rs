//! This file contains some miscellaneous string utilities: natural ordering of
//! plate and well labels, and small splitting helpers for filename conventions.
#![deny(missing_docs)]

use std::cmp::Ordering;

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// NATURAL ORDERING
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

impl<'a> Chunk<'a> {
    fn cmp_chunk(&self, other: &Chunk<'a>) -> Ordering {
        match (self, other) {
            (Chunk::Digits(a), Chunk::Digits(b)) => {
                let ta = a.trim_start_matches('0');
                let tb = b.trim_start_matches('0');
                ta.len()
                    .cmp(&tb.len())
                    .then_with(|| ta.cmp(tb))
                    .then_with(|| a.len().cmp(&b.len()))
            }
            // numbers sort ahead of text at the same position
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
            (Chunk::Text(a), Chunk::Text(b)) => a.cmp(b),
        }
    }
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map_or(self.rest.len(), |(i, _)| i);
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(if digits {
            Chunk::Digits(head)
        } else {
            Chunk::Text(head)
        })
    }
}

fn chunks(s: &str) -> Chunks<'_> {
    Chunks { rest: s }
}

/// Compare two strings in natural order, so that embedded numbers are compared
/// by value: "Plate2" < "Plate10" and "A2" < "A10" < "B1".
/// Strings that compare equal chunk by chunk fall back to byte order, which
/// keeps the ordering total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut xs = chunks(a);
    let mut ys = chunks(b);
    loop {
        match (xs.next(), ys.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match x.cmp_chunk(&y) {
                Ordering::Equal => {}
                ord => return ord,
            },
        }
    }
}

/// Compare two sequences of strings lexicographically, each position in
/// natural order.
pub fn natural_cmp_seq<'a, A, B>(a: A, b: B) -> Ordering
where
    A: IntoIterator<Item = &'a str>,
    B: IntoIterator<Item = &'a str>,
{
    let mut xs = a.into_iter();
    let mut ys = b.into_iter();
    loop {
        match (xs.next(), ys.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match natural_cmp(x, y) {
                Ordering::Equal => {}
                ord => return ord,
            },
        }
    }
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// SHORTHAND EXPRESSIONS FOR COMMON FUNCTIONALITY
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

/// Additional methods for &str.
pub trait TextUtils<'a> {
    /// s.before(t): return the part of s before the first instance of t,
    /// or None if t is not contained in s
    fn before(&'a self, t: &str) -> Option<&'a str>;

    /// s.after(t): return the part of s after the first instance of t,
    /// or None if t is not contained in s
    fn after(&'a self, t: &str) -> Option<&'a str>;

    /// ASCII case-insensitive prefix test.
    fn starts_with_ignore_case(&self, prefix: &str) -> bool;
}

impl<'a> TextUtils<'a> for str {
    fn before(&'a self, t: &str) -> Option<&'a str> {
        self.find(t).map(|r| &self[..r])
    }

    fn after(&'a self, t: &str) -> Option<&'a str> {
        self.find(t).map(|l| &self[l + t.len()..])
    }

    fn starts_with_ignore_case(&self, prefix: &str) -> bool {
        self.len() >= prefix.len()
            && self.is_char_boundary(prefix.len())
            && self[..prefix.len()].eq_ignore_ascii_case(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plates_sort_numerically() {
        let mut plates: Vec<String> = (1..=10).rev().map(|i| format!("Plate{i}")).collect();
        plates.sort_by(|a, b| natural_cmp(a, b));
        let expected: Vec<String> = (1..=10).map(|i| format!("Plate{i}")).collect();
        assert_eq!(plates, expected);
    }

    #[test]
    fn test_wells_sort_row_major() {
        let mut wells = vec!["B1", "A10", "A2", "A1", "P24", "B10"];
        wells.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(wells, vec!["A1", "A2", "A10", "B1", "B10", "P24"]);
    }

    #[test]
    fn test_leading_zeros_and_prefixes() {
        assert_eq!(natural_cmp("LCE007", "LCE7"), Ordering::Greater);
        assert_eq!(natural_cmp("LCE7", "LCE08"), Ordering::Less);
        assert_eq!(natural_cmp("LCE", "LCE1"), Ordering::Less);
        assert_eq!(natural_cmp("1x", "x"), Ordering::Less);
        assert_eq!(natural_cmp("", ""), Ordering::Equal);
    }

    #[test]
    fn test_seq_compare() {
        assert_eq!(
            natural_cmp_seq(["Plate2", "B1"], ["Plate10", "A1"]),
            Ordering::Less
        );
        assert_eq!(
            natural_cmp_seq(["Plate2", "A10"], ["Plate2", "A9"]),
            Ordering::Greater
        );
    }

    #[test]
    fn test_text_utils() {
        assert_eq!("PRM12_sampleA".before("_"), Some("PRM12"));
        assert_eq!("PRM12_sampleA".after("_"), Some("sampleA"));
        assert_eq!("PRM12".before("_"), None);
        assert!("LCE_plate".starts_with_ignore_case("lce"));
        assert!(!"LC".starts_with_ignore_case("lce"));
        assert!("Sample Primer & index".starts_with_ignore_case("sample primer"));
    }

    proptest! {
        #[test]
        fn prop_numeric_suffix_order(x in 0u32..100_000, y in 0u32..100_000) {
            let a = format!("Plate{x}");
            let b = format!("Plate{y}");
            prop_assert_eq!(natural_cmp(&a, &b), x.cmp(&y));
        }

        #[test]
        fn prop_antisymmetric(a in "[A-Z0-9_]{0,8}", b in "[A-Z0-9_]{0,8}") {
            prop_assert_eq!(natural_cmp(&a, &b), natural_cmp(&b, &a).reverse());
            prop_assert_eq!(natural_cmp(&a, &a), Ordering::Equal);
        }
    }
}
