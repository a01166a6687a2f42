//! Evidential lineage: the serial numbers of the input sentences a
//! sentence's evidence comes from, plus the tick it was created on.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stamp {
    base: Vec<u64>,
    creation_time: u64,
}

impl Stamp {
    /// Stamp of an input sentence with a fresh serial number.
    pub fn input(serial: u64, time: u64) -> Self {
        Self {
            base: vec![serial],
            creation_time: time,
        }
    }

    /// Same evidence, new creation time.
    pub fn with_time(&self, time: u64) -> Self {
        Self {
            base: self.base.clone(),
            creation_time: time,
        }
    }

    /// Combine two evidential bases, or `None` when they overlap: a
    /// conclusion must not count the same evidence twice.
    ///
    /// Serials interleave starting with the longer base and the result is
    /// truncated to `max_length`.
    pub fn merge(first: &Stamp, second: &Stamp, time: u64, max_length: usize) -> Option<Stamp> {
        if first.base.iter().any(|s| second.base.contains(s)) {
            return None;
        }
        let (long, short) = if first.len() > second.len() {
            (first, second)
        } else {
            (second, first)
        };

        let total = (long.len() + short.len()).min(max_length);
        let mut base = Vec::with_capacity(total);
        let mut i1 = 0;
        let mut i2 = 0;
        while i2 < short.len() && base.len() < total {
            base.push(long.base[i1]);
            i1 += 1;
            if base.len() < total {
                base.push(short.base[i2]);
                i2 += 1;
            }
        }
        while i1 < long.len() && base.len() < total {
            base.push(long.base[i1]);
            i1 += 1;
        }

        Some(Stamp {
            base,
            creation_time: time,
        })
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn base(&self) -> &[u64] {
        &self.base
    }

    pub fn creation_time(&self) -> u64 {
        self.creation_time
    }
}

/// Stamps are equal when their evidential bases hold the same serials.
impl PartialEq for Stamp {
    fn eq(&self, other: &Self) -> bool {
        self.base.len() == other.base.len()
            && self.base.iter().all(|s| other.base.contains(s))
            && other.base.iter().all(|s| self.base.contains(s))
    }
}

impl Eq for Stamp {}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let serials: Vec<String> = self.base.iter().map(u64::to_string).collect();
        write!(f, "{{{} : {}}}", self.creation_time, serials.join(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(serials: &[u64]) -> Stamp {
        Stamp {
            base: serials.to_vec(),
            creation_time: 0,
        }
    }

    #[test]
    fn test_merge_disjoint_interleaves_longer_first() {
        let merged = Stamp::merge(&stamp(&[1]), &stamp(&[2, 3]), 7, 8).unwrap();
        assert_eq!(merged.base(), &[2, 1, 3]);
        assert_eq!(merged.creation_time(), 7);
    }

    #[test]
    fn test_merge_overlap_is_none() {
        assert!(Stamp::merge(&stamp(&[1, 2]), &stamp(&[2, 5]), 0, 8).is_none());
    }

    #[test]
    fn test_merge_truncates() {
        let merged = Stamp::merge(&stamp(&[1, 2, 3]), &stamp(&[4, 5, 6]), 0, 4).unwrap();
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_equality_is_set_equality() {
        assert_eq!(stamp(&[1, 2]), stamp(&[2, 1]));
        assert_ne!(stamp(&[1, 2]), stamp(&[1, 3]));
        assert_ne!(stamp(&[1]), stamp(&[1, 2]));
    }

    #[test]
    fn test_with_time_keeps_evidence() {
        let s = Stamp::input(4, 1).with_time(9);
        assert_eq!(s.base(), &[4]);
        assert_eq!(s.creation_time(), 9);
    }
}
