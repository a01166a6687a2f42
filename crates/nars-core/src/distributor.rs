//! Deterministic stand-in for priority-weighted random sampling.
//!
//! For rank R the table has R·(R+1)/2 slots and level L (0-based) occupies
//! L+1 of them, spread by fixed-step insertion that skips taken slots. A bag
//! walks the table cyclically, so over one traversal level R-1 is offered R
//! times and level 0 once.

use std::sync::LazyLock;

use crate::constants::BAG_LEVEL;

/// Table shared by every bag; all bags use the same level count.
pub static DISTRIBUTOR: LazyLock<Distributor> = LazyLock::new(|| Distributor::new(BAG_LEVEL));

#[derive(Clone, Debug)]
pub struct Distributor {
    order: Vec<usize>,
}

impl Distributor {
    pub fn new(range: usize) -> Self {
        let capacity = range * (range + 1) / 2;
        let mut order: Vec<Option<usize>> = vec![None; capacity];
        let mut index = 0;

        for rank in (1..=range).rev() {
            for _ in 0..rank {
                index = (capacity / rank + index) % capacity;
                while order[index].is_some() {
                    index = (index + 1) % capacity;
                }
                order[index] = Some(rank - 1);
            }
        }

        Self {
            order: order.into_iter().flatten().collect(),
        }
    }

    /// Level stored at `index`.
    pub fn pick(&self, index: usize) -> usize {
        self.order[index]
    }

    /// Index following `index`, wrapping at the end of the table.
    pub fn next(&self, index: usize) -> usize {
        (index + 1) % self.order.len()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn traversal_counts(rank: usize) -> Vec<usize> {
        let d = Distributor::new(rank);
        let mut counts = vec![0; rank];
        let mut index = 0;
        for _ in 0..d.len() {
            counts[d.pick(index)] += 1;
            index = d.next(index);
        }
        counts
    }

    #[test]
    fn test_table_length() {
        assert_eq!(Distributor::new(1).len(), 1);
        assert_eq!(Distributor::new(4).len(), 10);
        assert_eq!(Distributor::new(100).len(), 5050);
    }

    #[test]
    fn test_level_frequencies_rank_ten() {
        let counts = traversal_counts(10);
        for (level, count) in counts.iter().enumerate() {
            assert_eq!(*count, level + 1, "level {level} visited {count} times");
        }
    }

    #[test]
    fn test_next_wraps() {
        let d = Distributor::new(3);
        assert_eq!(d.next(5), 0);
        assert_eq!(d.next(0), 1);
    }

    #[test]
    fn test_shared_table_covers_all_levels() {
        assert_eq!(DISTRIBUTOR.len(), BAG_LEVEL * (BAG_LEVEL + 1) / 2);
        let top = (0..DISTRIBUTOR.len()).map(|i| DISTRIBUTOR.pick(i)).max();
        assert_eq!(top, Some(BAG_LEVEL - 1));
    }

    #[test]
    fn test_high_levels_spread_out() {
        // The top level must not sit in one contiguous run.
        let d = Distributor::new(20);
        let top: Vec<usize> = (0..d.len()).filter(|&i| d.pick(i) == 19).collect();
        assert_eq!(top.len(), 20);
        let contiguous = top.windows(2).all(|w| w[1] == w[0] + 1);
        assert!(!contiguous);
    }

    proptest! {
        #[test]
        fn prop_every_level_visited_level_plus_one_times(rank in 1usize..60) {
            let counts = traversal_counts(rank);
            for (level, count) in counts.iter().enumerate() {
                prop_assert_eq!(*count, level + 1);
            }
        }
    }
}
