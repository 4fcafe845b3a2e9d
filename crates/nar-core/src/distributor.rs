//! Deterministic weighted level sequence.
//!
//! For `L` levels the table has `L(L+1)/2` slots and level `v` fills `v+1`
//! of them, so the top level comes up `L` times as often as the bottom one.
//! No randomness is involved: two runs over the same input visit levels in
//! the same order.

/// Immutable permutation of level indices, shared read-only between bags.
/// Each bag keeps its own cursor into it.
#[derive(Debug, Clone)]
pub struct Distributor {
    order: Vec<usize>,
    level_count: usize,
}

impl Distributor {
    /// Build the table for `level_count` levels. `level_count >= 1`.
    pub fn new(level_count: usize) -> Self {
        let capacity = level_count * (level_count + 1) / 2;
        let mut order: Vec<Option<usize>> = vec![None; capacity];
        let mut index = capacity;

        for rank in (1..=level_count).rev() {
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
            level_count,
        }
    }

    /// Level at the cursor position.
    pub fn pick(&self, cursor: usize) -> usize {
        self.order[cursor % self.order.len()]
    }

    /// Cursor position following `cursor`.
    pub fn next(&self, cursor: usize) -> usize {
        (cursor + 1) % self.order.len()
    }

    pub fn capacity(&self) -> usize {
        self.order.len()
    }

    pub fn level_count(&self) -> usize {
        self.level_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_size() {
        for levels in [1, 2, 3, 10, 100] {
            let d = Distributor::new(levels);
            assert_eq!(d.capacity(), levels * (levels + 1) / 2);
            assert_eq!(d.level_count(), levels);
            let highest = d.order.iter().copied().max().map(|m| m + 1);
            assert_eq!(highest, Some(d.level_count()));
        }
    }

    #[test]
    fn test_occurrence_counts() {
        let d = Distributor::new(100);
        let mut counts = vec![0usize; 100];
        for i in 0..d.capacity() {
            counts[d.pick(i)] += 1;
        }
        for (level, count) in counts.iter().enumerate() {
            assert_eq!(*count, level + 1, "level {level} appears {count} times");
        }
    }

    #[test]
    fn test_small_table_layout() {
        // capacity 6: rank 3 lands on 2, 4, 0; rank 2 on 3, 1; rank 1 probes to 5
        let d = Distributor::new(3);
        let seq: Vec<usize> = (0..d.capacity()).map(|i| d.pick(i)).collect();
        assert_eq!(seq, vec![2, 1, 2, 1, 2, 0]);
    }

    #[test]
    fn test_next_wraps() {
        let d = Distributor::new(4);
        assert_eq!(d.next(0), 1);
        assert_eq!(d.next(d.capacity() - 1), 0);
    }

    #[test]
    fn test_deterministic() {
        let a = Distributor::new(37);
        let b = Distributor::new(37);
        assert_eq!(a.order, b.order);
    }

    #[test]
    fn test_single_level() {
        let d = Distributor::new(1);
        assert_eq!(d.capacity(), 1);
        assert_eq!(d.pick(0), 0);
        assert_eq!(d.next(0), 0);
    }
}
