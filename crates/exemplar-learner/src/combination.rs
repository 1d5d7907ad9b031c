//! Feature-index subsets voted over during inference.
//!
//! For a feature arity `n` there are `2^n - 1` non-empty subsets of feature
//! indices. Voting over all of them quickly becomes intractable, so only a
//! fixed sample is kept: every `stride`-th subset in enumeration order,
//! starting with the first one.
//!
//! # Enumeration Order
//!
//! Subsets are enumerated by descending size, and lexicographically by their
//! sorted index tuple within one size. For `n = 3`:
//!
//! ```text
//! {0,1,2}  {0,1} {0,2} {1,2}  {0} {1} {2}
//! ```
//!
//! The full index set always comes first and is always retained, so every
//! learner sees at least one combination covering all of its features.
//!
//! # Caching
//!
//! [`CombinationIndex`] caches the retained subsets per arity. It is owned by
//! the caller and may be shared between learners through an [`Arc`]. Building
//! the list twice for the same arity yields the same result, so concurrent
//! callers may race to fill the cache without affecting correctness.
//!
//! # Examples
//!
//! ```
//! use std::num::NonZeroUsize;
//!
//! use exemplar_learner::combination::CombinationIndex;
//!
//! let index = CombinationIndex::with_stride(NonZeroUsize::MIN);
//! let combinations = index.combinations(2);
//! let indices = combinations
//!     .iter()
//!     .map(|c| c.indices().to_vec())
//!     .collect::<Vec<_>>();
//! assert_eq!(indices, [vec![0, 1], vec![0], vec![1]]);
//! ```

use std::{
    collections::HashMap,
    num::NonZeroUsize,
    sync::{Arc, PoisonError, RwLock},
};

/// Default sampling stride: one subset out of every 25 is retained.
pub const DEFAULT_STRIDE: NonZeroUsize = NonZeroUsize::new(25).unwrap();

/// A non-empty set of feature indices, stored in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combination {
    indices: Box<[usize]>,
}

impl Combination {
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of feature indices in this combination.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Cache of sampled feature-index combinations, keyed by feature arity.
#[derive(Debug)]
pub struct CombinationIndex {
    stride: NonZeroUsize,
    cache: RwLock<HashMap<usize, Arc<[Combination]>>>,
}

impl Default for CombinationIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CombinationIndex {
    /// Creates an empty index using [`DEFAULT_STRIDE`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_stride(DEFAULT_STRIDE)
    }

    /// Creates an empty index that retains every `stride`-th subset.
    ///
    /// A stride of one retains the whole power set.
    #[must_use]
    pub fn with_stride(stride: NonZeroUsize) -> Self {
        Self {
            stride,
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn stride(&self) -> NonZeroUsize {
        self.stride
    }

    /// Returns the retained combinations for `arity`, building them on first use.
    ///
    /// Combinations are ordered as described in the [module documentation](self).
    /// An arity of zero has no combinations.
    #[must_use]
    pub fn combinations(&self, arity: usize) -> Arc<[Combination]> {
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&arity)
            .cloned();
        if let Some(combinations) = cached {
            return combinations;
        }

        let combinations: Arc<[Combination]> = sample_combinations(arity, self.stride).into();
        tracing::debug!(
            arity,
            stride = self.stride.get(),
            retained = combinations.len(),
            "built feature combinations"
        );

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(arity).or_insert(combinations))
    }

    #[must_use]
    pub fn is_cached(&self, arity: usize) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&arity)
    }

    /// Drops all cached combinations. They are rebuilt on next use.
    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Enumerates the non-empty subsets of `0..arity` and keeps every `stride`-th one.
#[must_use]
pub fn sample_combinations(arity: usize, stride: NonZeroUsize) -> Vec<Combination> {
    let mut retained = vec![];
    let mut position = 0_usize;
    for size in (1..=arity).rev() {
        let mut indices = (0..size).collect::<Vec<_>>();
        loop {
            if position % stride == 0 {
                retained.push(Combination {
                    indices: indices.clone().into_boxed_slice(),
                });
            }
            position += 1;

            // advance to the next combination of the same size
            let Some(pivot) = (0..size).rev().find(|&i| indices[i] < arity - size + i) else {
                break;
            };
            let mut next = indices[pivot];
            for slot in &mut indices[pivot..] {
                next += 1;
                *slot = next;
            }
        }
    }
    retained
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    fn indices_of(combinations: &[Combination]) -> Vec<Vec<usize>> {
        combinations.iter().map(|c| c.indices().to_vec()).collect()
    }

    #[test]
    fn test_zero_arity_has_no_combinations() {
        assert!(sample_combinations(0, DEFAULT_STRIDE).is_empty());
        assert!(sample_combinations(0, NonZeroUsize::MIN).is_empty());
    }

    #[test]
    fn test_full_power_set_order() {
        let combinations = sample_combinations(3, NonZeroUsize::MIN);
        assert_eq!(
            indices_of(&combinations),
            [
                vec![0, 1, 2],
                vec![0, 1],
                vec![0, 2],
                vec![1, 2],
                vec![0],
                vec![1],
                vec![2],
            ]
        );
    }

    #[test]
    fn test_small_arity_keeps_only_full_set() {
        for arity in 1..=4 {
            let combinations = sample_combinations(arity, DEFAULT_STRIDE);
            assert_eq!(indices_of(&combinations), [(0..arity).collect::<Vec<_>>()]);
        }
    }

    #[test]
    fn test_default_stride_picks_every_25th() {
        // 31 subsets: positions 0 (the full set) and 25 (the last pair)
        let combinations = sample_combinations(5, DEFAULT_STRIDE);
        assert_eq!(indices_of(&combinations), [vec![0, 1, 2, 3, 4], vec![3, 4]]);

        // 127 subsets: positions 0, 25, 50, 75, 100, 125
        let combinations = sample_combinations(7, DEFAULT_STRIDE);
        let sizes = combinations.iter().map(Combination::len).collect::<Vec<_>>();
        assert_eq!(sizes, [7, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_index_uses_configured_stride() {
        assert_eq!(CombinationIndex::new().stride(), DEFAULT_STRIDE);

        let every_other = NonZeroUsize::new(2).unwrap();
        let index = CombinationIndex::with_stride(every_other);
        assert_eq!(index.stride(), every_other);
        // 7 subsets of 3 features: positions 0, 2, 4, 6
        assert_eq!(
            indices_of(&index.combinations(3)),
            [vec![0, 1, 2], vec![0, 2], vec![0], vec![2]]
        );
    }

    #[test]
    fn test_index_caches_per_arity() {
        let index = CombinationIndex::new();
        assert!(!index.is_cached(3));

        let first = index.combinations(3);
        assert!(index.is_cached(3));
        let second = index.combinations(3);
        assert!(Arc::ptr_eq(&first, &second));

        index.clear();
        assert!(!index.is_cached(3));
        let rebuilt = index.combinations(3);
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(first, rebuilt);
    }

    #[test]
    fn test_index_shared_across_threads() {
        let index = Arc::new(CombinationIndex::new());
        let handles = (0..4)
            .map(|_| {
                let index = Arc::clone(&index);
                std::thread::spawn(move || index.combinations(9))
            })
            .collect::<Vec<_>>();
        let results = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>();
        for result in &results {
            assert_eq!(result, &results[0]);
        }
    }

    proptest! {
        #[test]
        fn prop_sampled_combinations_are_valid(arity in 0..12_usize, stride in 1..40_usize) {
            let stride = NonZeroUsize::new(stride).unwrap();
            let combinations = sample_combinations(arity, stride);

            let total = (1_usize << arity) - 1;
            prop_assert_eq!(combinations.len(), total.div_ceil(stride.get()));

            let distinct = combinations.iter().collect::<HashSet<_>>();
            prop_assert_eq!(distinct.len(), combinations.len());

            for combination in &combinations {
                prop_assert!(!combination.is_empty());
                prop_assert!(combination.len() <= arity);
                prop_assert!(combination.indices().is_sorted_by(|a, b| a < b));
                prop_assert!(combination.indices().iter().all(|&i| i < arity));
            }
            if arity > 0 {
                prop_assert_eq!(combinations[0].len(), arity);
            }
        }
    }
}
