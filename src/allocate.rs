//! Per-group allocation of stems to train/val/test.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::config::Ratios;

/// Groups smaller than this go entirely to train
pub const MIN_SPLITTABLE_GROUP: usize = 3;

/// Number of stems each split receives from one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocationCounts {
    pub train: usize,
    pub val: usize,
    pub test: usize,
}

impl AllocationCounts {
    pub fn total(&self) -> usize {
        self.train + self.val + self.test
    }
}

/// The stems of one group after shuffling and slicing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupAllocation {
    pub train: Vec<String>,
    pub val: Vec<String>,
    pub test: Vec<String>,
}

impl GroupAllocation {
    pub fn counts(&self) -> AllocationCounts {
        AllocationCounts {
            train: self.train.len(),
            val: self.val.len(),
            test: self.test.len(),
        }
    }
}

/// Compute how many of `n` stems go to each split in a stratified group.
///
/// - groups with fewer than three stems go entirely to train;
/// - a nonzero val ratio guarantees one val stem whenever train leaves one over;
/// - a negative test count is taken back from train, then from val if train runs out.
pub fn allocation_counts(n: usize, train_ratio: f64, val_ratio: f64) -> AllocationCounts {
    if n < MIN_SPLITTABLE_GROUP {
        return AllocationCounts {
            train: n,
            val: 0,
            test: 0,
        };
    }

    let total = n as i64;
    let mut n_train = (n as f64 * train_ratio).floor() as i64;
    let mut n_val = (n as f64 * val_ratio).floor() as i64;

    if val_ratio > 0.0 && n_val == 0 && total > n_train {
        n_val = 1;
    }

    let mut n_test = total - n_train - n_val;
    if n_test < 0 {
        n_train += n_test;
        n_test = 0;
    }
    if n_train < 0 {
        n_val += n_train;
        n_train = 0;
    }

    AllocationCounts {
        train: n_train as usize,
        val: n_val as usize,
        test: n_test as usize,
    }
}

/// Counts for a plain random split: floor for train and val, the remainder to test
pub fn unstratified_counts(n: usize, train_ratio: f64, val_ratio: f64) -> AllocationCounts {
    let n_train = ((n as f64 * train_ratio).floor() as usize).min(n);
    let n_val = ((n as f64 * val_ratio).floor() as usize).min(n - n_train);

    AllocationCounts {
        train: n_train,
        val: n_val,
        test: n - n_train - n_val,
    }
}

/// Shuffle `stems` with `rng` and slice them into train, val and test.
pub fn allocate_group<R: Rng + ?Sized>(
    stems: Vec<String>,
    ratios: &Ratios,
    rng: &mut R,
) -> GroupAllocation {
    let counts = allocation_counts(stems.len(), ratios.train(), ratios.val());
    slice_shuffled(stems, counts, rng)
}

/// Shuffle `stems` and cut them at the given counts
pub fn slice_shuffled<R: Rng + ?Sized>(
    mut stems: Vec<String>,
    counts: AllocationCounts,
    rng: &mut R,
) -> GroupAllocation {
    debug_assert_eq!(counts.total(), stems.len());
    stems.shuffle(rng);

    let test = stems.split_off(counts.train + counts.val);
    let val = stems.split_off(counts.train);

    GroupAllocation {
        train: stems,
        val,
        test,
    }
}
