//! Planning of the train/val/test split.
//!
//! The random source is consumed in a fixed order: one shuffle per composition
//! group in canonical key order (or a single shuffle of all stems for the
//! unstratified split), then one reshuffle each of the final train, val and
//! test lists. Identical inputs and seed therefore give identical plans.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::allocate::{allocate_group, slice_shuffled, unstratified_counts, AllocationCounts};
use crate::config::Ratios;
use crate::group::group_by_composition;
use crate::index::DatasetIndex;
use crate::types::{CompositionKey, ImageRecord, Split};

/// Create the single random source driving every shuffle of a run
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Allocation of one composition group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub composition: CompositionKey,
    pub counts: AllocationCounts,
}

/// The complete assignment of stems to splits
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    pub seed: u64,
    pub ratios: Ratios,
    pub stratified: bool,
    pub train: Vec<String>,
    pub val: Vec<String>,
    pub test: Vec<String>,
    /// Per-group counts, empty for an unstratified split
    pub groups: Vec<GroupSummary>,
}

impl SplitPlan {
    pub fn stems(&self, split: Split) -> &[String] {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }

    pub fn counts(&self) -> AllocationCounts {
        AllocationCounts {
            train: self.train.len(),
            val: self.val.len(),
            test: self.test.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.counts().total()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map every stem to its split
    pub fn assignments(&self) -> BTreeMap<String, Split> {
        Split::ALL
            .iter()
            .flat_map(|&split| self.stems(split).iter().map(move |stem| (stem.clone(), split)))
            .collect()
    }

    pub fn print_summary(&self) {
        let total = self.len();
        let percent = |count: usize| {
            if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            }
        };

        info!("=== Split Summary ===");
        info!(
            "Mode: {} (seed {})",
            if self.stratified {
                "stratified"
            } else {
                "unstratified"
            },
            self.seed
        );
        info!("Total images: {}", total);
        for split in Split::ALL {
            let count = self.stems(split).len();
            info!("  {}: {} images ({:.1}%)", split, count, percent(count));
        }

        if !self.groups.is_empty() {
            info!("Composition groups: {}", self.groups.len());
            for group in &self.groups {
                info!(
                    "  {}: train {}, val {}, test {}",
                    group.composition, group.counts.train, group.counts.val, group.counts.test
                );
            }
        }
    }
}

/// Plan the split of an indexed dataset.
///
/// Stratifies by class composition unless `stratify` is false or the index has
/// no labels, in which case every image is split uniformly at random.
pub fn plan_split(index: &DatasetIndex, ratios: Ratios, seed: u64, stratify: bool) -> SplitPlan {
    let mut rng = seeded_rng(seed);

    let mut plan = if stratify && index.labels_available {
        stratified_split(index.records(), ratios, seed, &mut rng)
    } else {
        if stratify {
            warn!("No labels available, falling back to an unstratified random split");
        } else {
            info!("Stratification disabled, using an unstratified random split");
        }
        unstratified_split(index.records(), ratios, seed, &mut rng)
    };

    // Reorder within each split so same-composition stems are not clustered
    plan.train.shuffle(&mut rng);
    plan.val.shuffle(&mut rng);
    plan.test.shuffle(&mut rng);

    plan
}

/// Allocate every composition group separately and concatenate the results
pub fn stratified_split(
    records: &[ImageRecord],
    ratios: Ratios,
    seed: u64,
    rng: &mut StdRng,
) -> SplitPlan {
    let groups = group_by_composition(records);
    info!("Found {} distinct class compositions", groups.len());

    let mut plan = empty_plan(ratios, seed, true);
    for (composition, stems) in groups {
        let allocation = allocate_group(stems, &ratios, rng);
        plan.groups.push(GroupSummary {
            composition,
            counts: allocation.counts(),
        });
        plan.train.extend(allocation.train);
        plan.val.extend(allocation.val);
        plan.test.extend(allocation.test);
    }

    plan
}

/// Shuffle all stems together and cut them by the ratios
pub fn unstratified_split(
    records: &[ImageRecord],
    ratios: Ratios,
    seed: u64,
    rng: &mut StdRng,
) -> SplitPlan {
    let stems: Vec<String> = records.iter().map(|record| record.stem.clone()).collect();
    let counts = unstratified_counts(stems.len(), ratios.train(), ratios.val());
    let allocation = slice_shuffled(stems, counts, rng);

    let mut plan = empty_plan(ratios, seed, false);
    plan.train = allocation.train;
    plan.val = allocation.val;
    plan.test = allocation.test;
    plan
}

fn empty_plan(ratios: Ratios, seed: u64, stratified: bool) -> SplitPlan {
    SplitPlan {
        seed,
        ratios,
        stratified,
        train: Vec::new(),
        val: Vec::new(),
        test: Vec::new(),
        groups: Vec::new(),
    }
}
