//! Grouping of images by class composition.

use std::collections::BTreeMap;

use crate::types::{CompositionKey, ImageRecord};

/// Images grouped by composition, iterated in canonical (sorted key) order
pub type Groups = BTreeMap<CompositionKey, Vec<String>>;

/// Partition the records into groups of identical class composition.
///
/// Within a group the stems keep the order of `records`, so a sorted index
/// yields sorted groups. Background images share the empty composition.
pub fn group_by_composition(records: &[ImageRecord]) -> Groups {
    let mut groups = Groups::new();
    for record in records {
        groups
            .entry(record.composition())
            .or_default()
            .push(record.stem.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn record(stem: &str, classes: &[i64]) -> ImageRecord {
        ImageRecord {
            stem: stem.to_string(),
            image_path: PathBuf::from(format!("{}.jpg", stem)),
            label_path: None,
            classes: classes.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn groups_are_order_independent() {
        let records = vec![
            record("a", &[2, 0]),
            record("b", &[0, 2]),
            record("c", &[0]),
            record("d", &[]),
            record("e", &[]),
        ];
        let groups = group_by_composition(&records);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[&CompositionKey::new([0, 2])], vec!["a", "b"]);
        assert_eq!(groups[&CompositionKey::new([0])], vec!["c"]);
        assert_eq!(groups[&CompositionKey::default()], vec!["d", "e"]);
    }

    #[test]
    fn groups_partition_all_stems() {
        let records: Vec<_> = (0..20)
            .map(|i| record(&format!("img{:02}", i), &[i % 3, i % 5]))
            .collect();
        let groups = group_by_composition(&records);

        let mut stems: Vec<&String> = groups.values().flatten().collect();
        stems.sort();
        stems.dedup();
        assert_eq!(stems.len(), records.len());
    }

    #[test]
    fn canonical_order_puts_background_first() {
        let records = vec![record("x", &[5]), record("y", &[]), record("z", &[1, 5])];
        let keys: Vec<_> = group_by_composition(&records).into_keys().collect();
        assert_eq!(
            keys,
            vec![
                CompositionKey::default(),
                CompositionKey::new([1, 5]),
                CompositionKey::new([5]),
            ]
        );
    }
}
