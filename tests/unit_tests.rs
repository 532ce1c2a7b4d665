use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use yolo_split::{
    index_dataset, plan_split, run, Args, CompositionKey, IndexWarning, Ratios, Split, SplitError,
};

/// Write an image and, when `label` is given, its label file into `source`
fn add_image(source: &Path, file_name: &str, label: Option<&str>) {
    let images_dir = source.join("images");
    fs::create_dir_all(&images_dir).unwrap();
    File::create(images_dir.join(file_name))
        .unwrap()
        .write_all(b"\xFF\xD8\xFF fake image")
        .unwrap();

    if let Some(label) = label {
        let labels_dir = source.join("labels");
        fs::create_dir_all(&labels_dir).unwrap();
        let stem = Path::new(file_name).file_stem().unwrap().to_str().unwrap();
        File::create(labels_dir.join(format!("{}.txt", stem)))
            .unwrap()
            .write_all(label.as_bytes())
            .unwrap();
    }
}

fn args(source: &Path, dest: &Path) -> Args {
    Args {
        source_dir: source.to_path_buf(),
        dest_dir: dest.to_path_buf(),
        ratios: vec![0.8, 0.1, 0.1],
        copy: true,
        seed: 42,
        no_stratify: false,
        dry_run: false,
        manifest: None,
    }
}

fn stems_in(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path: PathBuf = entry.unwrap().path();
            path.file_stem().unwrap().to_string_lossy().into_owned()
        })
        .collect()
}

/// Twelve images of mixed composition plus two of a rare class
fn build_mixed_dataset(source: &Path) {
    for i in 0..12 {
        let label = match i % 3 {
            0 => "0 0.5 0.5 0.1 0.1\n",
            1 => "1 0.5 0.5 0.1 0.1\n0 0.2 0.2 0.1 0.1\n",
            _ => "0 0.1 0.1 0.1 0.1\n1 0.3 0.3 0.1 0.1\n1 0.4 0.4 0.2 0.2\n",
        };
        add_image(source, &format!("img{:02}.jpg", i), Some(label));
    }
    add_image(source, "rare_a.png", Some("7 0.5 0.5 0.2 0.2\n"));
    add_image(source, "rare_b.png", Some("7 0.5 0.5 0.2 0.2\n"));
}

#[test]
fn test_ten_image_group_splits_eight_one_one() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("datas");
    let dest = temp_dir.path().join("datasets");
    for i in 0..10 {
        add_image(&source, &format!("car{}.jpg", i), Some("0 0.5 0.5 0.1 0.1\n"));
    }

    let (plan, stats) = run(&args(&source, &dest)).unwrap();
    let stats = stats.unwrap();

    assert_eq!(plan.train.len(), 8);
    assert_eq!(plan.val.len(), 1);
    assert_eq!(plan.test.len(), 1);
    assert_eq!(stats.transferred_images, 10);
    assert_eq!(stats.transferred_labels, 10);
    assert_eq!(stats.failed_transfers, 0);

    for split in Split::ALL {
        let expected: BTreeSet<String> = plan.stems(split).iter().cloned().collect();
        let split_dir = dest.join(split.as_str());
        assert_eq!(stems_in(&split_dir.join("images")), expected);
        assert_eq!(stems_in(&split_dir.join("labels")), expected);
    }

    // Copy mode leaves the source intact
    assert_eq!(stems_in(&source.join("images")).len(), 10);
}

#[test]
fn test_groups_have_composition_order_independent() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("datas");
    build_mixed_dataset(&source);

    let index = index_dataset(&source.join("images"), &source.join("labels")).unwrap();
    let plan = plan_split(&index, Ratios::default(), 42, true);

    // {0}, {0,1} (two label orders) and {7}
    let compositions: Vec<&CompositionKey> = plan.groups.iter().map(|g| &g.composition).collect();
    assert_eq!(
        compositions,
        vec![
            &CompositionKey::new([0]),
            &CompositionKey::new([0, 1]),
            &CompositionKey::new([7]),
        ]
    );
    assert_eq!(plan.groups[1].counts.total(), 8);
}

#[test]
fn test_small_group_goes_to_train() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("datas");
    build_mixed_dataset(&source);

    let index = index_dataset(&source.join("images"), &source.join("labels")).unwrap();
    let plan = plan_split(&index, Ratios::new(0.2, 0.4, 0.4).unwrap(), 9, true);
    let assignments = plan.assignments();

    assert_eq!(assignments["rare_a"], Split::Train);
    assert_eq!(assignments["rare_b"], Split::Train);
}

#[test]
fn test_minimum_validation_sample() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("datas");
    for i in 0..5 {
        add_image(&source, &format!("dog{}.jpg", i), Some("3 0.5 0.5 0.1 0.1\n"));
    }

    let index = index_dataset(&source.join("images"), &source.join("labels")).unwrap();
    let plan = plan_split(&index, Ratios::default(), 42, true);

    assert_eq!(plan.groups.len(), 1);
    assert!(!plan.val.is_empty());
    assert_eq!(plan.len(), 5);
}

#[test]
fn test_partition_and_determinism() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("datas");
    build_mixed_dataset(&source);
    add_image(&source, "background.jpeg", None);

    let index = index_dataset(&source.join("images"), &source.join("labels")).unwrap();
    let first = plan_split(&index, Ratios::default(), 1234, true);
    let second = plan_split(&index, Ratios::default(), 1234, true);
    assert_eq!(first, second);

    let assignments = first.assignments();
    assert_eq!(assignments.len(), index.len());
    assert_eq!(first.len(), index.len());
    for record in index.records() {
        assert!(assignments.contains_key(&record.stem));
    }

    let summed: usize = first.groups.iter().map(|g| g.counts.total()).sum();
    assert_eq!(summed, index.len());
}

#[test]
fn test_missing_labels_dir_falls_back_to_random_split() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("datas");
    let dest = temp_dir.path().join("datasets");
    for i in 0..20 {
        add_image(&source, &format!("frame{:02}.png", i), None);
    }

    let index = index_dataset(&source.join("images"), &source.join("labels")).unwrap();
    assert!(!index.labels_available);
    assert!(matches!(index.warnings[0], IndexWarning::MissingLabelDir(_)));

    let (plan, stats) = run(&args(&source, &dest)).unwrap();
    assert!(!plan.stratified);
    assert_eq!(plan.assignments().len(), 20);
    assert_eq!(plan.train.len(), 16);
    assert_eq!(plan.val.len(), 2);
    assert_eq!(plan.test.len(), 2);

    let stats = stats.unwrap();
    assert_eq!(stats.transferred_images, 20);
    assert_eq!(stats.missing_labels, 20);
}

#[test]
fn test_malformed_label_line_is_skipped() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("datas");
    add_image(&source, "a.jpg", Some("person 0.5 0.5 0.1 0.1\n2 0.5 0.5 0.1 0.1\n"));
    add_image(&source, "b.jpg", Some("4 0.5 0.5 0.1 0.1\n"));
    add_image(&source, "c.jpg", None);

    let index = index_dataset(&source.join("images"), &source.join("labels")).unwrap();
    let class_sets = index.class_sets();

    assert_eq!(class_sets["a"], &BTreeSet::from([2]));
    assert_eq!(class_sets["b"], &BTreeSet::from([4]));
    assert!(class_sets["c"].is_empty());
    assert_eq!(index.warnings.len(), 1);
    assert!(matches!(
        &index.warnings[0],
        IndexWarning::MalformedLine { line_number: 1, .. }
    ));
    assert!(index.get("c").unwrap().label_path.is_none());
}

#[test]
fn test_extensions_are_case_insensitive_and_stems_unique() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("datas");
    add_image(&source, "upper.JPG", Some("0\n"));
    add_image(&source, "dup.jpg", Some("0\n"));
    add_image(&source, "dup.png", None);
    add_image(&source, "notes.txt", None);

    let index = index_dataset(&source.join("images"), &source.join("labels")).unwrap();
    let stems: Vec<&str> = index.records().iter().map(|r| r.stem.as_str()).collect();

    assert_eq!(stems, vec!["dup", "upper"]);
    assert_eq!(
        index.get("dup").unwrap().image_path.extension().unwrap(),
        "jpg"
    );
    assert!(index
        .warnings
        .iter()
        .any(|w| matches!(w, IndexWarning::DuplicateStem { stem, .. } if stem == "dup")));
}

#[test]
fn test_move_mode_empties_source() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("datas");
    let dest = temp_dir.path().join("datasets");
    build_mixed_dataset(&source);

    let mut args = args(&source, &dest);
    args.copy = false;
    let (plan, stats) = run(&args).unwrap();

    assert_eq!(stats.unwrap().failed_transfers, 0);
    assert!(stems_in(&source.join("images")).is_empty());
    assert!(stems_in(&source.join("labels")).is_empty());

    let moved: usize = Split::ALL
        .iter()
        .map(|split| stems_in(&dest.join(split.as_str()).join("images")).len())
        .sum();
    assert_eq!(moved, plan.len());
}

#[test]
fn test_dry_run_touches_nothing_and_writes_manifest() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("datas");
    let dest = temp_dir.path().join("datasets");
    let manifest = temp_dir.path().join("reports/split.json");
    build_mixed_dataset(&source);

    let mut args = args(&source, &dest);
    args.dry_run = true;
    args.manifest = Some(manifest.clone());
    let (plan, stats) = run(&args).unwrap();

    assert!(stats.is_none());
    assert!(!dest.exists());

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest).unwrap()).unwrap();
    assert_eq!(value["seed"], 42);
    assert_eq!(value["stratified"], true);
    assert_eq!(value["counts"]["train"], plan.train.len());

    let assignments: BTreeMap<String, String> =
        serde_json::from_value(value["assignments"].clone()).unwrap();
    assert_eq!(assignments.len(), 14);
    assert_eq!(assignments["rare_a"], "train");
}

#[test]
fn test_fatal_errors() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("datas");
    let dest = temp_dir.path().join("datasets");

    let err = run(&args(&source, &dest)).unwrap_err();
    assert!(matches!(err, SplitError::MissingImageDir(_)));

    fs::create_dir_all(source.join("images")).unwrap();
    let err = run(&args(&source, &dest)).unwrap_err();
    assert!(matches!(err, SplitError::NoImages(_)));

    add_image(&source, "a.jpg", Some("0\n"));
    let mut bad_ratios = args(&source, &dest);
    bad_ratios.ratios = vec![0.8, 0.3, 0.1];
    let err = run(&bad_ratios).unwrap_err();
    assert!(matches!(err, SplitError::InvalidRatios { .. }));
    assert!(!dest.exists());
}
