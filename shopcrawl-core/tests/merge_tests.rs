// Tests for corpus merging

use shopcrawl_core::merge::{MergeError, MergeLayout, MergeOptions, merge_corpus, separator};
use shopcrawl_core::naming::NameMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const FIRST: &str = "URL: https://shop.example/p/1\n================\n\nResistor 5k carbon film, pack of 10\n";
const SECOND: &str = "URL: https://shop.example/p/2\n================\n\nResistor 5k metal film 1% tolerance\n";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn resistor_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    // Written out of order on purpose; merge order is by file name
    write(&input, "Resistor/5kOhm/b.txt", SECOND);
    write(&input, "Resistor/5kOhm/empty.txt", "");
    write(&input, "Resistor/5kOhm/a.txt", FIRST);
    dir
}

fn options(dir: &TempDir) -> MergeOptions {
    MergeOptions::new(&dir.path().join("in"), &dir.path().join("out"))
}

#[test]
fn test_nested_merge_end_to_end() {
    let dir = resistor_fixture();
    let summary = merge_corpus(&options(&dir)).unwrap();

    let merged = fs::read_to_string(dir.path().join("out/Resistor/5kOhm_merged.txt")).unwrap();
    let entries: Vec<&str> = merged.split(separator().as_str()).collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], "Resistor 5k carbon film, pack of 10\n\n");
    assert_eq!(entries[1], "Resistor 5k metal film 1% tolerance\n\n");

    assert_eq!(summary.categories, 1);
    assert_eq!(summary.corpora_written, 1);
    assert_eq!(summary.entries_merged, 2);
    assert_eq!(summary.files_discarded, 1);
    assert_eq!(summary.write_failures, 0);
}

#[test]
fn test_merge_is_deterministic() {
    let dir = resistor_fixture();
    merge_corpus(&options(&dir)).unwrap();
    let first = fs::read(dir.path().join("out/Resistor/5kOhm_merged.txt")).unwrap();
    merge_corpus(&options(&dir)).unwrap();
    let second = fs::read(dir.path().join("out/Resistor/5kOhm_merged.txt")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_all_discarded_subcategory_has_no_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    write(&input, "LED/Red/a.txt", "URL: https://shop.example/p/3\n=====\n\nshort\n");
    write(&input, "LED/Red/b.txt", "");

    let summary = merge_corpus(&options(&dir)).unwrap();
    assert_eq!(summary.corpora_written, 0);
    assert_eq!(summary.files_discarded, 2);
    assert!(!dir.path().join("out/LED/Red_merged.txt").exists());
}

#[test]
fn test_max_files_caps_each_folder() {
    let dir = resistor_fixture();
    let mut opts = options(&dir);
    opts.max_files = Some(1);

    let summary = merge_corpus(&opts).unwrap();
    assert_eq!(summary.entries_merged, 1);
    let merged = fs::read_to_string(dir.path().join("out/Resistor/5kOhm_merged.txt")).unwrap();
    assert!(merged.contains("carbon film"));
    assert!(!merged.contains("metal film"));
}

#[test]
fn test_name_map_renames_outputs() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("in"), "قطعات/مقاومت/a.txt", FIRST);

    let mut opts = options(&dir);
    opts.name_map = NameMap::from([("مقاومت", "resistor")]);
    merge_corpus(&opts).unwrap();
    assert!(dir.path().join("out/قطعات/resistor_merged.txt").exists());
}

#[test]
fn test_unmapped_names_are_transliterated() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("in"), "Passive/Carbon film - 5k/a.txt", FIRST);
    merge_corpus(&options(&dir)).unwrap();
    assert!(dir.path().join("out/Passive/Carbon_film___5k_merged.txt").exists());
}

#[test]
fn test_flat_layout() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    write(&input, "Fuse/a.txt", FIRST);
    write(&input, "Fuse/notes.md", "ignored because it is not a .txt file");

    let mut opts = options(&dir);
    opts.layout = MergeLayout::Flat;
    let summary = merge_corpus(&opts).unwrap();

    assert_eq!(summary.entries_merged, 1);
    let merged = fs::read_to_string(dir.path().join("out/merged_Fuse.txt")).unwrap();
    assert_eq!(merged, "Resistor 5k carbon film, pack of 10\n\n");
}

#[test]
fn test_keep_source_url() {
    let dir = resistor_fixture();
    let mut opts = options(&dir);
    opts.keep_source_url = true;
    merge_corpus(&opts).unwrap();

    let merged = fs::read_to_string(dir.path().join("out/Resistor/5kOhm_merged.txt")).unwrap();
    assert!(merged.starts_with("URL: https://shop.example/p/1\nResistor 5k carbon film"));
    assert!(merged.contains("URL: https://shop.example/p/2\n"));
}

#[test]
fn test_missing_input_is_fatal_and_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let err = merge_corpus(&options(&dir)).unwrap_err();
    assert!(matches!(err, MergeError::MissingInput(_)));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_colliding_names_share_one_corpus() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    write(&input, "Resistor/Carbon film/a.txt", FIRST);
    write(&input, "Resistor/Carbon-film/a.txt", SECOND);

    let summary = merge_corpus(&options(&dir)).unwrap();

    let target = dir.path().join("out/Resistor/Carbon_film_merged.txt");
    let merged = fs::read_to_string(&target).unwrap();
    let entries: Vec<&str> = merged.split(separator().as_str()).collect();
    assert_eq!(entries, vec![
        "Resistor 5k carbon film, pack of 10\n\n",
        "Resistor 5k metal film 1% tolerance\n\n"
    ]);
    assert_eq!(summary.corpora_written, 1);
    assert_eq!(summary.entries_merged, 2);
    assert_eq!(summary.outputs, vec![target]);
}

#[test]
fn test_collision_does_not_append_to_previous_run_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    write(&input, "Resistor/Carbon film/a.txt", FIRST);
    write(&input, "Resistor/Carbon-film/a.txt", SECOND);

    merge_corpus(&options(&dir)).unwrap();
    let first = fs::read(dir.path().join("out/Resistor/Carbon_film_merged.txt")).unwrap();
    merge_corpus(&options(&dir)).unwrap();
    let second = fs::read(dir.path().join("out/Resistor/Carbon_film_merged.txt")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_hidden_directories_are_not_categories() {
    let dir = resistor_fixture();
    let input = dir.path().join("in");
    write(&input, ".state/visited.log", "https://shop.example/p/1\n");
    write(&input, ".state/nested/a.txt", FIRST);
    write(&input, "Resistor/.cache/a.txt", FIRST);

    let summary = merge_corpus(&options(&dir)).unwrap();

    assert_eq!(summary.categories, 1);
    assert_eq!(summary.corpora_written, 1);
    assert!(!dir.path().join("out/.state").exists());
    assert!(!dir.path().join("out/Resistor/.cache_merged.txt").exists());
}
