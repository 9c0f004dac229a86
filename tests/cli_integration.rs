use std::path::{Path, PathBuf};
use std::process::Command;

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixture").join(name)
}

fn run_changepoi(args: &[&str]) -> Vec<serde_json::Value> {
    let exe = env!("CARGO_BIN_EXE_changepoi");

    let output = Command::new(exe)
        .arg("--input")
        .arg(fixture_path("berlin_changes.osc"))
        .arg("--output")
        .arg("-")
        .args(args)
        .output()
        .expect("run changepoi");

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("changepoi failed: {}", stderr);
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("valid geojson line"))
        .collect()
}

fn property<'a>(feature: &'a serde_json::Value, key: &str) -> &'a serde_json::Value {
    &feature["properties"][key]
}

#[test]
fn writes_buckets_in_order_with_filter_file() {
    let filters = fixture_path("filters.yaml");
    let features = run_changepoi(&["--filters", filters.to_str().unwrap()]);

    let buckets: Vec<&str> = features
        .iter()
        .map(|f| property(f, "bucket").as_str().unwrap())
        .collect();
    assert_eq!(
        buckets,
        vec!["created", "created", "updated", "deleted", "malformed"]
    );

    let ids: Vec<i64> = features
        .iter()
        .map(|f| property(f, "id").as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 4, 5, 7, 8]);

    let first = &features[0];
    assert_eq!(property(first, "category"), "bank");
    assert_eq!(property(first, "change"), "create");
    assert_eq!(property(first, "name"), "Spree Bank");
    assert_eq!(property(first, "wheelchair"), true);
    assert_eq!(property(first, "date"), "2021-01-01");
    assert_eq!(first["geometry"]["type"], "Point");
    assert_eq!(first["bbox"].as_array().unwrap().len(), 4);
}

#[test]
fn amenity_flags_without_filter_file() {
    let features = run_changepoi(&["--amenity", "atm", "--utc-offset", "+01:00"]);

    let ids: Vec<i64> = features
        .iter()
        .map(|f| property(f, "id").as_i64().unwrap())
        .collect();
    // Shops plus the ATM; banks are not accepted and `renumber` is not tracked.
    assert_eq!(ids, vec![4, 5]);
    assert_eq!(property(&features[1], "date"), "2021-01-03");
}

#[test]
fn writes_geojson_collection_to_file() {
    let output_file = tempfile::NamedTempFile::with_suffix(".geojson").unwrap();
    let filters = fixture_path("filters.yaml");

    let status = Command::new(env!("CARGO_BIN_EXE_changepoi"))
        .arg("--input")
        .arg(fixture_path("berlin_changes.osc"))
        .arg("--output")
        .arg(output_file.path())
        .arg("--filters")
        .arg(&filters)
        .arg("--verbose")
        .status()
        .expect("failed to execute process");
    assert!(status.success());

    let content = std::fs::read_to_string(output_file.path()).unwrap();
    let collection: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(collection["type"], "FeatureCollection");
    assert_eq!(collection["features"].as_array().unwrap().len(), 5);
}

#[test]
fn missing_input_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_changepoi"))
        .arg("--input")
        .arg(fixture_path("missing.osc"))
        .arg("--output")
        .arg("-")
        .output()
        .expect("run changepoi");

    assert!(!output.status.success(), "expected failure");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to open"), "unexpected stderr: {stderr}");
}
