//! Tests for market file discovery.

use std::fs;

use stockout_ingest::{IngestError, discover_market_files, list_csv_files};
use stockout_model::PharmacyId;
use tempfile::TempDir;

#[test]
fn discovers_market_files_in_id_order() {
    let dir = TempDir::new().unwrap();
    for name in ["Rd2_20.csv", "Rd2_3.csv", "notes.csv", "Rd2_7.txt"] {
        fs::write(dir.path().join(name), "CLIENT_ID\n1\n").unwrap();
    }
    fs::create_dir(dir.path().join("Rd2_99.csv")).unwrap();

    let all = list_csv_files(dir.path()).unwrap();
    assert_eq!(all.len(), 3);

    let markets = discover_market_files(dir.path()).unwrap();
    let ids: Vec<PharmacyId> = markets.iter().map(|m| m.market_id).collect();
    assert_eq!(ids, vec![PharmacyId::new(3), PharmacyId::new(20)]);
    assert_eq!(markets[0].file_name(), "Rd2_3.csv");
}

#[test]
fn empty_directory_has_no_markets() {
    let dir = TempDir::new().unwrap();
    let result = discover_market_files(dir.path());
    assert!(matches!(result, Err(IngestError::NoMarketFiles { .. })));
}

#[test]
fn missing_directory_is_reported() {
    let dir = TempDir::new().unwrap();
    let result = list_csv_files(&dir.path().join("absent"));
    assert!(matches!(result, Err(IngestError::DirectoryNotFound { .. })));
}
