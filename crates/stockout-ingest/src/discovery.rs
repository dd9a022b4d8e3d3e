//! Market file discovery.

use std::path::{Path, PathBuf};

use stockout_model::PharmacyId;

use crate::error::{IngestError, Result};

/// File name prefix of raw market extracts.
pub const MARKET_FILE_PREFIX: &str = "Rd2_";

/// A raw market file and the target pharmacy encoded in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketFile {
    pub market_id: PharmacyId,
    pub path: PathBuf,
}

impl MarketFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Lists all CSV files in a directory.
///
/// Returns files sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Extracts the market id from `Rd2_{CLIENT_ID}.csv`.
pub fn market_id_from_file_name(name: &str) -> Option<PharmacyId> {
    let stem = name
        .strip_prefix(MARKET_FILE_PREFIX)?
        .rsplit_once('.')
        .filter(|(_, ext)| ext.eq_ignore_ascii_case("csv"))?
        .0;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok().map(PharmacyId::new)
}

/// Finds every market file in `dir`, ordered by market id.
///
/// CSV files that do not follow the naming pattern are skipped.
pub fn discover_market_files(dir: &Path) -> Result<Vec<MarketFile>> {
    let mut markets = Vec::new();
    for path in list_csv_files(dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match market_id_from_file_name(&name) {
            Some(market_id) => markets.push(MarketFile { market_id, path }),
            None => tracing::debug!(file = %name, "skipping file outside market naming pattern"),
        }
    }
    if markets.is_empty() {
        return Err(IngestError::NoMarketFiles {
            path: dir.to_path_buf(),
        });
    }
    markets.sort_by_key(|market| market.market_id);
    Ok(markets)
}
