//! Raw market data ingestion.
//!
//! This crate discovers `Rd2_<CLIENT_ID>.csv` market extracts, loads them
//! with Polars and decodes every row into a [`RawObservation`].
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use stockout_ingest::{discover_market_files, read_market_file};
//!
//! for file in discover_market_files(Path::new("data/raw"))? {
//!     let market = read_market_file(&file.path, Some(file.market_id))?;
//!     println!("{}: {} rows", market.market_id, market.observations.len());
//! }
//! ```
//!
//! [`RawObservation`]: stockout_model::RawObservation

mod columns;
mod discovery;
mod error;
mod period;
mod profile;
mod reader;

// === Error Types ===
pub use error::{IngestError, Result};

// === Raw Columns ===
pub use columns::{REQUIRED_COLUMNS, SEPARATOR, missing_columns, parse_decimal};

// === File Discovery ===
pub use discovery::{
    MARKET_FILE_PREFIX, MarketFile, discover_market_files, list_csv_files,
    market_id_from_file_name,
};

// === Period Decoding ===
pub use period::{decode_period_id, period_week};

// === Loading ===
pub use reader::{LoadedMarket, read_market_file, read_market_frame};

// === Profiles ===
pub use profile::{DrugCatalog, DrugCatalogEntry, MarketProfile};
