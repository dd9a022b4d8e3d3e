//! Raw market file loading.

use std::path::Path;

use chrono::NaiveDate;
use polars::prelude::*;
use stockout_model::{DrugId, IngredientId, PharmacyId, RawObservation, Week};

use crate::columns::{
    self, CLIENT_ID, DRUG_NAME, DRUGS_ID, INN, INN_ID, NFC1, NFC2, ORG_ID, PERIOD_ID, Q, V,
    SEPARATOR, non_empty, parse_decimal, parse_id, text_column,
};
use crate::error::{IngestError, Result};
use crate::period::decode_period_id;

/// All rows of one market file, decoded.
#[derive(Debug, Clone)]
pub struct LoadedMarket {
    /// Target pharmacy of the market.
    pub market_id: PharmacyId,
    pub file_name: String,
    pub observations: Vec<RawObservation>,
    /// Earliest decoded period date, before Monday alignment.
    pub data_start: NaiveDate,
    pub data_end: NaiveDate,
}

/// Reads a raw market file into a DataFrame with every column as text.
pub fn read_market_frame(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let parse_options = CsvParseOptions::default().with_separator(SEPARATOR);
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(parse_options)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    // Skip BOM if present
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    df.set_column_names(names)?;

    if df.height() == 0 {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    columns::ensure_required_columns(&df, path)?;
    Ok(df)
}

/// Loads and decodes one market file.
///
/// When `expected` is given, every CLIENT_ID must equal it; otherwise the
/// first row's CLIENT_ID becomes the market id.
pub fn read_market_file(path: &Path, expected: Option<PharmacyId>) -> Result<LoadedMarket> {
    let df = read_market_frame(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let client = text_column(&df, CLIENT_ID)?;
    let org = text_column(&df, ORG_ID)?;
    let period = text_column(&df, PERIOD_ID)?;
    let drug = text_column(&df, DRUGS_ID)?;
    let inn_id = text_column(&df, INN_ID)?;
    let inn = text_column(&df, INN)?;
    let quantity = text_column(&df, Q)?;
    let revenue = text_column(&df, V)?;
    let drug_name = text_column(&df, DRUG_NAME)?;
    let nfc1 = text_column(&df, NFC1)?;
    let nfc2 = text_column(&df, NFC2)?;

    let mut market_id = expected;
    let mut observations = Vec::with_capacity(df.height());
    let mut range: Option<(NaiveDate, NaiveDate)> = None;

    for idx in 0..df.height() {
        let row = idx + 1;
        let id = |ca: &StringChunked, column: &'static str| -> Result<i64> {
            let raw = ca.get(idx).unwrap_or_default();
            parse_id(raw).ok_or_else(|| IngestError::InvalidValue {
                column,
                value: raw.to_string(),
                row,
                path: path.to_path_buf(),
            })
        };
        let number = |ca: &StringChunked, column: &'static str| -> Result<f64> {
            let raw = ca.get(idx).unwrap_or_default();
            parse_decimal(raw).ok_or_else(|| IngestError::InvalidValue {
                column,
                value: raw.to_string(),
                row,
                path: path.to_path_buf(),
            })
        };

        let client_id = PharmacyId::new(id(client, CLIENT_ID)?);
        match market_id {
            Some(expected) if expected != client_id => {
                return Err(IngestError::ClientMismatch {
                    path: path.to_path_buf(),
                    expected,
                    found: client_id,
                });
            }
            Some(_) => {}
            None => market_id = Some(client_id),
        }

        let raw_period = period.get(idx).unwrap_or_default();
        let date = decode_period_id(raw_period).ok_or_else(|| IngestError::InvalidPeriodId {
            value: raw_period.to_string(),
            row,
            path: path.to_path_buf(),
        })?;
        range = Some(match range {
            Some((start, end)) => (start.min(date), end.max(date)),
            None => (date, date),
        });

        observations.push(RawObservation {
            pharmacy_id: PharmacyId::new(id(org, ORG_ID)?),
            drug_id: DrugId::new(id(drug, DRUGS_ID)?),
            ingredient_id: IngredientId::new(id(inn_id, INN_ID)?),
            week: Week::containing(date),
            quantity: number(quantity, Q)?,
            revenue: number(revenue, V)?,
            drug_name: non_empty(drug_name.get(idx)),
            ingredient_name: non_empty(inn.get(idx)),
            nfc1: non_empty(nfc1.get(idx)),
            nfc2: non_empty(nfc2.get(idx)),
        });
    }

    let (Some(market_id), Some((data_start, data_end))) = (market_id, range) else {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    };

    tracing::debug!(
        market_id = %market_id,
        file = %file_name,
        rows = observations.len(),
        "loaded market file"
    );

    Ok(LoadedMarket {
        market_id,
        file_name,
        observations,
        data_start,
        data_end,
    })
}
