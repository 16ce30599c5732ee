
use anyhow::{bail, Context};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::Connection;
use std::path::Path;

/// Default CollectOxoGMetrics context
pub const DEFAULT_CONTEXT: &str = "CCG";
/// Default metrics table
pub const DEFAULT_TABLE: &str = "picard_CollectOxoGMetrics";
/// Default input state
pub const DEFAULT_INPUT_STATE: &str = "markduplicates_readgroups";
/// Floor on the oxidation error numerator, keeps the log defined
pub const MIN_ERROR_NUMERATOR: f64 = 1.0001;

lazy_static! {
    static ref TABLE_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// One read-group row of OxoG metrics
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OxoMetricsRow {
    pub total_bases: i64,
    pub alt_oxo_bases: i64,
    pub alt_nonoxo_bases: i64,
    pub oxidation_q: f64
}

/// Anything that can supply OxoG metrics rows for a context and input state
pub trait OxoMetricsSource {
    fn oxo_rows(&self, context: &str, input_state: &str) -> anyhow::Result<Vec<OxoMetricsRow>>;
}

/// OxoG metrics stored in a SQLite table
pub struct SqliteOxoMetrics {
    connection: Connection,
    table: String
}

impl SqliteOxoMetrics {
    /// Opens a SQLite database file
    /// # Arguments
    /// * `filename` - the database path
    /// * `table` - table holding the metrics, must be a plain identifier
    pub fn open(filename: &Path, table: &str) -> anyhow::Result<Self> {
        debug!("Opening metrics database {filename:?}...");
        let connection = Connection::open(filename)
            .with_context(|| format!("Error while opening {filename:?}:"))?;
        Self::from_connection(connection, table)
    }

    pub fn from_connection(connection: Connection, table: &str) -> anyhow::Result<Self> {
        if !TABLE_NAME_REGEX.is_match(table) {
            bail!("Invalid table name: {table:?}");
        }
        Ok(Self {
            connection,
            table: table.to_string()
        })
    }
}

/// Integer view of a loosely typed SQLite value
fn value_as_i64(value: &Value) -> anyhow::Result<i64> {
    Ok(match value {
        Value::Integer(i) => *i,
        Value::Real(f) => *f as i64,
        Value::Text(s) => s.trim().parse()
            .with_context(|| format!("Error while parsing integer {s:?}:"))?,
        other => bail!("Expected an integer, found {other:?}")
    })
}

/// Float view of a loosely typed SQLite value
fn value_as_f64(value: &Value) -> anyhow::Result<f64> {
    Ok(match value {
        Value::Integer(i) => *i as f64,
        Value::Real(f) => *f,
        Value::Text(s) => s.trim().parse()
            .with_context(|| format!("Error while parsing float {s:?}:"))?,
        other => bail!("Expected a number, found {other:?}")
    })
}

impl OxoMetricsSource for SqliteOxoMetrics {
    fn oxo_rows(&self, context: &str, input_state: &str) -> anyhow::Result<Vec<OxoMetricsRow>> {
        let query = format!(
            "SELECT TOTAL_BASES, ALT_OXO_BASES, ALT_NONOXO_BASES, OXIDATION_Q FROM {} WHERE CONTEXT = ?1 AND input_state = ?2",
            self.table
        );
        let mut statement = self.connection.prepare(&query)
            .with_context(|| format!("Error while preparing query on {}:", self.table))?;
        let raw_rows = statement
            .query_map([context, input_state], |row| {
                Ok([
                    row.get::<_, Value>(0)?,
                    row.get::<_, Value>(1)?,
                    row.get::<_, Value>(2)?,
                    row.get::<_, Value>(3)?
                ])
            })?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Error while querying {}:", self.table))?;

        raw_rows.iter()
            .map(|[total, alt_oxo, alt_nonoxo, oxidation_q]| -> anyhow::Result<OxoMetricsRow> {
                Ok(OxoMetricsRow {
                    total_bases: value_as_i64(total)?,
                    alt_oxo_bases: value_as_i64(alt_oxo)?,
                    alt_nonoxo_bases: value_as_i64(alt_nonoxo)?,
                    oxidation_q: value_as_f64(oxidation_q)?
                })
            })
            .collect()
    }
}

/// Collapses read-group rows into one oxoQ score.
/// Multiple rows are pooled into a single error rate; a lone row keeps its own score; no rows gives NaN.
pub fn aggregate_oxoq(rows: &[OxoMetricsRow]) -> f64 {
    match rows {
        [] => f64::NAN,
        [single] => single.oxidation_q,
        _ => {
            let total: i64 = rows.iter().map(|r| r.total_bases).sum();
            let alt_oxo: i64 = rows.iter().map(|r| r.alt_oxo_bases).sum();
            let alt_nonoxo: i64 = rows.iter().map(|r| r.alt_nonoxo_bases).sum();
            let error_rate = ((alt_oxo - alt_nonoxo) as f64).max(MIN_ERROR_NUMERATOR) / total as f64;
            -10.0 * error_rate.log10()
        }
    }
}

/// Two-decimal score for stdout; non-finite scores print as `nan`, `inf`, or `-inf`
pub fn format_oxoq(score: f64) -> String {
    if score.is_nan() {
        "nan".to_string()
    } else if score.is_infinite() {
        if score > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{score:.2}")
    }
}

/// Queries and aggregates in one step
pub fn extract_oxoq(source: &dyn OxoMetricsSource, context: &str, input_state: &str) -> anyhow::Result<f64> {
    let rows = source.oxo_rows(context, input_state)?;
    debug!("Found {} metrics rows for context {context}, input state {input_state}", rows.len());
    Ok(aggregate_oxoq(&rows))
}
