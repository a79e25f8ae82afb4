//! Program lookup against the epgrec database.
#![allow(clippy::future_not_send)]

use chrono::NaiveDateTime;
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Connection, Row};

use crate::connection::{DatabaseConfig, connect};
use crate::error::FinderError;
use crate::filter::{CompiledSql, SqlValue};

/// A broadcast matching the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRecord {
    /// Program title.
    pub title: String,
    /// Channel number.
    pub channel: u32,
    /// Broadcast start time.
    pub start_time: NaiveDateTime,
}

/// Source of program records.
///
/// Abstracts query execution for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(ProgramSource: Send)]
pub trait LocalProgramSource {
    /// Executes a compiled positional query and maps every row.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails to prepare or execute, or a
    /// row cannot be decoded. Rows whose channel is not a number are
    /// skipped, not reported.
    async fn find_programs(&mut self, query: &CompiledSql) -> Result<Vec<ProgramRecord>, FinderError>;
}

/// [`ProgramSource`] backed by a single MySQL connection.
#[derive(Debug)]
pub struct MySqlProgramSource {
    conn: MySqlConnection,
}

impl MySqlProgramSource {
    /// Connects to the configured database.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver is unsupported or the connection fails.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, FinderError> {
        let conn = connect(config).await?;
        Ok(Self { conn })
    }

    /// Closes the connection gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not acknowledge the close.
    pub async fn close(self) -> Result<(), FinderError> {
        self.conn.close().await.map_err(FinderError::Connection)
    }
}

impl ProgramSource for MySqlProgramSource {
    async fn find_programs(&mut self, query: &CompiledSql) -> Result<Vec<ProgramRecord>, FinderError> {
        let mut statement = sqlx::query(&query.sql);
        for param in &query.params {
            statement = match &param.value {
                SqlValue::Int(v) => statement.bind(*v),
                SqlValue::Text(s) => statement.bind(s.as_str()),
            };
        }

        let rows = statement
            .fetch_all(&mut self.conn)
            .await
            .map_err(FinderError::Query)?;
        tracing::debug!(rows = rows.len(), "Fetched program rows");

        let rows = rows
            .iter()
            .map(map_program_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keep_numeric_channels(rows))
    }
}

/// Program row as stored, before the channel is parsed.
#[derive(Debug)]
struct RawProgramRow {
    title: String,
    channel: String,
    start_time: NaiveDateTime,
}

/// Maps a database row to a `RawProgramRow`.
fn map_program_row(row: &MySqlRow) -> Result<RawProgramRow, FinderError> {
    Ok(RawProgramRow {
        title: row.try_get("title").map_err(FinderError::Query)?,
        channel: row.try_get("channel").map_err(FinderError::Query)?,
        start_time: row.try_get("starttime").map_err(FinderError::Query)?,
    })
}

/// Converts raw rows to records, skipping rows without a numeric channel.
fn keep_numeric_channels(rows: Vec<RawProgramRow>) -> Vec<ProgramRecord> {
    rows.into_iter()
        .filter_map(|row| match parse_channel(&row.channel) {
            Ok(channel) => Some(ProgramRecord {
                title: row.title,
                channel,
                start_time: row.start_time,
            }),
            Err(e) => {
                tracing::warn!(title = %row.title, error = %e, "Skipping program row");
                None
            }
        })
        .collect()
}

/// Parses the textual channel column into a channel number.
///
/// # Errors
///
/// Returns an error if the value is not a non-negative integer
/// (e.g. satellite channel IDs such as `BS15_0`).
pub fn parse_channel(value: &str) -> Result<u32, FinderError> {
    value.trim().parse().map_err(|_| FinderError::Decode {
        column: "channel",
        reason: format!("not a channel number: {value}"),
    })
}
