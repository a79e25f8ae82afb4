//! Unreserved-program query for the epgrec schema.

use chrono::NaiveDateTime;

use crate::filter::{Column, CompiledSql, ExclusionRule, Param, Placeholder, Predicate};

/// epgrec category ID for anime.
///
/// Matched against `category_id` and the secondary genre columns
/// `genre2` / `genre3` of the program table.
pub const ANIME_CATEGORY_ID: i64 = 8;

/// Table prefix chosen by the default epgrec installer.
pub const DEFAULT_TABLE_PREFIX: &str = "Recorder_";

/// Datetime format used for the `starttime` lower bound.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Names of the two epgrec tables the query reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    /// Program table (`{prefix}programTbl`).
    pub program: String,
    /// Reservation table (`{prefix}reserveTbl`).
    pub reserve: String,
}

impl TableNames {
    /// Builds table names from an epgrec table prefix.
    ///
    /// Returns `None` if the prefix contains anything other than ASCII
    /// letters, digits, and `_`, since it is spliced into the SQL text.
    #[must_use]
    pub fn with_prefix(prefix: &str) -> Option<Self> {
        if !is_valid_table_prefix(prefix) {
            return None;
        }
        Some(Self {
            program: format!("{prefix}programTbl"),
            reserve: format!("{prefix}reserveTbl"),
        })
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            program: format!("{DEFAULT_TABLE_PREFIX}programTbl"),
            reserve: format!("{DEFAULT_TABLE_PREFIX}reserveTbl"),
        }
    }
}

/// Returns `true` if `prefix` is safe to use as a table name prefix.
#[must_use]
pub fn is_valid_table_prefix(prefix: &str) -> bool {
    prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Query for unreserved programs of [`ANIME_CATEGORY_ID`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramQuery {
    tables: TableNames,
    predicate: Predicate,
    exclusions: usize,
}

impl ProgramQuery {
    /// Returns the WHERE-clause predicate.
    #[must_use]
    pub const fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Number of exclusion rules that contributed a predicate.
    #[must_use]
    pub const fn exclusion_count(&self) -> usize {
        self.exclusions
    }

    /// Compiles the full `SELECT` statement.
    ///
    /// Selected columns are `title`, `channel` (as text; epgrec stores the
    /// physical channel in a character column) and `starttime`.
    #[must_use]
    pub fn compile(&self, style: Placeholder) -> CompiledSql {
        let mut out = CompiledSql::new();
        out.push_sql(&format!(
            "SELECT rp.title, CAST(rp.channel AS CHAR) AS channel, rp.starttime \
             FROM {} AS rp \
             LEFT OUTER JOIN {} AS rr ON rr.program_id = rp.id \
             WHERE ",
            self.tables.program, self.tables.reserve,
        ));
        self.predicate.write_sql(style, &mut out);
        out.push_sql(" ORDER BY rp.starttime");
        out
    }
}

/// Builds the unreserved-program query.
///
/// The base predicate selects programs in [`ANIME_CATEGORY_ID`] (by
/// category or either secondary genre) starting strictly after `since`
/// with no reservation row. Each non-empty rule appends one
/// `NOT (...)` conjunct; empty rules leave the query untouched.
#[must_use]
pub fn build_program_query(
    rules: &[ExclusionRule],
    since: NaiveDateTime,
    tables: TableNames,
) -> ProgramQuery {
    let category = Param::int("category_id", ANIME_CATEGORY_ID);
    let mut conjuncts = vec![
        Predicate::Or(vec![
            Predicate::Eq(Column::CategoryId, category.clone()),
            Predicate::Eq(Column::Genre2, category.clone()),
            Predicate::Eq(Column::Genre3, category),
        ]),
        Predicate::Gt(
            Column::StartTime,
            Param::text("starttime", since.format(DATETIME_FORMAT).to_string()),
        ),
        Predicate::IsNull(Column::ReservationId),
    ];
    let base_len = conjuncts.len();

    conjuncts.extend(
        rules
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| rule.to_predicate(index)),
    );
    let exclusions = conjuncts.len().saturating_sub(base_len);

    ProgramQuery {
        tables,
        predicate: Predicate::And(conjuncts),
        exclusions,
    }
}
