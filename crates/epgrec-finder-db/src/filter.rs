//! Predicate expression tree compiled to parameterized SQL.
//!
//! Exclusion rules become `NOT (...)` nodes of a [`Predicate`] tree instead
//! of hand-concatenated SQL fragments. A rule with no conditions yields no
//! node at all, so it can never turn into an always-true exclusion.

use serde::{Deserialize, Serialize};

/// Column of the program/reservation join, qualified by its table alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// `rp.title`
    Title,
    /// `rp.channel`
    Channel,
    /// `rp.starttime`
    StartTime,
    /// `rp.category_id`
    CategoryId,
    /// `rp.genre2`
    Genre2,
    /// `rp.genre3`
    Genre3,
    /// `rr.id`
    ReservationId,
}

impl Column {
    /// Returns the qualified SQL column name.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Title => "rp.title",
            Self::Channel => "rp.channel",
            Self::StartTime => "rp.starttime",
            Self::CategoryId => "rp.category_id",
            Self::Genre2 => "rp.genre2",
            Self::Genre3 => "rp.genre3",
            Self::ReservationId => "rr.id",
        }
    }
}

/// Value bound to a query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// Integer value.
    Int(i64),
    /// Text value.
    Text(String),
}

/// A named bound parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name, unique per distinct value within a query.
    pub name: String,
    /// Bound value.
    pub value: SqlValue,
}

impl Param {
    /// Creates an integer parameter.
    #[must_use]
    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value: SqlValue::Int(value),
        }
    }

    /// Creates a text parameter.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: SqlValue::Text(value.into()),
        }
    }
}

/// Boolean expression over [`Column`]s and bound [`Param`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `column = param`
    Eq(Column, Param),
    /// `column > param`
    Gt(Column, Param),
    /// `column LIKE param`
    Like(Column, Param),
    /// `column IS NULL`
    IsNull(Column),
    /// Conjunction. Empty renders as `1 = 1`.
    And(Vec<Self>),
    /// Disjunction. Empty renders as `1 = 0`.
    Or(Vec<Self>),
    /// Negation.
    Not(Box<Self>),
}

/// How bound parameters are written into the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?`, one parameter entry per occurrence (MySQL/`SQLite` execution).
    Positional,
    /// `:name`, one parameter entry per distinct name (diagnostics).
    Named,
}

/// SQL text with its parameters in binding order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSql {
    /// SQL text.
    pub sql: String,
    /// Parameters, ordered as the placeholders appear.
    pub params: Vec<Param>,
}

impl CompiledSql {
    /// Creates an empty compiled fragment.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Appends raw SQL text.
    pub fn push_sql(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    fn push_param(&mut self, style: Placeholder, param: &Param) {
        match style {
            Placeholder::Positional => {
                self.sql.push('?');
                self.params.push(param.clone());
            }
            Placeholder::Named => {
                self.sql.push(':');
                self.sql.push_str(&param.name);
                if !self.params.iter().any(|p| p.name == param.name) {
                    self.params.push(param.clone());
                }
            }
        }
    }
}

impl Default for CompiledSql {
    fn default() -> Self {
        Self::new()
    }
}

impl Predicate {
    /// Combines predicates with AND.
    ///
    /// Returns `None` for an empty list and the predicate itself for a
    /// single-element list.
    #[must_use]
    pub fn all(mut predicates: Vec<Self>) -> Option<Self> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Self::And(predicates)),
        }
    }

    /// Compiles the predicate into SQL text and parameters.
    #[must_use]
    pub fn compile(&self, style: Placeholder) -> CompiledSql {
        let mut out = CompiledSql::new();
        self.write_sql(style, &mut out);
        out
    }

    /// Appends this predicate to an existing compiled fragment.
    pub fn write_sql(&self, style: Placeholder, out: &mut CompiledSql) {
        match self {
            Self::Eq(column, param) => {
                out.push_sql(column.as_sql());
                out.push_sql(" = ");
                out.push_param(style, param);
            }
            Self::Gt(column, param) => {
                out.push_sql(column.as_sql());
                out.push_sql(" > ");
                out.push_param(style, param);
            }
            Self::Like(column, param) => {
                out.push_sql(column.as_sql());
                out.push_sql(" LIKE ");
                out.push_param(style, param);
            }
            Self::IsNull(column) => {
                out.push_sql(column.as_sql());
                out.push_sql(" IS NULL");
            }
            Self::And(children) => write_joined(children, " AND ", "1 = 1", style, out),
            Self::Or(children) => write_joined(children, " OR ", "1 = 0", style, out),
            Self::Not(inner) => {
                out.push_sql("NOT (");
                inner.write_sql(style, out);
                out.push_sql(")");
            }
        }
    }

    const fn is_compound(&self) -> bool {
        matches!(self, Self::And(_) | Self::Or(_))
    }
}

fn write_joined(
    children: &[Predicate],
    separator: &str,
    empty: &str,
    style: Placeholder,
    out: &mut CompiledSql,
) {
    if children.is_empty() {
        out.push_sql(empty);
        return;
    }
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push_sql(separator);
        }
        let wrap = child.is_compound();
        if wrap {
            out.push_sql("(");
        }
        child.write_sql(style, out);
        if wrap {
            out.push_sql(")");
        }
    }
}

/// Builds the `LIKE` pattern for a rule keyword.
///
/// The keyword is wrapped in `%...%` so plain text matches as a substring.
/// `%` and `_` inside the keyword stay wildcards, so patterns written as
/// `%ニュース%` keep working (`%%x%%` matches the same titles as `%x%`).
#[must_use]
pub fn like_pattern(keyword: &str) -> String {
    format!("%{keyword}%")
}

/// A user-configured exclusion rule.
///
/// A program matches the rule when it satisfies every present condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    /// Title keyword. `%` and `_` act as `LIKE` wildcards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Channel number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u32>,
}

impl ExclusionRule {
    /// Returns the keyword, treating an empty string as absent.
    #[must_use]
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|k| !k.is_empty())
    }

    /// Returns `true` if the rule has no condition.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keyword().is_none() && self.channel.is_none()
    }

    /// Builds the `NOT (...)` predicate for this rule.
    ///
    /// Parameters are named `title{index}` / `channel{index}` so rules
    /// never collide. Returns `None` when the rule has no condition.
    #[must_use]
    pub fn to_predicate(&self, index: usize) -> Option<Predicate> {
        let mut conditions = Vec::with_capacity(2);
        if let Some(keyword) = self.keyword() {
            conditions.push(Predicate::Like(
                Column::Title,
                Param::text(format!("title{index}"), like_pattern(keyword)),
            ));
        }
        if let Some(channel) = self.channel {
            conditions.push(Predicate::Eq(
                Column::Channel,
                Param::int(format!("channel{index}"), i64::from(channel)),
            ));
        }
        let matched = Predicate::all(conditions)?;
        Some(Predicate::Not(Box::new(matched)))
    }
}
