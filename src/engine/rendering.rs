use crate::engine::strategy::{JoinRequirement, QueryStrategy, WhereCondition};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// Everything up to, and including, the WHERE clause.
///
/// The null guard and the row cap are applied by the compiler on the rendered text, because they
/// look at what was rendered, not at the strategy.
pub struct Statement<'a> {
    select: String,
    from: &'a str,
    joins: Vec<JoinClause<'a>>,
    filters: Vec<QualifiedCondition<'a>>,
}

struct JoinClause<'a>(&'a JoinRequirement);

/// A WHERE condition with its field prefixed by the main table, unless it already has a prefix.
struct QualifiedCondition<'a> {
    main_table: &'a str,
    condition: &'a WhereCondition,
}

struct OptionalClause<'a, T> {
    intro: &'a str,
    ligature: &'a str,
    items: &'a [T],
}

impl<'a> Statement<'a> {
    pub fn new(strategy: &'a QueryStrategy) -> Self {
        let main_table = strategy.main_table_or_default();

        Statement {
            select: select_clause(&strategy.select_fields),
            from: main_table,
            joins: strategy.required_joins.iter().map(JoinClause).collect(),
            filters: strategy
                .where_conditions
                .iter()
                .map(|condition| QualifiedCondition {
                    main_table,
                    condition,
                })
                .collect(),
        }
    }

    pub fn select_clause(&self) -> &str {
        &self.select
    }
}

fn select_clause(fields: &[String]) -> String {
    let select = fields.join(", ");

    if select.is_empty() {
        "*".to_string()
    } else {
        select
    }
}

/// Collapses `JOIN JOIN` into `JOIN`, regardless of case. Join types sometimes come in as
/// `INNER JOIN JOIN` from the analysis step.
pub fn normalize_join_type(join_type: &str) -> Cow<str> {
    static DOUBLE_JOIN_REGEX: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)JOIN\s+JOIN").unwrap());

    DOUBLE_JOIN_REGEX.replace_all(join_type, "JOIN")
}

impl<'a, T> OptionalClause<'a, T> {
    fn filter(items: &'a [T]) -> Self {
        OptionalClause {
            intro: "WHERE",
            ligature: " AND",
            items,
        }
    }
}

impl Display for Statement<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SELECT {} FROM {}", self.select, self.from)?;

        for join in &self.joins {
            write!(f, "{join}")?;
        }

        write!(f, "{}", OptionalClause::filter(self.filters.as_slice()))
    }
}

impl Display for JoinClause<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let JoinRequirement {
            table, condition, ..
        } = self.0;
        let join_type = normalize_join_type(self.0.join_type_or_default());

        write!(f, " {join_type} {table} ON {condition}")
    }
}

impl Display for QualifiedCondition<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let WhereCondition {
            field,
            operator,
            value,
        } = self.condition;

        if !field.contains('.') {
            write!(f, "{}.", self.main_table)?;
        }

        write!(f, "{field} {operator} '{value}'")
    }
}

/// Displays things like " WHERE x AND y AND z", or nothing at all when there are no items.
impl<'a, T> Display for OptionalClause<'a, T>
where
    T: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Self {
            intro,
            ligature,
            items,
        } = self;

        if let Some((first, rest)) = items.split_first() {
            write!(f, " {intro} {first}")?;

            for condition in rest {
                write!(f, "{ligature} {condition}")?;
            }
        }

        Ok(())
    }
}
