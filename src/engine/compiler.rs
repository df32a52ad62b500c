use crate::engine::rendering::Statement;
use crate::engine::strategy::QueryStrategy;
use log::debug;

/// Added whenever a score is selected, so that rows without a score don't show up.
///
/// Note that the table is always `submissions`, no matter what the main table is.
pub const SCORE_NULL_GUARD: &str = "submissions.score IS NOT NULL";
/// Compiled queries are only used to preview results, so they never return many rows.
pub const ROW_CAP: usize = 10;

/// Turns a strategy into SQL.
///
/// Implementations must be pure: the same strategy always compiles to the same text.
pub trait QueryCompiler {
    fn compile(&self, strategy: &QueryStrategy) -> String;
}

/// Builds the SQL as plain text.
///
/// Nothing is escaped or parameterized: join conditions and condition values are copied into
/// the query as they are. Only feed it strategies from a source you trust.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrategyCompiler;

/// Compiles a strategy into a `SELECT` capped at [`ROW_CAP`] rows, using [`StrategyCompiler`].
pub fn compile(strategy: &QueryStrategy) -> String {
    StrategyCompiler.compile(strategy)
}

impl QueryCompiler for StrategyCompiler {
    fn compile(&self, strategy: &QueryStrategy) -> String {
        let statement = Statement::new(strategy);
        let mut query = statement.to_string();

        if statement.select_clause().contains("score") && !query.contains("score IS NOT NULL") {
            // Looks at the text, so a WHERE inside a join condition also counts.
            let intro = if query.contains("WHERE") {
                "AND"
            } else {
                "WHERE"
            };

            query.push_str(&format!(" {intro} {SCORE_NULL_GUARD}"));
        }

        query.push_str(&format!(" LIMIT {ROW_CAP}"));

        debug!(
            "compiled strategy for {table}: {query}",
            table = strategy.main_table_or_default()
        );

        query
    }
}

#[cfg(test)]
mod test {
    use super::{compile, QueryCompiler, StrategyCompiler};
    use crate::engine::strategy::{JoinRequirement, QueryStrategy, WhereCondition};

    fn condition(field: &str, operator: &str, value: &str) -> WhereCondition {
        WhereCondition {
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        }
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            "SELECT * FROM students LIMIT 10",
            compile(&QueryStrategy::default())
        );
    }

    #[test]
    fn test_select_all_ends_with_table_and_limit() {
        let strategy = QueryStrategy {
            main_table: Some("orders".to_string()),
            ..Default::default()
        };

        let query = compile(&strategy);

        assert!(query.ends_with("FROM orders LIMIT 10"), "{query}");
        assert!(!query.contains("WHERE"));
        assert!(!query.contains("JOIN"));
    }

    #[test]
    fn test_score_guard_without_filters() {
        let strategy = QueryStrategy {
            select_fields: fields(&["score"]),
            ..Default::default()
        };

        let query = compile(&strategy);

        assert_eq!(1, query.matches("score IS NOT NULL").count());
        assert_eq!(
            "SELECT score FROM students WHERE submissions.score IS NOT NULL LIMIT 10",
            query
        );
    }

    #[test]
    fn test_score_guard_with_filters() {
        let strategy = QueryStrategy {
            select_fields: fields(&["score"]),
            where_conditions: vec![condition("status", "=", "pending")],
            ..Default::default()
        };

        let query = compile(&strategy);

        assert!(query.contains("status = 'pending' AND submissions.score IS NOT NULL"));
        assert_eq!(
            "SELECT score FROM students \
             WHERE students.status = 'pending' AND submissions.score IS NOT NULL LIMIT 10",
            query
        );
    }

    #[test]
    fn test_score_guard_is_not_repeated() {
        let strategy = QueryStrategy {
            select_fields: fields(&["submissions.score"]),
            where_conditions: vec![condition("submissions.score IS NOT NULL OR 1", "=", "1")],
            ..Default::default()
        };

        let query = compile(&strategy);

        assert_eq!(1, query.matches("score IS NOT NULL").count());
    }

    #[test]
    fn test_score_guard_ignores_select_all() {
        let strategy = QueryStrategy {
            main_table: Some("scores".to_string()),
            ..Default::default()
        };

        // the table is named after scores, but only the select clause counts
        assert_eq!("SELECT * FROM scores LIMIT 10", compile(&strategy));
    }

    #[test]
    fn test_score_guard_uses_where_from_join_condition() {
        let strategy = QueryStrategy {
            select_fields: fields(&["avg_score"]),
            required_joins: vec![JoinRequirement {
                table: "submissions".to_string(),
                condition: "submissions.id IN (SELECT id FROM s WHERE ok)".to_string(),
                join_type: None,
            }],
            ..Default::default()
        };

        assert!(compile(&strategy).ends_with("WHERE ok) AND submissions.score IS NOT NULL LIMIT 10"));
    }

    #[test]
    fn test_double_join_is_collapsed() {
        let strategy = QueryStrategy {
            main_table: Some("b".to_string()),
            required_joins: vec![JoinRequirement {
                table: "a".to_string(),
                condition: "a.id=b.id".to_string(),
                join_type: Some("INNER JOIN JOIN".to_string()),
            }],
            ..Default::default()
        };

        let query = compile(&strategy);

        assert_eq!("SELECT * FROM b INNER JOIN a ON a.id=b.id LIMIT 10", query);
        assert!(!query.contains("JOIN JOIN"));
    }

    #[test]
    fn test_fields_qualified_against_main_table_only() {
        let strategy = QueryStrategy {
            main_table: Some("students".to_string()),
            required_joins: vec![JoinRequirement {
                table: "t2".to_string(),
                condition: "t2.student_id = students.id".to_string(),
                join_type: Some("LEFT JOIN".to_string()),
            }],
            where_conditions: vec![condition("age", ">", "10"), condition("t2.age", "<", "20")],
            ..Default::default()
        };

        let query = compile(&strategy);

        assert!(query.contains("WHERE students.age > '10' AND t2.age < '20'"), "{query}");
    }

    #[test]
    fn test_values_are_not_escaped() {
        let strategy = QueryStrategy {
            where_conditions: vec![condition("name", "=", "O'Brien")],
            ..Default::default()
        };

        assert_eq!(
            "SELECT * FROM students WHERE students.name = 'O'Brien' LIMIT 10",
            compile(&strategy)
        );
    }

    #[test]
    fn test_end_to_end() {
        let strategy = QueryStrategy {
            main_table: Some("students".to_string()),
            select_fields: fields(&["name", "score"]),
            required_joins: vec![],
            where_conditions: vec![condition("active", "=", "true")],
        };

        assert_eq!(
            "SELECT name, score FROM students \
             WHERE students.active = 'true' AND submissions.score IS NOT NULL LIMIT 10",
            compile(&strategy)
        );
    }

    #[test]
    fn test_compiling_is_repeatable() {
        let strategy = QueryStrategy {
            main_table: Some("students".to_string()),
            select_fields: fields(&["name", "score"]),
            required_joins: vec![JoinRequirement {
                table: "submissions".to_string(),
                condition: "submissions.student_id = students.id".to_string(),
                join_type: None,
            }],
            where_conditions: vec![condition("grade", "<", "5")],
        };
        let copy = strategy.clone();

        let first = StrategyCompiler.compile(&strategy);
        let second = StrategyCompiler.compile(&strategy);

        assert_eq!(first, second);
        assert_eq!(copy, strategy);
    }
}
