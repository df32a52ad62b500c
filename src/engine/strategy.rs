//! The query strategy is produced by an AI analysis step, so we get it as loosely shaped JSON.
//!
//! All the defaulting happens while deserializing: missing lists become empty, nulls become empty
//! names, numbers become text. Past this module the compiler only ever deals with plain strings
//! and never has to second-guess its input.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Used when the strategy does not name a main table.
pub const DEFAULT_MAIN_TABLE: &str = "students";
pub const DEFAULT_JOIN_TYPE: &str = "INNER JOIN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStrategy {
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub main_table: Option<String>,
    /// Either bare (`col`) or qualified (`table.col`) names, or whole expressions.
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub select_fields: Vec<String>,
    #[serde(default, deserialize_with = "lenient::entries")]
    pub required_joins: Vec<JoinRequirement>,
    #[serde(default, deserialize_with = "lenient::entries")]
    pub where_conditions: Vec<WhereCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequirement {
    #[serde(default, deserialize_with = "lenient::text")]
    pub table: String,
    /// Raw ON clause, used as is.
    #[serde(default, deserialize_with = "lenient::text")]
    pub condition: String,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub join_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereCondition {
    #[serde(default, deserialize_with = "lenient::text")]
    pub field: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub operator: String,
    /// Always rendered in single quotes, whatever type it came in as.
    #[serde(default, deserialize_with = "lenient::literal")]
    pub value: String,
}

/// What the analysis service answers with when given a user's intent.
///
/// We only care about the suggested strategy, everything else is passed along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient::entry")]
    pub suggested_query_strategy: QueryStrategy,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl QueryStrategy {
    pub fn main_table_or_default(&self) -> &str {
        self.main_table
            .as_deref()
            .filter(|table| !table.is_empty())
            .unwrap_or(DEFAULT_MAIN_TABLE)
    }
}

impl JoinRequirement {
    pub fn join_type_or_default(&self) -> &str {
        self.join_type
            .as_deref()
            .filter(|join_type| !join_type.is_empty())
            .unwrap_or(DEFAULT_JOIN_TYPE)
    }
}

impl From<AnalysisResult> for QueryStrategy {
    fn from(value: AnalysisResult) -> Self {
        value.suggested_query_strategy
    }
}

/// Deserializers that never fail on well formed JSON, they degrade instead.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::{Number, Value};

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(as_text(Value::deserialize(deserializer)?))
    }

    /// Empty names count as missing names.
    pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = as_text(Value::deserialize(deserializer)?);

        Ok(Some(text).filter(|text| !text.is_empty()))
    }

    /// Like [text], but an explicit null is kept as the literal `null`.
    pub fn literal<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok("null".to_string()),
            other => Ok(as_text(other)),
        }
    }

    pub fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => Ok(items.into_iter().map(as_text).collect()),
            _ => Ok(Vec::new()),
        }
    }

    /// Entries that are not shaped like `T` are replaced by `T::default()`, so the number and
    /// order of entries is always preserved.
    pub fn entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => Ok(items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    pub fn entry<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;

        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    /// Largest integer an `f64` holds exactly, 2^53.
    const EXACT_FLOAT_LIMIT: f64 = 9_007_199_254_740_992.0;

    fn as_text(value: Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(text) => text,
            Value::Number(number) => number_text(&number),
            // booleans, and whatever else, end up as their JSON text
            other => other.to_string(),
        }
    }

    /// Whole floats lose their fraction, so `3.0` and `1e3` read `3` and `1000`.
    fn number_text(number: &Number) -> String {
        match number.as_f64() {
            Some(float)
                if number.is_f64() && float.fract() == 0.0 && float.abs() < EXACT_FLOAT_LIMIT =>
            {
                format!("{}", float as i64)
            }
            _ => number.to_string(),
        }
    }
}
