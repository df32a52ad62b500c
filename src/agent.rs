//! Agents bundle a query strategy with what to do with its results: which message to send, on
//! which channel, and how often.
//!
//! The persistence service stores every sub-configuration as a JSON *string*, so an agent has two
//! shapes: [AgentConfig] to work with, and [AgentRecord] to send and receive.
use crate::engine::compiler::compile;
use crate::engine::strategy::QueryStrategy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent_name: String,
    #[serde(default = "default_agent_type")]
    pub agent_type: String,
    #[serde(default)]
    pub database_connection_id: Option<ConnectionId>,
    #[serde(default)]
    pub query_config: QueryStrategy,
    #[serde(default)]
    pub template_config: TemplateConfig,
    #[serde(default)]
    pub schedule_config: ScheduleConfig,
    #[serde(default)]
    pub channel_config: ChannelConfig,
}

/// Connections are numbered by the backend, but we also accept names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConnectionId {
    Number(u64),
    Name(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScheduleConfig {
    Interval {
        #[serde(default = "default_minutes")]
        minutes: u32,
    },
    Cron {
        #[serde(default = "default_cron")]
        cron: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
    #[serde(default = "default_channel")]
    pub primary: String,
}

/// What the persistence service stores for an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub agent_type: String,
    #[serde(default)]
    pub database_config: String,
    #[serde(default)]
    pub query_config: String,
    #[serde(default)]
    pub template_config: String,
    #[serde(default)]
    pub schedule_config: String,
    #[serde(default)]
    pub channel_config: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DatabaseConfig {
    #[serde(default)]
    connection_id: Option<ConnectionId>,
}

impl AgentConfig {
    pub fn to_record(&self) -> Result<AgentRecord, crate::Error> {
        let database_config = DatabaseConfig {
            connection_id: self.database_connection_id.clone(),
        };

        Ok(AgentRecord {
            agent_name: self.agent_name.clone(),
            agent_type: self.agent_type.clone(),
            database_config: serde_json::to_string(&database_config)?,
            query_config: serde_json::to_string(&self.query_config)?,
            template_config: serde_json::to_string(&self.template_config)?,
            schedule_config: serde_json::to_string(&self.schedule_config)?,
            channel_config: serde_json::to_string(&self.channel_config)?,
        })
    }

    /// Empty fields fall back to defaults, but anything that is not valid JSON is an error.
    pub fn from_record(record: &AgentRecord) -> Result<AgentConfig, crate::Error> {
        let database_config: DatabaseConfig = parse_or_default(&record.database_config)?;
        let agent_type = if record.agent_type.is_empty() {
            default_agent_type()
        } else {
            record.agent_type.clone()
        };

        Ok(AgentConfig {
            agent_name: record.agent_name.clone(),
            agent_type,
            database_connection_id: database_config.connection_id,
            query_config: parse_or_default(&record.query_config)?,
            template_config: parse_or_default(&record.template_config)?,
            schedule_config: parse_or_default(&record.schedule_config)?,
            channel_config: parse_or_default(&record.channel_config)?,
        })
    }

    pub fn compiled_query(&self) -> String {
        compile(&self.query_config)
    }
}

impl ScheduleConfig {
    pub fn describe(&self) -> String {
        match self {
            ScheduleConfig::Interval { minutes } => format!("Every {minutes} minutes"),
            ScheduleConfig::Cron { .. } => "cron".to_string(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig::Interval {
            minutes: default_minutes(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            channels: default_channels(),
            primary: default_channel(),
        }
    }
}

impl Display for ConnectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionId::Number(id) => write!(f, "{id}"),
            ConnectionId::Name(name) => write!(f, "{name}"),
        }
    }
}

fn parse_or_default<T>(json: &str) -> Result<T, crate::Error>
where
    T: DeserializeOwned + Default,
{
    if json.trim().is_empty() {
        return Ok(T::default());
    }

    Ok(serde_json::from_str(json)?)
}

fn default_agent_type() -> String {
    "dynamic".to_string()
}

fn default_minutes() -> u32 {
    60
}

fn default_cron() -> String {
    "0 9 * * *".to_string()
}

fn default_channels() -> Vec<String> {
    vec![default_channel()]
}

fn default_channel() -> String {
    "email".to_string()
}
