use crate::args::{InputKind, InputParams};
use agent_query::agent::{AgentConfig, AgentRecord};
use agent_query::{compile as compile_strategy, AnalysisResult, Error, QueryStrategy};
use std::fs;
use std::io::Read;

pub mod query_server;
pub mod schema;
pub mod test_query;

pub fn compile(input: &InputParams) -> Result<(), Error> {
    let strategy = read_strategy(input)?;

    println!("{}", compile_strategy(&strategy));

    Ok(())
}

pub fn agent_record(input: &str) -> Result<(), Error> {
    let agent: AgentConfig = serde_json::from_str(&read_input(input)?)?;

    println!("{}", serde_json::to_string_pretty(&agent.to_record()?)?);

    Ok(())
}

fn read_strategy(input: &InputParams) -> Result<QueryStrategy, Error> {
    let json = read_input(&input.input)?;

    let strategy = match input.kind {
        InputKind::Strategy => serde_json::from_str(&json)?,
        InputKind::Analysis => serde_json::from_str::<AnalysisResult>(&json)?.into(),
        InputKind::Agent => {
            let record: AgentRecord = serde_json::from_str(&json)?;

            AgentConfig::from_record(&record)?.query_config
        }
    };

    Ok(strategy)
}

/// Reads a whole file, or all of stdin for `-`.
fn read_input(input: &str) -> Result<String, Error> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;

        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}
