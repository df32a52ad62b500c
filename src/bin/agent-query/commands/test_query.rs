use super::read_strategy;
use crate::args::InputParams;
use agent_query::analyze::{connect, QueryResults};
use agent_query::context::Context;
use agent_query::{compile, Error};
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;
use serde_json::Value;
use tokio::runtime::Builder;

pub fn run(input: &InputParams, query: Option<String>) -> Result<(), Error> {
    let query = match query {
        Some(query) => query,
        None => compile(&read_strategy(input)?),
    };

    let context = Context::current()?;
    let password = ask_for_password(&context)?;

    // we need tokio here because sqlx is exclusively async
    let tokio = Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()?;

    let results = tokio.block_on(async {
        let runner = connect(&context.server_params, &password).await?;

        runner.run(&query).await
    })?;

    println!("{}\n", query.dimmed());
    print!("{}", render_table(&results));
    println!("{} rows", results.row_count.to_string().bold());

    Ok(())
}

/// Ask the user for a password.
///
/// Passwords are never stored, so we have to ask every time.
pub(super) fn ask_for_password(context: &Context) -> Result<String, Error> {
    println!("Using context {}", context.name.to_string().bold().green());
    println!(
        "Please provide the password for {}",
        context.server_params.to_string().bold().green()
    );

    Ok(Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password: ")
        .interact()?)
}

fn render_table(results: &QueryResults) -> String {
    if results.columns.is_empty() {
        return String::new();
    }

    let cells: Vec<Vec<String>> = results
        .rows
        .iter()
        .map(|row| row.iter().map(render_cell).collect())
        .collect();

    let widths: Vec<usize> = results
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            cells
                .iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .chain([column.chars().count()])
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut table = String::new();

    let header: Vec<String> = results
        .columns
        .iter()
        .zip(&widths)
        .map(|(column, &width)| format!("{column:<width$}").bold().to_string())
        .collect();
    table.push_str(&header.join(" | "));
    table.push('\n');

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        table.push_str(&line.join(" | "));
        table.push('\n');
    }

    table
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
