use super::test_query::ask_for_password;
use agent_query::analyze::{connect, Schema, TableSchema};
use agent_query::cache;
use agent_query::context::{Context, SavedSchema};
use agent_query::Error;
use colored::Colorize;
use tokio::runtime::Builder;

pub fn run(refresh: bool) -> Result<(), Error> {
    let context = Context::current()?;
    let root = cache::cache_root()?;

    let saved = if refresh {
        None
    } else {
        SavedSchema::load(&root, &context.name)?
    };

    let schema = match saved {
        Some(saved) => {
            println!(
                "Saved schema of {}, run with {} to read it again.\n",
                context.name.to_string().bold().green(),
                "--refresh".bold()
            );

            saved.schema
        }
        None => {
            let password = ask_for_password(&context)?;

            let tokio = Builder::new_current_thread()
                .enable_io()
                .enable_time()
                .build()?;

            let schema = tokio.block_on(async {
                let runner = connect(&context.server_params, &password).await?;

                runner.describe_schema().await
            })?;

            cache::write_to(
                &root,
                &SavedSchema {
                    context: context.name.clone(),
                    schema: schema.clone(),
                },
            )?;

            schema
        }
    };

    print!("{}", render_schema(&schema));
    println!(
        "{} tables, {} columns",
        schema.tables.len().to_string().bold(),
        schema.column_count().to_string().bold()
    );

    Ok(())
}

fn render_schema(schema: &Schema) -> String {
    let mut text = String::new();

    for (table, TableSchema { columns }) in &schema.tables {
        text.push_str(&format!("{}\n", table.bold()));

        for column in columns {
            text.push_str(&format!("  {column}\n"));
        }
    }

    text
}

#[cfg(test)]
mod test {
    use super::render_schema;
    use agent_query::analyze::Schema;

    #[test]
    fn test_render_schema_lists_tables_then_columns() {
        colored::control::set_override(false);

        let schema = Schema::from_columns(
            [("students", "id"), ("courses", "title"), ("students", "name")]
                .map(|(table, column)| (table.to_string(), column.to_string())),
        );

        assert_eq!(
            "courses\n  title\nstudents\n  id\n  name\n",
            render_schema(&schema)
        );
    }
}
