mod args;
mod commands;

use crate::args::{Command, ContextParams};
use agent_query::context::{Context, ContextName};
use agent_query::{cache, Error};
use args::Args;
use clap::Parser;
use colored::Colorize;
use std::process::exit;

fn main() {
    let args = Args::parse();

    // The server logs through tracing, it sets up its own subscriber.
    if !matches!(args.command, Command::Serve(_)) {
        env_logger::init();
    }

    let result = match args.command {
        Command::CreateContext(context) => create_context(context),
        Command::UseContext { name } => use_context(name.into()),
        Command::ListContexts => list_contexts(),
        Command::Compile(input) => commands::compile(&input),
        Command::TestQuery { input, query } => commands::test_query::run(&input, query),
        Command::AgentRecord { input } => commands::agent_record(&input),
        Command::Schema { refresh } => commands::schema::run(refresh),
        Command::Serve(params) => commands::query_server::run(params),
    };

    if let Err(error) = result {
        eprintln!("{intro}: {error}", intro = "error".bold().red());
        exit(1);
    }
}

fn create_context(params: ContextParams) -> Result<(), Error> {
    let use_it = params.use_it;
    let new_context: Context = params.into();

    cache::write(&new_context)?;

    println!("Create new context {}.", new_context.name.to_string().bold());

    if use_it {
        use_context(new_context.name)?;
    } else {
        println!(
            "Switch to it by running {}.",
            format!("agent-query use-context {}", new_context.name).bold()
        );
    }

    Ok(())
}

fn use_context(context_name: ContextName) -> Result<(), Error> {
    // make sure it exists before switching to it
    Context::named(&context_name)?;

    context_name.make_current()?;

    println!("Switched to context {}.", context_name.to_string().bold());

    Ok(())
}

fn list_contexts() -> Result<(), Error> {
    // Having no current context is fine, we just won't mark anything.
    let current_context = ContextName::current().ok();
    let known_contexts = Context::all()?;

    println!("Available contexts:");
    for context in &known_contexts {
        println!(
            "{}{}: {} ({})",
            if current_context.as_ref() == Some(&context.name) {
                " * ".bold()
            } else {
                "   ".into()
            },
            context.name.to_string().bold(),
            context.server_params.hostname,
            context.server_params.database
        )
    }

    Ok(())
}
