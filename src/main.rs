use clap::Parser;
use clipwatch::cli::{
    handle_add, handle_init, handle_list, handle_remove, handle_set_prefix, handle_set_threshold,
    handle_triggers_init, handle_triggers_show, Cli, Commands, TriggersAction,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => handle_init(&cli.store),
        Commands::Add {
            text,
            negative,
            ensemble,
            json,
        } => handle_add(&cli.store, text, negative, ensemble, json),
        Commands::Remove { text } => handle_remove(&cli.store, text),
        Commands::List { json } => handle_list(&cli.store, json),
        Commands::SetThreshold { value } => handle_set_threshold(&cli.store, value),
        Commands::SetPrefix { prefix } => handle_set_prefix(&cli.store, prefix),
        Commands::Triggers(triggers_cmd) => match triggers_cmd.action {
            TriggersAction::Init { path } => handle_triggers_init(&path),
            TriggersAction::Show { path, json } => handle_triggers_show(&path, json),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
