use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "clipwatch")]
#[command(version, about = "Prompt registry and trigger table editor for the clipwatch engine")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the embeddings store file
    #[arg(long, global = true, default_value = "embeddings.json")]
    pub store: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty embeddings store file
    Init,

    /// Add a prompt (embeds the text; requires the embedding runtime)
    Add {
        /// Prompt text, e.g. "a cat"
        text: String,

        /// Mark the prompt as negative: it suppresses other matches and is
        /// never reported itself
        #[arg(long)]
        negative: bool,

        /// Ensemble key; prompts sharing a key blend into one candidate
        #[arg(long)]
        ensemble: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a prompt by text
    Remove {
        /// Prompt text to remove
        text: String,
    },

    /// List prompts with the current threshold and prefix
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the global match threshold (clamped to [0, 1])
    SetThreshold {
        #[arg(allow_negative_numbers = true)]
        value: f32,
    },

    /// Set the prefix prepended to prompt text before embedding.
    /// Affects future prompts only.
    SetPrefix {
        prefix: String,
    },

    /// Manage the trigger table
    Triggers(TriggersCommand),
}

#[derive(Args, Debug)]
pub struct TriggersCommand {
    #[command(subcommand)]
    pub action: TriggersAction,
}

#[derive(Subcommand, Debug)]
pub enum TriggersAction {
    /// Write an example trigger table
    Init {
        /// Where to write the table
        #[arg(long, default_value = "triggers.yaml")]
        path: PathBuf,
    },

    /// Print the trigger table
    Show {
        /// Table to read
        #[arg(long, default_value = "triggers.yaml")]
        path: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
