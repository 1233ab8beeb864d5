//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "jot")]
#[command(about = "Manage notes on a remote note service from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL (falls back to the JOT_API_URL environment variable)
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Optional path to the session file
    #[arg(long, value_name = "PATH", global = true)]
    pub session_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and persist the session
    Login {
        username: String,
        /// Password (prompted when omitted)
        password: Option<String>,
    },
    /// Clear the persisted session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List notes
    List {
        /// Show archived notes instead of active ones
        #[arg(long)]
        archived: bool,
        /// Restrict the list to a category (ignores the archive state)
        #[arg(long, value_name = "NAME")]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new note
    #[command(alias = "new")]
    Add {
        title: String,
        /// Note content
        content: Vec<String>,
        /// Tag the note with a category (repeatable, by name or id)
        #[arg(long = "category", value_name = "NAME")]
        categories: Vec<String>,
    },
    /// Edit an existing note
    Edit {
        id: i64,
        title: String,
        /// New content
        content: Vec<String>,
    },
    /// Delete a note
    Delete { id: i64 },
    /// Archive a note
    Archive { id: i64 },
    /// Unarchive a note
    Unarchive { id: i64 },
    /// Attach a category to a note
    Tag {
        note_id: i64,
        /// Category name or id
        category: String,
    },
    /// Detach a category from a note
    Untag {
        note_id: i64,
        /// Category name or id
        category: String,
    },
    /// Manage categories
    #[command(subcommand)]
    Categories(CategoryCommands),
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List known categories
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a category
    Add { name: String },
    /// Delete a category by name or id
    Rm { category: String },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
