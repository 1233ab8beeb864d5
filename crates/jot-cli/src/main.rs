//! Jot CLI - command-line client for a remote note-taking service.
//!
//! Parses user intents, drives the note board view-model, and renders the
//! resulting state as text or JSON.

mod cli;
mod error;
mod render;
mod storage;

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::aot::Generator;
use clap_complete::{generate, shells};
use jot_core::util::normalize_text_option;
use jot_core::{ActiveView, Category, CategoryFilter, NoteBoard, NoteService, SessionStore};

use crate::cli::{CategoryCommands, Cli, Commands, CompletionShell};
use crate::error::CliError;
use crate::render::{format_category_lines, format_note_lines, note_items};
use crate::storage::FileSessionStorage;

type Session = SessionStore<FileSessionStorage>;
type Board = NoteBoard<NoteService<FileSessionStorage>>;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        tracing::error!("command failed: {error}");
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("jot=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = cli.command {
        return run_completions(shell, output);
    }

    let api_url = resolve_api_url(cli.api_url, env::var("JOT_API_URL").ok())?;
    let session_path = resolve_session_path(cli.session_file)?;
    let session = SessionStore::new(&api_url, FileSessionStorage::new(session_path))?;
    let service = NoteService::new(&api_url, session.clone())?;
    let mut board = NoteBoard::new(service);

    let result = dispatch(cli.command, &session, &mut board).await;
    if session.take_expired() {
        tracing::warn!("session invalidated by an unauthorized response");
        eprintln!("Session expired. Run `jot login <username>` to sign in again.");
    }
    result
}

async fn dispatch(command: Commands, session: &Session, board: &mut Board) -> Result<(), CliError> {
    match command {
        Commands::Login { username, password } => run_login(session, &username, password).await,
        Commands::Logout => {
            session.logout()?;
            println!("Logged out.");
            Ok(())
        }
        Commands::Whoami => run_whoami(session),
        Commands::List {
            archived,
            category,
            json,
        } => run_list(session, board, archived, category, json).await,
        Commands::Add {
            title,
            content,
            categories,
        } => run_add(session, board, &title, &content, &categories).await,
        Commands::Edit { id, title, content } => {
            ensure_authenticated(session)?;
            let updated = board.update_note(id, &title, &join_content(&content)).await?;
            println!("Updated note {}", updated.id);
            Ok(())
        }
        Commands::Delete { id } => {
            ensure_authenticated(session)?;
            board.delete_note(id).await?;
            println!("Deleted note {id}");
            Ok(())
        }
        Commands::Archive { id } => {
            ensure_authenticated(session)?;
            board.archive_note(id).await?;
            println!("Archived note {id}");
            Ok(())
        }
        Commands::Unarchive { id } => {
            ensure_authenticated(session)?;
            board.unarchive_note(id).await?;
            println!("Unarchived note {id}");
            Ok(())
        }
        Commands::Tag { note_id, category } => run_tag(session, board, note_id, &category).await,
        Commands::Untag { note_id, category } => {
            run_untag(session, board, note_id, &category).await
        }
        Commands::Categories(command) => run_categories(session, board, command).await,
        Commands::Completions { .. } => unreachable!("handled before dispatch"),
    }
}

async fn run_login(
    session: &Session,
    username: &str,
    password: Option<String>,
) -> Result<(), CliError> {
    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };
    let established = session.login(username, &password).await?;
    println!("Logged in as {}", established.username);
    Ok(())
}

fn run_whoami(session: &Session) -> Result<(), CliError> {
    let user = session.current_user()?.ok_or(CliError::NotLoggedIn)?;
    println!("{} ({})", user.username, user.auth_type);
    Ok(())
}

async fn run_list(
    session: &Session,
    board: &mut Board,
    archived: bool,
    category: Option<String>,
    as_json: bool,
) -> Result<(), CliError> {
    ensure_authenticated(session)?;

    let view = if archived {
        ActiveView::Archived
    } else {
        ActiveView::Active
    };
    board.switch_view(view).await?;
    if let Some(name) = normalize_text_option(category) {
        board.apply_filter(CategoryFilter::Name(name)).await?;
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note_items(board.notes()))?);
    } else if board.notes().is_empty() {
        println!("No notes found.");
    } else {
        for line in format_note_lines(board.notes()) {
            println!("{line}");
        }
    }
    Ok(())
}

async fn run_add(
    session: &Session,
    board: &mut Board,
    title: &str,
    content: &[String],
    categories: &[String],
) -> Result<(), CliError> {
    ensure_authenticated(session)?;

    let mut category_ids = Vec::new();
    if !categories.is_empty() {
        board.refresh_categories().await?;
        for value in categories {
            category_ids.push(required_category(board.registry().categories(), value)?.id);
        }
    }

    let note = board
        .create_note(title, &join_content(content), &category_ids)
        .await?;
    println!("Created note {}", note.id);
    Ok(())
}

async fn run_tag(
    session: &Session,
    board: &mut Board,
    note_id: i64,
    category: &str,
) -> Result<(), CliError> {
    ensure_authenticated(session)?;
    board.refresh_categories().await?;
    let category_id = required_category(board.registry().categories(), category)?.id;
    // Load the current view first so the duplicate check runs against a
    // fresh snapshot.
    board.switch_view(ActiveView::Active).await?;
    board.add_category_to_note(note_id, category_id).await?;
    println!("Tagged note {note_id}");
    Ok(())
}

async fn run_untag(
    session: &Session,
    board: &mut Board,
    note_id: i64,
    category: &str,
) -> Result<(), CliError> {
    ensure_authenticated(session)?;
    board.refresh_categories().await?;
    let category_id = required_category(board.registry().categories(), category)?.id;
    board.remove_category_from_note(note_id, category_id).await?;
    println!("Untagged note {note_id}");
    Ok(())
}

async fn run_categories(
    session: &Session,
    board: &mut Board,
    command: CategoryCommands,
) -> Result<(), CliError> {
    ensure_authenticated(session)?;
    match command {
        CategoryCommands::List { json } => {
            board.switch_view(ActiveView::ManageCategories).await?;
            board.refresh_categories().await?;
            let categories = board.registry().categories();
            if json {
                println!("{}", serde_json::to_string_pretty(categories)?);
            } else if categories.is_empty() {
                println!("No categories found.");
            } else {
                for line in format_category_lines(categories) {
                    println!("{line}");
                }
            }
        }
        CategoryCommands::Add { name } => {
            let category = board.create_category(&name).await?;
            println!("Created category {} ({})", category.name, category.id);
        }
        CategoryCommands::Rm { category } => {
            board.refresh_categories().await?;
            let id = required_category(board.registry().categories(), &category)?.id;
            board.delete_category(id).await?;
            println!("Deleted category {category}");
        }
    }
    Ok(())
}

fn run_completions(shell: CompletionShell, output: Option<PathBuf>) -> Result<(), CliError> {
    let mut command = Cli::command();
    let mut buffer = Vec::new();
    match shell {
        CompletionShell::Bash => generate_for_shell(shells::Bash, &mut command, &mut buffer),
        CompletionShell::Zsh => generate_for_shell(shells::Zsh, &mut command, &mut buffer),
        CompletionShell::Fish => generate_for_shell(shells::Fish, &mut command, &mut buffer),
    }

    if let Some(path) = output {
        std::fs::write(&path, &buffer)?;
        println!("{}", path.display());
    } else {
        io::stdout().write_all(&buffer)?;
    }
    Ok(())
}

fn generate_for_shell<G: Generator>(
    generator: G,
    command: &mut clap::Command,
    buffer: &mut Vec<u8>,
) {
    generate(generator, command, "jot", buffer);
}

fn ensure_authenticated(session: &Session) -> Result<(), CliError> {
    if session.is_authenticated() {
        Ok(())
    } else {
        Err(CliError::NotLoggedIn)
    }
}

fn prompt_password() -> Result<String, CliError> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut password = String::new();
    io::stdin().read_line(&mut password)?;
    Ok(password.trim_end_matches(['\r', '\n']).to_string())
}

/// Resolve the API base URL: explicit flag first, then the environment.
pub fn resolve_api_url(
    flag: Option<String>,
    env_value: Option<String>,
) -> Result<String, CliError> {
    normalize_text_option(flag)
        .or_else(|| normalize_text_option(env_value))
        .ok_or(CliError::MissingApiUrl)
}

/// Resolve the session file path, defaulting under the user config dir.
pub fn resolve_session_path(flag: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = flag {
        return Ok(path);
    }
    dirs::config_dir()
        .map(|dir| dir.join("jot").join("session.json"))
        .ok_or(CliError::NoConfigDir)
}

pub fn join_content(parts: &[String]) -> String {
    parts.join(" ")
}

/// Find a category by numeric id or (case-insensitive) name.
pub fn find_category<'a>(categories: &'a [Category], value: &str) -> Option<&'a Category> {
    let value = value.trim();
    if let Ok(id) = value.parse::<i64>() {
        if let Some(category) = categories.iter().find(|category| category.id == id) {
            return Some(category);
        }
    }
    categories
        .iter()
        .find(|category| category.name.eq_ignore_ascii_case(value))
}

fn required_category<'a>(
    categories: &'a [Category],
    value: &str,
) -> Result<&'a Category, CliError> {
    find_category(categories, value).ok_or_else(|| CliError::UnknownCategory(value.to_string()))
}
