use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use linkstash::{Database, LinkId, LinkService, StoreError, TagExpression, UserId};

/// linkstash - tag-based bookmark search from the command line
#[derive(Parser)]
#[command(name = "linkstash")]
#[command(about = "Save, tag, and search links with a tag expression language")]
#[command(version)]
struct Cli {
    /// User to operate as (defaults to the LINKSTASH_USER environment variable)
    #[arg(long, global = true, value_name = "USER")]
    user: Option<String>,

    /// Path to the database file (defaults to the platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Save a new link with optional tags
    Add(AddCommand),
    /// Search links with a tag expression (e.g. "rust +async -old")
    Search(SearchCommand),
    /// Suggest tags: co-occurring with a query, or most used overall
    Tags(TagsCommand),
    /// Record a click on a link and print its URL
    Open(OpenCommand),
    /// Show the most clicked links
    Top(TopCommand),
    /// Rename a tag everywhere it is used
    RenameTag(RenameTagCommand),
    /// Delete a tag that no link uses anymore
    DeleteTag(DeleteTagCommand),
    /// Delete a link
    Delete(DeleteCommand),
}

/// Save a new link
#[derive(Parser)]
struct AddCommand {
    /// The URL to save
    #[arg(value_name = "URL")]
    url: String,

    /// A short description of the link
    #[arg(short, long, value_name = "TEXT", default_value = "")]
    description: String,

    /// Comma-separated tags to apply to the link
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,
}

/// Search links
#[derive(Parser)]
struct SearchCommand {
    /// Tag expression; plain tags broaden, +tag requires, -tag excludes
    #[arg(value_name = "QUERY", default_value = "")]
    query: String,

    /// Maximum number of results (requests below 50 are raised to 50)
    #[arg(short, long, value_name = "N")]
    limit: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

/// Suggest tags
#[derive(Parser)]
struct TagsCommand {
    /// Tag expression to suggest refinements for; empty lists most-used tags
    #[arg(value_name = "QUERY", default_value = "")]
    query: String,

    /// Maximum number of suggestions (capped at 25)
    #[arg(short, long, value_name = "N")]
    limit: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

/// Record a click
#[derive(Parser)]
struct OpenCommand {
    /// The link id
    #[arg(value_name = "ID")]
    id: i64,
}

/// Show most clicked links
#[derive(Parser)]
struct TopCommand {
    /// Maximum number of links to show
    #[arg(short, long, value_name = "N")]
    limit: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

/// Rename a tag
#[derive(Parser)]
struct RenameTagCommand {
    /// The current tag name
    #[arg(value_name = "OLD")]
    old: String,

    /// The new tag name
    #[arg(value_name = "NEW")]
    new: String,
}

/// Delete an unused tag
#[derive(Parser)]
struct DeleteTagCommand {
    /// The tag name
    #[arg(value_name = "NAME")]
    name: String,
}

/// Delete a link
#[derive(Parser)]
struct DeleteCommand {
    /// The link id
    #[arg(value_name = "ID")]
    id: i64,
}

fn main() {
    // Pick up LINKSTASH_USER from a local .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e}");
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let user = resolve_user(cli.user.as_deref())?;

    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => get_database_path()?,
    };
    ensure_database_directory(&db_path)?;
    let db = Database::open(&db_path).context("Failed to open database")?;
    let service = LinkService::new(db);

    match &cli.command {
        Commands::Add(cmd) => run_add(&service, &user, cmd),
        Commands::Search(cmd) => run_search(&service, &user, cmd),
        Commands::Tags(cmd) => run_tags(&service, &user, cmd),
        Commands::Open(cmd) => run_open(&service, &user, cmd),
        Commands::Top(cmd) => run_top(&service, &user, cmd),
        Commands::RenameTag(cmd) => run_rename_tag(&service, &user, cmd),
        Commands::DeleteTag(cmd) => run_delete_tag(&service, &user, cmd),
        Commands::Delete(cmd) => run_delete(&service, &user, cmd),
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors include validation failures and the typed store errors a
/// caller can act on; internal errors include database and I/O failures.
fn is_user_error(error: &anyhow::Error) -> bool {
    if error.downcast_ref::<StoreError>().is_some() {
        return true;
    }
    error.to_string().contains("cannot be empty")
}

/// Resolves the acting user from the flag or the environment.
fn resolve_user(flag: Option<&str>) -> Result<UserId> {
    if let Some(user) = flag {
        return Ok(UserId::new(user));
    }
    match std::env::var("LINKSTASH_USER") {
        Ok(user) if !user.trim().is_empty() => Ok(UserId::new(user)),
        _ => anyhow::bail!("No user given: pass --user or set LINKSTASH_USER"),
    }
}

/// Handles the add command by saving a new link.
fn run_add(service: &LinkService, user: &UserId, cmd: &AddCommand) -> Result<()> {
    if cmd.url.trim().is_empty() {
        anyhow::bail!("URL cannot be empty");
    }

    let tags = cmd.tags.as_deref().map(parse_tags).unwrap_or_default();
    let tag_refs: Vec<&str> = tags.iter().map(String::as_str).collect();

    let link = service
        .create_link(user, cmd.url.trim(), &cmd.description, &tag_refs)
        .context("Failed to save link")?;

    print!("Link saved (id: {})", link.id);
    if !link.tags.is_empty() {
        let names: Vec<&str> = link.tags.iter().map(|t| t.name()).collect();
        print!(" with tags: {}", names.join(", "));
    }
    println!();

    Ok(())
}

/// Handles the search command.
fn run_search(service: &LinkService, user: &UserId, cmd: &SearchCommand) -> Result<()> {
    let results = service.search(user, &cmd.query, cmd.limit)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.links.is_empty() {
        println!("No links found");
    }
    for link in &results.links {
        let names: Vec<&str> = link.tags.iter().map(|t| t.name()).collect();
        println!("{:>5}  {}  [{}]", link.id, link.url, names.join(", "));
        if !link.description.is_empty() {
            println!("       {}", link.description);
        }
    }
    if !results.common_tags.is_empty() {
        println!();
        println!("Related tags: {}", results.common_tags.join(", "));
    }

    Ok(())
}

/// Handles the tags command.
fn run_tags(service: &LinkService, user: &UserId, cmd: &TagsCommand) -> Result<()> {
    let expr = TagExpression::parse(&cmd.query);
    let suggestions = service.suggest_tags(user, &expr, cmd.limit)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    for suggestion in &suggestions {
        println!("{}  ({} links)", suggestion.name, suggestion.uses);
    }

    Ok(())
}

/// Handles the open command: bump the counter, print the URL.
fn run_open(service: &LinkService, user: &UserId, cmd: &OpenCommand) -> Result<()> {
    let id = LinkId::new(cmd.id);
    let clicks = service.record_click(user, id)?;

    // record_click verified ownership, so the link is present
    if let Some(link) = service.get_link(user, id)? {
        println!("{}", link.url);
    }
    eprintln!("({clicks} clicks)");

    Ok(())
}

/// Handles the top command.
fn run_top(service: &LinkService, user: &UserId, cmd: &TopCommand) -> Result<()> {
    let clicked = service.most_clicked_links(user, cmd.limit)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&clicked)?);
        return Ok(());
    }

    if clicked.is_empty() {
        println!("No clicks recorded yet");
    }
    for entry in &clicked {
        println!("{:>5}  {}  ({} clicks)", entry.link.id, entry.link.url, entry.clicks);
    }

    Ok(())
}

/// Handles the rename-tag command.
fn run_rename_tag(service: &LinkService, user: &UserId, cmd: &RenameTagCommand) -> Result<()> {
    let tag = service.rename_tag(user, &cmd.old, &cmd.new)?;
    println!("Tag renamed to '{}'", tag.name());
    Ok(())
}

/// Handles the delete-tag command.
fn run_delete_tag(service: &LinkService, user: &UserId, cmd: &DeleteTagCommand) -> Result<()> {
    service.delete_tag(user, &cmd.name)?;
    println!("Tag '{}' deleted", cmd.name.trim().to_lowercase());
    Ok(())
}

/// Handles the delete command.
fn run_delete(service: &LinkService, user: &UserId, cmd: &DeleteCommand) -> Result<()> {
    service.delete_link(user, LinkId::new(cmd.id))?;
    println!("Link {} deleted", cmd.id);
    Ok(())
}

/// Gets the cross-platform database path.
///
/// Returns the path as `{data_dir}/linkstash/links.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
fn get_database_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("linkstash").join("links.db"))
}

/// Ensures the parent directory of the database file exists.
fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}

/// Parses comma-separated tags from a string.
///
/// Splits on commas, trims whitespace from each tag, and filters out empty strings.
fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tags_with_normal_input() {
        let result = parse_tags("rust,learning");
        assert_eq!(result, vec!["rust", "learning"]);
    }

    #[test]
    fn parse_tags_with_whitespace() {
        let result = parse_tags(" rust , learning ");
        assert_eq!(result, vec!["rust", "learning"]);
    }

    #[test]
    fn parse_tags_with_empty_elements() {
        let result = parse_tags("rust,,learning,");
        assert_eq!(result, vec!["rust", "learning"]);
    }

    #[test]
    fn parse_tags_empty_string() {
        assert!(parse_tags("").is_empty());
        assert!(parse_tags("  ,  ,  ").is_empty());
    }

    #[test]
    fn user_resolution_prefers_the_flag() {
        let user = resolve_user(Some("alice")).unwrap();
        assert_eq!(user.as_str(), "alice");
    }

    #[test]
    #[serial_test::serial]
    fn user_resolution_falls_back_to_the_environment() {
        unsafe { std::env::set_var("LINKSTASH_USER", "bob") };
        let user = resolve_user(None).unwrap();
        assert_eq!(user.as_str(), "bob");

        unsafe { std::env::remove_var("LINKSTASH_USER") };
        assert!(resolve_user(None).is_err());
    }

    #[test]
    fn store_errors_are_user_errors() {
        let err: anyhow::Error = StoreError::TagNotFound("work".to_string()).into();
        assert!(is_user_error(&err));

        let err = anyhow::anyhow!("disk on fire");
        assert!(!is_user_error(&err));
    }
}
