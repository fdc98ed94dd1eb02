use blog_core::application::{AuthorService, PostService};
use blog_core::domain::{Author, AuthorChanges, NewAuthor, NewPost, Post, PostChanges};
use blog_core::ports::{BlogError, Result};
use blog_core::utils::{format_optional_timestamp, format_timestamp_to_local, preview};
use blog_core::validation::field_messages;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use sqlite_adapter::SqliteBlogRepository;
use std::path::PathBuf;

/// CLI tool to manage blog authors and posts stored in SQLite
#[derive(Parser, Debug)]
#[command(name = "blog-cli")]
#[command(about = "Creates, updates and lists blog authors and posts, validating every write")]
struct Cli {
    /// Path to the SQLite database file, created when missing
    #[arg(short = 'd', long = "database", env = "BLOG_DATABASE", default_value = "blog.db")]
    database: PathBuf,

    /// Log more (repeat for trace output)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage authors
    #[command(subcommand)]
    Author(AuthorCommand),
    /// Manage posts
    #[command(subcommand)]
    Post(PostCommand),
}

#[derive(Subcommand, Debug)]
enum AuthorCommand {
    /// Add a new author
    Add {
        #[arg(long)]
        name: String,
        /// Ten digit phone number
        #[arg(long)]
        phone: Option<String>,
    },
    /// Change fields of an existing author
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "clear_phone")]
        phone: Option<String>,
        /// Remove the stored phone number
        #[arg(long)]
        clear_phone: bool,
    },
    /// Show one author
    Show { id: i64 },
    /// List all authors
    List,
    /// Delete an author
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum PostCommand {
    /// Add a new post
    Add {
        #[arg(long)]
        title: String,
        #[command(flatten)]
        content: ContentArg,
        /// Fiction or Non-Fiction
        #[arg(long)]
        category: String,
        #[arg(long)]
        summary: String,
    },
    /// Change fields of an existing post
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        content: OptionalContentArg,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        summary: Option<String>,
    },
    /// Show one post in full
    Show { id: i64 },
    /// List all posts
    List,
    /// Delete a post
    Delete { id: i64 },
}

/// Post body, given inline or read from a file
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ContentArg {
    #[arg(long)]
    content: Option<String>,
    #[arg(long = "content-file")]
    content_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
struct OptionalContentArg {
    #[arg(long)]
    content: Option<String>,
    #[arg(long = "content-file")]
    content_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG overrides the verbosity flag
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            report(&e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    // Instantiate the secondary adapter, then inject it into the service the command needs
    let repository = SqliteBlogRepository::open(&cli.database)?;

    match cli.command {
        Command::Author(command) => run_author(AuthorService::new(Box::new(repository)), command),
        Command::Post(command) => run_post(PostService::new(Box::new(repository)), command),
    }
}

fn run_author(service: AuthorService, command: AuthorCommand) -> Result<String> {
    match command {
        AuthorCommand::Add { name, phone } => {
            let author = service.create_author(&NewAuthor {
                name,
                phone_number: phone,
            })?;
            Ok(format!("Created {}", author))
        }
        AuthorCommand::Update {
            id,
            name,
            phone,
            clear_phone,
        } => {
            let phone_number = if clear_phone { Some(None) } else { phone.map(Some) };
            let author = service.update_author(id, &AuthorChanges { name, phone_number })?;
            Ok(format!("Updated {}", author))
        }
        AuthorCommand::Show { id } => Ok(describe_author(&service.get_author(id)?)),
        AuthorCommand::List => {
            let authors = service.list_authors()?;
            if authors.is_empty() {
                return Ok("No authors".to_string());
            }
            let lines: Vec<String> = authors
                .iter()
                .map(|a| {
                    format!(
                        "{:>4}  {}  {}",
                        a.id,
                        a.name,
                        a.phone_number.as_deref().unwrap_or("-")
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
        AuthorCommand::Delete { id } => {
            service.delete_author(id)?;
            Ok(format!("Deleted author {}", id))
        }
    }
}

fn run_post(service: PostService, command: PostCommand) -> Result<String> {
    match command {
        PostCommand::Add {
            title,
            content,
            category,
            summary,
        } => {
            let content = read_content(content.content, content.content_file)?.unwrap_or_default();
            let post = service.create_post(&NewPost {
                title,
                content,
                category,
                summary,
            })?;
            Ok(format!("Created post {}: {}", post.id, post.title))
        }
        PostCommand::Update {
            id,
            title,
            content,
            category,
            summary,
        } => {
            let changes = PostChanges {
                title,
                content: read_content(content.content, content.content_file)?,
                category,
                summary,
            };
            let post = service.update_post(id, &changes)?;
            Ok(format!("Updated post {}: {}", post.id, post.title))
        }
        PostCommand::Show { id } => Ok(describe_post(&service.get_post(id)?)),
        PostCommand::List => {
            let posts = service.list_posts()?;
            if posts.is_empty() {
                return Ok("No posts".to_string());
            }
            let lines: Vec<String> = posts
                .iter()
                .map(|p| {
                    format!(
                        "{:>4}  [{}]  {}  {}",
                        p.id,
                        p.category,
                        preview(&p.title, 40),
                        preview(&p.summary, 60)
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
        PostCommand::Delete { id } => {
            service.delete_post(id)?;
            Ok(format!("Deleted post {}", id))
        }
    }
}

fn read_content(inline: Option<String>, file: Option<PathBuf>) -> Result<Option<String>> {
    match (inline, file) {
        (Some(content), _) => Ok(Some(content)),
        (None, Some(path)) => std::fs::read_to_string(&path).map(Some).map_err(|e| {
            BlogError::Storage(format!("cannot read {}: {}", path.display(), e))
        }),
        (None, None) => Ok(None),
    }
}

fn describe_author(author: &Author) -> String {
    format!(
        "{}\nphone:   {}\ncreated: {}\nupdated: {}",
        author,
        author.phone_number.as_deref().unwrap_or("-"),
        format_timestamp_to_local(&author.created_at),
        format_optional_timestamp(author.updated_at.as_ref())
    )
}

fn describe_post(post: &Post) -> String {
    format!(
        "# {}\n\n*{}* | created {} | updated {}\n\n> {}\n\n{}",
        post.title,
        post.category,
        format_timestamp_to_local(&post.created_at),
        format_optional_timestamp(post.updated_at.as_ref()),
        post.summary,
        post.content.trim()
    )
}

fn report(error: &BlogError) {
    match error {
        BlogError::Validation(errors) => {
            eprintln!("Rejected:");
            for (field, message) in field_messages(errors) {
                eprintln!("  - {}: {}", field, message);
            }
        }
        other => eprintln!("Error: {}", other),
    }
}
