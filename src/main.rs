//! # Folios CLI (`folios`)
//!
//! Serves a folder of versioned Markdown documents over MCP, and offers the
//! same operations as one-shot commands.
//!
//! ## Usage
//!
//! ```bash
//! folios --folios-path ./documents <command>
//! FOLIOS_PATH=./documents folios <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `folios serve` | MCP server over stdio (default) or HTTP |
//! | `folios list` | Latest version of every document, optionally filtered |
//! | `folios get <id>` | Raw document content |
//! | `folios metadata <id>` | Metadata and chapter titles |
//! | `folios chapter <id> <title>` | One chapter |
//! | `folios versions <id>` | Version history |
//! | `folios diff <id> <from> <to>` | Chapter-grouped diff |
//! | `folios schema` | Discovered metadata fields |

use clap::{Parser, Subcommand, ValueEnum};
use folios::config::resolve_documents_path;
use folios::documents::{self, DocumentFilter};
use folios::error::FoliosError;
use folios::library::Library;
use folios::logging::{self, Profile};
use folios::server;
use folios::traits::ToolRegistry;
use folios_core::FieldSchema;
use std::path::PathBuf;
use std::sync::Arc;

/// Folios: versioned document retrieval and chapter-grouped diffs for AI tools.
#[derive(Parser)]
#[command(
    name = "folios",
    about = "Folios: versioned document retrieval and chapter-grouped diffs over MCP",
    version
)]
struct Cli {
    /// Path to the folder containing `{id}_v{version}.md` documents.
    ///
    /// Falls back to the `FOLIOS_PATH` environment variable.
    #[arg(long, global = true, env = "FOLIOS_PATH", hide_env_values = true)]
    folios_path: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server (the default when no command is given).
    Serve {
        #[arg(long, value_enum, default_value_t = Transport::Stdio)]
        transport: Transport,

        /// HTTP bind address; overrides `[server].bind` in folios.toml.
        #[arg(long)]
        bind: Option<String>,
    },

    /// List documents (latest version of each).
    List {
        /// Exact status, e.g. `Draft`.
        #[arg(long)]
        status: Option<String>,
        /// Exact document type.
        #[arg(long = "type")]
        document_type: Option<String>,
        /// Case-insensitive substring of the author.
        #[arg(long)]
        author: Option<String>,
    },

    /// Print the raw content of a document.
    Get {
        id: u64,
        #[arg(long)]
        version: Option<u64>,
    },

    /// Print metadata and chapter titles.
    Metadata {
        id: u64,
        #[arg(long)]
        version: Option<u64>,
    },

    /// Print one chapter (title match is case-insensitive).
    Chapter {
        id: u64,
        title: String,
        #[arg(long)]
        version: Option<u64>,
    },

    /// List the versions of a document.
    Versions { id: u64 },

    /// Show what changed between two versions, grouped by chapter.
    Diff { id: u64, from: u64, to: u64 },

    /// Show the discovered metadata schema.
    Schema,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(if cli.json_logs {
        Profile::Production
    } else {
        Profile::Development
    });

    let root = match resolve_documents_path(cli.folios_path, None) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let library = Arc::new(Library::open(root)?);

    match cli.command.unwrap_or(Commands::Serve {
        transport: Transport::Stdio,
        bind: None,
    }) {
        Commands::Serve { transport, bind } => {
            let tools = Arc::new(ToolRegistry::with_builtins(&library));
            match transport {
                Transport::Stdio => server::run_stdio(library, tools).await?,
                Transport::Http => {
                    let bind = bind.unwrap_or_else(|| library.config().server.bind.clone());
                    server::run_http(library, tools, &bind).await?;
                }
            }
        }
        Commands::List {
            status,
            document_type,
            author,
        } => {
            let filter = DocumentFilter {
                status,
                document_type,
                author,
            };
            let docs = documents::list_documents(&library, &filter);
            if docs.is_empty() {
                println!("No documents found.");
            }
            for d in docs {
                println!(
                    "{:>8}  v{:<4} {:<12} {:<20} {}",
                    d.id, d.latest_version, d.status, d.document_type, d.title
                );
            }
        }
        Commands::Get { id, version } => {
            let doc = exit_on_error(documents::get_content(&library, id, version));
            print!("{}", doc.content);
        }
        Commands::Metadata { id, version } => {
            let m = exit_on_error(documents::get_metadata(&library, id, version));
            println!("--- Document ---");
            println!("id:        {}", m.id);
            println!("version:   {}", m.version);
            println!("title:     {}", m.title);
            println!("type:      {}", m.document_type);
            println!("author:    {}", m.author);
            println!("reviewer:  {}", m.reviewer);
            println!("approver:  {}", m.approver);
            println!("date:      {}", m.date);
            println!("status:    {}", m.status);
            for (key, value) in m.extra.iter() {
                println!("{:<10} {}", format!("{}:", key), value);
            }
            println!();
            println!("--- Chapters ({}) ---", m.chapters.len());
            for c in &m.chapters {
                println!("{}", c.title);
            }
            for w in &m.warnings {
                eprintln!("warning: {}", w);
            }
        }
        Commands::Chapter { id, title, version } => {
            let c = exit_on_error(documents::get_chapter(&library, id, &title, version));
            print!("{}", c.content);
        }
        Commands::Versions { id } => {
            let v = exit_on_error(documents::list_versions(&library, id));
            for info in v.versions {
                println!(
                    "v{:<4} {:<12} {:<12} {}",
                    info.version, info.date, info.status, info.author
                );
            }
        }
        Commands::Diff { id, from, to } => {
            let d = exit_on_error(documents::diff_versions(&library, id, from, to));
            if d.changes.is_empty() {
                println!("No changes between versions.");
            }
            for change in d.changes {
                println!("=== {} ===", change.chapter);
                print!("{}", change.diff);
            }
        }
        Commands::Schema => {
            let schema = documents::get_schema(&library);
            if schema.is_empty() {
                println!("No metadata fields discovered.");
            }
            for (field, classification) in schema.iter() {
                match classification {
                    FieldSchema::Enumerable(values) => {
                        println!("{}: {}", field, values.join(", "))
                    }
                    FieldSchema::FreeText(count) => {
                        println!("{}: free text ({} unique values)", field, count)
                    }
                }
            }
        }
    }

    Ok(())
}

/// Print a document error as `Error [CODE]: message` and exit with status 1.
fn exit_on_error<T>(result: Result<T, FoliosError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error [{}]: {}", e.code(), e);
            std::process::exit(1);
        }
    }
}
