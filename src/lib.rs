//! # Folios
//!
//! Versioned document retrieval and chapter-grouped diffs for AI tools.
//!
//! A folder of Markdown files named `{id}_v{version}.md` is indexed at
//! startup. Each file carries YAML front matter, a level-1 title, and
//! chapters taken from its level-2 headings. The library exposes the corpus
//! as MCP tools and resources (stdio or Streamable HTTP), a small REST
//! tool API, and a CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  {id}_vN.md  │──▶│ CorpusIndex │──▶│   Library    │
//! │   + toml     │   │  + Schema   │   │  (parse/diff)│
//! └──────────────┘   └─────────────┘   └──────┬───────┘
//!                                             │
//!                      ┌──────────────────────┤
//!                      ▼                      ▼
//!                 ┌──────────┐         ┌────────────┐
//!                 │   CLI    │         │ MCP / HTTP │
//!                 │ (folios) │         │  (tools)   │
//!                 └──────────┘         └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Documents path resolution and `folios.toml` |
//! | [`index`] | File-name scan into an id/version index |
//! | [`library`] | Loaded corpus: index, config, discovered schema |
//! | [`documents`] | Document operations and their response types |
//! | [`traits`] | `Tool` trait, built-in tools, registry |
//! | [`mcp`] | MCP protocol bridge (tools and resources) |
//! | [`server`] | stdio and HTTP transports |
//! | [`error`] | Error taxonomy and wire envelope |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! Parsing, diffing, and schema discovery live in the `folios-core` crate.

pub mod config;
pub mod documents;
pub mod error;
pub mod index;
pub mod library;
pub mod logging;
pub mod mcp;
pub mod server;
pub mod traits;
