//! todochat is a terminal chat client for a hosted model that manages the
//! user's to-do list through a remote MCP server.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns configuration, client construction, the transcript and the
//!   per-session streaming orchestration.
//! - [`mcp`] describes the remote MCP server as a tool the model may call.
//! - [`api`] defines the request and stream payloads of the responses API.
//! - [`ui`] runs the interactive line-based chat loop.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which builds the shared services and hands a
//! fresh [`core::session::ChatSession`] to [`ui::repl`].

pub mod api;
pub mod cli;
pub mod core;
pub mod mcp;
pub mod ui;
pub mod utils;
