//! Askdocs is a terminal-first client for documentation question-answering
//! backends.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns session state: conversations, the active-thread pointer,
//!   the session controller, the service-catalog cache, and configuration.
//! - [`api`] defines the backend's wire payloads and the typed,
//!   failure-classified HTTP client.
//! - [`masking`] renders answer text with sensitive spans wrapped in
//!   backend- or client-masked markers.
//! - [`cli`] parses arguments and drives the interactive chat loop and the
//!   one-shot subcommands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod masking;
pub mod utils;
