//! chatterm is a terminal client for a cookie-session chat service.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] defines the wire payloads, the invoke route table, and the
//!   [`api::ChatBackend`] seam with its reqwest implementation.
//! - [`core`] owns session, model, conversation and composer state and the
//!   two-phase message exchange, all driven through [`core::app::ChatApp`].
//! - [`commands`] implements slash-command parsing for the composer.
//! - [`ui`] renders the terminal interface and runs the interactive event loop.
//! - [`cli`] parses arguments and runs the one-shot subcommands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
