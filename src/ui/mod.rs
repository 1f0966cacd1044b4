//! Full-screen terminal interface.
//!
//! - [`chat_loop`]: the event loop that reads keys, runs slash commands via
//!   [`crate::commands`] and applies background results.
//! - [`renderer`]: frame composition (sidebar, transcript, composer, status).
//! - [`state`]: focus, line editing and scroll state that only the view needs.
//!
//! Domain state lives in [`crate::core::app::ChatApp`]; this layer only
//! presents it and captures input.

pub mod chat_loop;
pub mod renderer;
pub mod state;
