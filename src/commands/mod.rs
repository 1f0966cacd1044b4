//! Slash commands typed into the composer.
//!
//! Handlers run synchronously against [`ChatApp`]. Commands that need the
//! network or the filesystem return a [`CommandResult`] describing the work
//! and the chat loop performs it.

mod registry;

pub use registry::{all_commands, matching_commands, CommandInvocation};

use std::path::PathBuf;

use crate::core::app::ChatApp;
use crate::core::attachment::AttachmentKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    Attach(AttachmentKind, PathBuf),
    RefreshHistory,
    Logout,
}

pub fn process_input(app: &mut ChatApp, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        (command.handler)(app, CommandInvocation { args })
    } else {
        CommandResult::ProcessAsMessage(input.to_string())
    }
}

fn usage(app: &mut ChatApp, name: &str) -> CommandResult {
    if let Some(command) = registry::find_command(name) {
        app.notify_error(format!("Usage: {}", command.usage));
    }
    CommandResult::Continue
}

/// `/help` lists every command; `/help <name>` explains one.
pub(super) fn handle_help(app: &mut ChatApp, invocation: CommandInvocation<'_>) -> CommandResult {
    let topic = invocation.args.trim_start_matches('/');
    if !topic.is_empty() {
        match registry::find_command(topic) {
            Some(command) => app.notify_info(format!("{}: {}", command.usage, command.help)),
            None => app.notify_error(format!("No command named /{topic}")),
        }
        return CommandResult::Continue;
    }

    let usages: Vec<&str> = all_commands().iter().map(|command| command.usage).collect();
    app.notify_info(format!(
        "{}  |  Tab sidebar, Ctrl+N new chat, Ctrl+R RAG, Ctrl+C quit",
        usages.join(", ")
    ));
    CommandResult::Continue
}

fn attach(app: &mut ChatApp, kind: AttachmentKind, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return usage(app, kind.label());
    }
    CommandResult::Attach(kind, PathBuf::from(invocation.args))
}

pub(super) fn handle_image(app: &mut ChatApp, invocation: CommandInvocation<'_>) -> CommandResult {
    attach(app, AttachmentKind::Image, invocation)
}

pub(super) fn handle_file(app: &mut ChatApp, invocation: CommandInvocation<'_>) -> CommandResult {
    attach(app, AttachmentKind::Document, invocation)
}

pub(super) fn handle_detach(app: &mut ChatApp, _invocation: CommandInvocation<'_>) -> CommandResult {
    match app.composer.detach() {
        Some(attachment) => app.notify_info(format!("Removed {}", attachment.file_name)),
        None => app.notify_info("No attachment to remove"),
    }
    CommandResult::Continue
}

pub(super) fn handle_rag(app: &mut ChatApp, invocation: CommandInvocation<'_>) -> CommandResult {
    let enabled = match invocation.args.to_ascii_lowercase().as_str() {
        "" => app.composer.toggle_rag(),
        "on" => {
            app.composer.set_rag(true);
            true
        }
        "off" => {
            app.composer.set_rag(false);
            false
        }
        _ => return usage(app, "rag"),
    };
    app.notify_info(if enabled { "RAG mode on" } else { "RAG mode off" });
    CommandResult::Continue
}

pub(super) fn handle_model(app: &mut ChatApp, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let current = app.models.active_model().to_string();
        app.notify_info(format!("Current model: {current} (use /model <name> to switch)"));
        return CommandResult::Continue;
    }

    let result = app
        .models
        .select(invocation.args)
        .map(|choice| format!("Model set to {} ({})", choice.model, choice.provider))
        .map_err(|err| err.to_string());
    match result {
        Ok(message) => app.notify_info(message),
        Err(message) => app.notify_error(message),
    }
    CommandResult::Continue
}

pub(super) fn handle_models(app: &mut ChatApp, _invocation: CommandInvocation<'_>) -> CommandResult {
    if app.models.catalog().is_empty() {
        app.notify_error("No models loaded yet");
        return CommandResult::Continue;
    }

    let active = app.models.active_model();
    let listing: Vec<String> = app
        .models
        .catalog()
        .iter()
        .map(|choice| {
            let marker = if choice.model == active { "*" } else { "" };
            format!("{marker}{} ({})", choice.model, choice.provider)
        })
        .collect();
    let message = format!("Models: {}", listing.join(", "));
    app.notify_info(message);
    CommandResult::Continue
}

pub(super) fn handle_new(app: &mut ChatApp, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.new_chat();
    CommandResult::Continue
}

pub(super) fn handle_refresh(
    _app: &mut ChatApp,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    CommandResult::RefreshHistory
}

pub(super) fn handle_logout(
    _app: &mut ChatApp,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    CommandResult::Logout
}
