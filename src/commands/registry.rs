use super::CommandResult;
use crate::core::app::ChatApp;

pub type CommandHandler = fn(&mut ChatApp, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

/// Commands whose name starts with `prefix`, for completion.
pub fn matching_commands(prefix: &str) -> Vec<&'static Command> {
    let prefix = prefix.to_ascii_lowercase();
    all_commands()
        .iter()
        .filter(|command| command.name.starts_with(&prefix))
        .collect()
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "List the available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "image",
        usage: "/image <path>",
        help: "Attach an image to the next message.",
        handler: super::handle_image,
    },
    Command {
        name: "file",
        usage: "/file <path>",
        help: "Attach a text document to the next message.",
        handler: super::handle_file,
    },
    Command {
        name: "detach",
        usage: "/detach",
        help: "Drop the pending attachment.",
        handler: super::handle_detach,
    },
    Command {
        name: "rag",
        usage: "/rag [on|off]",
        help: "Toggle answering from the document store.",
        handler: super::handle_rag,
    },
    Command {
        name: "model",
        usage: "/model <name>",
        help: "Switch the model used for new messages.",
        handler: super::handle_model,
    },
    Command {
        name: "models",
        usage: "/models",
        help: "Show the models the server offers.",
        handler: super::handle_models,
    },
    Command {
        name: "new",
        usage: "/new",
        help: "Start a new chat.",
        handler: super::handle_new,
    },
    Command {
        name: "refresh",
        usage: "/refresh",
        help: "Reload the conversation list.",
        handler: super::handle_refresh,
    },
    Command {
        name: "logout",
        usage: "/logout",
        help: "End the session and quit.",
        handler: super::handle_logout,
    },
];
