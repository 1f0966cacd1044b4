//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod account;
pub mod history;
pub mod say;

#[cfg(test)]
mod tests;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use crate::api::{ChatBackend, HttpBackend, UserWithHistory};
use crate::cli::account::{login, logout, register, whoami};
use crate::cli::history::{delete_conversation, list_history, list_models, show_conversation};
use crate::cli::say::{run_say, SayOptions};
use crate::core::app::ChatApp;
use crate::core::config::Config;
use crate::core::keyring::SessionVault;
use crate::logging;
use crate::ui::chat_loop::{run_chat, ChatExit};

pub const NOT_LOGGED_IN: &str = "Not logged in; run `chatterm login` first";

#[derive(Parser, Debug)]
#[command(name = "chatterm")]
#[command(about = "A terminal client for a cookie-session chat service")]
#[command(
    long_about = "chatterm is a full-screen terminal client for a chat service with \
conversation history, image and document attachments, and a retrieval (RAG) mode.\n\n\
Sessions:\n\
  Use 'chatterm login' once; the session cookie is kept in your system keyring \
and shared by the chat screen and the one-shot commands.\n\n\
Environment Variables:\n\
  CHATTERM_BASE_URL   Address of the chat service (defaults to http://localhost:8000)\n\
  CHATTERM_LOG        Log filter, e.g. 'debug' or 'chatterm::api=trace'\n\n\
Controls:\n\
  Enter             Send the message\n\
  Tab               Switch between the composer and the conversation list\n\
  Ctrl+N            Start a new chat\n\
  Ctrl+R            Toggle RAG mode\n\
  Ctrl+C            Quit the application\n\n\
Commands:\n\
  /help             Show all slash commands"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Address of the chat service (overrides config and CHATTERM_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Write diagnostic logs to this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// End the session and forget the saved cookie
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List the models offered by the service
    Models,
    /// List saved conversations
    History,
    /// Print one conversation's transcript
    Show {
        /// Conversation id, as printed by `history`
        id: String,
    },
    /// Delete a conversation
    Delete {
        /// Conversation id, as printed by `history`
        id: String,
    },
    /// Send one message and print the reply
    Say {
        /// Attach an image
        #[arg(long, value_name = "PATH", conflicts_with = "file")]
        image: Option<PathBuf>,
        /// Attach a document
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Answer from the document store
        #[arg(long)]
        rag: bool,
        /// Continue an existing conversation instead of starting one
        #[arg(long, value_name = "ID")]
        conversation: Option<String>,
        /// Model to use for this message
        #[arg(short = 'm', long)]
        model: Option<String>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

/// Everything a command needs to talk to the service.
pub struct CliContext {
    pub config: Config,
    pub backend: Arc<HttpBackend>,
    pub vault: SessionVault,
}

impl CliContext {
    /// Builds the transport for the resolved address and restores any saved
    /// session cookie into it.
    pub fn connect(config: Config, base_url_flag: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let base_url = config.resolve_base_url(base_url_flag);
        let backend = HttpBackend::new(&base_url, config.request_timeout())?;
        let vault = SessionVault::new(&base_url, config.keyring_enabled());
        if let Some(cookie) = vault.load_or_warn() {
            backend.restore_session_cookie(&cookie);
        }
        debug!(base_url = %backend.base_url(), "Connected context ready");
        Ok(Self {
            config,
            backend: Arc::new(backend),
            vault,
        })
    }

    pub fn app(&self) -> ChatApp {
        ChatApp::new(self.backend.clone(), self.config.default_model.clone())
    }

    /// The logged-in user and their history, or an error telling the user to
    /// log in.
    pub async fn require_user(&self) -> Result<UserWithHistory, Box<dyn Error>> {
        match self.backend.current_user().await? {
            Some(probe) => Ok(probe),
            None => Err(NOT_LOGGED_IN.into()),
        }
    }

    /// Settles `app`'s session from a fresh probe.
    pub async fn require_session(&self, app: &mut ChatApp) -> Result<(), Box<dyn Error>> {
        let probe = self.require_user().await?;
        app.apply_session_check(Ok(Some(probe)));
        Ok(())
    }

    /// Saves whatever session cookie the transport currently holds.
    pub fn remember_session(&self) {
        match self.backend.session_cookie() {
            Some(cookie) => {
                if let Err(err) = self.vault.store(&cookie) {
                    warn!(error = %err, "Could not save session cookie");
                    eprintln!("⚠️  {err}");
                }
            }
            None => warn!("Service did not set a session cookie"),
        }
    }

    pub fn forget_session(&self) {
        self.backend.forget_session_cookie();
        if let Err(err) = self.vault.clear() {
            warn!(error = %err, "Could not remove saved session cookie");
            eprintln!("⚠️  {err}");
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if let Err(err) = logging::init(args.log_file.as_deref()) {
        eprintln!("⚠️  Logging disabled: {err}");
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let base_url = args.base_url.as_deref();
    let connect = |config| CliContext::connect(config, base_url);

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Set { key, value } => set_config(config, &key, value),
        Commands::Unset { key } => unset_config(config, &key),
        Commands::Chat => chat(connect(config)?).await,
        Commands::Login { email } => login(&connect(config)?, email).await,
        Commands::Register { name, email } => register(&connect(config)?, name, email).await,
        Commands::Logout => logout(&connect(config)?).await,
        Commands::Whoami => whoami(&connect(config)?).await,
        Commands::Models => list_models(&connect(config)?).await,
        Commands::History => list_history(&connect(config)?).await,
        Commands::Show { id } => show_conversation(&connect(config)?, &id).await,
        Commands::Delete { id } => delete_conversation(&connect(config)?, &id).await,
        Commands::Say {
            image,
            file,
            rag,
            conversation,
            model,
            prompt,
        } => {
            let options = SayOptions {
                prompt,
                image,
                file,
                rag,
                conversation,
                model,
            };
            run_say(&connect(config)?, options).await
        }
    }
}

async fn chat(context: CliContext) -> Result<(), Box<dyn Error>> {
    let mut app = context.app();
    context.require_session(&mut app).await?;
    match run_chat(app, context.vault).await? {
        ChatExit::LoggedOut => println!("Logged out."),
        ChatExit::Quit => {}
    }
    Ok(())
}

fn set_config(mut config: Config, key: &str, value: Vec<String>) -> Result<(), Box<dyn Error>> {
    if value.is_empty() {
        config.print_all();
        return Ok(());
    }
    let value = value.join(" ");
    config.set_value(key, &value)?;
    config.save()?;
    println!("✅ Set {key} to: {value}");
    Ok(())
}

fn unset_config(mut config: Config, key: &str) -> Result<(), Box<dyn Error>> {
    config.unset_value(key)?;
    config.save()?;
    println!("✅ Unset {key}");
    Ok(())
}
