//! TUI-less "say" command

use std::error::Error;
use std::path::PathBuf;

use tracing::warn;

use crate::cli::CliContext;
use crate::core::app::ChatApp;
use crate::core::attachment::{Attachment, AttachmentKind};
use crate::core::exchange::SendOutcome;

#[derive(Debug, Default)]
pub struct SayOptions {
    pub prompt: Vec<String>,
    pub image: Option<PathBuf>,
    pub file: Option<PathBuf>,
    pub rag: bool,
    pub conversation: Option<String>,
    pub model: Option<String>,
}

/// The reply to a one-shot send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SayReply {
    pub text: String,
    /// Set when the service started a conversation for this message.
    pub started_conversation: Option<String>,
}

pub async fn run_say(context: &CliContext, options: SayOptions) -> Result<(), Box<dyn Error>> {
    let attachment = load_attachment(&options).await?;
    if options.prompt.join(" ").trim().is_empty() && attachment.is_none() {
        return Err("Usage: chatterm say [--image PATH | --file PATH] <prompt>".into());
    }

    let mut app = context.app();
    context.require_session(&mut app).await?;
    if let Err(err) = app.models.load_catalog(context.backend.as_ref()).await {
        warn!(error = %err, "Model catalog unavailable; using the fallback model");
    }

    let reply = send_one(&mut app, options, attachment).await?;
    println!("{}", reply.text);
    if let Some(id) = reply.started_conversation {
        eprintln!("(conversation {id})");
    }
    Ok(())
}

async fn load_attachment(options: &SayOptions) -> Result<Option<Attachment>, Box<dyn Error>> {
    let (kind, path) = match (&options.image, &options.file) {
        (Some(_), Some(_)) => return Err("Only one of --image and --file may be given".into()),
        (Some(path), None) => (AttachmentKind::Image, path),
        (None, Some(path)) => (AttachmentKind::Document, path),
        (None, None) => return Ok(None),
    };
    let attachment = Attachment::load(kind, path)
        .await
        .map_err(|err| format!("Could not read {}: {err}", path.display()))?;
    Ok(Some(attachment))
}

/// Sends one message through `app`, which must hold a settled session.
pub async fn send_one(
    app: &mut ChatApp,
    options: SayOptions,
    attachment: Option<Attachment>,
) -> Result<SayReply, Box<dyn Error>> {
    if let Some(model) = options.model.as_deref() {
        app.models.select(model)?;
    }
    if let Some(id) = options.conversation.as_deref() {
        if app.conversations.get(id).is_none() {
            return Err(format!("No conversation with id {id}").into());
        }
        app.select_conversation(id);
    }

    app.composer.text = options.prompt.join(" ");
    if let Some(attachment) = attachment {
        app.composer.attach(attachment);
    }
    app.composer.set_rag(options.rag);

    // One-shot: the conversation list is not reloaded afterwards.
    let pending = app.begin_send()?;
    let result = pending.dispatch(app.backend().as_ref()).await;
    match app.complete_send(&pending, result) {
        SendOutcome::Replied { refresh_history } => {
            let text = app
                .conversations
                .transcript()
                .last()
                .map(|message| message.content.clone())
                .unwrap_or_default();
            let started_conversation = match refresh_history {
                true => app.conversations.active_id().map(str::to_owned),
                false => None,
            };
            Ok(SayReply {
                text,
                started_conversation,
            })
        }
        SendOutcome::Failed(err) => Err(format!("Send failed: {err}").into()),
        SendOutcome::Discarded => Err("The reply was discarded".into()),
    }
}
