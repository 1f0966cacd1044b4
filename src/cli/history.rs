//! Read-only listings and conversation deletion.

use std::error::Error;

use crate::api::ChatBackend;
use crate::cli::{CliContext, NOT_LOGGED_IN};
use crate::core::app::ChatApp;
use crate::core::conversations::ConversationList;
use crate::core::message::Conversation;
use crate::core::models::ModelSelection;

pub async fn list_models(context: &CliContext) -> Result<(), Box<dyn Error>> {
    let mut models = ModelSelection::with_preferred(context.config.default_model.clone());
    models.load_catalog(context.backend.as_ref()).await?;

    println!("🤖 Available models");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if models.catalog().is_empty() {
        println!("The service offered no models.");
    }
    for line in model_lines(&models) {
        println!("{line}");
    }
    Ok(())
}

pub async fn list_history(context: &CliContext) -> Result<(), Box<dyn Error>> {
    let mut app = context.app();
    context.require_session(&mut app).await?;
    print!("{}", history_text(&app.conversations));
    Ok(())
}

pub async fn show_conversation(context: &CliContext, id: &str) -> Result<(), Box<dyn Error>> {
    let mut app = context.app();
    context.require_session(&mut app).await?;
    let conversation = app
        .conversations
        .get(id)
        .ok_or_else(|| format!("No conversation with id {id}"))?;
    print!("{}", transcript_text(conversation));
    Ok(())
}

pub async fn delete_conversation(context: &CliContext, id: &str) -> Result<(), Box<dyn Error>> {
    let mut app = context.app();
    context.require_session(&mut app).await?;
    delete_one(&mut app, id).await?;
    println!("✅ Deleted conversation {id}");
    Ok(())
}

/// Deletes `id` on the service and then from `app`'s list.
pub(crate) async fn delete_one(app: &mut ChatApp, id: &str) -> Result<(), Box<dyn Error>> {
    if app.conversations.get(id).is_none() {
        return Err(format!("No conversation with id {id}").into());
    }
    let email = app.require_email().ok_or(NOT_LOGGED_IN)?;
    let result = app.backend().delete_conversation(&email, id).await;
    app.apply_delete(id, result.clone());
    Ok(result?)
}

/// Most recent conversation first, as the sidebar shows them.
pub(crate) fn history_text(conversations: &ConversationList) -> String {
    if conversations.conversations().is_empty() {
        return "No conversations yet.\n".to_string();
    }
    conversations
        .conversations()
        .iter()
        .map(|conversation| conversation_line(conversation) + "\n")
        .collect()
}

/// One line per model; the one a new chat would use is starred.
pub(crate) fn model_lines(models: &ModelSelection) -> Vec<String> {
    let selected = models.selected();
    models
        .catalog()
        .iter()
        .map(|choice| {
            let marker = if Some(choice) == selected { "*" } else { " " };
            format!("{marker} {} ({})", choice.model, choice.provider)
        })
        .collect()
}

pub(crate) fn conversation_line(conversation: &Conversation) -> String {
    let mut line = format!(
        "{}  {}  ({} messages)",
        conversation.id,
        conversation.title,
        conversation.messages.len()
    );
    if conversation.rag_mode {
        line.push_str("  [RAG]");
    }
    line
}

pub(crate) fn transcript_text(conversation: &Conversation) -> String {
    let mut out = format!("# {}\n", conversation.title);
    for message in &conversation.messages {
        out.push('\n');
        out.push_str(message.role.label());
        out.push_str(":\n");
        out.push_str(&message.content);
        out.push('\n');
    }
    out
}
