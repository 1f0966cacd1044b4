use super::*;
use crate::cli::history::{conversation_line, delete_one, history_text, model_lines, transcript_text};
use crate::core::app::ChatApp;
use crate::core::conversations::ConversationList;
use crate::core::error::ApiError;
use crate::core::models::ModelSelection;
use crate::utils::test_utils::{conversation, sample_catalog, sample_probe, ScriptedBackend};
use std::path::Path;
use std::sync::Arc;

fn parse_args(argv: &[&str]) -> Args {
    Args::try_parse_from(argv)
        .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
}

#[test]
fn no_subcommand_means_chat() {
    let args = parse_args(&["chatterm"]);
    assert!(args.command.is_none());
    assert!(args.base_url.is_none());
}

#[test]
fn global_flags_follow_subcommands() {
    let args = parse_args(&[
        "chatterm",
        "history",
        "--base-url",
        "http://chat.local:9000",
        "--log-file",
        "/tmp/chatterm.log",
    ]);
    assert!(matches!(args.command, Some(Commands::History)));
    assert_eq!(args.base_url.as_deref(), Some("http://chat.local:9000"));
    assert_eq!(args.log_file.as_deref(), Some(Path::new("/tmp/chatterm.log")));
}

#[test]
fn login_and_register_fields_are_optional() {
    match parse_args(&["chatterm", "login"]).command {
        Some(Commands::Login { email }) => assert_eq!(email, None),
        other => panic!("unexpected command: {other:?}"),
    }
    match parse_args(&["chatterm", "register", "--name", "Ada", "--email", "a@x.com"]).command {
        Some(Commands::Register { name, email }) => {
            assert_eq!(name.as_deref(), Some("Ada"));
            assert_eq!(email.as_deref(), Some("a@x.com"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn say_collects_prompt_words_and_options() {
    let args = parse_args(&[
        "chatterm",
        "say",
        "--image",
        "cat.png",
        "--rag",
        "--conversation",
        "c1",
        "-m",
        "gpt-4o",
        "what",
        "is",
        "this",
    ]);
    match args.command {
        Some(Commands::Say {
            image,
            file,
            rag,
            conversation,
            model,
            prompt,
        }) => {
            assert_eq!(image.as_deref(), Some(Path::new("cat.png")));
            assert_eq!(file, None);
            assert!(rag);
            assert_eq!(conversation.as_deref(), Some("c1"));
            assert_eq!(model.as_deref(), Some("gpt-4o"));
            assert_eq!(prompt, vec!["what", "is", "this"]);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn say_rejects_image_and_file_together() {
    let result = Args::try_parse_from([
        "chatterm", "say", "--image", "a.png", "--file", "b.pdf", "hi",
    ]);
    assert!(result.is_err());
}

#[test]
fn set_joins_multi_word_values() {
    match parse_args(&["chatterm", "set", "default-model", "gpt-4o", "mini"]).command {
        Some(Commands::Set { key, value }) => {
            assert_eq!(key, "default-model");
            assert_eq!(value.join(" "), "gpt-4o mini");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn show_and_delete_take_an_id() {
    assert!(matches!(
        parse_args(&["chatterm", "show", "c1"]).command,
        Some(Commands::Show { id }) if id == "c1"
    ));
    assert!(matches!(
        parse_args(&["chatterm", "delete", "c2"]).command,
        Some(Commands::Delete { id }) if id == "c2"
    ));
    assert!(Args::try_parse_from(["chatterm", "delete"]).is_err());
}

#[test]
fn model_listing_stars_the_selected_model() {
    let mut models = ModelSelection::with_preferred(Some("gemini-pro".into()));
    models.apply_catalog(sample_catalog());

    let lines = model_lines(&models);
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "  gpt-4o (openAI)");
    assert_eq!(lines[2], "* gemini-pro (google)");
}

#[test]
fn history_line_and_transcript() {
    let chat = conversation("c1", "Trip plans", 2);
    assert_eq!(conversation_line(&chat), "c1  Trip plans  (2 messages)");
    assert_eq!(
        transcript_text(&chat),
        "# Trip plans\n\nYou:\nTrip plans question 0\n\nAssistant:\nTrip plans answer 1\n"
    );
}

#[test]
fn history_lists_most_recent_first() {
    let mut list = ConversationList::new();
    list.apply_history(sample_probe().chat_history);
    assert_eq!(
        history_text(&list),
        "c2  Second  (2 messages)\nc1  First  (2 messages)\n"
    );

    assert_eq!(history_text(&ConversationList::new()), "No conversations yet.\n");
}

#[test]
fn retrieval_conversations_are_tagged() {
    let mut chat = conversation("c4", "Docs", 2);
    chat.rag_mode = true;
    assert_eq!(conversation_line(&chat), "c4  Docs  (2 messages)  [RAG]");
}

fn logged_in(backend: ScriptedBackend) -> (ChatApp, Arc<ScriptedBackend>) {
    let backend = Arc::new(backend);
    let mut app = ChatApp::new(backend.clone(), None);
    app.apply_session_check(Ok(Some(sample_probe())));
    (app, backend)
}

#[tokio::test]
async fn delete_goes_through_the_conversation_list() {
    let (mut app, backend) = logged_in(ScriptedBackend::new());

    delete_one(&mut app, "c1").await.expect("deleted");
    assert_eq!(backend.deleted(), [("a@x.com".to_string(), "c1".to_string())]);
    assert!(app.conversations.get("c1").is_none());
    assert_eq!(history_text(&app.conversations), "c2  Second  (2 messages)\n");
}

#[tokio::test]
async fn failed_delete_is_an_error_and_keeps_the_entry() {
    let (mut app, _backend) = logged_in(
        ScriptedBackend::new().with_delete_error(ApiError::http(404, Some("Not found".into()))),
    );

    assert!(delete_one(&mut app, "c1").await.is_err());
    assert!(app.conversations.get("c1").is_some());
}

#[tokio::test]
async fn unknown_id_is_rejected_without_a_call() {
    let (mut app, backend) = logged_in(ScriptedBackend::new());

    let err = delete_one(&mut app, "c9").await.expect_err("unknown");
    assert_eq!(err.to_string(), "No conversation with id c9");
    assert!(backend.deleted().is_empty());
}

#[tokio::test]
async fn delete_without_a_user_is_an_error() {
    let (mut app, backend) = logged_in(ScriptedBackend::new());
    app.session.clear();

    let err = delete_one(&mut app, "c1").await.expect_err("anonymous");
    assert_eq!(err.to_string(), NOT_LOGGED_IN);
    assert!(backend.deleted().is_empty());
    assert!(app.conversations.get("c1").is_some());
}
