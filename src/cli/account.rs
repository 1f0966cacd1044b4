//! Account commands: login, register, logout and whoami.

use std::error::Error;

use crate::api::ChatBackend;
use crate::cli::CliContext;
use crate::core::session::SessionStore;
use crate::utils::prompt::{prompt_password, value_or_prompt};

pub async fn login(context: &CliContext, email: Option<String>) -> Result<(), Box<dyn Error>> {
    let email = value_or_prompt(email, "Email: ")?;
    let password = prompt_password("Password: ")?;

    let mut session = SessionStore::new();
    let response = session
        .login(context.backend.as_ref(), &email, &password)
        .await?;
    context.remember_session();

    println!(
        "✅ Logged in as {} <{}>",
        response.user.name, response.user.email
    );
    Ok(())
}

pub async fn register(
    context: &CliContext,
    name: Option<String>,
    email: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let name = value_or_prompt(name, "Name: ")?;
    let email = value_or_prompt(email, "Email: ")?;
    let password = prompt_password("Password: ")?;
    let confirmation = prompt_password("Confirm password: ")?;
    if password != confirmation {
        return Err("Passwords do not match".into());
    }

    let message = SessionStore::new()
        .register(context.backend.as_ref(), &name, &email, &password)
        .await?;
    println!("✅ {message}");
    println!("Run `chatterm login --email {}` to sign in.", email.trim());
    Ok(())
}

/// Ends the session on the server and locally. A failed server call still
/// clears the saved cookie.
pub async fn logout(context: &CliContext) -> Result<(), Box<dyn Error>> {
    let mut session = SessionStore::new();
    let result = session.logout(context.backend.as_ref()).await;
    context.forget_session();

    match result {
        Ok(()) => println!("✅ Logged out"),
        Err(err) => println!("⚠️  Server logout failed ({err}); local session cleared"),
    }
    Ok(())
}

pub async fn whoami(context: &CliContext) -> Result<(), Box<dyn Error>> {
    match context.backend.current_user().await? {
        Some(probe) => {
            println!("{} <{}>", probe.name, probe.email);
            println!("{} saved conversation(s)", probe.chat_history.len());
        }
        None => println!("Not logged in"),
    }
    Ok(())
}
