//! Interactive prompts for the login and registration commands.

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::fmt;
use std::io::{self, BufRead, Write};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PromptError {
    message: String,
}

impl PromptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PromptError {}

impl From<io::Error> for PromptError {
    fn from(err: io::Error) -> Self {
        PromptError::new(err.to_string())
    }
}

/// Reads one visible line from stdin.
pub fn prompt_line(prompt: &str) -> Result<String, PromptError> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(PromptError::new("No input"));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Returns `value` when present, otherwise asks for it.
pub fn value_or_prompt(value: Option<String>, prompt: &str) -> Result<String, PromptError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => prompt_line(prompt),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SecretOutcome {
    Continue,
    Submit,
    Cancel,
}

fn apply_secret_key(secret: &mut String, key: &KeyEvent) -> SecretOutcome {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => SecretOutcome::Submit,
        KeyCode::Esc => SecretOutcome::Cancel,
        KeyCode::Char('c') if control => SecretOutcome::Cancel,
        KeyCode::Char('u') if control => {
            secret.clear();
            SecretOutcome::Continue
        }
        KeyCode::Backspace => {
            secret.pop();
            SecretOutcome::Continue
        }
        KeyCode::Char(c) if !control => {
            secret.push(c);
            SecretOutcome::Continue
        }
        _ => SecretOutcome::Continue,
    }
}

fn redraw_masked(prompt: &str, secret: &str) -> io::Result<()> {
    print!("\r\x1b[K{}{}", prompt, "*".repeat(secret.chars().count()));
    io::stdout().flush()
}

/// Reads a password with every character echoed as `*`.
pub fn prompt_password(prompt: &str) -> Result<String, PromptError> {
    enable_raw_mode()?;

    let result = (|| -> Result<String, PromptError> {
        let mut secret = String::new();
        redraw_masked(prompt, &secret)?;
        loop {
            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match apply_secret_key(&mut secret, &key) {
                        SecretOutcome::Continue => redraw_masked(prompt, &secret)?,
                        SecretOutcome::Submit => break Ok(secret),
                        SecretOutcome::Cancel => break Err(PromptError::new("Cancelled by user")),
                    }
                }
                Event::Paste(text) => {
                    secret.extend(text.chars().filter(|c| !c.is_control()));
                    redraw_masked(prompt, &secret)?;
                }
                _ => {}
            }
        }
    })();

    let disable_result = disable_raw_mode();
    println!();
    match (result, disable_result) {
        (Ok(_), Err(err)) => Err(err.into()),
        (result, _) => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn secret_editing() {
        let mut secret = String::new();
        for c in "pw!x".chars() {
            assert_eq!(
                apply_secret_key(&mut secret, &press(KeyCode::Char(c), KeyModifiers::NONE)),
                SecretOutcome::Continue
            );
        }
        apply_secret_key(&mut secret, &press(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(secret, "pw!");
        assert_eq!(
            apply_secret_key(&mut secret, &press(KeyCode::Enter, KeyModifiers::NONE)),
            SecretOutcome::Submit
        );
    }

    #[test]
    fn control_keys_do_not_insert() {
        let mut secret = "abc".to_string();
        assert_eq!(
            apply_secret_key(&mut secret, &press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            SecretOutcome::Cancel
        );
        apply_secret_key(&mut secret, &press(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(secret, "");
    }

    #[test]
    fn provided_values_skip_the_prompt() {
        assert_eq!(
            value_or_prompt(Some("a@x.com".into()), "Email: ").expect("value"),
            "a@x.com"
        );
    }
}
