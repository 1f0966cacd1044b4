pub mod app;
pub mod attachment;
pub mod config;
pub mod conversations;
pub mod error;
pub mod exchange;
pub mod keyring;
pub mod message;
pub mod models;
pub mod session;
