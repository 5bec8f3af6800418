pub mod chat_stream;
pub mod client;
pub mod config;
pub mod conversation;
pub mod credential;
pub mod error;
pub mod message;
pub mod session;
pub mod suggestions;
