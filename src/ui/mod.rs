//! Interactive front end.
//!
//! - [`repl`]: the chat loop that feeds stdin lines to a
//!   [`crate::core::session::ChatSession`] and prints its events.
//! - [`input`]: slash-command parsing for that loop.

pub mod input;
pub mod repl;
