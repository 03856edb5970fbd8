//! Core types for cardfold.

mod flashcard;
mod folder;
mod message;
mod user;

pub use flashcard::*;
pub use folder::*;
pub use message::*;
pub use user::*;

/// Owner scope used when a request does not name a user.
pub const DEFAULT_USER_ID: &str = "local";
