//! Domain types shared by the store, matcher and responder.

pub mod scope;
pub mod strategy;

pub use scope::{ClearTarget, Conversation, Scope, GLOBAL_SCOPE_ID};
pub use strategy::Strategy;
