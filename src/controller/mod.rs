//! Request actions and the state machine that applies them.

mod action;
mod machine;

pub use action::*;
pub use machine::{Controller, Outcome, REMOVE_FAILED, REMOVE_OK, SAVE_FAILED, SAVE_OK};
