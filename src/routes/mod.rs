//! Router builders.

pub mod common;
pub mod crud;
pub use common::*;
pub use crud::*;
