//! HTTP handlers for the listing and form actions.

pub mod crud;
pub use crud::*;
