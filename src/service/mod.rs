//! Query engine over the introspected schema.

mod dao;
pub use dao::{Cell, Dao, Page, Row};
