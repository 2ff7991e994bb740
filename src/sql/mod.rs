//! Safe SQL builder: identifiers from introspection only, values as parameters.

mod builder;
mod filter;
pub mod params;
pub use builder::*;
pub use filter::SearchFilter;
pub use params::*;
