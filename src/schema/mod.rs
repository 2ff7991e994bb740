//! Runtime table metadata: model types and the SQLite introspector.

mod index_sql;
mod introspect;
mod model;

pub use index_sql::parse_index_columns;
pub use introspect::{SchemaIntrospector, SEQUENCE_TABLE};
pub use model::*;
