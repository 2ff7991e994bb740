//! Values bound to SQLite statements, and the directives a form field can carry instead of data.

use serde::{Deserialize, Serialize};
use sqlx::encode::{Encode, IsNull};
use sqlx::sqlite::{Sqlite, SqliteTypeInfo};
use sqlx::Database;

/// Form text that asks the database to generate the value (column left out of INSERT).
pub const AUTO_INCREMENT: &str = "AUTO_INCREMENT";
/// Form text that asks for the server's current local time.
pub const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";
/// Value of the per-column `-null` companion checkbox.
pub const SET_NULL: &str = "SETNULL";

/// A single SQLite value, either read from a row or bound as a parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Bind category implied by the runtime value itself.
    pub fn category(&self) -> Option<BindCategory> {
        match self {
            SqlValue::Integer(_) => Some(BindCategory::Integer),
            SqlValue::Real(_) => Some(BindCategory::Real),
            SqlValue::Text(_) => Some(BindCategory::Text),
            SqlValue::Null | SqlValue::Blob(_) => None,
        }
    }

    /// Convert to the requested category. Values that do not parse keep their runtime type.
    pub fn coerce(self, category: BindCategory) -> SqlValue {
        match (category, self) {
            (BindCategory::Text, SqlValue::Integer(n)) => SqlValue::Text(n.to_string()),
            (BindCategory::Text, SqlValue::Real(f)) => SqlValue::Text(f.to_string()),
            (BindCategory::Integer, SqlValue::Text(s)) => match s.trim().parse::<i64>() {
                Ok(n) => SqlValue::Integer(n),
                Err(_) => SqlValue::Text(s),
            },
            (BindCategory::Integer, SqlValue::Real(f)) if f.fract() == 0.0 => SqlValue::Integer(f as i64),
            (BindCategory::Real, SqlValue::Text(s)) => match s.trim().parse::<f64>() {
                Ok(f) => SqlValue::Real(f),
                Err(_) => SqlValue::Text(s),
            },
            (BindCategory::Real, SqlValue::Integer(n)) => SqlValue::Real(n as f64),
            (_, v) => v,
        }
    }

    /// Text shown in views and used to prefill forms.
    pub fn display(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Integer(n) => n.to_string(),
            SqlValue::Real(f) => f.to_string(),
            SqlValue::Text(s) => s.clone(),
            SqlValue::Blob(b) => format!("<blob {} bytes>", b.len()),
        }
    }
}

impl<'q> Encode<'q, Sqlite> for SqlValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            SqlValue::Null => IsNull::Yes,
            SqlValue::Integer(n) => <i64 as Encode<Sqlite>>::encode_by_ref(n, buf)?,
            SqlValue::Real(f) => <f64 as Encode<Sqlite>>::encode_by_ref(f, buf)?,
            SqlValue::Text(s) => <String as Encode<Sqlite>>::encode_by_ref(s, buf)?,
            SqlValue::Blob(b) => <Vec<u8> as Encode<Sqlite>>::encode_by_ref(b, buf)?,
        })
    }

    fn produces(&self) -> Option<SqliteTypeInfo> {
        match self {
            SqlValue::Null => None,
            SqlValue::Integer(_) => Some(<i64 as sqlx::Type<Sqlite>>::type_info()),
            SqlValue::Real(_) => Some(<f64 as sqlx::Type<Sqlite>>::type_info()),
            SqlValue::Text(_) => Some(<str as sqlx::Type<Sqlite>>::type_info()),
            SqlValue::Blob(_) => Some(<[u8] as sqlx::Type<Sqlite>>::type_info()),
        }
    }
}

/// Static fallback only; each bound value reports its own storage class through `produces`.
impl sqlx::Type<Sqlite> for SqlValue {
    fn type_info() -> SqliteTypeInfo {
        <str as sqlx::Type<Sqlite>>::type_info()
    }
}

/// Storage class a primary key is bound as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindCategory {
    Text,
    Integer,
    Real,
}

impl BindCategory {
    /// Category from the first three letters of a declared type: `STR`, `INT`, `FLO`.
    /// `TEXT`, `REAL`, `DATETIME` and anything else yield `None`.
    pub fn from_declared(declared: &str) -> Option<Self> {
        let prefix: String = declared.trim().chars().take(3).collect::<String>().to_ascii_uppercase();
        match prefix.as_str() {
            "STR" => Some(BindCategory::Text),
            "INT" => Some(BindCategory::Integer),
            "FLO" => Some(BindCategory::Real),
            _ => None,
        }
    }
}

/// Pick the bind form of a key: declared category when known, else the value's own type.
pub fn bind_key(value: &SqlValue, declared: Option<&str>) -> SqlValue {
    match declared.and_then(BindCategory::from_declared) {
        Some(category) => value.clone().coerce(category),
        None => value.clone(),
    }
}

/// SQL expressions the server may substitute for a value. Never parameterised.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerExpr {
    CurrentTimestamp,
}

impl ServerExpr {
    pub fn sql(self) -> &'static str {
        match self {
            ServerExpr::CurrentTimestamp => "DATETIME(CURRENT_TIMESTAMP,'LOCALTIME')",
        }
    }
}

/// What to write into one column on insert or update.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Literal(SqlValue),
    /// Leave the column to the database (omitted from INSERT, untouched by UPDATE).
    UseServerDefault,
    ExplicitNull,
    ServerExpression(ServerExpr),
}

impl FieldValue {
    /// Decode one submitted form field. The rendered form prefills `AUTO_INCREMENT` and
    /// `CURRENT_TIMESTAMP` into read-only inputs; those exact texts come back as directives.
    /// A user typing either text into a plain field triggers the same directive.
    pub fn from_form_text(text: &str, null_flag: bool) -> FieldValue {
        if null_flag {
            return FieldValue::ExplicitNull;
        }
        match text {
            AUTO_INCREMENT => FieldValue::UseServerDefault,
            CURRENT_TIMESTAMP => FieldValue::ServerExpression(ServerExpr::CurrentTimestamp),
            _ => FieldValue::Literal(SqlValue::Text(text.to_string())),
        }
    }

    pub fn text(s: impl Into<String>) -> FieldValue {
        FieldValue::Literal(SqlValue::Text(s.into()))
    }
}
