//! Session id from the `crud_session` cookie, minted when absent.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue},
};
use cookie::{Cookie, SameSite};

pub const SESSION_COOKIE: &str = "crud_session";

/// Extractor for the client's session id. `fresh` ids were minted for this request
/// and must be sent back with [`SessionId::set_cookie`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionId {
    pub id: String,
    pub fresh: bool,
}

impl SessionId {
    pub fn mint() -> Self {
        SessionId {
            id: uuid::Uuid::new_v4().simple().to_string(),
            fresh: true,
        }
    }

    pub fn cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, self.id.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }

    /// `Set-Cookie` value for a fresh id.
    pub fn set_cookie(&self) -> Option<HeaderValue> {
        if !self.fresh {
            return None;
        }
        HeaderValue::from_str(&self.cookie().to_string()).ok()
    }
}

/// The session id in one `Cookie` header, if it holds a well-formed one.
fn from_cookie_header(value: &str) -> Option<String> {
    Cookie::split_parse(value)
        .filter_map(Result::ok)
        .filter(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value_trimmed().to_string())
        .find(|v| uuid::Uuid::parse_str(v).is_ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let existing = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(from_cookie_header);
        Ok(match existing {
            Some(id) => SessionId { id, fresh: false },
            None => SessionId::mint(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_cookie_among_others() {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let header = format!("theme=dark; crud_session={}; lang=en", id);
        assert_eq!(from_cookie_header(&header), Some(id));
    }

    #[test]
    fn reads_quoted_cookie_value() {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let header = format!("crud_session=\"{}\"", id);
        assert_eq!(from_cookie_header(&header), Some(id));
    }

    #[test]
    fn rejects_malformed_ids() {
        assert_eq!(from_cookie_header("crud_session=../../etc"), None);
        assert_eq!(from_cookie_header("other=1"), None);
    }

    #[test]
    fn only_fresh_ids_set_a_cookie() {
        let fresh = SessionId::mint();
        let header = fresh.set_cookie().unwrap();
        let parsed = Cookie::parse(header.to_str().unwrap().to_string()).unwrap();
        assert_eq!(parsed.name(), SESSION_COOKIE);
        assert_eq!(parsed.value(), fresh.id);
        assert_eq!(parsed.http_only(), Some(true));
        assert_eq!(parsed.same_site(), Some(SameSite::Lax));
        assert_eq!(parsed.path(), Some("/"));
        let known = SessionId { id: fresh.id, fresh: false };
        assert_eq!(known.set_cookie(), None);
    }
}
