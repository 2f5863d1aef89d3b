//! CWMP endpoint
//!
//! `POST /acs` carries one leg of a CWMP exchange. The device's session is
//! tracked with a cookie; the serial bound to it lives in [`SessionRepo`].

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use super::ApiState;
use crate::Result;
use crate::cwmp::{self, DeviceSession, Dispatcher, NextAction, SessionStore, encoder::BANNER_TEXT};
use crate::db::SessionRepo;

/// Reply to a POST whose content type is not `text/xml`
pub const WRONG_CONTENT_TYPE_TEXT: &str = "Wrong content type";

/// Reply to any method other than GET/POST on `/acs`
pub const NOTHING_TO_SHOW_TEXT: &str = "There is nothing to show";

async fn banner() -> &'static str {
    BANNER_TEXT
}

async fn nothing_to_show() -> &'static str {
    NOTHING_TO_SHOW_TEXT
}

/// Main CWMP entry point
async fn acs(State(state): State<Arc<ApiState>>, headers: HeaderMap, body: Bytes) -> Response {
    if !is_xml(&headers) {
        tracing::debug!(content_type = ?headers.get(header::CONTENT_TYPE), "rejecting request");
        return WRONG_CONTENT_TYPE_TEXT.into_response();
    }

    let session_id = session_cookie(&headers, &state.session_cookie);

    match exchange(&state, session_id.as_deref(), &body) {
        Ok((action, new_session)) => {
            let mut response = encode(&action);
            if let Some(id) = new_session {
                set_session_cookie(&mut response, &state.session_cookie, &id);
            }
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "CWMP exchange failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

/// Run one exchange; returns the action and a session id to hand out, if a
/// new session was created
fn exchange(
    state: &ApiState,
    session_id: Option<&str>,
    body: &[u8],
) -> Result<(NextAction, Option<String>)> {
    let stored = match session_id {
        Some(id) => state.sessions.serial(id)?,
        None => None,
    };
    let mut session = DeviceSession::restored(stored);

    let action = Dispatcher::new(&state.ledger, state.params.as_ref())
        .dispatch(&mut session, cwmp::read(body))?;

    let mut new_session = None;
    if let (true, Some(serial)) = (session.is_dirty(), session.serial()) {
        let id = session_id.map_or_else(SessionRepo::new_id, ToString::to_string);
        state.sessions.set_serial(&id, serial)?;
        if session_id.is_none() {
            new_session = Some(id);
        }
    }

    Ok((action, new_session))
}

/// Whether the request's media type is `text/xml`, ignoring parameters
fn is_xml(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("text/xml"))
}

/// Session id from the request cookies; ids we could not have issued are
/// ignored
fn session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim_matches('"'))
        .filter(|v| is_session_id(v))
        .map(ToString::to_string)
}

fn is_session_id(value: &str) -> bool {
    value.len() == 32 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn set_session_cookie(response: &mut Response, name: &str, id: &str) {
    match HeaderValue::from_str(&format!("{name}={id}; Path=/; HttpOnly")) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(error = %e, "failed to build session cookie"),
    }
}

/// Turn a decided action into an HTTP response
fn encode(action: &NextAction) -> Response {
    let encoded = cwmp::encode(action);
    let mut response = (
        [(header::CONTENT_TYPE, encoded.content_type)],
        encoded.body,
    )
        .into_response();

    for (name, value) in encoded.headers {
        match HeaderName::from_bytes(name.as_bytes()) {
            Ok(name) => {
                response
                    .headers_mut()
                    .insert(name, HeaderValue::from_static(value));
            }
            Err(e) => tracing::warn!(header = name, error = %e, "invalid response header"),
        }
    }

    response
}

/// Build the CWMP router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(banner).post(banner))
        .route("/acs", get(banner).post(acs).fallback(nothing_to_show))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_is_xml() {
        assert!(is_xml(&headers(&[(header::CONTENT_TYPE, "text/xml")])));
        assert!(is_xml(&headers(&[(header::CONTENT_TYPE, "text/xml; charset=\"utf-8\"")])));
        assert!(is_xml(&headers(&[(header::CONTENT_TYPE, "TEXT/XML")])));
        assert!(!is_xml(&headers(&[(header::CONTENT_TYPE, "application/json")])));
        assert!(!is_xml(&HeaderMap::new()));
    }

    #[test]
    fn test_session_cookie_lookup() {
        let id = SessionRepo::new_id();
        let cookie = format!("other=1; acs_session={id}");
        let map = headers(&[(header::COOKIE, cookie.as_str())]);
        assert_eq!(session_cookie(&map, "acs_session"), Some(id.clone()));
        assert_eq!(session_cookie(&map, "sid"), None);

        let cookie = format!("acs_session={id}");
        let split = headers(&[(header::COOKIE, "a=b"), (header::COOKIE, cookie.as_str())]);
        assert_eq!(session_cookie(&split, "acs_session"), Some(id));
    }

    #[test]
    fn test_foreign_session_ids_are_ignored() {
        let map = headers(&[(header::COOKIE, "acs_session=../../etc/passwd")]);
        assert_eq!(session_cookie(&map, "acs_session"), None);

        let upper = headers(&[(header::COOKIE, "acs_session=ABCDEF0123456789ABCDEF0123456789")]);
        assert_eq!(session_cookie(&upper, "acs_session"), None);
    }

    #[test]
    fn test_encode_sets_server_headers() {
        let response = encode(&NextAction::InformAck {
            cwmp_id: Some("1".to_string()),
        });
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            cwmp::encoder::CONTENT_TYPE_XML_UTF8
        );
        assert_eq!(response.headers()["soapserver"], cwmp::encoder::SERVER_BANNER);
        assert_eq!(response.headers()[header::SERVER], cwmp::encoder::SERVER_BANNER);
    }
}
