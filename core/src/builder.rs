//! Turns a base URL, path, method and parameters into an [`HttpRequest`].
//!
//! # Design
//! Building is pure: no I/O and no shared state, so the same inputs always
//! produce the same request. Only spaces are percent-encoded in the joined
//! URL. A joined string holding any character RFC 3986 does not allow (`{`,
//! `|`, `"`, non-ASCII, a `%` not followed by two hex digits) is rejected
//! with `ApiError::InvalidUrl` rather than encoded, as is anything else the
//! URL parser refuses.
//!
//! A string that passes goes through `url::Url`, which still normalizes a
//! few things on the wire: a bare authority gains a trailing `/`, the host
//! is lowercased, a scheme's default port is dropped and `.`/`..` path
//! segments are resolved.
//!
//! Query items are percent-encoded individually. A space travels as `%20`,
//! `&`, `=`, `#` and `%` are escaped, and `+` is sent as is.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{ApiError, UrlError};
use crate::http::{HttpRequest, Method, Parameters};

pub const CONTENT_TYPE: &str = "content-type";
pub const APPLICATION_JSON: &str = "application/json";

/// Characters left as they are in a query item name or value.
const QUERY_ITEM_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b':')
    .remove(b'@')
    .remove(b'/')
    .remove(b'?');

/// Stateless builder bound to a base URL.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: String,
}

impl RequestBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the request for `url_path` relative to the base URL.
    ///
    /// `GET` parameters become query items (any query already on the URL is
    /// replaced); every other method sends them as a JSON object body.
    #[tracing::instrument(skip(self, parameters), fields(base_url = %self.base_url), err(Display))]
    pub fn build(
        &self,
        url_path: &str,
        method: Method,
        parameters: Option<&Parameters>,
    ) -> Result<HttpRequest, ApiError> {
        let joined = join_url(&self.base_url, url_path);
        let mut url = parse_url(&joined).map_err(|source| ApiError::InvalidUrl {
            url: joined.clone(),
            source,
        })?;

        let mut body = None;
        if let Some(params) = parameters {
            if method.sends_body() {
                let bytes = serde_json::to_vec(params).map_err(|e| {
                    debug!(error = %e, "parameters could not be encoded as JSON");
                    ApiError::UnknownError
                })?;
                body = Some(bytes);
            } else {
                attach_query(&mut url, params);
            }
        }

        debug!(%method, %url, has_body = body.is_some(), "built request");
        Ok(HttpRequest {
            method,
            url,
            headers: vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())],
            body,
        })
    }
}

/// Concatenate base and path, encoding spaces and nothing else.
pub fn join_url(base_url: &str, url_path: &str) -> String {
    format!("{base_url}{url_path}").replace(' ', "%20")
}

/// Text form of a parameter value when it travels in a query string.
///
/// Strings go verbatim; numbers, booleans, null, arrays and objects use their
/// compact JSON text.
pub fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_url(joined: &str) -> Result<Url, UrlError> {
    check_uri_chars(joined)?;
    Ok(Url::parse(joined)?)
}

/// Reject anything outside RFC 3986's unreserved and reserved sets, and any
/// `%` that does not start a two-digit hex escape.
fn check_uri_chars(joined: &str) -> Result<(), UrlError> {
    let bytes = joined.as_bytes();
    for (i, c) in joined.char_indices() {
        match c {
            '%' => {
                let escape = bytes.get(i + 1..i + 3);
                if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                    return Err(UrlError::MalformedEscape(i));
                }
            }
            c if c.is_ascii_alphanumeric() || "-._~:/?#[]@!$&'()*+,;=".contains(c) => {}
            other => return Err(UrlError::DisallowedCharacter(other)),
        }
    }
    Ok(())
}

fn encode_query_item(text: &str) -> String {
    utf8_percent_encode(text, QUERY_ITEM_SET).to_string()
}

fn attach_query(url: &mut Url, params: &Parameters) {
    if params.is_empty() {
        url.set_query(None);
        return;
    }
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_query_item(k), encode_query_item(&query_value(v))))
        .collect::<Vec<_>>()
        .join("&");
    url.set_query(Some(query.as_str()));
}
