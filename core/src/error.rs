//! Error types for the network caller.
//!
//! # Design
//! The taxonomy is closed: seven kinds, every failure surfaces through the
//! same `Result` a call resolves to. `ServerOffline` keeps its historical name
//! even though it covers every non-2xx status and every transport failure;
//! callers match on it, so the name and trigger stay as they are.
//!
//! `InvalidDateFormat`, `InvalidMemoryType`, `DataNotFound` and
//! `UnknownError` are never produced by the library itself. They exist so
//! callers can report their own failures in the same vocabulary.

/// Errors returned by a network call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// `base_url + url_path` did not parse as a URL after space encoding.
    #[error("Invalid URL")]
    InvalidUrl {
        url: String,
        #[source]
        source: UrlError,
    },

    #[error("Invalid date format")]
    InvalidDateFormat,

    #[error("Invalid memory type")]
    InvalidMemoryType,

    /// The body was received but did not decode into the requested type.
    #[error("Response could not be decoded")]
    ErrorDecoding(#[source] serde_json::Error),

    #[error("Data not found")]
    DataNotFound,

    /// Non-2xx status, or no HTTP response at all (`status` is `None`).
    #[error("Service unavailable at the moment, please try again later")]
    ServerOffline { status: Option<u16> },

    #[error("Error is Unknown")]
    UnknownError,
}

/// Why a joined URL string was rejected.
#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error("character {0:?} is not allowed in a URL")]
    DisallowedCharacter(char),
    #[error("malformed percent-escape at byte {0}")]
    MalformedEscape(usize),
    #[error(transparent)]
    Parse(#[from] url::ParseError),
}

/// The kind of an [`ApiError`] without its diagnostic payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    InvalidUrl,
    InvalidDateFormat,
    InvalidMemoryType,
    ErrorDecoding,
    DataNotFound,
    ServerOffline,
    UnknownError,
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::InvalidUrl { .. } => ApiErrorKind::InvalidUrl,
            ApiError::InvalidDateFormat => ApiErrorKind::InvalidDateFormat,
            ApiError::InvalidMemoryType => ApiErrorKind::InvalidMemoryType,
            ApiError::ErrorDecoding(_) => ApiErrorKind::ErrorDecoding,
            ApiError::DataNotFound => ApiErrorKind::DataNotFound,
            ApiError::ServerOffline { .. } => ApiErrorKind::ServerOffline,
            ApiError::UnknownError => ApiErrorKind::UnknownError,
        }
    }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(ApiError::InvalidDateFormat.to_string(), "Invalid date format");
        assert_eq!(ApiError::DataNotFound.to_string(), "Data not found");
        assert_eq!(
            ApiError::ServerOffline { status: Some(404) }.to_string(),
            "Service unavailable at the moment, please try again later"
        );
        assert_eq!(ApiError::UnknownError.to_string(), "Error is Unknown");
    }

    #[test]
    fn decoding_error_keeps_the_decoder_detail() {
        let inner = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let detail = inner.to_string();
        let err = ApiError::ErrorDecoding(inner);
        assert_eq!(err.kind(), ApiErrorKind::ErrorDecoding);
        assert_eq!(err.source().unwrap().to_string(), detail);
    }

    #[test]
    fn invalid_url_keeps_the_offending_string() {
        let source = url::Url::parse("nope").unwrap_err();
        let err = ApiError::InvalidUrl {
            url: "nope".to_string(),
            source: source.into(),
        };
        assert_eq!(err.kind(), ApiErrorKind::InvalidUrl);
        assert_eq!(err.to_string(), "Invalid URL");
        assert_eq!(err.source().unwrap().to_string(), source.to_string());

        let err = ApiError::InvalidUrl {
            url: "/q/{id}".to_string(),
            source: UrlError::DisallowedCharacter('{'),
        };
        assert_eq!(
            err.source().unwrap().to_string(),
            "character '{' is not allowed in a URL"
        );
    }
}
