//! Generic JSON-over-HTTP request wrapper.
//!
//! # Overview
//! A [`NetworkCaller<T>`] describes one request shape: base URL, path,
//! method, optional JSON parameters and the type `T` the response decodes
//! into. Executing it builds an [`HttpRequest`], sends it through a
//! [`Transport`], checks for a 2xx status and decodes the body, resolving a
//! single-value [`Call<T>`].
//!
//! # Design
//! - Building is pure ([`RequestBuilder`]); I/O lives behind the
//!   [`Transport`] trait, with a lazily created process-wide reqwest
//!   transport as the default.
//! - Response keys are converted from `snake_case` to `camelCase` and matched
//!   case-insensitively; dates decode from ISO-8601 text ([`Timestamp`]).
//! - Every failure, including an unparseable URL, resolves the call with an
//!   [`ApiError`]; nothing panics and nothing is retried.
//! - No retries, caching, timeouts or auth are layered on top of the transport.

pub mod builder;
pub mod call;
pub mod caller;
pub mod decode;
pub mod error;
pub mod executor;
pub mod http;
pub mod transport;

pub use builder::RequestBuilder;
pub use call::{Call, Subscription};
pub use caller::NetworkCaller;
pub use decode::{iso8601, Decoder, KeyDecoding, Timestamp};
pub use error::{ApiError, ApiErrorKind, Result, UrlError};
pub use http::{HttpRequest, HttpResponse, Method, Parameters, UnknownMethod};
pub use executor::RequestExecutor;
pub use transport::{shared_transport, ReqwestTransport, Transport, TransportError};
