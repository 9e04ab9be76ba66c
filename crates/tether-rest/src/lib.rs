#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! REST client bound to one base URL and one fixed header set
//!
//! Requests are described by a [`RequestTemplate`] whose endpoint pattern
//! takes printf-style positional arguments. [`RestClient::request`] decodes a
//! JSON response, [`RestClient::download_multipart`] streams every part of a
//! `multipart/form-data` response to disk, and
//! [`RestClient::execute_with_retry`] runs either under the retry loop.

mod client;
mod kind;
mod multipart;
mod template;

pub use client::RestClient;
pub use kind::{Outcome, RequestKind};
pub use template::RequestTemplate;

/// Content type sent with JSON requests
pub const JSON_CONTENT_TYPE: &str = "application/json";
