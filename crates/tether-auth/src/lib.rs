#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Credential sources for the `Authorization` header
//!
//! [`Credentials`] selects between URL userinfo, a static token and an
//! OAuth2 authorization-code exchange with PKCE ([`pkce::PkceFlow`]).

mod credentials;
pub mod pkce;

pub use credentials::{Credentials, authorization_header};
pub use pkce::PkceFlow;
