use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codes::{ErrorCode, StatusCode};

/// Structured payload attached to an error
pub type Payload = Map<String, Value>;

/// Returned when a JSON error envelope cannot be decoded
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The bytes are not a valid envelope
    #[error("malformed error envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Which code space an error belongs to, with the annotation that space carries
#[derive(Debug, Clone, PartialEq, Eq)]
enum Origin {
    Application { service: Option<String> },
    Http { uri: Option<String> },
}

/// Uniform error returned by every tether operation
///
/// Serializes to `{"code", "description", "service"?, "comment"?, "uri"?, "payload"?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Envelope", from = "Envelope")]
pub struct StructuredError {
    code: u16,
    description: String,
    origin: Origin,
    comment: Option<String>,
    payload: Option<Payload>,
}

impl StructuredError {
    /// Error in the application code space
    pub fn application(code: ErrorCode) -> Self {
        Self {
            code: code.as_u16(),
            description: code.description().to_owned(),
            origin: Origin::Application { service: None },
            comment: None,
            payload: None,
        }
    }

    /// Error in the HTTP status space
    pub fn http(status: impl Into<StatusCode>) -> Self {
        let status = status.into();
        Self {
            code: status.as_u16(),
            description: status.description().to_owned(),
            origin: Origin::Http { uri: None },
            comment: None,
            payload: None,
        }
    }

    /// `400` carrying a comment
    pub fn bad_request(comment: impl Into<String>) -> Self {
        Self::http(StatusCode::BAD_REQUEST).with_comment(comment)
    }

    /// `500` carrying a comment
    pub fn internal(comment: impl Into<String>) -> Self {
        Self::http(StatusCode::INTERNAL_SERVER_ERROR).with_comment(comment)
    }

    /// `503` carrying a comment
    pub fn unavailable(comment: impl Into<String>) -> Self {
        Self::http(StatusCode::SERVICE_UNAVAILABLE).with_comment(comment)
    }

    /// Annotate with the originating service; ignored for HTTP errors
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        if let Origin::Application { service: slot } = &mut self.origin {
            *slot = non_empty(service.into());
        }
        self
    }

    /// Annotate with the request URI; ignored for application errors
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        if let Origin::Http { uri: slot } = &mut self.origin {
            *slot = non_empty(uri.into());
        }
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = non_empty(comment.into());
        self
    }

    pub const fn code(&self) -> u16 {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn service(&self) -> Option<&str> {
        match &self.origin {
            Origin::Application { service } => service.as_deref(),
            Origin::Http { .. } => None,
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match &self.origin {
            Origin::Http { uri } => uri.as_deref(),
            Origin::Application { .. } => None,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub const fn is_application(&self) -> bool {
        matches!(self.origin, Origin::Application { .. })
    }

    pub const fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Attach a payload; an empty map keeps whatever was set before
    pub fn set_payload(&mut self, payload: Payload) {
        if !payload.is_empty() {
            self.payload = Some(payload);
        }
    }

    /// Encode as the JSON envelope
    pub fn to_json(&self) -> String {
        // Envelope holds only strings, integers and a JSON map
        serde_json::to_string(&Envelope::from(self.clone())).unwrap_or_default()
    }

    /// Decode a JSON envelope
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError::Malformed` if the bytes are not a valid envelope
    pub fn from_json(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let envelope: Envelope = serde_json::from_slice(bytes)?;
        Ok(envelope.into())
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, annotation) = match &self.origin {
            Origin::Application { service } => ("Service", service.as_deref()),
            Origin::Http { uri } => ("Uri", uri.as_deref()),
        };

        match (annotation, self.comment.as_deref()) {
            (Some(a), None) => write!(f, "{} : {}, {label}: {a}", self.code, self.description),
            (None, Some(c)) => write!(f, "{} : {}, Comment: {c}", self.code, self.description),
            (Some(a), Some(c)) => write!(f, "{} : {}, {label}: {a}, Comment: {c}", self.code, self.description),
            (None, None) => write!(f, "{} : {}", self.code, self.description),
        }
    }
}

impl std::error::Error for StructuredError {}

/// Wire shape of the error envelope
#[derive(Serialize, Deserialize)]
struct Envelope {
    code: u16,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Payload>,
}

impl From<StructuredError> for Envelope {
    fn from(error: StructuredError) -> Self {
        let (service, uri) = match error.origin {
            Origin::Application { service } => (service, None),
            Origin::Http { uri } => (None, uri),
        };

        Self {
            code: error.code,
            description: error.description,
            service,
            comment: error.comment,
            uri,
            payload: error.payload.filter(|p| !p.is_empty()),
        }
    }
}

impl From<Envelope> for StructuredError {
    fn from(envelope: Envelope) -> Self {
        let origin = if envelope.uri.is_some() {
            Origin::Http {
                uri: envelope.uri.and_then(non_empty),
            }
        } else if envelope.service.is_some() || ErrorCode::is_application(envelope.code) {
            Origin::Application {
                service: envelope.service.and_then(non_empty),
            }
        } else {
            Origin::Http { uri: None }
        };

        Self {
            code: envelope.code,
            description: envelope.description,
            origin,
            comment: envelope.comment.and_then(non_empty),
            payload: envelope.payload.filter(|p| !p.is_empty()),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_payload() -> Payload {
        let mut payload = Payload::new();
        payload.insert("string".to_owned(), json!("a string"));
        payload.insert("int".to_owned(), json!(34.0));
        payload
    }

    #[test]
    fn application_error_basic() {
        let err = StructuredError::application(ErrorCode::INVALID_REQUEST);
        assert_eq!(err.to_string(), "1000 : The request is invalid");
    }

    #[test]
    fn application_error_with_service() {
        let err = StructuredError::application(ErrorCode::UNAUTHORIZED_CLIENT).with_service("serviceX");
        assert_eq!(
            err.to_string(),
            "1001 : The client is not authorized to access the requested resource, Service: serviceX"
        );
    }

    #[test]
    fn application_error_with_service_and_comment() {
        let err = StructuredError::application(ErrorCode::SERVER_ERROR)
            .with_service("serviceX")
            .with_comment("A specific comment");
        assert_eq!(
            err.to_string(),
            "1003 : The server encountered an internal error while processing the request, Service: serviceX, Comment: A specific comment"
        );
    }

    #[test]
    fn application_error_with_comment_only() {
        let err = StructuredError::application(ErrorCode::SERVER_ERROR)
            .with_service("")
            .with_comment("A specific comment");
        assert_eq!(
            err.to_string(),
            "1003 : The server encountered an internal error while processing the request, Comment: A specific comment"
        );
    }

    #[test]
    fn application_error_to_json_omits_unset_fields() {
        let err = StructuredError::application(ErrorCode::SERVER_ERROR).with_comment("A specific comment");
        assert_eq!(
            err.to_json(),
            r#"{"code":1003,"description":"The server encountered an internal error while processing the request","comment":"A specific comment"}"#
        );
    }

    #[test]
    fn application_error_round_trips_with_payload() {
        let mut err = StructuredError::application(ErrorCode::INVALID_CLIENT)
            .with_service("newService")
            .with_comment("newComment");
        err.set_payload(sample_payload());

        let decoded = StructuredError::from_json(err.to_json().as_bytes()).unwrap();

        assert_eq!(decoded.code(), 1005);
        assert_eq!(decoded.description(), "The client is invalid or not recognized");
        assert_eq!(decoded.service(), Some("newService"));
        assert_eq!(decoded.comment(), Some("newComment"));
        assert_eq!(decoded.payload().unwrap()["string"], json!("a string"));
        assert_eq!(decoded.payload().unwrap()["int"], json!(34.0));
        assert_eq!(decoded, err);
    }

    #[test]
    fn http_status_basic() {
        assert_eq!(StructuredError::http(StatusCode::OK).to_string(), "200 : Request successful");
    }

    #[test]
    fn http_status_with_uri() {
        let err = StructuredError::http(StatusCode::NOT_FOUND).with_uri("/my/path/status");
        assert_eq!(err.to_string(), "404 : Resource not found, Uri: /my/path/status");
    }

    #[test]
    fn http_status_with_uri_and_comment() {
        let err = StructuredError::http(StatusCode::FORBIDDEN)
            .with_uri("/forbidden/path/ddd")
            .with_comment("Private area");
        assert_eq!(
            err.to_string(),
            "403 : Request forbidden, Uri: /forbidden/path/ddd, Comment: Private area"
        );
    }

    #[test]
    fn http_status_with_comment_only() {
        let err = StructuredError::internal("A specific comment");
        assert_eq!(err.to_string(), "500 : Server error, Comment: A specific comment");
    }

    #[test]
    fn http_status_to_json() {
        let err = StructuredError::bad_request("A specific comment");
        assert_eq!(
            err.to_json(),
            r#"{"code":400,"description":"Invalid request","comment":"A specific comment"}"#
        );
    }

    #[test]
    fn http_status_round_trips_uri_and_comment() {
        let err = StructuredError::http(StatusCode::CREATED)
            .with_uri("/the/path")
            .with_comment("That's ok !!!");

        let decoded = StructuredError::from_json(err.to_json().as_bytes()).unwrap();

        assert_eq!(decoded.code(), 201);
        assert_eq!(decoded.description(), "Resource created");
        assert_eq!(decoded.uri(), Some("/the/path"));
        assert_eq!(decoded.comment(), Some("That's ok !!!"));
        assert!(!decoded.is_application());
    }

    #[test]
    fn http_status_round_trips_bare() {
        let mut err = StructuredError::http(StatusCode::NO_CONTENT);
        err.set_payload(sample_payload());

        let decoded = StructuredError::from_json(err.to_json().as_bytes()).unwrap();

        assert_eq!(decoded.code(), 204);
        assert_eq!(decoded.description(), "No content to return");
        assert_eq!(decoded.uri(), None);
        assert_eq!(decoded.comment(), None);
        assert_eq!(decoded.payload(), err.payload());
    }

    #[test]
    fn empty_payload_keeps_previous_payload() {
        let mut err = StructuredError::http(StatusCode::FOUND);
        err.set_payload(sample_payload());
        err.set_payload(Payload::new());

        assert_eq!(err.payload().map(Map::len), Some(2));
    }

    #[test]
    fn malformed_envelope_is_a_decode_error() {
        let err = StructuredError::from_json(b"{\"code\": \"not a number\"}").unwrap_err();
        assert!(matches!(err, EnvelopeError::Malformed(_)));
    }

    #[test]
    fn decoding_picks_code_space_from_code_range() {
        let app = StructuredError::from_json(br#"{"code":1002,"description":"x"}"#).unwrap();
        assert!(app.is_application());

        let http = StructuredError::from_json(br#"{"code":502,"description":""}"#).unwrap();
        assert!(!http.is_application());
    }

    #[test]
    fn service_is_ignored_on_http_errors() {
        let err = StructuredError::http(StatusCode::BAD_REQUEST).with_service("svc");
        assert_eq!(err.service(), None);
        assert_eq!(err.to_string(), "400 : Invalid request");
    }

    #[test]
    fn serde_uses_envelope_shape() {
        let err = StructuredError::http(StatusCode::NOT_FOUND).with_uri("/items/42");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(
            value,
            json!({"code": 404, "description": "Resource not found", "uri": "/items/42"})
        );
    }
}
