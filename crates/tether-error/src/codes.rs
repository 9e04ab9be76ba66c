use std::fmt;

/// Application-level error code (the `1000..=1007` space)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(u16);

impl ErrorCode {
    pub const INVALID_REQUEST: Self = Self(1000);
    pub const UNAUTHORIZED_CLIENT: Self = Self(1001);
    pub const ACCESS_DENIED: Self = Self(1002);
    pub const SERVER_ERROR: Self = Self(1003);
    pub const TEMPORARILY_UNAVAILABLE: Self = Self(1004);
    pub const INVALID_CLIENT: Self = Self(1005);
    pub const INVALID_GRANT: Self = Self(1006);
    pub const UNSUPPORTED_GRANT_TYPE: Self = Self(1007);

    /// Wrap a raw code, registered or not
    pub const fn from_u16(code: u16) -> Self {
        Self(code)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Human description, empty for unregistered codes
    pub const fn description(self) -> &'static str {
        match self.0 {
            1000 => "The request is invalid",
            1001 => "The client is not authorized to access the requested resource",
            1002 => "Access to the requested resource is denied",
            1003 => "The server encountered an internal error while processing the request",
            1004 => "The requested resource is temporarily unavailable",
            1005 => "The client is invalid or not recognized",
            1006 => "The grant or authorization code is invalid or expired",
            1007 => "The grant type requested is not supported by the server",
            _ => "",
        }
    }

    /// Whether a raw code belongs to the application space
    pub const fn is_application(code: u16) -> bool {
        code >= 1000 && code < 2000
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP-aligned status code
///
/// Any status received from a backend can be carried; only the registered
/// ones have a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: Self = Self(200);
    pub const CREATED: Self = Self(201);
    pub const ACCEPTED: Self = Self(202);
    pub const NO_CONTENT: Self = Self(204);
    pub const MOVED_PERMANENTLY: Self = Self(301);
    pub const FOUND: Self = Self(302);
    pub const SEE_OTHER: Self = Self(303);
    pub const NOT_MODIFIED: Self = Self(304);
    pub const TEMPORARY_REDIRECT: Self = Self(307);
    pub const BAD_REQUEST: Self = Self(400);
    pub const UNAUTHORIZED: Self = Self(401);
    pub const FORBIDDEN: Self = Self(403);
    pub const NOT_FOUND: Self = Self(404);
    pub const METHOD_NOT_ALLOWED: Self = Self(405);
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);
    pub const SERVICE_UNAVAILABLE: Self = Self(503);

    pub const fn from_u16(code: u16) -> Self {
        Self(code)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Brief description, empty for unregistered statuses
    pub const fn description(self) -> &'static str {
        match self.0 {
            200 => "Request successful",
            201 => "Resource created",
            202 => "Request accepted",
            204 => "No content to return",
            301 => "Resource moved permanently",
            302 => "Resource temporarily moved",
            303 => "Response at a different URL",
            304 => "Resource not modified",
            307 => "Temporarily redirected",
            400 => "Invalid request",
            401 => "Authentication required",
            403 => "Request forbidden",
            404 => "Resource not found",
            405 => "Method not allowed",
            500 => "Server error",
            503 => "Service unavailable",
            _ => "",
        }
    }
}

impl From<http::StatusCode> for StatusCode {
    fn from(status: http::StatusCode) -> Self {
        Self(status.as_u16())
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
