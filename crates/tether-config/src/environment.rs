use std::fmt;

use serde::Deserialize;

/// Deployment environment of the calling service
///
/// Unrecognized names fall back to `Localhost`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Environment {
    #[default]
    Localhost,
    Development,
    Staging,
    Production,
}

impl Environment {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Localhost => "localhost",
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl From<&str> for Environment {
    fn from(name: &str) -> Self {
        match name {
            "development" => Self::Development,
            "staging" => Self::Staging,
            "production" => Self::Production,
            _ => Self::Localhost,
        }
    }
}

impl From<String> for Environment {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
