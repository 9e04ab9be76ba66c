use std::fmt::Display;

use http::Method;
use serde::Serialize;
use tether_error::{Result, StructuredError};

/// One request: method, endpoint pattern, positional arguments and body
///
/// The pattern accepts `%s`, `%d` and `%v`, each consuming the next
/// argument, and `%%` for a literal percent sign.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: Method,
    endpoint: String,
    args: Vec<String>,
    body: Option<String>,
}

impl RequestTemplate {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            args: Vec::new(),
            body: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    /// Append one positional argument
    #[must_use]
    pub fn arg(mut self, value: impl Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Append several positional arguments
    #[must_use]
    pub fn args<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        self.args.extend(values.into_iter().map(|v| v.to_string()));
        self
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let encoded = serde_json::to_string(body)
            .map_err(|e| StructuredError::internal(format!("failed to encode request body: {e}")))?;
        self.body = Some(encoded);
        Ok(self)
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Substitute the arguments into the endpoint pattern
    ///
    /// Missing, surplus or non-integer `%d` arguments are internal errors.
    pub fn render(&self) -> Result<String> {
        let mut rendered = String::with_capacity(self.endpoint.len());
        let mut args = self.args.iter();
        let mut chars = self.endpoint.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                rendered.push(c);
                continue;
            }

            match chars.next() {
                Some('%') => rendered.push('%'),
                Some(verb @ ('s' | 'd' | 'v')) => {
                    let Some(arg) = args.next() else {
                        return Err(self.render_error(format!("missing argument for %{verb}")));
                    };

                    if verb == 'd' && arg.parse::<i64>().is_err() {
                        return Err(self.render_error(format!("%d expects an integer, got '{arg}'")));
                    }

                    rendered.push_str(arg);
                }
                Some(other) => return Err(self.render_error(format!("unsupported verb %{other}"))),
                None => return Err(self.render_error("trailing %".to_owned())),
            }
        }

        if args.next().is_some() {
            return Err(self.render_error(format!("{} arguments given, pattern uses fewer", self.args.len())));
        }

        Ok(rendered)
    }

    fn render_error(&self, reason: String) -> StructuredError {
        StructuredError::internal(format!("cannot render endpoint '{}': {reason}", self.endpoint))
    }
}
