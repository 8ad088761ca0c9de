//! Parameter sources.
//!
//! A declared handler parameter names where its value comes from
//! ([`ParamType`]) and, optionally, what shape the raw text must be coerced
//! into ([`ParamFormat`]). Drivers receive a [`ParamSource`] when asked to
//! read a value out of a request.

use std::fmt;

/// Where a parameter value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// One path segment, by name.
    Path,
    /// One query-string value, by name.
    Query,
    /// The whole query string as a map.
    Queries,
    /// One header, by name.
    Header,
    /// Every header as a map.
    Headers,
    /// One cookie, by name.
    Cookie,
    /// Every cookie as a map.
    Cookies,
    /// The request body.
    Body,
    /// One field of a JSON body, by name.
    BodyParam,
    /// The session, or one session value by name.
    Session,
    /// One uploaded file, by form field name.
    UploadedFile,
    /// Every file uploaded under a form field name.
    UploadedFiles,
    /// The raw request.
    Request,
    /// The response handle.
    Response,
}

impl ParamType {
    /// Lowercase identifier used in error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Queries => "queries",
            Self::Header => "header",
            Self::Headers => "headers",
            Self::Cookie => "cookie",
            Self::Cookies => "cookies",
            Self::Body => "body",
            Self::BodyParam => "body-param",
            Self::Session => "session",
            Self::UploadedFile => "file",
            Self::UploadedFiles => "files",
            Self::Request => "request",
            Self::Response => "response",
        }
    }

    /// True for sources that never carry text needing coercion.
    #[must_use]
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::Queries
                | Self::Headers
                | Self::Cookies
                | Self::UploadedFile
                | Self::UploadedFiles
                | Self::Request
                | Self::Response
        )
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected shape of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamFormat {
    /// Keep the text.
    String,
    /// Floating-point number.
    Number,
    /// Whole number.
    Integer,
    /// `true`/`false`/`1`/`0`.
    Boolean,
    /// Any JSON document.
    Json,
}

impl ParamFormat {
    /// Name used in normalization errors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ParamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a driver needs to read one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSource {
    /// Source kind.
    pub kind: ParamType,
    /// Name for named sources.
    pub name: Option<String>,
    /// Parse the body as JSON regardless of its content type.
    pub json_body: bool,
}

impl ParamSource {
    /// Source without a name.
    #[must_use]
    pub fn new(kind: ParamType) -> Self {
        Self {
            kind,
            name: None,
            json_body: false,
        }
    }

    /// Named source.
    #[must_use]
    pub fn named(kind: ParamType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            json_body: false,
        }
    }

    /// Sets the JSON body flag.
    #[must_use]
    pub fn json_body(mut self, json_body: bool) -> Self {
        self.json_body = json_body;
        self
    }
}
