//! Purpose: Cookie records exchanged with the host and produced by the login utility.
//! Exports: `CookieRecord`.
//! Role: Credential input for `Initialize`; output format of `x-login`.
//! Invariants: Serializes with PascalCase keys; deserializes PascalCase or lower/snake case.
//! Invariants: Unknown keys (e.g. `MaxAge`, `Raw`, `SameSite`) are ignored on input.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CookieRecord {
    #[serde(alias = "name")]
    pub name: String,
    #[serde(alias = "value")]
    pub value: String,
    #[serde(default, alias = "domain", skip_serializing_if = "is_blank")]
    pub domain: Option<String>,
    #[serde(default, alias = "path", skip_serializing_if = "is_blank")]
    pub path: Option<String>,
    /// RFC 3339 timestamp.
    #[serde(default, alias = "expires", skip_serializing_if = "is_blank")]
    pub expires: Option<String>,
    #[serde(default, alias = "secure")]
    pub secure: bool,
    #[serde(default, alias = "http_only", alias = "httpOnly")]
    pub http_only: bool,
}

impl CookieRecord {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}
