//! Print server endpoint and connection URL composition.
//!
//! The print server identifies an agent by organisation id and authenticates
//! it with an API key carried in the query string.  Both values are opaque
//! tokens: the agent never inspects them beyond checking they are present.
//!
//! ```text
//! <base_url><org_id>/?key=<api_key>
//! wss://api.example.com/ws/print/org-42/?key=s3cret
//! ```

use std::fmt;

use thiserror::Error;

/// Error returned when an [`Endpoint`] is built from incomplete settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// A required field was empty (or only whitespace).
    #[error("endpoint field `{0}` must not be empty")]
    Empty(&'static str),
}

/// The print server the agent keeps a connection to.
///
/// Built once at startup and shared read-only with the supervisor for the
/// lifetime of the process.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
    org_id: String,
    api_key: String,
}

impl Endpoint {
    /// Creates an endpoint, rejecting empty fields.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Empty`] naming the first empty field.
    pub fn new(
        base_url: impl Into<String>,
        org_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, EndpointError> {
        let base_url = non_empty("base_url", base_url.into())?;
        let org_id = non_empty("org_id", org_id.into())?;
        let api_key = non_empty("api_key", api_key.into())?;
        Ok(Self {
            base_url,
            org_id,
            api_key,
        })
    }

    /// The base URL, e.g. `wss://api.example.com/ws/print/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The organisation id appended to the base URL.
    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    /// Composes the full connection URL including the API key.
    pub fn connection_url(&self) -> String {
        format!("{}{}/?key={}", self.base_url, self.org_id, self.api_key)
    }

    /// Composes the connection URL with the API key masked, for log output.
    pub fn redacted_url(&self) -> String {
        format!("{}{}/?key=***", self.base_url, self.org_id)
    }
}

// Manual impl so the key never ends up in `{:?}` output.
impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("base_url", &self.base_url)
            .field("org_id", &self.org_id)
            .field("api_key", &"***")
            .finish()
    }
}

fn non_empty(field: &'static str, value: String) -> Result<String, EndpointError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EndpointError::Empty(field));
    }
    Ok(trimmed.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
