//! User notification surface.
//!
//! Hosts render notices however fits their shell (toast, snackbar, system
//! notification). The core reports outcomes; it never blocks on delivery.

use crate::error::Result;

/// A human-readable notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: Option<String>,
}

impl Notice {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Host notification sink.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Show a success notice.
    async fn success(&self, notice: Notice) -> Result<()>;

    /// Show an error notice.
    async fn error(&self, notice: Notice) -> Result<()>;
}
