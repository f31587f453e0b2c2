//! Distributor Capability
//! 
//! The contract every distributor backend implements, plus construction of the
//! backends enabled in configuration. The optimizer only ever sees
//! `Arc<dyn Distributor>`.

use async_trait::async_trait;
use partpal_models::ProductRecord;
use partpal_utils::{AppConfig, PartPalResult};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod digikey;
pub mod mouser;

pub use digikey::DigiKeyClient;
pub use mouser::MouserClient;

/// Failure of a single (component, distributor) lookup.
///
/// Variants that came from the backend keep the raw response body.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("part number is empty")]
    EmptyPartNumber,

    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("backend responded with HTTP {status}")]
    Rejected { status: u16, body: String },

    #[error("backend reported an error: {message}")]
    Backend { message: String, body: String },

    #[error("no results for part number {part_number}")]
    NotFound { part_number: String, body: String },

    #[error("unusable payload: {reason}")]
    MalformedPayload { reason: String, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("lookup task failed: {0}")]
    Task(String),
}

impl LookupError {
    /// Raw backend response, when there was one
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            Self::Rejected { body, .. }
            | Self::Backend { body, .. }
            | Self::NotFound { body, .. }
            | Self::MalformedPayload { body, .. } => Some(body),
            _ => None,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>, body: &str) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
            body: body.to_string(),
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

/// A distributor that can price a part number.
///
/// Implementations are built once per run and shared read-only across the
/// concurrent lookups of a pass.
#[async_trait]
pub trait Distributor: Send + Sync {
    /// Human-readable name, written into the BOM's distributor column
    fn name(&self) -> &str;

    /// Acquire whatever credential lookups need.
    ///
    /// Backends that send a static key with every request have nothing to do.
    async fn authenticate(&self) -> PartPalResult<()> {
        Ok(())
    }

    async fn lookup(&self, part_number: &str) -> Result<ProductRecord, LookupError>;
}

/// Reject blank part numbers before touching the network
pub(crate) fn require_part_number(part_number: &str) -> Result<&str, LookupError> {
    let trimmed = part_number.trim();
    if trimmed.is_empty() {
        return Err(LookupError::EmptyPartNumber);
    }
    Ok(trimmed)
}

/// Offers must carry a real, positive unit price to be comparable
pub(crate) fn require_unit_price(price: f64, body: &str) -> Result<f64, LookupError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(LookupError::malformed(format!("unusable unit price {}", price), body));
    }
    Ok(price)
}

/// Build every distributor enabled in configuration, in a fixed order
pub fn build_distributors(config: &AppConfig) -> PartPalResult<Vec<Arc<dyn Distributor>>> {
    let timeout = Duration::from_secs(config.optimizer.lookup_timeout_seconds);
    let mut distributors: Vec<Arc<dyn Distributor>> = Vec::new();

    if let Some(digikey) = &config.distributors.digikey {
        let refresh_margin = Duration::from_secs(config.optimizer.token_refresh_margin_seconds);
        distributors.push(Arc::new(DigiKeyClient::from_config(digikey, timeout, refresh_margin)?));
    }

    if let Some(mouser) = &config.distributors.mouser {
        distributors.push(Arc::new(MouserClient::from_config(mouser, timeout)?));
    }

    Ok(distributors)
}
