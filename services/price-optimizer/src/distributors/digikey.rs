//! DigiKey API Client
//!
//! Token-authenticated backend. An OAuth2 client-credentials token is fetched
//! by `authenticate` and reused by every lookup of the run until it nears
//! expiry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use partpal_models::ProductRecord;
use partpal_utils::{DigiKeyConfig, PartPalError, PartPalResult};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{require_part_number, require_unit_price, Distributor, LookupError};

const PRODUCTION_URL: &str = "https://api.digikey.com";
const SANDBOX_URL: &str = "https://sandbox-api.digikey.com";
const NAME: &str = "DigiKey";

/// Lifetime assumed when the token response omits `expires_in`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 600;

/// Upper bound on an advertised lifetime; longer values are clamped
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// Bearer credential with the instant it stops being valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        let lifetime = response
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
            .clamp(0, MAX_TOKEN_LIFETIME_SECS);
        // An unrepresentable expiry is treated as already expired
        let expires_at = now
            .checked_add_signed(chrono::Duration::seconds(lifetime))
            .unwrap_or(now);

        Self {
            value: response.access_token,
            expires_at,
        }
    }

    /// Usable for at least `margin` beyond `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        let margin = chrono::Duration::from_std(margin).unwrap_or(chrono::Duration::zero());
        now + margin < self.expires_at
    }
}

/// DigiKey product-details client
pub struct DigiKeyClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    locale_site: String,
    locale_currency: String,
    refresh_margin: Duration,
    /// Written by authentication and refresh only; lookups read it
    token: RwLock<Option<AccessToken>>,
}

impl DigiKeyClient {
    pub fn from_config(config: &DigiKeyConfig, timeout: Duration, refresh_margin: Duration) -> PartPalResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        let base_url = match &config.base_url {
            Some(url) => url.clone(),
            None if config.sandbox => SANDBOX_URL.to_string(),
            None => PRODUCTION_URL.to_string(),
        };

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            locale_site: "US".to_string(),
            locale_currency: "USD".to_string(),
            refresh_margin,
            token: RwLock::new(None),
        })
    }

    /// Request a fresh client-credentials token
    async fn fetch_token(&self) -> PartPalResult<AccessToken> {
        let url = format!("{}/v1/oauth2/token", self.base_url);
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self.client.post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| PartPalError::authentication(NAME, format!("token request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| PartPalError::authentication(NAME, format!("token response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(PartPalError::authentication(
                NAME,
                format!("token request rejected with HTTP {}: {}", status.as_u16(), body),
            ));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| PartPalError::authentication(NAME, format!("malformed token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(PartPalError::authentication(NAME, "no access token received"));
        }

        Ok(AccessToken::from_response(token, Utc::now()))
    }

    /// Current token, refreshed first if it is about to expire
    async fn current_token(&self) -> Result<AccessToken, LookupError> {
        let stale = {
            let guard = self.token.read().await;
            match guard.as_ref() {
                Some(token) if token.is_fresh(Utc::now(), self.refresh_margin) => return Ok(token.clone()),
                Some(token) => token.value.clone(),
                None => return Err(LookupError::NotAuthenticated("authenticate was not called or failed".to_string())),
            }
        };
        self.refresh(&stale).await
    }

    /// Replace `stale` with a new token.
    ///
    /// If another lookup already swapped it out, that newer token is reused.
    async fn refresh(&self, stale: &str) -> Result<AccessToken, LookupError> {
        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref() {
            if token.value != stale && token.is_fresh(Utc::now(), self.refresh_margin) {
                return Ok(token.clone());
            }
        }

        debug!(distributor = NAME, "Refreshing access token");
        match self.fetch_token().await {
            Ok(token) => {
                *guard = Some(token.clone());
                Ok(token)
            }
            Err(e) => {
                warn!(distributor = NAME, error = %e, "Token refresh failed");
                Err(LookupError::NotAuthenticated(e.to_string()))
            }
        }
    }

    async fn send_lookup(&self, part_number: &str, token: &AccessToken) -> Result<(StatusCode, String), LookupError> {
        let url = format!(
            "{}/products/v4/search/{}/productdetails",
            self.base_url,
            urlencoding::encode(part_number)
        );

        let response = self.client.get(&url)
            .bearer_auth(&token.value)
            .header("X-DIGIKEY-Client-Id", &self.client_id)
            .header("X-DIGIKEY-Locale-Site", &self.locale_site)
            .header("X-DIGIKEY-Locale-Currency", &self.locale_currency)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl Distributor for DigiKeyClient {
    fn name(&self) -> &str {
        NAME
    }

    async fn authenticate(&self) -> PartPalResult<()> {
        let token = self.fetch_token().await?;
        info!(distributor = NAME, expires_at = %token.expires_at, "Authenticated");
        *self.token.write().await = Some(token);
        Ok(())
    }

    async fn lookup(&self, part_number: &str) -> Result<ProductRecord, LookupError> {
        let part_number = require_part_number(part_number)?;
        let token = self.current_token().await?;

        let (mut status, mut body) = self.send_lookup(part_number, &token).await?;

        // One re-authentication and retry when the token was revoked early
        if status == StatusCode::UNAUTHORIZED {
            let token = self.refresh(&token.value).await?;
            (status, body) = self.send_lookup(part_number, &token).await?;
        }

        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound {
                part_number: part_number.to_string(),
                body,
            });
        }

        if !status.is_success() {
            return Err(LookupError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        parse_product_details(&body)
    }
}

/// Translate a product-details payload into the canonical record
pub fn parse_product_details(body: &str) -> Result<ProductRecord, LookupError> {
    let response: ProductDetailsResponse = serde_json::from_str(body)
        .map_err(|e| LookupError::malformed(e.to_string(), body))?;
    let product = response.product;

    let part_number = product.product_variations
        .into_iter()
        .map(|v| v.digi_key_product_number)
        .find(|pn| !pn.is_empty())
        .ok_or_else(|| LookupError::malformed("product has no DigiKey product number", body))?;

    Ok(ProductRecord {
        part_number,
        mfr_part_number: product.manufacturer_product_number,
        manufacturer: product.manufacturer.name,
        unit_price: require_unit_price(product.unit_price, body)?,
        availability: product.quantity_available,
        description: product.description.product_description,
        datasheet: product.datasheet_url.unwrap_or_default(),
        product_url: product.product_url,
    })
}

// ========== DigiKey API wire types ==========

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProductDetailsResponse {
    product: DigiKeyProduct,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DigiKeyProduct {
    description: DigiKeyDescription,
    manufacturer: DigiKeyManufacturer,
    manufacturer_product_number: String,
    unit_price: f64,
    product_url: String,
    #[serde(default)]
    datasheet_url: Option<String>,
    quantity_available: u64,
    product_variations: Vec<ProductVariation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DigiKeyDescription {
    product_description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DigiKeyManufacturer {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProductVariation {
    digi_key_product_number: String,
}
