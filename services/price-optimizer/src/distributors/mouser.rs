//! Mouser API Client
//!
//! Key-authenticated backend: the API key travels with every request, so there
//! is no separate authentication step.

use async_trait::async_trait;
use partpal_models::{parse_amount, ProductRecord};
use partpal_utils::{MouserConfig, PartPalResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{require_part_number, require_unit_price, Distributor, LookupError};

const DEFAULT_URL: &str = "https://api.mouser.com/api/v1";
const NAME: &str = "Mouser";

/// Mouser part-number search client
pub struct MouserClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MouserClient {
    pub fn from_config(config: &MouserConfig, timeout: Duration) -> PartPalResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_URL);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Distributor for MouserClient {
    fn name(&self) -> &str {
        NAME
    }

    async fn lookup(&self, part_number: &str) -> Result<ProductRecord, LookupError> {
        let part_number = require_part_number(part_number)?;
        let url = format!("{}/search/partnumber", self.base_url);

        let request_body = MouserRequestBody {
            search_by_part_request: SearchByPartRequest {
                mouser_part_number: part_number.to_string(),
            },
        };

        let response = self.client.post(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LookupError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        parse_search_response(part_number, &body)
    }
}

/// Translate a search-by-part payload into the canonical record
pub fn parse_search_response(part_number: &str, body: &str) -> Result<ProductRecord, LookupError> {
    let response: MouserApiResponse = serde_json::from_str(body)
        .map_err(|e| LookupError::malformed(e.to_string(), body))?;

    if let Some(error) = response.errors.unwrap_or_default().into_iter().next() {
        let message = if error.message.is_empty() {
            format!("{} ({})", error.code, error.property_name)
        } else {
            error.message
        };
        return Err(LookupError::Backend {
            message,
            body: body.to_string(),
        });
    }

    let results = response.search_results
        .ok_or_else(|| LookupError::malformed("missing SearchResults", body))?;

    let part = match results.parts.into_iter().next() {
        Some(part) if results.number_of_result > 0 => part,
        _ => {
            return Err(LookupError::NotFound {
                part_number: part_number.to_string(),
                body: body.to_string(),
            })
        }
    };

    // The lowest-quantity break is the single-unit price
    let price_break = part.price_breaks
        .iter()
        .min_by_key(|pb| pb.quantity)
        .ok_or_else(|| LookupError::malformed("part has no price breaks", body))?;
    let unit_price = parse_price(&price_break.price)
        .ok_or_else(|| LookupError::malformed(format!("unparsable price {:?}", price_break.price), body))?;

    let availability = parse_availability(part.availability_in_stock.as_deref())
        .ok_or_else(|| LookupError::malformed("unparsable AvailabilityInStock", body))?;

    Ok(ProductRecord {
        part_number: part.mouser_part_number,
        mfr_part_number: part.manufacturer_part_number,
        manufacturer: part.manufacturer,
        unit_price: require_unit_price(unit_price, body)?,
        availability,
        description: part.description,
        datasheet: part.data_sheet_url.unwrap_or_default(),
        product_url: part.product_detail_url,
    })
}

/// `"$1,234.50"` -> `1234.5`
///
/// Commas are only accepted as thousands separators, so a decimal-comma price
/// such as `"0,71 €"` is rejected rather than read as 71.
fn parse_price(raw: &str) -> Option<f64> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let (integer, fraction) = match kept.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (kept.as_str(), ""),
    };
    if fraction.contains(',') {
        return None;
    }

    let mut groups = integer.split(',');
    let lead = groups.next()?;
    if integer.contains(',') && (lead.trim_start_matches('-').is_empty() || groups.any(|g| g.len() != 3)) {
        return None;
    }

    let digits: String = kept.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() {
        return None;
    }
    parse_amount(&digits)
}

/// Blank or absent stock means none on hand
fn parse_availability(raw: Option<&str>) -> Option<u64> {
    match raw.map(str::trim) {
        None | Some("") => Some(0),
        Some(value) => value.parse().ok(),
    }
}

// ========== Mouser API wire types ==========

#[derive(Serialize, Debug)]
struct MouserRequestBody {
    #[serde(rename = "SearchByPartRequest")]
    search_by_part_request: SearchByPartRequest,
}

#[derive(Serialize, Debug)]
struct SearchByPartRequest {
    #[serde(rename = "mouserPartNumber")]
    mouser_part_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MouserApiResponse {
    #[serde(default)]
    errors: Option<Vec<MouserError>>,
    #[serde(default)]
    search_results: Option<SearchResults>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MouserError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    property_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResults {
    number_of_result: u32,
    #[serde(default)]
    parts: Vec<MouserPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MouserPart {
    mouser_part_number: String,
    manufacturer_part_number: String,
    manufacturer: String,
    description: String,
    price_breaks: Vec<PriceBreak>,
    #[serde(default)]
    availability_in_stock: Option<String>,
    product_detail_url: String,
    #[serde(default)]
    data_sheet_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PriceBreak {
    quantity: u32,
    price: String,
}
