//! # PSREF Catalog Client
//!
//! A read-only async client for the Lenovo PSREF product catalog API, which
//! exposes product hierarchies, model specifications and a change feed over
//! unauthenticated HTTP/JSON.
//!
//! ## Features
//!
//! - **Rate Limiting**: Shared token bucket protecting the remote service
//! - **Retries**: Configurable attempt budget, with 404 treated as absence
//! - **Cancellation**: Every blocking wait observes a caller-supplied [`Cancellation`]
//! - **Normalization**: Repaired URLs, decoded images, parsed change-feed versions
//! - **Model code lookup**: Resolution through the search API with uniqueness checks
//!
//! ## Quick Start
//!
//! ```no_run
//! use psref::{Cancellation, Client};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new();
//! let cancel = Cancellation::new();
//!
//! let model = client.model_by_code(&cancel, "21CB000AUS".into()).await?;
//! println!(
//!     "{} ({}): {}",
//!     model.product.id,
//!     model.product.key,
//!     model.detail_by_name("Processor").unwrap_or_default()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`client`] - Endpoint operations, retry executor, rate limiter, transport
//! - [`normalize`] - URL repair and free-text parsing applied to responses
//! - [`cancel`] - Cancellation and deadlines for in-flight requests

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Cancellation and deadlines
pub mod cancel;

/// Catalog API client
pub mod client;

/// Response normalization
pub mod normalize;

pub use cancel::{Cancellation, SharedCancellation};
pub use client::{Client, ClientConfig, ClientError, ClientResult, RateLimit};

use normalize::{normalize_url_in_place, parse_version_title, split_update_reason, unescape_image};

/// Numeric product identifier assigned by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(pub u64);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Pid {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Pid)
    }
}

impl From<u64> for Pid {
    fn from(id: u64) -> Self {
        Pid(id)
    }
}

/// Alphanumeric code of one sellable configuration of a product
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCode(pub String);

impl ModelCode {
    /// Code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelCode {
    fn from(code: &str) -> Self {
        ModelCode(code.to_string())
    }
}

impl From<String> for ModelCode {
    fn from(code: String) -> Self {
        ModelCode(code)
    }
}

/// Calendar date encoded as `YYYY-MM-DD` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Date(pub NaiveDate);

impl Date {
    /// Wire format
    pub const FORMAT: &'static str = "%Y-%m-%d";

    /// Years representable in the four-digit wire form
    pub const YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

    /// Build from year, month and day
    ///
    /// Returns `None` for invalid dates and for years outside [`Date::YEARS`].
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        if !Self::YEARS.contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day).map(Date)
    }

    /// Parse the wire encoding
    ///
    /// Only the zero-padded `YYYY-MM-DD` form is accepted.
    pub fn parse(s: &str) -> Result<Self, String> {
        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == 10
            && bytes.iter().enumerate().all(|(i, b)| match i {
                4 | 7 => *b == b'-',
                _ => b.is_ascii_digit(),
            });
        if !shape_ok {
            return Err(format!("invalid date '{s}': expected YYYY-MM-DD"));
        }
        NaiveDate::parse_from_str(s, Self::FORMAT)
            .map(Date)
            .map_err(|e| format!("invalid date '{s}': {e}"))
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for Date {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s)
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Date::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Deserialize a field that the service may send as `null`, falling back to its zero value
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Top-level product classification (e.g. "Laptops")
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductType {
    /// Classification name
    #[serde(rename = "ClassificationName", deserialize_with = "nullable")]
    pub name: String,
    /// Display background color
    #[serde(rename = "BackgroundColor", deserialize_with = "nullable")]
    pub bg_color: String,
    /// Product lines in display order
    #[serde(rename = "ProductLine", deserialize_with = "nullable")]
    pub lineup: Vec<ProductLine>,
}

/// Withdrawn-products shape, which names the classification differently
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WithdrawnProductType {
    #[serde(rename = "ProductType", deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "ProductLine", deserialize_with = "nullable")]
    pub lineup: Vec<ProductLine>,
}

impl From<WithdrawnProductType> for ProductType {
    fn from(v: WithdrawnProductType) -> Self {
        ProductType {
            name: v.name,
            bg_color: String::new(),
            lineup: v.lineup,
        }
    }
}

impl ProductType {
    pub(crate) fn normalize(&mut self) {
        self.lineup.iter_mut().for_each(ProductLine::normalize);
    }
}

/// Product line within a classification (e.g. "ThinkPad")
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductLine {
    /// Line name
    #[serde(rename = "ProductLineName", deserialize_with = "nullable")]
    pub name: String,
    /// Line image URL
    #[serde(rename = "ImageUrl", deserialize_with = "nullable")]
    pub image: String,
    /// Series in display order
    #[serde(rename = "Series", deserialize_with = "nullable")]
    pub series: Vec<Series>,
}

impl ProductLine {
    pub(crate) fn normalize(&mut self) {
        normalize_url_in_place(&mut self.image);
    }
}

/// Series within a product line (e.g. "ThinkPad X1")
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Series {
    /// Series name
    #[serde(rename = "SeriesName", deserialize_with = "nullable")]
    pub name: String,
    /// Products in display order
    #[serde(rename = "Products", deserialize_with = "nullable")]
    pub products: Vec<ProductShort>,
}

/// Product summary listed in the hierarchy
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductShort {
    /// Product identifier
    #[serde(rename = "ProductId", deserialize_with = "nullable")]
    pub id: Pid,
    /// Human-readable key (e.g. "ThinkPad_X1_Carbon_Gen_10")
    #[serde(rename = "ProductKey", deserialize_with = "nullable")]
    pub key: String,
    /// Display name
    #[serde(rename = "ProductName", deserialize_with = "nullable")]
    pub name: String,
    /// Withdrawal status flag
    #[serde(rename = "P_WdStatus", deserialize_with = "nullable")]
    pub withdrawn_status: i64,
    /// Last general update
    #[serde(rename = "LastUpdated")]
    pub updated: Option<Date>,
    /// Last model list change
    #[serde(rename = "ModelModifyDateTime")]
    pub model_modified: Option<Date>,
    /// Last configuration change
    #[serde(rename = "ConfigModifyDateTime")]
    pub config_modified: Option<Date>,
}

/// Model entry in a product's model list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInfo {
    /// Model code
    #[serde(rename = "ModelCode", deserialize_with = "nullable")]
    pub code: ModelCode,
    /// One-line specification summary
    #[serde(rename = "Summary", deserialize_with = "nullable")]
    pub summary: String,
    /// Last update
    #[serde(rename = "Updated")]
    pub updated: Option<Date>,
}

/// Link to a documentation resource
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Documentation {
    /// Product the document belongs to
    #[serde(rename = "ProductId", deserialize_with = "nullable")]
    pub product_id: Pid,
    /// Document title
    #[serde(rename = "DocTitle", deserialize_with = "nullable")]
    pub title: String,
    /// Document URL
    #[serde(rename = "DocLink", deserialize_with = "nullable")]
    pub url: String,
}

/// Full product record, including its model list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    /// Product identifier
    #[serde(rename = "ProductId", deserialize_with = "nullable")]
    pub id: Pid,
    /// Human-readable key
    #[serde(rename = "ProductKey", deserialize_with = "nullable")]
    pub key: String,
    /// Display name
    #[serde(rename = "Name", deserialize_with = "nullable")]
    pub name: String,
    /// Detail page URL
    #[serde(rename = "ProductURL", deserialize_with = "nullable")]
    pub ref_url: String,
    /// Withdrawal status flag
    #[serde(rename = "P_WdStatus", deserialize_with = "nullable")]
    pub withdrawn_status: i64,
    /// Spec sheet URL
    #[serde(rename = "Spec", deserialize_with = "nullable")]
    pub spec_url: String,
    /// US spec sheet PDF
    #[serde(rename = "US_Pdf", deserialize_with = "nullable")]
    pub us_pdf: String,
    /// EMEA spec sheet PDF
    #[serde(rename = "EMEA_Pdf", deserialize_with = "nullable")]
    pub emea_pdf: String,
    /// Worldwide spec sheet PDF
    #[serde(rename = "WW_Pdf", deserialize_with = "nullable")]
    pub ww_pdf: String,
    /// Share image URL
    #[serde(rename = "ImageForShare", deserialize_with = "nullable")]
    pub image: String,
    /// Gallery image URLs
    #[serde(rename = "Images", deserialize_with = "nullable")]
    pub images: Vec<String>,
    /// Models of this product
    #[serde(rename = "Models", deserialize_with = "nullable")]
    pub models: Vec<ModelInfo>,
    /// Documentation links
    #[serde(rename = "Documentations", deserialize_with = "nullable")]
    pub docs: Vec<Documentation>,
}

impl Product {
    pub(crate) fn normalize(&mut self) {
        self.image = unescape_image(&self.image);
        normalize_url_in_place(&mut self.ref_url);
        normalize_url_in_place(&mut self.spec_url);
        normalize_url_in_place(&mut self.us_pdf);
        normalize_url_in_place(&mut self.emea_pdf);
        normalize_url_in_place(&mut self.ww_pdf);
        normalize_url_in_place(&mut self.image);
        self.images.iter_mut().for_each(normalize_url_in_place);
        for doc in &mut self.docs {
            normalize_url_in_place(&mut doc.url);
        }
    }
}

/// Name/value specification pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyValue {
    /// Specification name (e.g. "Processor")
    #[serde(rename = "Name", deserialize_with = "nullable")]
    pub name: String,
    /// Specification value
    #[serde(rename = "Value", deserialize_with = "nullable")]
    pub value: String,
}

/// Full model record with specifications
///
/// Not every [`Product`] field is populated by the model endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    /// Product fields shared with the product record
    #[serde(flatten)]
    pub product: Product,
    /// Model-specific withdrawal status
    #[serde(rename = "M_WdStatus", deserialize_with = "nullable")]
    pub withdrawn_status: i64,
    /// Model detail page URL
    #[serde(rename = "ModelURL", deserialize_with = "nullable")]
    pub ref_url: String,
    /// Specifications in display order
    #[serde(rename = "Detail", deserialize_with = "nullable")]
    pub detail: Vec<KeyValue>,
    /// Model code
    #[serde(rename = "ModelCode", deserialize_with = "nullable")]
    pub code: ModelCode,
}

impl Model {
    /// Look up a specification value by name; the first match wins
    pub fn detail_by_name(&self, name: &str) -> Option<&str> {
        self.detail
            .iter()
            .find(|kv| kv.name == name)
            .map(|kv| kv.value.as_str())
    }

    pub(crate) fn normalize(&mut self) {
        self.product.normalize();
        normalize_url_in_place(&mut self.ref_url);
    }
}

/// Change-feed entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatedProduct {
    /// Product identifier
    #[serde(rename = "productId", deserialize_with = "nullable")]
    pub id: Pid,
    /// Product title, without a recognized reason suffix
    #[serde(rename = "title", deserialize_with = "nullable")]
    pub title: String,
    /// Why the product was updated, if the title carried a recognized reason
    #[serde(rename = "reason", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Snapshot of the catalog change feed
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Updates {
    /// Catalog version parsed from the title, 0 if absent
    #[serde(rename = "x_Version", deserialize_with = "nullable")]
    pub version: u64,
    /// Version date parsed from the title
    #[serde(rename = "x_VersionTS")]
    pub version_ts: Option<NaiveDate>,
    /// Version title with markup removed
    #[serde(rename = "LatestUpdateVersion", deserialize_with = "nullable")]
    pub version_title: String,
    /// Newly added products
    #[serde(rename = "New", deserialize_with = "nullable")]
    pub new: Vec<UpdatedProduct>,
    /// Updated products
    #[serde(rename = "Updated", deserialize_with = "nullable")]
    pub updated: Vec<UpdatedProduct>,
    /// Withdrawn products
    #[serde(rename = "Withdrawn", deserialize_with = "nullable")]
    pub withdrawn: Vec<UpdatedProduct>,
}

impl Updates {
    pub(crate) fn normalize(&mut self) {
        let info = parse_version_title(&self.version_title);
        self.version_title = info.title;
        if info.version != 0 {
            self.version = info.version;
        }
        if info.timestamp.is_some() {
            self.version_ts = info.timestamp;
        }
        for entry in &mut self.updated {
            if let (title, Some(reason)) = split_update_reason(&entry.title) {
                entry.title = title;
                entry.reason = Some(reason);
            }
        }
    }
}

/// Keyword search hit
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    /// Matched product
    #[serde(rename = "ProductId", deserialize_with = "nullable")]
    pub id: Pid,
    /// Product display name
    #[serde(rename = "ProductName", deserialize_with = "nullable")]
    pub name: String,
    /// Number of matching models under the product
    #[serde(rename = "ModelCount", deserialize_with = "nullable")]
    pub models: u64,
}

/// Reading resource listed by the book endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Book {
    /// Title
    #[serde(rename = "BookTitle", deserialize_with = "nullable")]
    pub title: String,
    /// Resource URL
    #[serde(rename = "BookLink", deserialize_with = "nullable")]
    pub url: String,
    /// Region
    #[serde(rename = "Geo", deserialize_with = "nullable")]
    pub geo: String,
    /// Free-form remark
    #[serde(rename = "Remark", deserialize_with = "nullable")]
    pub remark: String,
}

impl Book {
    pub(crate) fn normalize(&mut self) {
        normalize_url_in_place(&mut self.url);
    }
}
