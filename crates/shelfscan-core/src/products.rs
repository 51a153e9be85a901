use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Acquisition method that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    /// The catalog's machine-readable query endpoint.
    Structured,
    /// A full page load through the rendering engine.
    Rendered,
}

impl std::fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchMethod::Structured => write!(f, "structured"),
            FetchMethod::Rendered => write!(f, "rendered"),
        }
    }
}

/// Tri-state stock indicator. `Unknown` is used whenever the source omits
/// the field or reports something we cannot interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
    #[default]
    Unknown,
}

/// One search-result item, normalized from either acquisition method.
///
/// `url` is the identity of the item: within a single result set it is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub name: String,
    /// Current selling price. `None` means the price could not be determined,
    /// which is distinct from a price of zero.
    pub price: Option<Decimal>,
    /// List price before discount, when the catalog shows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    pub in_stock: StockStatus,
    /// Absolute product page URL.
    pub url: String,
    pub method: FetchMethod,
}

/// A single product page, as returned by a detail lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub url: String,
    pub title: String,
    pub price: Option<Decimal>,
    /// Average review score as shown on the page (e.g. `4.6`).
    pub rating: Option<f64>,
    pub seller: Option<String>,
    /// Attribute lines in page order.
    pub specifications: Vec<String>,
    pub method: FetchMethod,
}
