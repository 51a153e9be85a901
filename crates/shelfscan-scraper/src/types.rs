//! Response types for the catalog's structured (`ajax=true`) listing endpoint.
//!
//! ## Observed shape
//!
//! ### Envelope
//! Listings arrive at `mods.listItems`. Some edge nodes wrap the same object in
//! a `data` key, so `data.mods.listItems` is accepted too. A body that carries
//! neither `mods` nor `data.mods` is not a listing response at all (usually a
//! challenge or an error object) and is reported as malformed. `mods` present
//! with `listItems` missing or `null` is the end of the result list.
//!
//! ### Field aliases
//! Item fields have been renamed over time. Each alias is modelled as its own
//! optional field; [`ListItem::into_raw`] picks the first one present:
//!
//! | Field          | Aliases, in priority order                          |
//! |----------------|-----------------------------------------------------|
//! | name           | `name`, `title`, `productName`                      |
//! | price          | `priceShow`, `price`, `salePrice`, `currentPrice`   |
//! | original price | `originalPrice`, `listPrice`, `marketPrice`         |
//! | url            | `itemUrl`, `link`, `url`                            |
//! | stock          | `inStock`, `stock`, `available`                     |
//!
//! ### Scalar types
//! Prices are sometimes strings (`"Rs. 1,299"`) and sometimes numbers
//! (`1299`); stock is a bool, a count, or a phrase. Every field is decoded as
//! a [`Scalar`] and interpreted later by the normalizer.
//!
//! Items are decoded one by one from raw JSON values so a single odd item
//! cannot fail the whole page.

use serde::Deserialize;

use crate::normalize::RawListing;

/// Top-level listing response.
#[derive(Debug, Deserialize)]
pub struct ListingEnvelope {
    #[serde(default)]
    pub mods: Option<ListingMods>,
    #[serde(default)]
    pub data: Option<ListingData>,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub mods: Option<ListingMods>,
}

#[derive(Debug, Deserialize)]
pub struct ListingMods {
    #[serde(default, rename = "listItems")]
    pub list_items: Option<Vec<serde_json::Value>>,
}

impl ListingEnvelope {
    /// Raw item values, or `None` when the body has no listing section.
    #[must_use]
    pub fn into_item_values(self) -> Option<Vec<serde_json::Value>> {
        let mods = self.mods.or_else(|| self.data.and_then(|d| d.mods))?;
        Some(mods.list_items.unwrap_or_default())
    }
}

/// A JSON leaf that may be a bool, a number, or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// Text form, `None` for blank strings.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Scalar::Bool(b) => Some(b.to_string()),
            Scalar::Number(n) => Some(n.to_string()),
            Scalar::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_owned())
            }
        }
    }
}

/// One entry of `listItems`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    #[serde(default)]
    pub name: Option<Scalar>,
    #[serde(default)]
    pub title: Option<Scalar>,
    #[serde(default)]
    pub product_name: Option<Scalar>,

    #[serde(default)]
    pub price_show: Option<Scalar>,
    #[serde(default)]
    pub price: Option<Scalar>,
    #[serde(default)]
    pub sale_price: Option<Scalar>,
    #[serde(default)]
    pub current_price: Option<Scalar>,

    #[serde(default)]
    pub original_price: Option<Scalar>,
    #[serde(default)]
    pub list_price: Option<Scalar>,
    #[serde(default)]
    pub market_price: Option<Scalar>,

    #[serde(default)]
    pub item_url: Option<Scalar>,
    #[serde(default)]
    pub link: Option<Scalar>,
    #[serde(default)]
    pub url: Option<Scalar>,

    #[serde(default)]
    pub in_stock: Option<Scalar>,
    #[serde(default)]
    pub stock: Option<Scalar>,
    #[serde(default)]
    pub available: Option<Scalar>,
}

fn first_text(candidates: [Option<Scalar>; 3]) -> Option<String> {
    candidates.into_iter().flatten().find_map(Scalar::into_text)
}

impl ListItem {
    #[must_use]
    pub fn into_raw(self) -> RawListing {
        RawListing {
            name: first_text([self.name, self.title, self.product_name]),
            price: [
                self.price_show,
                self.price,
                self.sale_price,
                self.current_price,
            ]
            .into_iter()
            .flatten()
            .find_map(Scalar::into_text),
            original_price: first_text([self.original_price, self.list_price, self.market_price]),
            url: first_text([self.item_url, self.link, self.url]),
            stock: first_text([self.in_stock, self.stock, self.available]),
        }
    }
}
