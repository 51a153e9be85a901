pub mod client;
pub mod disguise;
pub mod engine;
pub mod error;
pub mod markup;
pub mod normalize;
pub mod outcome;
pub mod parse;
pub(crate) mod retry;
pub mod render;
pub mod types;

pub use client::{CatalogSite, StructuredClient};
pub use disguise::{Disguise, Identity};
pub use engine::{SearchEngine, SearchPolicy};
pub use error::ScraperError;
pub use normalize::{normalize_detail, normalize_listing, RawDetail, RawListing};
pub use outcome::{
    BlockReason, DetailLookup, FetchOutcome, FetchReport, ResultOrigin, SearchOutcome, StopReason,
};
#[cfg(feature = "browser")]
pub use render::ChromiumRenderer;
pub use render::{DisabledRenderer, PageRenderer, RenderedClient};
