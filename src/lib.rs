pub mod enrich;
pub mod extract;
pub mod fetch;
pub mod harvest;
pub mod models;
pub mod politeness;
pub mod sink;
pub mod sites;

// Exporting types for convenience
pub use enrich::{DetailEnricher, DetailPageSource, EnrichReport};
pub use extract::RetryPolicy;
pub use fetch::{BrowserSession, FetchError, SessionConfig};
pub use harvest::ListingHarvester;
pub use models::{ListingDetail, ListingSummary, SellerKind};
pub use politeness::Politeness;
pub use sites::SiteProfile;
