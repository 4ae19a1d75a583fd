//! Fragment-specific modules: HTTP session, query building, parsing, pagination, models.

pub mod models;
pub mod paginator;
pub mod parser;
pub mod query;
pub mod selectors;
pub mod session;

pub use models::{Attribute, Gift, GiftInfo, Issued, ListingPage, OwnershipHistory};
pub use paginator::Paginator;
pub use parser::Parser;
pub use query::{GiftFilter, GiftSort, Query, RequestSpec};
pub use session::{GiftSource, HttpSession};
