//! Configuration types and validation
//!
//! Configuration arrives as a struct (the embedding application decides how to
//! load it); everything is validated up front so an invalid job fails before
//! any network activity.

mod types;
mod validation;

pub use types::{ClassifyRules, CrawlConfig};
pub use validation::validate;
