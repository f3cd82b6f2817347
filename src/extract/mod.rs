//! Free-text extractors (§4.2).
//!
//! Each extractor returns a partial record; absence is signaled by
//! `None`, never by an error — these run over noisy, heterogeneous
//! search-result text and must never abort a search.

mod age;
mod dod;
mod location;
mod name;
mod service_dates;

pub use age::extract_age;
pub use dod::extract_dod;
pub use location::{extract_location, Location};
pub use name::{extract_name, ExtractedName};
pub use service_dates::{extract_service_dates, infer_year, ServiceDates};

pub(crate) mod months;
