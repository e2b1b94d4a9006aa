//! USNEWS GRAD SCHOOL RANKING SCRAPER
//! Pages through the ranking search api, keeps every page on disk
//! and flattens the whole thing into a single spreadsheet.

mod error;
mod macros;

pub mod config;
pub mod dataset;
pub mod export;
pub mod pages;
pub mod params;
pub mod process;
pub mod record;
pub mod request;

pub use error::{Error, Result};

/// The search endpoint every ranking page is backed by.
pub const API_URL: &str = "https://www.usnews.com/best-graduate-schools/api/search";
/// Only urls containing this are accepted.
pub const SUPPORTED_PREFIX: &str = "usnews.com/best-graduate-schools";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

pub const DEFAULT_OUTPUT: &str = "usnews";
pub const DEFAULT_PAUSE_SECS: u64 = 2;
pub const MIN_PAUSE_SECS: u64 = 1;
pub const MAX_PAUSE_SECS: u64 = 10;
pub const DEFAULT_START_PAGE: u32 = 1;
pub const DEFAULT_END_PAGE: u32 = 100;
/// Pause after the initial request that discovers the page count.
pub const DISCOVERY_PAUSE_SECS: u64 = 1;
/// Used for the sheet when the url gives us neither program nor specialty.
pub const DEFAULT_LABEL: &str = "Ranking";
pub const OUTPUT_EXTENSION: &str = "xlsx";
