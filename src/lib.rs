//! storysearch - Paragraph-level search over scraped long-form stories
//!
//! Loads a prebuilt index source and a metadata file, indexes them with
//! tantivy, and turns queries into escaped, highlighted snippet cards.

pub mod config;
pub mod debounce;
pub mod errors;
pub mod index;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod status;
pub mod store;
