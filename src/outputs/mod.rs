//! Output generation for crawled events.
//!
//! # Submodules
//!
//! - [`json`]: Writes the event list to a JSON file and stdout
//!
//! # Output Structure
//!
//! ```text
//! data/
//! └── events.json   # every event of the crawl, completion order unless sorted
//! ```

pub mod json;
