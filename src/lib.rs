//! # SpamSieve
//!
//! Obfuscation-resistant spam detection for chat moderation bots.
//!
//! Messages are rewritten into a canonical form before they are matched
//! against a dynamic set of regex patterns, so that spacing, decoration,
//! emoji separators, mixed case and Latin look-alikes of Cyrillic letters
//! do not get past the filter.
//!
//! ## Features
//!
//! - **Look-alike folding**: editable equivalence table (`р` ↔ `p`, `ж` ↔ `}|{`, ...)
//! - **Ambiguity aware**: glyphs shared by several letters are tried every way
//! - **Dynamic patterns**: add and remove regex fragments at runtime
//! - **Persistent**: pattern set and character table stored as JSON files
//! - **Lock-free reads**: checks run on an immutable snapshot
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spamsieve::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let filter = SpamFilter::new(FilterConfig::with_data_dir("data"))?;
//!     filter.add_pattern("рубл(ь|я|ей)")?;
//!
//!     assert!(filter.is_spam("100 p у б л е й"));
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod config;
pub mod filter;

// Re-export commonly used items
pub mod prelude {
    pub use crate::config::{FilterConfig, NormalizationSettings};
    pub use crate::filter::{
        filter_commands::FilterCommands,
        SpamFilter, FilterSnapshot,
    };
    pub use crate::types::{
        AmbiguityOverride, EquivalenceTable, FilterError, FilterStats, SpamVerdict,
    };
    pub use anyhow::Result;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
