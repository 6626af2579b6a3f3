//! bf-feedstock: curated feedstock library, name matching and intake parsing.
//!
//! The library is an in-memory table; nothing here performs I/O.

pub mod library;
pub mod params;
pub mod parse;

pub use library::{
    FeedstockLibrary, FeedstockProfile, LibraryMatch, MatchTier, curated_library, filter_library,
};
pub use params::{FeedstockParam, Resolved, SpecSource, lookup};
pub use parse::{ParseOutcome, ParsedFeedstock, parse_feedstocks};
