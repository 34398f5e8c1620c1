//! Resolution engine: variables, control sequences, macros, and the
//! collapse pipeline that turns an annotated manuscript into one
//! permutation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod chooser;
pub mod collapse;
pub mod config;
pub mod context;
pub mod ctrlseq;
pub mod discourse;
pub mod macros;
pub mod variables;

pub use chooser::Chooser;
pub use collapse::{collapse, process, Collapsed};
pub use config::{ParseParams, Strategy};
pub use context::ResolutionContext;
pub use ctrlseq::{Alts, Item, Pick};
pub use discourse::DiscourseStats;
pub use macros::Macros;
pub use variables::Variables;

use collapser_foundation::{Error, SourceMap};

/// Builds a parse error pointing at a byte offset in the source.
pub(crate) fn parse_error_at(
    source: &str,
    message: impl Into<String>,
    offset: usize,
) -> Error {
    Error::parse(message).with_context(SourceMap::new(source).context(offset))
}
