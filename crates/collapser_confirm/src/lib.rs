//! Interactive confirmation of manuscript variants.
//!
//! This crate provides:
//! - [`ConfirmStore`] - Persisted per-file-set confirmation keys
//! - [`Reviewer`] / [`TerminalReviewer`] - The decision seam and its
//!   terminal implementation
//! - [`process`] - The confirmation loop over a prepared manuscript

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod present;
pub mod reviewer;
pub mod session;
pub mod store;

pub use reviewer::{Decision, MockReviewer, Reviewer, TerminalReviewer};
pub use session::process;
pub use store::ConfirmStore;
