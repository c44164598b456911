//! # calldata-crypto
//!
//! The digest primitive behind function selectors and event topics.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod hash;

pub use hash::{keccak256, selector_of};
