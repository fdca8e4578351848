pub mod client;
pub mod parse;

pub use client::{apply_rating_deltas, ApiClient, ProgressFn};
