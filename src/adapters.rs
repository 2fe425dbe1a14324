//! Serial adapter implementations shipped with the crate.

pub mod json;

pub use json::JsonAdapter;
