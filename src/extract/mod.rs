//! Best-effort field extraction heuristics.
//!
//! | Field | Module | Input |
//! |-------|--------|-------|
//! | Thumbnail | [`thumbnail`] | a video tile element |
//! | Description | [`description`] | caption text or meta content |
//!
//! Both return an empty string rather than an error when nothing usable is found.

pub mod description;
pub mod thumbnail;

pub use description::extract_quoted;
pub use thumbnail::{ThumbnailPolicy, resolve_thumbnail};
