//! Output generation.
//!
//! # Submodules
//!
//! - [`csv`]: serializes records to the exported CSV file
//! - [`preview`]: renders a text table of the first rows for the terminal
//!
//! # Output Structure
//!
//! ```text
//! output/
//! └── tiktok_videos.csv   # overwritten on every run
//! ```

pub mod csv;
pub mod preview;
