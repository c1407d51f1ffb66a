//! Data models shared by the console services.
//!
//! Wire types derive `serde` for the console API's JSON; view types
//! (`ListingEntry`, `UploadTask`) are built locally and only serialized for
//! `--json` output.

pub mod audit;
pub mod credential;
pub mod listing;
pub mod object;
pub mod session;
pub mod upload;
