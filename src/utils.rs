//! Utility functions shared across the service
//!
//! - `time`: time-zone aware "today" and the air-date window check
//! - `url`: feed URL normalisation and link rewriting
//! - `json_file`: whole-file JSON persistence with atomic replacement

pub mod json_file;
pub mod time;
pub mod url;
