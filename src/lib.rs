//! Upcoming-shows subscriber
//!
//! Fetches an "upcoming TV shows" RSS feed, filters the entries by wish
//! count, region, genre and air date, subscribes to what is left and keeps a
//! history so no entry is handled twice.

pub mod config;
pub mod errors;
pub mod ingestor;
pub mod models;
pub mod repositories;
pub mod services;
pub mod sources;
pub mod utils;
pub mod web;
