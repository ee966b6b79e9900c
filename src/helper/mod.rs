pub mod counts_log;
pub mod export;
pub mod library;
pub mod normalization;
pub mod params;
pub mod plot;
pub mod summary;
pub mod utils;
