// Core modules shared by the C ABI and the bundled client.
pub mod config;
pub mod cookie;
pub mod envelope;
pub mod error;
pub mod scraper;
pub mod session;
pub mod tweet;
