pub mod cache;
pub mod images;
pub mod lookahead;
pub mod stats_api;
pub mod types;
