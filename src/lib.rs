pub mod api;
pub mod content;
pub mod error;
pub mod progress;
pub mod query;
pub mod store;
pub mod utils;
