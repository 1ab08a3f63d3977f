pub mod bridge;
pub mod capability;
pub mod error;
pub mod fetcher;
pub mod manager;
pub mod models;
