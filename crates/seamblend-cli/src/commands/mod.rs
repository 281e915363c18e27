pub mod blend;
pub mod cache;
pub mod config;
pub mod deghost;
pub mod info;
