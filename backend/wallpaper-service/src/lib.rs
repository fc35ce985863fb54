//! Wallpaper Service
//!
//! Single-endpoint image proxy: resolves the current top wallpaper from an
//! upstream feed, optionally shrinks it to a bounded JPEG, and serves it
//! with a two-tier Redis cache in front of the fetch and transcode work.

pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
