//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and turning them into per-session [`CrawlSettings`].
//!
//! # Example
//!
//! ```no_run
//! use seo_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod settings;
mod types;
mod validation;

// Re-export types
pub use settings::{CrawlSettings, MAX_WORKERS, MIN_REQUESTS_PER_SECOND};
pub use types::{Config, CrawlerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
