// Core modules implementing config parsing and error modeling.
pub mod cache_config;
pub mod error;
