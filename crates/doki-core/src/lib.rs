//! Doki core crate - shared types, configuration, errors and backend traits.

pub mod backend;
pub mod config;
pub mod error;
pub mod types;

pub use backend::{ImageLabeler, TextGenerator, WebSearcher};
pub use config::DokiConfig;
pub use error::{DokiError, Result};
pub use types::*;
