pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::{CliConfig, Command};

pub use crate::adapters::http::HttpOrderApi;
pub use crate::config::{toml_config::TomlConfig, ClientConfig};
pub use crate::core::{
    cart::{format_amount, Cart},
    checkout::Checkout,
    tracker::{OrderTracker, TrackerUpdate, TrackingSession},
};
pub use crate::utils::error::{OrderError, Result};
