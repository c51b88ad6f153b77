//! MaxCompute data source backend
//!
//! Process configuration, logging, connection settings and the
//! [`driver::MaxComputeDriver`] facade over the type registry, macro
//! expander and frame builder.

pub mod config;
pub mod driver;
pub mod logging;
pub mod settings;

pub use config::{Config, ConfigError, QueryConfig};
pub use driver::{DriverSettings, FillMode, MaxComputeDriver};
pub use settings::{load_settings, InstanceSettings, MaxComputeSettings, SettingsError};
