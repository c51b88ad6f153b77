//! The MaxCompute driver as seen by the data source host
//!
//! Bundles everything the host asks a SQL driver for: the macro table, the
//! converter list, per-instance driver settings, and frame building for a
//! result cursor. The registry and macro table are built once and shared.

use std::sync::Arc;
use std::time::Duration;

use mcds_frame::{frame_from_rows, Frame, FrameError, RowSource};
use mcds_macros::{interpolate, MacroError, MacroTable};
use mcds_registry::{Converter, TypeRegistry};
use mcds_types::TimeRange;
use tracing::{debug, info, warn};

use crate::config::QueryConfig;
use crate::settings::{load_settings, InstanceSettings, MaxComputeSettings, SettingsError};

/// How the host fills gaps when aligning time series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    pub timeout: Duration,
    pub fill_mode: FillMode,
    pub row_limit: usize,
}

#[derive(Debug, Clone)]
pub struct MaxComputeDriver {
    registry: Arc<TypeRegistry>,
    macros: Arc<MacroTable>,
    query: QueryConfig,
}

impl MaxComputeDriver {
    pub fn new(query: QueryConfig) -> Self {
        let driver = Self {
            registry: TypeRegistry::shared(),
            macros: Arc::new(MacroTable::new()),
            query,
        };
        info!(
            types = driver.registry.rules().len(),
            macros = driver.macros.names().count(),
            row_limit = driver.query.row_limit,
            "MaxCompute driver ready"
        );
        driver
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn converters(&self) -> Vec<Converter> {
        self.registry.converters()
    }

    /// Validated connection settings for `instance`, as needed to open a
    /// connection.
    pub fn connection_settings(
        &self,
        instance: &InstanceSettings,
    ) -> Result<MaxComputeSettings, SettingsError> {
        debug!("loading MaxCompute connection settings");
        load_settings(instance)
    }

    /// Never fails: unusable settings fall back to the configured timeout.
    pub fn settings(&self, instance: &InstanceSettings) -> DriverSettings {
        let timeout = match load_settings(instance) {
            Ok(settings) => settings
                .tcp_connection_timeout
                .filter(|t| !t.is_zero())
                .unwrap_or_else(|| self.query.default_timeout()),
            Err(e) => {
                warn!(error = %e, "invalid data source settings, using default timeout");
                self.query.default_timeout()
            }
        };

        DriverSettings {
            timeout,
            fill_mode: FillMode::Null,
            row_limit: self.query.row_limit,
        }
    }

    pub fn interpolate(&self, sql: &str, range: &TimeRange) -> Result<String, MacroError> {
        interpolate(sql, range, &self.macros)
    }

    /// Read `rows` into a frame, stopping at the configured row limit.
    pub fn frame<R: RowSource + ?Sized>(&self, rows: &mut R) -> Result<Frame, FrameError> {
        frame_from_rows(rows, self.query.row_limit, &self.registry)
    }
}

impl Default for MaxComputeDriver {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}
