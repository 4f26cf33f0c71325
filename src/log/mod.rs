//! Diagnostic logging for a running simulation: world construction, per-step summaries, moves,
//! infections, cures and deaths. Census data for analysis goes through [`crate::report`] instead.
//!
//! The five `log` macros (`error!`, `warn!`, `info!`, `debug!`, `trace!`) are re-exported here.
//! Everything is off until a level is set:
//!
//!  - `enable_logging()` shows every message from every module, down to `trace!`
//!  - `disable_logging()` silences everything
//!  - `set_log_level(level)` shows messages at `level` or above
//!
//! Each simulation module logs under its own target, listed in [`LogTarget`]. A filter set on a
//! target overrides the global level for that module only:
//!
//! ```rust
//! use epiroam::log::{set_log_level, set_target_filter, LevelFilter, LogTarget};
//!
//! pub fn setup_logging() {
//!     // World construction and step summaries.
//!     set_log_level(LevelFilter::Debug);
//!     // Every infection as it happens.
//!     set_target_filter(LogTarget::Place, LevelFilter::Trace);
//! }
//! ```
//!
//! `set_module_filter()` / `set_module_filters()` take arbitrary module paths, for filtering other
//! crates' messages as well.
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

use std::collections::hash_map::Entry;
use std::sync::{LazyLock, Mutex, MutexGuard};

pub use log::{debug, error, info, trace, warn, LevelFilter};
#[cfg(feature = "logging")]
use log4rs::Handle;
use strum::EnumIter;

use crate::HashMap;

/// The modules of this crate that emit log messages, and what each one reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum LogTarget {
    /// Construction (`info`), step summaries (`debug`), moves (`trace`) and failed
    /// placements (`warn`).
    World,
    /// Infections (`trace`).
    Place,
    /// Deaths and cures (`trace`).
    Agent,
}

impl LogTarget {
    /// The module path the target's messages are logged under.
    #[must_use]
    pub fn module_path(self) -> &'static str {
        match self {
            LogTarget::World => "epiroam::world",
            LogTarget::Place => "epiroam::place",
            LogTarget::Agent => "epiroam::agent",
        }
    }
}

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// A maximum level for every message whose target starts with `module`.
#[derive(Debug, PartialEq)]
struct ModuleFilter {
    module: String,
    level: LevelFilter,
}

/// The single, process-wide logging state. Loggers are global, so the public API is a set of
/// free functions that lock this and apply the change.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// Applies to every module without its own filter. `Off` until logging is enabled.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_filters: HashMap<String, ModuleFilter>,

    #[cfg(feature = "logging")]
    /// Set once the `log4rs` logger has been installed.
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: LevelFilter::Off,
            module_filters: HashMap::default(),

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns false if the filter was already in place.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_filters.entry(module.to_string()) {
            Entry::Occupied(entry) if entry.get().level == level => false,
            Entry::Occupied(mut entry) => {
                entry.get_mut().level = level;
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(ModuleFilter {
                    module: module.to_string(),
                    level,
                });
                true
            }
        }
    }

    fn set_module_filters(&mut self, filters: &[(&str, LevelFilter)]) {
        let mut changed = false;
        for &(module, level) in filters {
            changed |= self.insert_module_filter(module, level);
        }
        if changed {
            self.set_config();
        }
    }

    fn remove_module_filter(&mut self, module: &str) {
        if self.module_filters.remove(module).is_some() {
            self.set_config();
        }
    }
}

/// Shows every message from every module. Same as `set_log_level(LevelFilter::Trace)`; module
/// filters still apply.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Same as `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the level for every module without its own filter.
pub fn set_log_level(level: LevelFilter) {
    log_configuration().set_log_level(level);
}

/// Overrides the global level for one of this crate's modules.
pub fn set_target_filter(target: LogTarget, level: LevelFilter) {
    set_module_filter(target.module_path(), level);
}

/// Overrides the global level for messages whose target starts with `module_path`.
pub fn set_module_filter(module_path: &str, level: LevelFilter) {
    set_module_filters(&[(module_path, level)]);
}

/// Sets several module filters with a single logger reconfiguration.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    log_configuration().set_module_filters(module_filters);
}

/// Puts `module_path` back under the global level.
pub fn remove_module_filter(module_path: &str) {
    log_configuration().remove_module_filter(module_path);
}

fn log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
