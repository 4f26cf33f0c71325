/*!

A "logger" used when the `logging` feature is off. It outputs nothing but keeps the level
filters working.

*/

use crate::log::LogConfiguration;

impl LogConfiguration {
    /// Applies the global level filter without installing a logger.
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
