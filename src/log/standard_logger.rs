use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use crate::log::{LogConfiguration, ModuleFilter};

// ISO 8601 timestamp, colored level, target module
const LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";
const APPENDER: &str = "console";

impl From<&ModuleFilter> for Logger {
    fn from(filter: &ModuleFilter) -> Self {
        Logger::builder().build(filter.module.clone(), filter.level)
    }
}

impl LogConfiguration {
    /// Installs the console logger on first use, then swaps in a configuration built from the
    /// current levels and filters.
    pub(in crate::log) fn set_config(&mut self) {
        let console = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        let config = Config::builder()
            .appender(Appender::builder().build(APPENDER, Box::new(console)))
            .loggers(self.module_filters.values().map(Logger::from))
            .build(Root::builder().appender(APPENDER).build(self.global_log_level));
        let config = match config {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to build log config: {e}");
                return;
            }
        };

        if let Some(handle) = &self.root_handle {
            handle.set_config(config);
            return;
        }
        match log4rs::init_config(config) {
            Ok(handle) => self.root_handle = Some(handle),
            // Another logger owns the `log` facade; leave it in charge.
            Err(e) => eprintln!("failed to install logger: {e}"),
        }
    }
}
