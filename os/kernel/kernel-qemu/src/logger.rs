use crate::qemu_trace;
use core::sync::atomic::{AtomicUsize, Ordering};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Routes `log` records to the QEMU UART.
///
/// The level threshold lives in an atomic so the single static instance can be
/// registered with `log` without `static mut`.
pub struct QemuLogger {
    max_level: AtomicUsize,
}

static LOGGER: QemuLogger = QemuLogger::new(LevelFilter::Trace);

impl QemuLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self {
            max_level: AtomicUsize::new(max_level as usize),
        }
    }

    /// Installs the logger. Call this once during early init.
    ///
    /// # Errors
    /// Fails if another logger has already been installed.
    pub fn init(max_level: LevelFilter) -> Result<(), SetLoggerError> {
        LOGGER.max_level.store(max_level as usize, Ordering::Relaxed);
        log::set_logger(&LOGGER)?;
        log::set_max_level(max_level);
        Ok(())
    }

    fn max_level(&self) -> LevelFilter {
        match self.max_level.load(Ordering::Relaxed) {
            0 => LevelFilter::Off,
            1 => LevelFilter::Error,
            2 => LevelFilter::Warn,
            3 => LevelFilter::Info,
            4 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

impl Log for QemuLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Format: "[LEVEL] target: message\n"
        qemu_trace!(
            "[{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        // The UART has no buffering beyond its FIFO.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn threshold_filters_levels() {
        let logger = QemuLogger::new(LevelFilter::Info);
        let info = Metadata::builder().level(Level::Info).build();
        let debug = Metadata::builder().level(Level::Debug).build();
        assert!(logger.enabled(&info));
        assert!(!logger.enabled(&debug));
    }

    #[test]
    fn off_disables_everything() {
        let logger = QemuLogger::new(LevelFilter::Off);
        let error = Metadata::builder().level(Level::Error).build();
        assert!(!logger.enabled(&error));
    }
}
