//! Boot-phase logging over a board-supplied sink.
//!
//! The device is alloc-free at this stage, so lines are formatted into
//! a fixed heapless buffer and handed to the sink whole. The sink slot
//! is set once during bring-up, before the integrity gate runs.

use core::fmt::Write;

use log::{LevelFilter, Log, Metadata, Record};
use spin::Once;

/// Longest log line the boot phase emits.
const LINE_CAPACITY: usize = 192;

/// Byte-oriented output the board provides (SWO, UART, display margin).
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Global sink slot. `Once` keeps the first registration.
static SINK: Once<&'static dyn LogSink> = Once::new();

struct GateLogger;

static LOGGER: GateLogger = GateLogger;

impl Log for GateLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(sink) = SINK.get() {
            let mut line = heapless::String::<LINE_CAPACITY>::new();
            // Overflow truncates the line rather than dropping it.
            let _ = write!(
                line,
                "[{}][{}] {}",
                record.level(),
                record.target(),
                record.args()
            );
            sink.write_line(&line);
        }
    }

    fn flush(&self) {}
}

/// Register the board sink and level filter.
///
/// Call once during bring-up, before [`crate::gate::check_bootloader`].
/// Later calls keep the first sink; messages logged before any call are
/// discarded.
pub fn init_logger(sink: &'static dyn LogSink, level: LevelFilter) {
    SINK.call_once(|| sink);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Capture(Mutex<Vec<String>>);

    impl LogSink for Capture {
        fn write_line(&self, line: &str) {
            self.0.lock().unwrap().push(line.to_string());
        }
    }

    static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

    #[test]
    fn lines_carry_level_and_target() {
        init_logger(&CAPTURE, LevelFilter::Info);
        log::info!(target: "gate", "decision ready");

        let lines = CAPTURE.0.lock().unwrap();
        assert!(lines.iter().any(|line| line == "[INFO][gate] decision ready"));
    }

    #[test]
    fn lines_below_the_filter_are_dropped() {
        init_logger(&CAPTURE, LevelFilter::Info);
        log::trace!(target: "gate", "noise");

        let lines = CAPTURE.0.lock().unwrap();
        assert!(!lines.iter().any(|line| line.contains("noise")));
    }
}
