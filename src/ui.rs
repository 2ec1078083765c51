//! Presentation seam for terminal warnings.
//!
//! The gate emits exactly three static messages; rendering (font,
//! margins, inversion) belongs to the board's display stack.

/// Renders a static warning ahead of a halt.
pub trait WarningScreen {
    fn show_warning(&mut self, message: &'static str);
}

/// Screenless boards: the warning still reaches the log sink.
pub struct HeadlessScreen;

impl WarningScreen for HeadlessScreen {
    fn show_warning(&mut self, message: &'static str) {
        log::warn!(target: "ui", "{}", message);
    }
}
