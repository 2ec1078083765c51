//! In-memory collaborator fakes.
//!
//! The gate's ordering and read-back properties are only checkable
//! against a flash model, so the fakes ship with the crate: unit tests
//! use them directly and host-side harnesses can script whole boot
//! scenarios without a device attached.

use heapless::Vec;

use crate::flash::{FlashControl, FlashStatus};
use crate::hardware::{DigestSource, SystemControl};
use crate::ui::WarningScreen;

/// Bytes of flash the fake window models.
pub const WINDOW_LEN: usize = 1024;

/// Calls a [`FakeFlash`] records, in invocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashCall {
    Unlock,
    Program,
    Lock,
    ClearStatus,
}

/// Write behavior of the fake controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBehavior {
    /// Writes land and the controller reports success.
    Clean,
    /// Writes land but the controller latches a spurious protection
    /// fault, the way some parts do.
    LandsWithFault,
    /// Writes are dropped and the controller reports a sequence error.
    Dropped,
}

/// Memory-backed [`FlashControl`] with call recording.
pub struct FakeFlash {
    window: [u8; WINDOW_LEN],
    base: u32,
    protected: bool,
    status: FlashStatus,
    behavior: WriteBehavior,
    pub calls: Vec<FlashCall, 16>,
}

impl FakeFlash {
    /// Window filled with erased-flash 0xff, write protection on.
    pub fn new(base: u32) -> Self {
        Self::with_behavior(base, WriteBehavior::Clean)
    }

    pub fn with_behavior(base: u32, behavior: WriteBehavior) -> Self {
        FakeFlash {
            window: [0xff; WINDOW_LEN],
            base,
            protected: true,
            status: FlashStatus::empty(),
            behavior,
            calls: Vec::new(),
        }
    }

    pub fn protected(&self) -> bool {
        self.protected
    }

    pub fn status(&self) -> FlashStatus {
        self.status
    }

    /// Borrow the modeled window.
    pub fn window(&self) -> &[u8] {
        &self.window
    }

    /// Seed the window at `offset` from the base address.
    pub fn load(&mut self, offset: usize, bytes: &[u8]) {
        self.window[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn offset_of(&self, address: u32) -> usize {
        (address - self.base) as usize
    }

    fn record(&mut self, call: FlashCall) {
        let _ = self.calls.push(call);
    }
}

impl FlashControl for FakeFlash {
    fn unlock_protection(&mut self) {
        self.record(FlashCall::Unlock);
        self.protected = false;
    }

    fn lock_protection(&mut self) {
        self.record(FlashCall::Lock);
        self.protected = true;
    }

    fn program(&mut self, address: u32, bytes: &[u8]) -> Result<(), FlashStatus> {
        self.record(FlashCall::Program);
        if self.protected {
            self.status |= FlashStatus::WRPERR;
            return Err(self.status);
        }
        match self.behavior {
            WriteBehavior::Clean => {
                let at = self.offset_of(address);
                self.window[at..at + bytes.len()].copy_from_slice(bytes);
                Ok(())
            }
            WriteBehavior::LandsWithFault => {
                let at = self.offset_of(address);
                self.window[at..at + bytes.len()].copy_from_slice(bytes);
                self.status |= FlashStatus::WRPERR;
                Err(self.status)
            }
            WriteBehavior::Dropped => {
                self.status |= FlashStatus::PGSERR;
                Err(self.status)
            }
        }
    }

    fn clear_error_flags(&mut self) {
        self.record(FlashCall::ClearStatus);
        self.status = FlashStatus::empty();
    }

    fn read(&self, address: u32, out: &mut [u8]) {
        let at = self.offset_of(address);
        out.copy_from_slice(&self.window[at..at + out.len()]);
    }
}

/// Digest source returning a fixed byte string of any length.
pub struct FixedDigest {
    bytes: Vec<u8, 64>,
}

impl FixedDigest {
    pub fn new(bytes: &[u8]) -> Self {
        let mut stored = Vec::new();
        let _ = stored.extend_from_slice(bytes);
        FixedDigest { bytes: stored }
    }
}

impl DigestSource for FixedDigest {
    fn read_bootloader_digest(&mut self, out: &mut [u8]) -> usize {
        let take = self.bytes.len().min(out.len());
        out[..take].copy_from_slice(&self.bytes[..take]);
        self.bytes.len()
    }
}

/// Screen that records every warning literal it is asked to show.
#[derive(Default)]
pub struct FakeScreen {
    pub warnings: Vec<&'static str, 4>,
}

impl WarningScreen for FakeScreen {
    fn show_warning(&mut self, message: &'static str) {
        let _ = self.warnings.push(message);
    }
}

/// Halt that panics instead of spinning, so tests observe it.
pub struct PanicHalt;

impl SystemControl for PanicHalt {
    fn halt(&mut self) -> ! {
        panic!("halt: device stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_writes_are_rejected_and_latch_wrperr() {
        let mut flash = FakeFlash::new(0x0802_0000);
        assert!(flash.program(0x0802_0000, &[0x00; 2]).is_err());
        assert!(flash.status().contains(FlashStatus::WRPERR));
        assert_eq!(&flash.window()[..2], &[0xff, 0xff]);
    }

    #[test]
    fn unlocked_writes_land_in_the_window() {
        let mut flash = FakeFlash::new(0x0802_0000);
        flash.unlock_protection();
        flash.program(0x0802_0010, &[0xab, 0xcd]).unwrap();
        assert_eq!(&flash.window()[0x10..0x12], &[0xab, 0xcd]);
    }
}
