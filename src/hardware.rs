//! Board collaborator contracts and the flash-backed digest adapter.
//!
//! The gate consumes three narrow capabilities the surrounding firmware
//! supplies: a digest of the installed bootloader, the flash controller
//! (see [`crate::flash`]), and a terminal halt. Everything here is
//! synchronous; the check runs before any scheduler exists.

use sha2::{Digest, Sha256};

use crate::flash::FlashControl;

/// Length of a bootloader content digest.
pub const DIGEST_LEN: usize = 32;

/// Start of the second-stage bootloader's flash window.
pub const BOOTLOADER_START: u32 = 0x0802_0000;

/// Size of the bootloader flash window in bytes.
pub const BOOTLOADER_LEN: u32 = 0x0004_0000;

/// Source of the installed bootloader's content digest.
pub trait DigestSource {
    /// Write the digest into `out` and return the number of bytes
    /// produced. Any count other than [`DIGEST_LEN`] marks the
    /// bootloader unverifiable.
    fn read_bootloader_digest(&mut self, out: &mut [u8]) -> usize;
}

/// Terminal system control.
pub trait SystemControl {
    /// Stop the device. Never returns; the warning on screen is the
    /// last thing the user sees before re-flashing or support.
    fn halt(&mut self) -> !;
}

/// Digest of the bootloader flash window, read through the flash
/// capability: SHA-256 applied twice over the region.
pub struct BootloaderDigest<'a, F: FlashControl> {
    flash: &'a F,
    start: u32,
    len: u32,
}

impl<'a, F: FlashControl> BootloaderDigest<'a, F> {
    /// Digest over the standard bootloader window.
    pub fn new(flash: &'a F) -> Self {
        BootloaderDigest {
            flash,
            start: BOOTLOADER_START,
            len: BOOTLOADER_LEN,
        }
    }

    /// Digest over a caller-chosen window, for boards that map the
    /// bootloader elsewhere.
    pub fn over_region(flash: &'a F, start: u32, len: u32) -> Self {
        BootloaderDigest { flash, start, len }
    }
}

impl<F: FlashControl> DigestSource for BootloaderDigest<'_, F> {
    fn read_bootloader_digest(&mut self, out: &mut [u8]) -> usize {
        if out.len() < DIGEST_LEN {
            return 0;
        }

        let mut hasher = Sha256::new();
        let mut chunk = [0u8; 256];
        let mut offset = 0u32;
        while offset < self.len {
            let take = (self.len - offset).min(chunk.len() as u32) as usize;
            self.flash.read(self.start + offset, &mut chunk[..take]);
            hasher.update(&chunk[..take]);
            offset += take as u32;
        }

        let first: [u8; DIGEST_LEN] = hasher.finalize().into();
        let second: [u8; DIGEST_LEN] = Sha256::digest(first).into();
        out[..DIGEST_LEN].copy_from_slice(&second);
        DIGEST_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFlash;

    #[test]
    fn digest_is_double_sha256_of_the_window() {
        let mut flash = FakeFlash::new(BOOTLOADER_START);
        let image = [0x5a_u8; 600];
        flash.load(0, &image);

        let mut digest = [0u8; DIGEST_LEN];
        let mut source = BootloaderDigest::over_region(&flash, BOOTLOADER_START, 600);
        assert_eq!(source.read_bootloader_digest(&mut digest), DIGEST_LEN);

        let first: [u8; DIGEST_LEN] = Sha256::digest(image).into();
        let expected: [u8; DIGEST_LEN] = Sha256::digest(first).into();
        assert_eq!(digest, expected);
    }

    #[test]
    fn digest_changes_when_the_window_changes() {
        let mut flash = FakeFlash::new(BOOTLOADER_START);
        flash.load(0, &[0x11; 64]);
        let mut a = [0u8; DIGEST_LEN];
        BootloaderDigest::over_region(&flash, BOOTLOADER_START, 64).read_bootloader_digest(&mut a);

        flash.load(0, &[0x22; 64]);
        let mut b = [0u8; DIGEST_LEN];
        BootloaderDigest::over_region(&flash, BOOTLOADER_START, 64).read_bootloader_digest(&mut b);

        assert_ne!(a, b);
    }

    #[test]
    fn undersized_buffer_produces_nothing() {
        let flash = FakeFlash::new(BOOTLOADER_START);
        let mut short = [0u8; 16];
        let mut source = BootloaderDigest::over_region(&flash, BOOTLOADER_START, 64);
        assert_eq!(source.read_bootloader_digest(&mut short), 0);
    }
}
