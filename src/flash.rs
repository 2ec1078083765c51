//! Flash write-protection capability.
//!
//! The gate never touches flash registers directly. Boards implement
//! [`FlashControl`] over their memory-mapped controller; tests and
//! host-side harnesses use the in-memory fake from [`crate::testing`].

use bitflags::bitflags;

bitflags! {
    /// Error bits of an STM32F2-class flash status register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FlashStatus: u32 {
        /// Write attempted against a protected sector.
        const WRPERR = 1 << 4;
        /// Programming alignment error.
        const PGAERR = 1 << 5;
        /// Programming parallelism error.
        const PGPERR = 1 << 6;
        /// Programming sequence error.
        const PGSERR = 1 << 7;
    }
}

/// Flash controller operations the gate consumes.
pub trait FlashControl {
    /// Lift write protection on the patchable region.
    fn unlock_protection(&mut self);

    /// Re-impose write protection.
    fn lock_protection(&mut self);

    /// Program `bytes` starting at `address`. The returned status is
    /// the controller's claim, not ground truth; callers that must know
    /// whether the write landed read the region back.
    fn program(&mut self, address: u32, bytes: &[u8]) -> Result<(), FlashStatus>;

    /// Clear any latched error bits in the status register.
    fn clear_error_flags(&mut self);

    /// Copy `out.len()` bytes starting at `address` into `out`.
    fn read(&self, address: u32, out: &mut [u8]);
}

/// Scoped write-protection lift.
///
/// Relocking and clearing the status register happen in `Drop`, so no
/// exit path can leave the region writable or an error bit latched.
pub struct ProtectionGuard<'a, F: FlashControl> {
    flash: &'a mut F,
}

impl<'a, F: FlashControl> ProtectionGuard<'a, F> {
    /// Unlock the region and hand back a guard scoped to the lift.
    pub fn lift(flash: &'a mut F) -> Self {
        flash.unlock_protection();
        ProtectionGuard { flash }
    }

    /// Program through the lifted protection.
    pub fn program(&mut self, address: u32, bytes: &[u8]) -> Result<(), FlashStatus> {
        self.flash.program(address, bytes)
    }
}

impl<F: FlashControl> Drop for ProtectionGuard<'_, F> {
    fn drop(&mut self) {
        self.flash.lock_protection();
        self.flash.clear_error_flags();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFlash, FlashCall, WriteBehavior};

    const BASE: u32 = 0x0802_0000;

    #[test]
    fn guard_relocks_and_clears_on_drop() {
        let mut flash = FakeFlash::new(BASE);
        {
            let mut region = ProtectionGuard::lift(&mut flash);
            region.program(BASE, &[0x00; 4]).unwrap();
        }
        assert!(flash.protected());
        assert!(flash.status().is_empty());
        assert_eq!(
            flash.calls.as_slice(),
            [
                FlashCall::Unlock,
                FlashCall::Program,
                FlashCall::Lock,
                FlashCall::ClearStatus,
            ]
        );
    }

    #[test]
    fn guard_relocks_even_when_program_fails() {
        let mut flash = FakeFlash::with_behavior(BASE, WriteBehavior::Dropped);
        {
            let mut region = ProtectionGuard::lift(&mut flash);
            assert!(region.program(BASE, &[0x00; 4]).is_err());
        }
        assert!(flash.protected());
        assert!(flash.calls.contains(&FlashCall::Lock));
        assert!(flash.calls.contains(&FlashCall::ClearStatus));
    }

    #[test]
    fn guard_clears_the_latched_status() {
        let mut flash = FakeFlash::with_behavior(BASE, WriteBehavior::Dropped);
        {
            let mut region = ProtectionGuard::lift(&mut flash);
            let _ = region.program(BASE, &[0x00; 4]);
        }
        assert!(flash.status().is_empty());
    }
}
