//! In-place repair of known-vulnerable bootloaders.
//!
//! The only patch registered today blanks the unsigned-firmware jump
//! inside the vulnerable releases with a run of Thumb `movs r0, r0`
//! no-ops, so those bootloaders can no longer execute unsigned images.

use crate::classify::Classification;
use crate::flash::{FlashControl, ProtectionGuard};

/// Largest payload any registered patch carries.
pub const MAX_PATCH_LEN: usize = 32;

/// A single in-place code edit: a fixed payload at a fixed address.
pub struct PatchDescriptor {
    pub address: u32,
    pub payload: &'static [u8],
}

/// Address of the unsigned-firmware check inside the repairable
/// releases. The layout is identical across all of them; the allowlist
/// guarantees the patch only ever lands on images with this exact code
/// at this exact address.
const UNSIGNED_CHECK_ADDR: u32 = 0x0802_026c;

/// Nine Thumb `movs r0, r0` no-ops (each encodes as 0x0000).
const NOP_WINDOW: [u8; 18] = [0x00; 18];

/// Registered hotpatches, keyed by the classification that requires
/// them. One entry today; a future repairable release adds its own.
pub const PATCHES: &[(Classification, PatchDescriptor)] = &[(
    Classification::Repairable,
    PatchDescriptor {
        address: UNSIGNED_CHECK_ADDR,
        payload: &NOP_WINDOW,
    },
)];

// Read-back buffers are stack-allocated at MAX_PATCH_LEN; an oversized
// payload must fail the build, not the boot.
const _: () = {
    let mut i = 0;
    while i < PATCHES.len() {
        if PATCHES[i].1.payload.len() > MAX_PATCH_LEN {
            panic!("patch payload exceeds MAX_PATCH_LEN");
        }
        i += 1;
    }
};

/// Look up the patch registered for `kind`.
pub fn patch_for(kind: Classification) -> Option<&'static PatchDescriptor> {
    PATCHES.iter().find(|(k, _)| *k == kind).map(|(_, p)| p)
}

/// Apply `patch` under a scoped protection lift, then verify by
/// read-back. True only when the region matches the payload exactly.
///
/// The controller's program status is discarded: some parts latch a
/// spurious protection fault even when the write lands, so the
/// read-back comparison is the only arbiter of success. One attempt,
/// never retried; applying an already-applied patch reads back clean
/// and returns true.
pub fn apply(flash: &mut impl FlashControl, patch: &PatchDescriptor) -> bool {
    {
        let mut region = ProtectionGuard::lift(flash);
        let _ = region.program(patch.address, patch.payload);
    }

    let mut readback = [0u8; MAX_PATCH_LEN];
    let readback = &mut readback[..patch.payload.len()];
    flash.read(patch.address, readback);

    if readback[..] == patch.payload[..] {
        log::info!(target: "hotpatch", "patch verified at {:#010x}", patch.address);
        true
    } else {
        log::error!(target: "hotpatch", "read-back mismatch at {:#010x}", patch.address);
        false
    }
}
