//! Boot-time decision: continue into main firmware or halt the device.
//!
//! Single pass, no loops, no re-entry: classify the installed
//! bootloader, repair it when a repair is registered, and fail closed
//! on everything else. `Halted` is terminal; the boot sequence must not
//! proceed past this gate once it is signaled.

use crate::classify::{self, tag};
use crate::flash::FlashControl;
use crate::hardware::{DigestSource, SystemControl};
use crate::hotpatch;
use crate::ui::WarningScreen;

/// Terminal fault of the integrity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateFault {
    /// Digest absent, malformed, or not in the allowlist.
    UnverifiedBootloader,
    /// Patch write completed but the read-back does not match.
    HotpatchVerificationFailure,
    /// Classification outside the known domain.
    UnclassifiedState,
}

impl GateFault {
    /// Static warning shown before the device halts.
    pub fn warning(self) -> &'static str {
        match self {
            GateFault::UnverifiedBootloader => "Unknown bootloader. Contact support.",
            GateFault::HotpatchVerificationFailure => "Hotpatch failed. Contact support.",
            GateFault::UnclassifiedState => "B/L check failed. Reboot Device!",
        }
    }
}

/// Result of the gate. `Halted` means the caller must not continue the
/// boot sequence.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Halted(GateFault),
}

/// Run the integrity check: classify, repair if repairable, decide.
///
/// Shows the matching warning on `screen` for every halted outcome;
/// the caller is responsible for actually stopping the device.
pub fn run<D, F, S>(source: &mut D, flash: &mut F, screen: &mut S) -> Outcome
where
    D: DigestSource,
    F: FlashControl,
    S: WarningScreen,
{
    let kind = classify::classify(source);
    let outcome = decide(kind as u32, || match hotpatch::patch_for(kind) {
        Some(patch) => hotpatch::apply(flash, patch),
        None => false,
    });

    if let Outcome::Halted(fault) = outcome {
        log::error!(target: "gate", "{}", fault.warning());
        screen.show_warning(fault.warning());
    }
    outcome
}

/// Map a classification tag to the boot decision.
///
/// Matches on the raw tag with a mandatory default arm: a value outside
/// the classification domain (a corrupted discriminant included) halts,
/// it never falls open. `repair` runs only for the repairable tag.
fn decide(kind_tag: u32, mut repair: impl FnMut() -> bool) -> Outcome {
    match kind_tag {
        tag::VERIFIED => Outcome::Continue,
        tag::REPAIRABLE => {
            if repair() {
                Outcome::Continue
            } else {
                Outcome::Halted(GateFault::HotpatchVerificationFailure)
            }
        }
        tag::UNVERIFIED => Outcome::Halted(GateFault::UnverifiedBootloader),
        _ => Outcome::Halted(GateFault::UnclassifiedState),
    }
}

/// Boot-sequence entry point. Returns only when the installed
/// bootloader is safe; every other outcome halts the device and never
/// hands control back.
pub fn check_bootloader<D, F, S, H>(source: &mut D, flash: &mut F, screen: &mut S, system: &mut H)
where
    D: DigestSource,
    F: FlashControl,
    S: WarningScreen,
    H: SystemControl,
{
    match run(source, flash, screen) {
        Outcome::Continue => {}
        Outcome::Halted(_) => system.halt(),
    }
}
