//! Installed-bootloader classification against the release allowlist.
//!
//! The allowlist is the one artifact that changes when a bootloader
//! release ships: adding the release's digest and classification here
//! is the whole change, no other module moves.

use crate::hardware::{DigestSource, DIGEST_LEN};

/// Raw classification tags.
///
/// Sparse values keep a flipped bit or stray write from turning one
/// kind into another; the decision site in [`crate::gate`] matches on
/// these and fails closed on everything else.
pub mod tag {
    pub const UNVERIFIED: u32 = 0x0;
    pub const REPAIRABLE: u32 = 0xa1f3_5c78;
    pub const VERIFIED: u32 = 0x95c3_a027;
}

/// Trust classification of the installed second-stage bootloader.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Digest absent, malformed, or not in the allowlist.
    Unverified = tag::UNVERIFIED,
    /// Known-vulnerable release with a registered hotpatch.
    Repairable = tag::REPAIRABLE,
    /// Release that is already safe; nothing to do.
    Verified = tag::VERIFIED,
}

/// One allowlisted bootloader release.
pub struct AllowlistEntry {
    pub digest: [u8; DIGEST_LEN],
    pub kind: Classification,
    pub release: &'static str,
}

/// Known bootloader releases, keyed by content digest.
///
/// Ordering is irrelevant; digests are unique (checked at compile time
/// below). Releases up to v1.0.4 shipped in a patched and an unpatched
/// build, so each label appears twice with different digests.
pub const ALLOWLIST: &[AllowlistEntry] = &[
    // Patched releases
    AllowlistEntry {
        digest: [
            0xf1, 0x3c, 0xe2, 0x28, 0xc0, 0xbb, 0x2b, 0xdb,
            0xc5, 0x6b, 0xdc, 0xb5, 0xf4, 0x56, 0x93, 0x67,
            0xf8, 0xe3, 0x01, 0x10, 0x74, 0xcc, 0xc6, 0x33,
            0x31, 0x34, 0x8d, 0xeb, 0x49, 0x8f, 0x2d, 0x8f,
        ],
        kind: Classification::Verified,
        release: "v1.0.0",
    },
    AllowlistEntry {
        digest: [
            0xec, 0x61, 0x88, 0x36, 0xf8, 0x64, 0x23, 0xdb,
            0xd3, 0x11, 0x4c, 0x37, 0xd6, 0xe3, 0xe4, 0xff,
            0xdf, 0xb8, 0x7d, 0x9e, 0x4c, 0x61, 0x99, 0xcf,
            0x3e, 0x16, 0x3a, 0x67, 0xb2, 0x74, 0x98, 0xa2,
        ],
        kind: Classification::Verified,
        release: "v1.0.1",
    },
    AllowlistEntry {
        digest: [
            0x4f, 0x9c, 0x38, 0xc1, 0xcd, 0x06, 0xf5, 0x9e,
            0x8d, 0x4d, 0xe8, 0xe0, 0xd3, 0x1c, 0xdd, 0x34,
            0xc8, 0x31, 0x44, 0xd2, 0xdf, 0x55, 0x0c, 0x41,
            0x2e, 0x00, 0x2b, 0x4b, 0x35, 0xbd, 0x4f, 0xb3,
        ],
        kind: Classification::Verified,
        release: "v1.0.3",
    },
    AllowlistEntry {
        digest: [
            0x91, 0x7d, 0x19, 0x52, 0x26, 0x0c, 0x9b, 0x89,
            0xf3, 0xa9, 0x6b, 0xea, 0x07, 0xee, 0xa4, 0x07,
            0x4a, 0xfd, 0xcc, 0x0e, 0x8c, 0xdd, 0x5d, 0x06,
            0x4e, 0x36, 0x86, 0x8b, 0xdd, 0x68, 0xba, 0x7d,
        ],
        kind: Classification::Verified,
        release: "v1.0.3-signed",
    },
    AllowlistEntry {
        digest: [
            0xfc, 0x4e, 0x5c, 0x4d, 0xc2, 0xe5, 0x12, 0x7b,
            0x68, 0x14, 0xa3, 0xf6, 0x94, 0x24, 0xc9, 0x36,
            0xf1, 0xdc, 0x24, 0x1d, 0x1d, 0xaf, 0x2c, 0x5a,
            0x2d, 0x8f, 0x07, 0x28, 0xeb, 0x69, 0xd2, 0x0d,
        ],
        kind: Classification::Verified,
        release: "v1.0.4-salt",
    },
    // Unpatched releases
    AllowlistEntry {
        digest: [
            0x63, 0x97, 0xc4, 0x46, 0xf6, 0xb9, 0x00, 0x2a,
            0x8b, 0x15, 0x0b, 0xf4, 0xb9, 0xb4, 0xe0, 0xbb,
            0x66, 0x80, 0x0e, 0xd0, 0x99, 0xb8, 0x81, 0xca,
            0x49, 0x70, 0x01, 0x39, 0xb0, 0x55, 0x9f, 0x10,
        ],
        kind: Classification::Repairable,
        release: "v1.0.0",
    },
    AllowlistEntry {
        digest: [
            0xd5, 0x44, 0xb5, 0xe0, 0x6b, 0x0c, 0x35, 0x5d,
            0x68, 0xb8, 0x68, 0xac, 0x75, 0x80, 0xe9, 0xba,
            0xb2, 0xd2, 0x24, 0xa1, 0xe2, 0x44, 0x08, 0x81,
            0xcc, 0x1b, 0xca, 0x2b, 0x81, 0x67, 0x52, 0xd5,
        ],
        kind: Classification::Repairable,
        release: "v1.0.1",
    },
    AllowlistEntry {
        digest: [
            0x5a, 0xa5, 0x5e, 0x69, 0xf1, 0xd9, 0xaa, 0x50,
            0x4d, 0xe6, 0x0f, 0xaf, 0x22, 0xbe, 0x93, 0xcb,
            0xd0, 0x3b, 0x13, 0x73, 0x2d, 0xcb, 0x07, 0xbb,
            0xc0, 0xb7, 0xf9, 0x1d, 0x42, 0xe1, 0x4c, 0xcc,
        ],
        kind: Classification::Repairable,
        release: "v1.0.3",
    },
    AllowlistEntry {
        digest: [
            0xcb, 0x22, 0x25, 0x48, 0xa3, 0x9f, 0xf6, 0xcb,
            0xe2, 0xae, 0x2f, 0x02, 0xc8, 0xd4, 0x31, 0xc9,
            0xae, 0x0d, 0xf8, 0x50, 0xf8, 0x14, 0x44, 0x49,
            0x11, 0xf5, 0x21, 0xb9, 0x5a, 0xb0, 0x2f, 0x4c,
        ],
        kind: Classification::Repairable,
        release: "v1.0.3-signed",
    },
    AllowlistEntry {
        digest: [
            0x77, 0x0b, 0x30, 0xaa, 0xa0, 0xbe, 0x88, 0x4e,
            0xe8, 0x62, 0x18, 0x59, 0xf5, 0xd0, 0x55, 0x43,
            0x7f, 0x89, 0x4a, 0x5c, 0x9c, 0x7c, 0xa2, 0x26,
            0x35, 0xe7, 0x02, 0x4e, 0x05, 0x98, 0x57, 0xb7,
        ],
        kind: Classification::Repairable,
        release: "v1.0.4-salt",
    },
];

/// Classify the installed bootloader by content digest.
///
/// Fail-closed: a digest of the wrong length, or one absent from the
/// allowlist, is `Unverified`. There is no "unknown but assumed safe".
pub fn classify(source: &mut impl DigestSource) -> Classification {
    let mut digest = [0u8; DIGEST_LEN];
    if source.read_bootloader_digest(&mut digest) != DIGEST_LEN {
        log::warn!(target: "classify", "digest source produced a malformed digest");
        return Classification::Unverified;
    }

    // Boot-time constants, not secrets; plain equality is enough.
    for entry in ALLOWLIST {
        if entry.digest == digest {
            log::info!(
                target: "classify",
                "recognized bootloader {} ({:?})",
                entry.release,
                entry.kind
            );
            return entry.kind;
        }
    }

    log::warn!(target: "classify", "bootloader digest not in allowlist");
    Classification::Unverified
}

const fn digest_eq(a: &[u8; DIGEST_LEN], b: &[u8; DIGEST_LEN]) -> bool {
    let mut i = 0;
    while i < DIGEST_LEN {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

// A digest mapped to two classifications must never reach a device;
// reject the table at compile time instead.
const _: () = {
    let mut i = 0;
    while i < ALLOWLIST.len() {
        let mut j = i + 1;
        while j < ALLOWLIST.len() {
            if digest_eq(&ALLOWLIST[i].digest, &ALLOWLIST[j].digest) {
                panic!("duplicate digest in allowlist");
            }
            j += 1;
        }
        i += 1;
    }
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedDigest;

    #[test]
    fn every_allowlist_entry_maps_to_its_kind() {
        for entry in ALLOWLIST {
            let mut source = FixedDigest::new(&entry.digest);
            assert_eq!(
                classify(&mut source),
                entry.kind,
                "entry {} misclassified",
                entry.release
            );
        }
    }

    #[test]
    fn unknown_digest_is_unverified() {
        let mut source = FixedDigest::new(&[0x42; DIGEST_LEN]);
        assert_eq!(classify(&mut source), Classification::Unverified);
    }

    #[test]
    fn short_digest_is_unverified_even_with_known_prefix() {
        let mut source = FixedDigest::new(&ALLOWLIST[0].digest[..16]);
        assert_eq!(classify(&mut source), Classification::Unverified);
    }

    #[test]
    fn overlong_digest_is_unverified() {
        let mut bytes = [0u8; DIGEST_LEN + 1];
        bytes[..DIGEST_LEN].copy_from_slice(&ALLOWLIST[0].digest);
        let mut source = FixedDigest::new(&bytes);
        assert_eq!(classify(&mut source), Classification::Unverified);
    }

    #[test]
    fn empty_digest_source_is_unverified() {
        let mut source = FixedDigest::new(&[]);
        assert_eq!(classify(&mut source), Classification::Unverified);
    }
}
