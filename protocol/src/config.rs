//! # Protocol Configuration & Constants
//!
//! Every magic number the signing engine depends on lives here. These are
//! consensus values: the network hashes and verifies against exactly these
//! bytes and limits, so none of them are tunable at runtime.
//!
//! If you're hardcoding a prefix or a length somewhere else in the crate,
//! move it here.

// ---------------------------------------------------------------------------
// Domain Separation Prefixes
// ---------------------------------------------------------------------------

/// Prefix for transaction ids and transaction signing bytes.
pub const TX_DOMAIN: &[u8] = b"TX";

/// Prefix for the group id computed over an ordered list of transaction ids.
pub const TX_GROUP_DOMAIN: &[u8] = b"TG";

/// Prefix for logic program hashing and delegation signatures.
pub const PROGRAM_DOMAIN: &[u8] = b"Program";

/// Prefix for arbitrary data signed so that a program can check it.
pub const PROGRAM_DATA_DOMAIN: &[u8] = b"ProgData";

/// Prefix for multisig address derivation.
pub const MULTISIG_ADDR_DOMAIN: &[u8] = b"MultisigAddr";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 seed length in bytes.
pub const SEED_LENGTH: usize = 32;

/// Secret key length as the SDKs export it: seed followed by the public key.
pub const SECRET_KEY_LENGTH: usize = 64;

/// Ed25519 public key length. Also the raw address length.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// SHA-512/256 output length.
pub const HASH_LENGTH: usize = 32;

/// Number of trailing digest bytes appended to a public key as its checksum.
pub const CHECKSUM_LENGTH: usize = 4;

/// Length of a display address: base-32 of 36 bytes, no padding.
pub const ADDRESS_STRING_LENGTH: usize = 58;

/// Length of a display transaction id: base-32 of 32 bytes, no padding.
pub const TXID_STRING_LENGTH: usize = 52;

// ---------------------------------------------------------------------------
// Transaction Header Limits
// ---------------------------------------------------------------------------

/// Minimum fee per transaction in microunits. Per-byte fees that compute
/// lower than this are bumped up to it.
pub const MIN_TXN_FEE: u64 = 1_000;

/// Maximum note size in bytes.
pub const MAX_NOTE_LENGTH: usize = 1_024;

/// Maximum number of transactions in an atomic group.
pub const MAX_GROUP_SIZE: usize = 16;

// ---------------------------------------------------------------------------
// Kind-specific Limits
// ---------------------------------------------------------------------------

/// State proof participation keys are 64 bytes.
pub const STATE_PROOF_KEY_LENGTH: usize = 64;

/// Maximum asset decimals.
pub const MAX_ASSET_DECIMALS: u32 = 19;

/// Maximum asset unit name length in bytes.
pub const MAX_ASSET_UNIT_NAME_LENGTH: usize = 8;

/// Maximum asset name length in bytes.
pub const MAX_ASSET_NAME_LENGTH: usize = 32;

/// Maximum asset URL length in bytes.
pub const MAX_ASSET_URL_LENGTH: usize = 96;

/// Maximum number of application call arguments.
pub const MAX_APP_ARGS: usize = 16;

/// Maximum combined size of application call arguments.
pub const MAX_APP_TOTAL_ARG_LENGTH: usize = 2_048;

/// Maximum number of accounts an application call may reference.
pub const MAX_APP_ACCOUNTS: usize = 4;

/// Maximum number of accounts, applications and assets referenced together.
pub const MAX_APP_TOTAL_REFERENCES: usize = 8;

/// Maximum extra program pages an application may rent.
pub const MAX_APP_EXTRA_PAGES: u32 = 3;

// ---------------------------------------------------------------------------
// Multisig & Logic Signatures
// ---------------------------------------------------------------------------

/// The only multisig version the network currently accepts.
pub const MULTISIG_VERSION: u8 = 1;

/// Maximum combined size of a logic program and its arguments.
pub const LOGIC_SIG_MAX_SIZE: usize = 1_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_prefixes_are_distinct() {
        let prefixes = [
            TX_DOMAIN,
            TX_GROUP_DOMAIN,
            PROGRAM_DOMAIN,
            PROGRAM_DATA_DOMAIN,
            MULTISIG_ADDR_DOMAIN,
        ];
        for (i, a) in prefixes.iter().enumerate() {
            for b in prefixes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_address_string_length_matches_payload() {
        // 36 bytes * 8 bits / 5 bits per symbol, rounded up.
        let bits = (PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH) * 8;
        assert_eq!((bits + 4) / 5, ADDRESS_STRING_LENGTH);
        assert_eq!((HASH_LENGTH * 8 + 4) / 5, TXID_STRING_LENGTH);
    }

    #[test]
    fn test_crypto_parameter_sizes() {
        assert_eq!(SEED_LENGTH + PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH);
        assert_eq!(SIGNATURE_LENGTH, 64);
        assert_eq!(HASH_LENGTH, 32);
    }

    #[test]
    fn test_reference_limits_are_consistent() {
        assert!(MAX_APP_ACCOUNTS <= MAX_APP_TOTAL_REFERENCES);
        assert!(MIN_TXN_FEE > 0);
    }
}
