//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use licgen_license::{IdGenerator, KeyPair, LicenseId};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Modulus used by most tests; large enough for typical records.
pub const TEST_MODULUS_BITS: usize = 2048;

/// A key pair generated once per test binary.
pub fn test_key_pair() -> &'static KeyPair {
    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    KEYS.get_or_init(|| KeyPair::generate(TEST_MODULUS_BITS).expect("test key generation"))
}

/// A second, unrelated key pair.
pub fn other_key_pair() -> &'static KeyPair {
    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    KEYS.get_or_init(|| KeyPair::generate(TEST_MODULUS_BITS).expect("test key generation"))
}

/// Fixed issuance instant: 2026-03-15T09:30:00.250Z.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 9, 30, 0).unwrap() + chrono::TimeDelta::milliseconds(250)
}

/// Hands out `00000000-0000-0000-0000-000000000001`, `...0002`, ...
#[derive(Debug, Default)]
pub struct SequentialIds(AtomicU64);

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> LicenseId {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        LicenseId::from_uuid(Uuid::from_u128(u128::from(n)))
    }
}
