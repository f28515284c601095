//! License issuance for licgen.
//!
//! This crate handles:
//! - Resolving relative (`days-30`) and absolute expiration dates
//! - Sourcing an RSA key pair (reuse supplied PEM files or generate 4096-bit)
//! - Building the license record
//! - Transforming the record with the private key into the license artifact
//!
//! # Artifact Format
//!
//! The record is serialized as compact JSON with fixed field order
//! (`id, major, minor, patch, user, created, validTo, expire`), padded with
//! PKCS#1 v1.5 type 1 padding and transformed with the RSA private key. The
//! public key recovers the exact JSON bytes via [`recover_payload`].
//!
//! Verification policy (expiry checks, version matching) is out of scope.

mod clock;
mod error;
mod expiry;
mod ids;
mod issue;
mod keypair;
mod record;
mod signer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ErrorKind, LicenseError, LicenseResult};
pub use expiry::{
    ExpiryUnit, MAX_EXPIRY_YEAR, RelativeExpiry, parse_absolute_date, resolve_valid_to,
};
pub use ids::{IdGenerator, LicenseId, RandomIds};
pub use issue::{
    DEFAULT_LICENSE_NAME, DEFAULT_PRIVATE_KEY_NAME, DEFAULT_PUBLIC_KEY_NAME, IssueRequest,
    Issuance, Issuer, OutputFile, OutputKind, OutputLayout,
};
pub use keypair::{DEFAULT_MODULUS_BITS, KeyPair, KeyPairProvider, KeyPairSource, Provenance};
pub use record::{LicenseRecord, LicenseTerms, WILDCARD, version_component};
pub use signer::{
    PKCS1_PADDING_OVERHEAD, SignedArtifact, decode_private_key, decode_public_key,
    max_payload_len, recover_payload, sign_payload, sign_record,
};
