//! Private-key transform of the canonical record.
//!
//! The artifact is a single RSA block: the payload padded with PKCS#1 v1.5
//! type 1 padding (`00 01 FF.. 00 payload`, no digest) and raised to the
//! private exponent. Anyone holding the public key recovers the exact
//! payload with [`recover_payload`]. The payload must therefore fit in one
//! block: at most `modulus_bytes - 11` bytes.

use crate::error::{LicenseError, LicenseResult};
use crate::record::LicenseRecord;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

/// Bytes of PKCS#1 v1.5 padding overhead per block.
pub const PKCS1_PADDING_OVERHEAD: usize = 11;

/// Minimum run of `0xFF` filler bytes in a well-formed block.
const MIN_FILLER_LEN: usize = 8;

/// The opaque license artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedArtifact(Vec<u8>);

impl SignedArtifact {
    /// Wraps raw artifact bytes (e.g. read back from disk).
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Largest payload a key of this size can carry.
#[must_use]
pub fn max_payload_len(key: &impl PublicKeyParts) -> usize {
    key.size().saturating_sub(PKCS1_PADDING_OVERHEAD)
}

fn pem_str(pem: &[u8]) -> LicenseResult<&str> {
    std::str::from_utf8(pem).map_err(|_| LicenseError::InvalidKey("key is not UTF-8 PEM".to_string()))
}

/// Decodes a private key from PKCS#8 or PKCS#1 PEM.
pub fn decode_private_key(pem: &[u8]) -> LicenseResult<RsaPrivateKey> {
    let pem = pem_str(pem)?;
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| LicenseError::InvalidKey(format!("private key: {e}")))
}

/// Decodes a public key from SPKI or PKCS#1 PEM.
pub fn decode_public_key(pem: &[u8]) -> LicenseResult<RsaPublicKey> {
    let pem = pem_str(pem)?;
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| LicenseError::InvalidKey(format!("public key: {e}")))
}

/// Applies the private-key transform to an arbitrary payload.
pub fn sign_payload(private_pem: &[u8], payload: &[u8]) -> LicenseResult<SignedArtifact> {
    let key = decode_private_key(private_pem)?;
    let max = max_payload_len(&key);
    if payload.len() > max {
        return Err(LicenseError::PayloadTooLarge {
            len: payload.len(),
            max,
        });
    }

    let block = key
        .sign(Pkcs1v15Sign::new_unprefixed(), payload)
        .map_err(|e| LicenseError::Signing(e.to_string()))?;
    Ok(SignedArtifact(block))
}

/// Serializes `record` canonically and signs it.
pub fn sign_record(record: &LicenseRecord, private_pem: &[u8]) -> LicenseResult<SignedArtifact> {
    let payload = record.to_canonical_bytes()?;
    tracing::debug!(payload_len = payload.len(), "signing license record");
    sign_payload(private_pem, &payload)
}

/// Inverts the private-key transform with the public key and strips the
/// padding, yielding the exact payload that was signed.
///
/// # Errors
///
/// Fails if the key cannot be decoded, the artifact is not one block of this
/// key's size, or the recovered block is not type 1 padded (which is what a
/// mismatched key pair produces).
pub fn recover_payload(public_pem: &[u8], artifact: &[u8]) -> LicenseResult<Vec<u8>> {
    let key = decode_public_key(public_pem)?;
    let block_len = key.size();
    if artifact.len() != block_len {
        return Err(LicenseError::Recovery(format!(
            "artifact is {} bytes, expected {block_len}",
            artifact.len()
        )));
    }

    let signature = BigUint::from_bytes_be(artifact);
    if &signature >= key.n() {
        return Err(LicenseError::Recovery(
            "artifact is out of range for this key".to_string(),
        ));
    }

    let recovered = signature.modpow(key.e(), key.n()).to_bytes_be();
    let mut block = vec![0u8; block_len - recovered.len()];
    block.extend_from_slice(&recovered);

    strip_type1_padding(&block).map(<[u8]>::to_vec)
}

/// Parses `00 01 FF{8,} 00 payload`.
fn strip_type1_padding(block: &[u8]) -> LicenseResult<&[u8]> {
    let malformed = || LicenseError::Recovery("malformed padding (wrong public key?)".to_string());

    let (header, rest) = block.split_at_checked(2).ok_or_else(malformed)?;
    if header != [0x00, 0x01] {
        return Err(malformed());
    }

    let filler_len = rest.iter().take_while(|&&b| b == 0xFF).count();
    if filler_len < MIN_FILLER_LEN || rest.get(filler_len) != Some(&0x00) {
        return Err(malformed());
    }
    Ok(&rest[filler_len + 1..])
}
