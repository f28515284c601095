//! RSA key pair sourcing.
//!
//! A key pair is either read verbatim from two caller-supplied PEM files or
//! freshly generated (4096-bit modulus, SPKI public PEM, PKCS#8 private PEM).
//! Supplying only one of the two paths is treated as supplying neither.

use crate::error::{LicenseError, LicenseResult};
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Modulus length of generated keys, in bits.
pub const DEFAULT_MODULUS_BITS: usize = 4096;

/// Where a key pair came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Freshly generated for this issuance.
    Generated,
    /// Loaded unchanged from caller-supplied files.
    Supplied,
}

/// A PEM-encoded RSA key pair.
///
/// Matching of the two halves is not checked; a mismatched pair surfaces only
/// when the artifact fails to recover under the public key.
#[derive(Clone)]
pub struct KeyPair {
    public_pem: Vec<u8>,
    private_pem: Vec<u8>,
    provenance: Provenance,
}

impl KeyPair {
    /// Wraps PEM bytes supplied by the caller.
    #[must_use]
    pub fn supplied(public_pem: Vec<u8>, private_pem: Vec<u8>) -> Self {
        Self {
            public_pem,
            private_pem,
            provenance: Provenance::Supplied,
        }
    }

    /// Generates a fresh key pair with the given modulus length.
    pub fn generate(bits: usize) -> LicenseResult<Self> {
        let private = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| LicenseError::KeyGeneration(e.to_string()))?;
        let public = RsaPublicKey::from(&private);

        let private_pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| LicenseError::KeyGeneration(format!("PKCS#8 encoding: {e}")))?;
        let public_pem = public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| LicenseError::KeyGeneration(format!("SPKI encoding: {e}")))?;

        Ok(Self {
            public_pem: public_pem.into_bytes(),
            private_pem: private_pem.as_bytes().to_vec(),
            provenance: Provenance::Generated,
        })
    }

    /// Returns the public key PEM bytes.
    #[must_use]
    pub fn public_pem(&self) -> &[u8] {
        &self.public_pem
    }

    /// Returns the private key PEM bytes.
    #[must_use]
    pub fn private_pem(&self) -> &[u8] {
        &self.private_pem
    }

    #[must_use]
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_pem", &String::from_utf8_lossy(&self.public_pem))
            .field("private_pem", &"[REDACTED]")
            .field("provenance", &self.provenance)
            .finish()
    }
}

/// Anything that can hand the issuer a key pair.
pub trait KeyPairSource {
    fn key_pair(&self) -> LicenseResult<KeyPair>;
}

impl KeyPairSource for KeyPair {
    fn key_pair(&self) -> LicenseResult<KeyPair> {
        Ok(self.clone())
    }
}

/// Reuses caller key files when both are given, otherwise generates.
#[derive(Debug, Clone, Default)]
pub struct KeyPairProvider {
    public_key: Option<PathBuf>,
    private_key: Option<PathBuf>,
    modulus_bits: Option<usize>,
}

impl KeyPairProvider {
    /// Creates a provider for the given (optional) existing key files.
    #[must_use]
    pub fn new(public_key: Option<PathBuf>, private_key: Option<PathBuf>) -> Self {
        Self {
            public_key,
            private_key,
            modulus_bits: None,
        }
    }

    /// Overrides the modulus length used when generating.
    #[must_use]
    pub fn with_modulus_bits(mut self, bits: usize) -> Self {
        self.modulus_bits = Some(bits);
        self
    }

    fn read_pem(path: &Path) -> LicenseResult<Vec<u8>> {
        fs::read(path).map_err(|source| LicenseError::KeyRead {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl KeyPairSource for KeyPairProvider {
    fn key_pair(&self) -> LicenseResult<KeyPair> {
        match (&self.public_key, &self.private_key) {
            (Some(public), Some(private)) => {
                debug!(public = %public.display(), private = %private.display(), "reusing supplied key pair");
                let private_pem = Self::read_pem(private)?;
                let public_pem = Self::read_pem(public)?;
                Ok(KeyPair::supplied(public_pem, private_pem))
            }
            (public, private) => {
                if let Some(ignored) = public.as_ref().or(private.as_ref()) {
                    warn!(
                        ignored = %ignored.display(),
                        "only one existing key supplied, generating a fresh key pair instead"
                    );
                }
                let bits = self.modulus_bits.unwrap_or(DEFAULT_MODULUS_BITS);
                debug!(bits, "generating RSA key pair");
                KeyPair::generate(bits)
            }
        }
    }
}
