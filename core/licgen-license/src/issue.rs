//! Issuance pipeline.
//!
//! One call to [`Issuer::issue`] runs: validate terms, capture `now`, resolve
//! `validTo`, build the record, source the key pair, sign. Nothing touches
//! the filesystem except reading supplied key files; the caller persists the
//! returned [`Issuance`].

use crate::clock::{Clock, SystemClock};
use crate::error::LicenseResult;
use crate::expiry::resolve_valid_to;
use crate::ids::{IdGenerator, RandomIds};
use crate::keypair::{KeyPair, KeyPairSource};
use crate::record::{LicenseRecord, LicenseTerms};
use crate::signer::{SignedArtifact, sign_record};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_PUBLIC_KEY_NAME: &str = "public.key";
pub const DEFAULT_PRIVATE_KEY_NAME: &str = "private.key";
pub const DEFAULT_LICENSE_NAME: &str = "license.data";

/// Destination directory and file names for the three outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub directory: PathBuf,
    pub public_key: String,
    pub private_key: String,
    pub license: String,
}

impl OutputLayout {
    /// Default file names inside `directory`.
    #[must_use]
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            public_key: DEFAULT_PUBLIC_KEY_NAME.to_string(),
            private_key: DEFAULT_PRIVATE_KEY_NAME.to_string(),
            license: DEFAULT_LICENSE_NAME.to_string(),
        }
    }

    #[must_use]
    pub fn public_key_path(&self) -> PathBuf {
        self.place(&self.public_key)
    }

    #[must_use]
    pub fn private_key_path(&self) -> PathBuf {
        self.place(&self.private_key)
    }

    #[must_use]
    pub fn license_path(&self) -> PathBuf {
        self.place(&self.license)
    }

    /// Resolves a file name under `directory`. A leading root or drive
    /// prefix is dropped, so `/tmp/x.pub` lands at `<directory>/tmp/x.pub`.
    fn place(&self, name: &str) -> PathBuf {
        let relative: PathBuf = Path::new(name)
            .components()
            .filter(|c| !matches!(c, Component::Prefix(_) | Component::RootDir))
            .collect();
        self.directory.join(relative)
    }
}

/// A fully specified issuance request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    pub terms: LicenseTerms,
    pub outputs: OutputLayout,
}

impl IssueRequest {
    /// Builds a request, rejecting terms that cannot be issued.
    pub fn new(terms: LicenseTerms, outputs: OutputLayout) -> LicenseResult<Self> {
        terms.validate()?;
        Ok(Self { terms, outputs })
    }
}

/// Which of the three outputs a file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    PublicKey,
    PrivateKey,
    License,
}

impl OutputKind {
    /// Human-readable label used in status messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::PublicKey => "public key",
            Self::PrivateKey => "private key",
            Self::License => "license",
        }
    }
}

/// One output buffer and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile<'a> {
    pub kind: OutputKind,
    pub path: PathBuf,
    pub contents: &'a [u8],
}

/// The result of a successful issuance.
#[derive(Debug, Clone)]
pub struct Issuance {
    record: LicenseRecord,
    key_pair: KeyPair,
    artifact: SignedArtifact,
    outputs: OutputLayout,
}

impl Issuance {
    #[must_use]
    pub fn record(&self) -> &LicenseRecord {
        &self.record
    }

    #[must_use]
    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    #[must_use]
    pub fn artifact(&self) -> &SignedArtifact {
        &self.artifact
    }

    /// The three buffers to persist, in write order: public key, private
    /// key, license.
    #[must_use]
    pub fn files(&self) -> [OutputFile<'_>; 3] {
        [
            OutputFile {
                kind: OutputKind::PublicKey,
                path: self.outputs.public_key_path(),
                contents: self.key_pair.public_pem(),
            },
            OutputFile {
                kind: OutputKind::PrivateKey,
                path: self.outputs.private_key_path(),
                contents: self.key_pair.private_pem(),
            },
            OutputFile {
                kind: OutputKind::License,
                path: self.outputs.license_path(),
                contents: self.artifact.as_bytes(),
            },
        ]
    }
}

/// Runs issuances with an injectable clock and id source.
#[derive(Debug, Clone, Default)]
pub struct Issuer<C = SystemClock, G = RandomIds> {
    clock: C,
    ids: G,
}

impl Issuer {
    /// Issuer backed by the system clock and random ids.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock, G: IdGenerator> Issuer<C, G> {
    /// Issuer with explicit clock and id source.
    #[must_use]
    pub fn with_parts(clock: C, ids: G) -> Self {
        Self { clock, ids }
    }

    /// Issues one license.
    ///
    /// # Errors
    ///
    /// Validation errors are raised before the key source is consulted. Key
    /// read and crypto errors abort the issuance; no partial result is
    /// returned.
    pub fn issue(&self, request: &IssueRequest, keys: &impl KeyPairSource) -> LicenseResult<Issuance> {
        request.terms.validate()?;

        let now = self.clock.now();
        let valid_to = resolve_valid_to(now, request.terms.valid_to.as_deref());
        let record = LicenseRecord::build(self.ids.next_id(), &request.terms, now, valid_to)?;
        debug!(id = %record.id(), user = record.user(), ?valid_to, "license record built");

        let key_pair = keys.key_pair()?;
        debug!(provenance = ?key_pair.provenance(), "key pair ready");

        let artifact = sign_record(&record, key_pair.private_pem())?;
        info!(id = %record.id(), artifact_len = artifact.len(), "license issued");

        Ok(Issuance {
            record,
            key_pair,
            artifact,
            outputs: request.outputs.clone(),
        })
    }
}
