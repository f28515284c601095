//! Command-line adapter around `licgen-license`.
//!
//! Parses flags into an [`IssueRequest`], runs the issuer and writes the
//! public key, private key and license artifact into the output directory.
//! All three files are staged first and only moved into place once every
//! one of them has been written. A failure while moving them rolls back
//! what was already placed, so a failed run leaves no partial output.

use anyhow::{Context, Result, bail};
use clap::Parser;
use licgen_license::{
    DEFAULT_LICENSE_NAME, DEFAULT_PRIVATE_KEY_NAME, DEFAULT_PUBLIC_KEY_NAME, IssueRequest,
    Issuance, Issuer, KeyPairProvider, LicenseTerms, OutputFile, OutputLayout, version_component,
};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile, TempPath};
use tracing::{debug, info, warn};

/// Single-dash multi-letter aliases and the long flag each stands for.
const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("-ma", "--major"),
    ("-mi", "--minor"),
    ("-p", "--patch"),
    ("-pa", "--patch"),
    ("-u", "--user"),
    ("-e", "--expire"),
    ("-vt", "--valid-to"),
    ("-pu", "--public"),
    ("-pr", "--private"),
    ("-l", "--license"),
    ("-o", "--output"),
    ("-pk", "--private-key"),
    ("-pubk", "--public-key"),
];

/// Long flags that consume the following argument as their value.
const VALUE_FLAGS: &[&str] = &[
    "--major",
    "--minor",
    "--patch",
    "--user",
    "--expire",
    "--valid-to",
    "--public",
    "--private",
    "--license",
    "--output",
    "--private-key",
    "--public-key",
];

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "licgen")]
#[command(about = "Issue an RSA-signed software license")]
pub struct Args {
    /// Major version constraint (number or *)
    #[arg(long, default_value = "*")]
    pub major: String,

    /// Minor version constraint (number or *)
    #[arg(long, default_value = "*")]
    pub minor: String,

    /// Patch version constraint (number or *)
    #[arg(long, default_value = "*")]
    pub patch: String,

    /// License holder, e.g. an email address
    #[arg(long)]
    pub user: Option<String>,

    /// Absolute expiration date (e.g. 2027-12-31)
    #[arg(long)]
    pub expire: Option<String>,

    /// Relative expiration: <years|months|days|hours|minutes|seconds>-<count>
    #[arg(long)]
    pub valid_to: Option<String>,

    /// Public key output filename
    #[arg(long, default_value = DEFAULT_PUBLIC_KEY_NAME)]
    pub public: String,

    /// Private key output filename
    #[arg(long, default_value = DEFAULT_PRIVATE_KEY_NAME)]
    pub private: String,

    /// License output filename
    #[arg(long, default_value = DEFAULT_LICENSE_NAME)]
    pub license: String,

    /// Output directory [default: current directory]
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Existing private key to reuse (requires --public-key)
    #[arg(long)]
    pub private_key: Option<PathBuf>,

    /// Existing public key to reuse (requires --private-key)
    #[arg(long)]
    pub public_key: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Rewrites legacy single-dash aliases (`-ma`, `-pubk`, ...) to long flags.
///
/// The token after a value-taking flag is passed through untouched, so a
/// value that happens to look like an alias is not rewritten.
pub fn normalize_args<I, T>(raw: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut raw = raw.into_iter().map(Into::<OsString>::into);
    let mut out: Vec<OsString> = raw.next().into_iter().collect();

    while let Some(token) = raw.next() {
        let Some(text) = token.to_str() else {
            out.push(token);
            continue;
        };
        if text == "--" {
            out.push(token);
            out.extend(raw.by_ref());
            break;
        }

        let long = LEGACY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == text)
            .map(|(_, long)| *long)
            .or_else(|| VALUE_FLAGS.iter().copied().find(|flag| *flag == text));

        match long {
            Some(flag) => {
                out.push(flag.into());
                if let Some(value) = raw.next() {
                    out.push(value);
                }
            }
            None => out.push(token),
        }
    }
    out
}

/// Parses a full argv (program name first), accepting legacy aliases.
pub fn parse_args<I, T>(raw: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    Args::try_parse_from(normalize_args(raw))
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() { default.to_string() } else { value }
}

impl Args {
    /// Turns parsed flags into a validated request and its key source.
    pub fn into_request(self) -> Result<(IssueRequest, KeyPairProvider)> {
        let directory = match self.output.filter(|dir| !dir.as_os_str().is_empty()) {
            Some(dir) => dir,
            None => std::env::current_dir().context("Failed to resolve current directory")?,
        };

        let terms = LicenseTerms {
            major: version_component(Some(self.major)),
            minor: version_component(Some(self.minor)),
            patch: version_component(Some(self.patch)),
            user: self.user.unwrap_or_default(),
            valid_to: self.valid_to.filter(|s| !s.is_empty()),
            expire: self.expire.filter(|s| !s.is_empty()),
        };
        let outputs = OutputLayout {
            directory,
            public_key: or_default(self.public, DEFAULT_PUBLIC_KEY_NAME),
            private_key: or_default(self.private, DEFAULT_PRIVATE_KEY_NAME),
            license: or_default(self.license, DEFAULT_LICENSE_NAME),
        };

        let request = IssueRequest::new(terms, outputs)?;
        let keys = KeyPairProvider::new(self.public_key, self.private_key);
        Ok((request, keys))
    }
}

/// A destination that has been written over, and what it held before.
struct Placed {
    path: PathBuf,
    previous: Option<TempPath>,
}

impl Placed {
    fn undo(self) {
        let restored = match &self.previous {
            Some(backup) => fs::rename(backup, &self.path),
            None => fs::remove_file(&self.path),
        };
        match restored {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound && self.previous.is_none() => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to roll back output"),
        }
    }
}

/// Moves an existing file at `path` to a hidden backup next to it.
fn set_aside(path: &Path) -> io::Result<Option<TempPath>> {
    if fs::symlink_metadata(path).is_err() {
        return Ok(None);
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let backup = Builder::new()
        .prefix(".licgen-prev")
        .tempfile_in(dir)?
        .into_temp_path();
    fs::rename(path, &backup)?;
    Ok(Some(backup))
}

/// Outermost ancestor of `dir` that does not exist yet.
fn first_missing_ancestor(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .take_while(|a| !a.as_os_str().is_empty() && !a.exists())
        .last()
        .map(Path::to_path_buf)
}

fn remove_created(dirs: &[PathBuf]) {
    for dir in dirs.iter().rev() {
        if let Err(e) = fs::remove_dir_all(dir) {
            warn!(path = %dir.display(), error = %e, "failed to remove output directory");
        }
    }
}

fn check_destinations(files: &[OutputFile<'_>]) -> Result<()> {
    for (i, file) in files.iter().enumerate() {
        if file.path.is_dir() {
            bail!(
                "Cannot save {} file to '{}': a directory is in the way",
                file.kind.label(),
                file.path.display()
            );
        }
        if let Some(other) = files[..i].iter().find(|other| other.path == file.path) {
            bail!(
                "The {} and {} files both point at '{}'",
                other.kind.label(),
                file.kind.label(),
                file.path.display()
            );
        }
    }
    Ok(())
}

fn stage(files: &[OutputFile<'_>], created: &mut Vec<PathBuf>) -> Result<Vec<NamedTempFile>> {
    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        let parent = file.path.parent().unwrap_or(Path::new("."));
        if let Some(missing) = first_missing_ancestor(parent) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory '{}'", parent.display()))?;
            created.push(missing);
        }
        let mut tmp = NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to stage {} file in '{}'", file.kind.label(), parent.display()))?;
        tmp.write_all(file.contents)
            .and_then(|()| tmp.flush())
            .with_context(|| format!("Failed to write {} file", file.kind.label()))?;
        debug!(kind = file.kind.label(), tmp = %tmp.path().display(), "staged output");
        staged.push(tmp);
    }
    Ok(staged)
}

fn place(file: &OutputFile<'_>, tmp: NamedTempFile, placed: &mut Vec<Placed>) -> Result<()> {
    let previous = set_aside(&file.path).with_context(|| {
        format!("Failed to move existing {} file '{}' aside", file.kind.label(), file.path.display())
    })?;
    placed.push(Placed {
        path: file.path.clone(),
        previous,
    });
    tmp.persist(&file.path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to save {} file to '{}'", file.kind.label(), file.path.display()))?;
    Ok(())
}

/// Writes the three outputs.
///
/// Every destination is checked and every file staged before any is moved
/// into place. If a move fails, files already placed are removed, any file
/// they replaced is restored, and directories created for this run are
/// deleted.
pub fn write_outputs(issuance: &Issuance) -> Result<()> {
    let files = issuance.files();
    check_destinations(&files)?;

    let mut created = Vec::new();
    let staged = match stage(&files, &mut created) {
        Ok(staged) => staged,
        Err(e) => {
            remove_created(&created);
            return Err(e);
        }
    };

    let mut placed = Vec::with_capacity(files.len());
    for (file, tmp) in files.iter().zip(staged) {
        info!("Saving {} file to '{}'.", file.kind.label(), file.path.display());
        if let Err(e) = place(file, tmp, &mut placed) {
            for done in placed.into_iter().rev() {
                done.undo();
            }
            remove_created(&created);
            return Err(e);
        }
    }
    Ok(())
}

/// Runs one issuance end to end and persists the outputs.
pub fn run(args: Args) -> Result<Issuance> {
    let (request, keys) = args.into_request()?;
    let issuance = Issuer::new()
        .issue(&request, &keys)
        .context("License issuance failed")?;
    write_outputs(&issuance)?;
    Ok(issuance)
}
