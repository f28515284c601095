//! licgen: issue an RSA-signed software license.
//!
//! Usage:
//!   licgen --user a@b.com --major 1 --valid-to days-30 --output ./out
//!
//! Writes `public.key`, `private.key` and `license.data` into the output
//! directory. Pass `--private-key` and `--public-key` together to reuse an
//! existing key pair.

use anyhow::Result;
use licgen_cli::{parse_args, run};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit());
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let issuance = run(args)?;
    info!(
        "Issued license {} for {}",
        issuance.record().id(),
        issuance.record().user()
    );
    Ok(())
}
