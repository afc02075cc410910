//! ad-ldap-probe - Kerberos LDAP bind check against Active Directory.
//!
//! Binds with the caller's Kerberos ticket, reads the default naming context and prints one
//! random user account. Diagnostic lines go to stdout, logs to stderr.

use adprobe_core::ProbeConfig;
use adprobe_directory::DirectoryProbe;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LONG_ABOUT: &str = "\
Kerberos-authenticated LDAP probe for Active Directory.

Connects to $AD_LDAP_HOST on port 389, binds with the current Kerberos ticket, reads the
default naming context and prints one random user account.

The Kerberos bind needs the `gssapi` cargo feature and the system GSSAPI libraries:
    cargo build -p adprobe-cli --features gssapi
Without it the bind step fails with an \"Unsupported\" error.";

#[derive(Parser, Debug)]
#[command(name = "ad-ldap-probe")]
#[command(version)]
#[command(
    about = "Kerberos-authenticated LDAP probe for Active Directory (build with --features gssapi)",
    long_about = LONG_ABOUT
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "AD_PROBE_LOG", default_value = "warn")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();

    let config = ProbeConfig::from_env();
    if config.is_placeholder_host() {
        warn!(host = %config.host, "AD_LDAP_HOST is not set; using placeholder host");
    }

    let probe = DirectoryProbe::new(config);
    let mut rng = rand::rng();
    let mut stdout = std::io::stdout().lock();
    match probe.run(&mut rng, &mut stdout).await {
        Ok(outcome) => {
            info!(?outcome, "Probe finished");
            Ok(())
        }
        Err(err) => {
            if err.should_log() {
                error!(code = err.error_code(), error = %err, "Probe failed");
            }
            Err(err.into())
        }
    }
}
