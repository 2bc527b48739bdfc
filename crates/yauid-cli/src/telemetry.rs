//! Log output for the `yauid` binary.
//!
//! Events from the binary and from the `yauid` library (issuance spans,
//! retries, clock regressions) go to stderr so stdout only carries keys.
//! `RUST_LOG` selects what is shown and defaults to `warn`:
//!
//! ```bash
//! RUST_LOG=yauid=trace yauid key --state-file /var/lib/yauid/key --node-id 3
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339()),
        )
        .try_init()?;
    Ok(())
}
