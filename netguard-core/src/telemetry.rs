//! Structured logging setup. There is no metrics/trace export pipeline here,
//! since there's no RPC façade in this crate to instrument — just an
//! `EnvFilter`-driven `fmt` layer, the same shape every binary built against
//! this crate would want.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_telemetry() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}
