use anyhow::Result;
use framerelay_core::MediaSource;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;
mod hooks;

fn main() -> Result<()> {
    // RUST_LOG controls verbosity; defaults to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("framerelay v{}", env!("CARGO_PKG_VERSION"));

    let Some(arg) = std::env::args().nth(1) else {
        error!("missing source (file path, stream URL, or '-' for stdin)");
        std::process::exit(2);
    };
    let source = MediaSource::parse(&arg);

    match app::run(source) {
        Ok(()) => {
            info!("framerelay exited cleanly");
            Ok(())
        }
        Err(e) => {
            error!("fatal error: {:#}", e);
            Err(e)
        }
    }
}
