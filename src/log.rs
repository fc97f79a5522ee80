use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Log lines go through the indicatif layer so
/// they do not tear progress bars.
///
/// `RUST_LOG` wins over `verbose` when set.
pub fn init(verbose: bool) {
    let default = if verbose {
        "packfetch=debug,packfetch_api=debug,packfetch_util=debug,info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let indicatif_layer = IndicatifLayer::new();
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(indicatif_layer.get_stderr_writer())
                .compact(),
        )
        .with(indicatif_layer)
        .try_init();
}
