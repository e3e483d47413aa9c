// Swing Highlights Core - golf swing detection and highlight reels
// Live pose-triggered recording plus offline swing extraction, selection
// and timeline composition

// Module declarations
pub mod analysis;
pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod highlight;
pub mod managers;
pub mod offline;
pub mod pose;
pub mod telemetry;
pub mod trigger;

// Re-exports for convenience
pub use analysis::{ClassifiedFrame, PoseLabel};
pub use engine::{EngineHandle, HighlightOutcome, HighlightRequest};
pub use error::{ErrorCode, HighlightError, PoseError};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber
///
/// Honors `RUST_LOG`, defaulting to `swing_highlights=info`. Output goes to
/// stderr so stdout stays free for machine-readable reports. Calling it
/// again, or after the host installed its own subscriber, is a no-op.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swing_highlights=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
