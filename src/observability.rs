use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global fmt subscriber for library hosts that have none.
///
/// Safe to call more than once; later calls are no-ops because a global
/// default may already be set (e.g. by the embedding application or by
/// another test in the same binary).
pub fn init_tracing(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
