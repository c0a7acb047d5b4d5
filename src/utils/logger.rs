use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs a stdout subscriber for the whole process. Later calls are
/// no-ops, so embedding applications and tests can both call this freely.
pub fn setup_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
