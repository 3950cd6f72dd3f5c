use thiserror::Error;

/// Errors surfaced by the media decode boundary.
///
/// None of these ever reach the editing layer as a fatal condition; the
/// resource lifecycle manager converts them into "remains absent" states and
/// the synchronizer retries on later ticks.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to open media source: {0}")]
    OpenFailed(String),
    #[error("Media reported zero dimensions")]
    ZeroDimensions,
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
