use thiserror::Error;

/// Failures at the edges of the crate: config files, recorded streams, exports.
///
/// Per-frame processing never produces these; a bad frame only skips its
/// contribution to counting.
#[derive(Debug, Error)]
pub enum CoachError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("could not decode frame on line {line}: {source}")]
    FrameDecode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
