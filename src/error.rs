use thiserror::Error;

/// Failures at the I/O and parsing boundary. The layout pipeline itself
/// never fails; imperfect data degrades by omission.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid chart input: {0}")]
    InputJson(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    ConfigParse(#[from] json5::Error),
}
