use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration loaded explicitly from environment variables.
///
/// The reference file path has no default; the caller must provide it,
/// and a missing file is fatal before any request is served.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    /// Filesystem path to the reference exam catalog (delimited text).
    pub reference_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),

    #[error("invalid LISTEN_ADDR '{value}': {source}")]
    InvalidAddr {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("reference file not found at {0}")]
    ReferenceMissing(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `REFERENCE_EXAMS_PATH`: path to the reference exam catalog
    ///
    /// Optional:
    /// - `LISTEN_ADDR`: socket address to bind (default `0.0.0.0:8000`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let reference_path = std::env::var("REFERENCE_EXAMS_PATH")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::MissingVar("REFERENCE_EXAMS_PATH"))?;

        if !reference_path.exists() {
            return Err(ConfigError::ReferenceMissing(
                reference_path.display().to_string(),
            ));
        }

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(value) => value
                .parse()
                .map_err(|source| ConfigError::InvalidAddr { value, source })?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 8000)),
        };

        Ok(Self {
            listen_addr,
            reference_path,
        })
    }
}
