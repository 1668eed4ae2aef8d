use thiserror::Error;

#[derive(Error, Debug)]
pub enum HoststatError {
    #[error("kernel query {name} failed: {source}")]
    KernelQuery {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode {what}: got {got} bytes, need at least {need}")]
    Decode {
        what: &'static str,
        got: usize,
        need: usize,
    },

    #[error("invalid clock rate: {0} ticks per second")]
    InvalidClockRate(f64),

    #[error("unsupported on this platform: {0}")]
    Unsupported(&'static str),

    #[error("unknown collector: {0}")]
    UnknownCollector(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<prometheus::Error> for HoststatError {
    fn from(err: prometheus::Error) -> Self {
        HoststatError::Metrics(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HoststatError>;
