#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid metrics configuration: {0}")]
    InvalidConfig(String),
    #[cfg(feature = "prometheus")]
    #[error(transparent)]
    Prometheus(#[from] metrics_exporter_prometheus::BuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
