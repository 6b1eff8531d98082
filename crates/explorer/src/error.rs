use clustering::ClusterError;

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerError {
    Cluster(ClusterError),
    Config(ConfigError),
    UnknownRegion(String),
    /// The feature is not part of the current location set or view.
    UnknownFeature,
}

impl std::fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExplorerError::Cluster(e) => write!(f, "{e}"),
            ExplorerError::Config(e) => write!(f, "{e}"),
            ExplorerError::UnknownRegion(id) => write!(f, "unknown region: {id}"),
            ExplorerError::UnknownFeature => write!(f, "feature is not visible"),
        }
    }
}

impl std::error::Error for ExplorerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExplorerError::Cluster(e) => Some(e),
            ExplorerError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ClusterError> for ExplorerError {
    fn from(e: ClusterError) -> Self {
        ExplorerError::Cluster(e)
    }
}

impl From<ConfigError> for ExplorerError {
    fn from(e: ConfigError) -> Self {
        ExplorerError::Config(e)
    }
}
