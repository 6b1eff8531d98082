use foundation::ids::ClusterId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    /// A query reached a source whose index has not been built yet.
    NotBuilt,
    UnknownCluster(ClusterId),
    InvalidOptions(String),
}

impl std::fmt::Display for ClusterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterError::NotBuilt => write!(f, "cluster index queried before it was built"),
            ClusterError::UnknownCluster(id) => write!(f, "unknown cluster id: {id}"),
            ClusterError::InvalidOptions(msg) => write!(f, "invalid cluster options: {msg}"),
        }
    }
}

impl std::error::Error for ClusterError {}
