use thiserror::Error;

/// Failure taxonomy of the orchestration surface. Every network-dependent
/// operation catches its own failures and degrades to an empty or fallback
/// result; none of these ever aborts a request.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),
    #[error("no matching places")]
    NoResults,
    #[error("no routable target after {attempts} attempts")]
    NoRoutableTarget { attempts: u32 },
    #[error("routing unavailable: {0}")]
    RouteUnavailable(String),
}

impl NavError {
    /// Short user-visible notice for the session's notice slot.
    pub fn notice(&self) -> String {
        match self {
            NavError::PermissionDenied => "Location permission denied".to_string(),
            NavError::Network(_) => "Network unavailable".to_string(),
            NavError::NoResults => "No results".to_string(),
            NavError::NoRoutableTarget { .. } => "No routable destination nearby".to_string(),
            NavError::RouteUnavailable(_) => {
                "Routing unavailable, showing straight line".to_string()
            }
        }
    }
}
