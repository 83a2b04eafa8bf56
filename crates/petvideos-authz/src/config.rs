//! Authorization configuration.

use std::time::Duration;

/// Configuration for the authorization service.
#[derive(Debug, Clone)]
pub struct AuthzConfig {
    /// Policy store the decision requests are evaluated against.
    pub policy_store_id: String,
    /// Namespace prefixed to every entity and action type
    /// (`"<namespace>::Video"`).
    pub app_namespace: String,
    /// Id of the application-level placeholder entity targeted when a
    /// check has no resource.
    pub application_id: String,
    /// Name of the top-level directory the ancestor walk stops at.
    /// `None` walks until a vertex has no parent.
    pub root_directory: Option<String>,
    /// Maximum number of MEMBEROF hops before the walk fails with
    /// `CycleDetected` (default: 32).
    pub max_depth: usize,
    /// Timeout applied to every graph store call.
    pub store_timeout: Duration,
    /// Timeout applied to every decision engine call.
    pub decision_timeout: Duration,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            policy_store_id: String::new(),
            app_namespace: "PetVideosApp".into(),
            application_id: "PetVideosApp".into(),
            root_directory: Some("petVideosDirectory".into()),
            max_depth: 32,
            store_timeout: Duration::from_secs(5),
            decision_timeout: Duration::from_secs(5),
        }
    }
}
