//! Best-effort, cached project id lookup.

use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::ProjectConfig;

/// Lifecycle of the cached metadata-server result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectState {
    /// No lookup has started since construction or the last reset.
    Unresolved,
    /// A lookup is in flight.
    Resolving,
    /// The lookup finished without an id.
    Absent,
    /// The lookup returned an id.
    Present(String),
}

/// One generation of the cache. `reset` swaps in a fresh slot.
#[derive(Default)]
struct Slot {
    cell: OnceCell<Option<String>>,
    resolving: AtomicBool,
}

/// Resolves the project id used to format Cloud Logging trace fields.
pub struct ProjectResolver {
    config: ProjectConfig,
    client: reqwest::Client,
    slot: ArcSwap<Slot>,
    lookups: AtomicUsize,
}

impl ProjectResolver {
    /// Create a resolver from config. No lookup happens until [`resolve`](Self::resolve).
    pub fn new(config: ProjectConfig) -> Self {
        // The metadata server is link-local; never route it through a proxy.
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_default();

        Self {
            config,
            client,
            slot: ArcSwap::from_pointee(Slot::default()),
            lookups: AtomicUsize::new(0),
        }
    }

    /// A resolver that never queries the metadata server.
    ///
    /// The environment override still wins when set.
    pub fn fixed(project_id: Option<String>) -> Self {
        Self::new(ProjectConfig {
            project_id,
            metadata_enabled: false,
            ..ProjectConfig::default()
        })
    }

    /// Resolve the project id.
    ///
    /// Order: environment override, configured id, cached metadata lookup.
    /// Failures resolve to `None` and are cached like successes.
    pub async fn resolve(&self) -> Option<String> {
        if let Some(id) = self.env_override() {
            return Some(id);
        }
        if let Some(id) = self.config.project_id.as_ref().filter(|id| !id.is_empty()) {
            return Some(id.clone());
        }
        if !self.config.metadata_enabled {
            return None;
        }

        let slot = self.slot.load_full();
        slot.cell
            .get_or_init(|| self.lookup(&slot))
            .await
            .clone()
    }

    /// State of the metadata cache.
    pub fn state(&self) -> ProjectState {
        let slot = self.slot.load();
        match slot.cell.get() {
            Some(Some(id)) => ProjectState::Present(id.clone()),
            Some(None) => ProjectState::Absent,
            None if slot.resolving.load(Ordering::Acquire) => ProjectState::Resolving,
            None => ProjectState::Unresolved,
        }
    }

    /// Forget the cached result. Intended for test isolation.
    pub fn reset(&self) {
        self.slot.store(Arc::new(Slot::default()));
    }

    /// Number of metadata requests issued so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// The configuration this resolver was built from.
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    fn env_override(&self) -> Option<String> {
        std::env::var(&self.config.env_var)
            .ok()
            .filter(|value| !value.is_empty())
    }

    async fn lookup(&self, slot: &Slot) -> Option<String> {
        let _resolving = ResolvingGuard::set(&slot.resolving);
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let result = self.fetch().await;

        match &result {
            Some(id) => tracing::debug!(project_id = %id, "Resolved GCP project id"),
            None => tracing::debug!("GCP project id unavailable, trace fields will be omitted"),
        }
        result
    }

    async fn fetch(&self) -> Option<String> {
        let response = self
            .client
            .get(&self.config.metadata_url)
            .header("Metadata-Flavor", "Google")
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, url = %self.config.metadata_url, "Metadata server unreachable");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "Metadata server returned an error");
            return None;
        }

        match response.text().await {
            Ok(body) => {
                let id = body.trim();
                (!id.is_empty()).then(|| id.to_string())
            }
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read metadata response");
                None
            }
        }
    }
}

/// Marks a slot as resolving until dropped, including when the lookup
/// future is cancelled mid-flight.
struct ResolvingGuard<'a>(&'a AtomicBool);

impl<'a> ResolvingGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for ProjectResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectResolver")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_env(env_var: &str) -> ProjectConfig {
        ProjectConfig {
            env_var: env_var.to_string(),
            // Nothing listens on port 1; connections are refused immediately.
            metadata_url: "http://127.0.0.1:1/project-id".to_string(),
            ..ProjectConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fixed_resolver() {
        let resolver = ProjectResolver::fixed(Some("fixed-project".into()));
        assert_eq!(resolver.resolve().await.as_deref(), Some("fixed-project"));

        let resolver = ProjectResolver::fixed(None);
        assert_eq!(resolver.resolve().await, None);
        assert_eq!(resolver.lookup_count(), 0);
        assert_eq!(resolver.state(), ProjectState::Unresolved);
    }

    #[tokio::test]
    async fn test_empty_configured_id_is_absent() {
        let resolver = ProjectResolver::fixed(Some(String::new()));
        assert_eq!(resolver.resolve().await, None);

        let resolver = ProjectResolver::new(ProjectConfig {
            project_id: Some(String::new()),
            ..config_with_env("TRACE_LOGGER_TEST_UNSET_3")
        });
        assert_eq!(resolver.resolve().await, None);
        assert_eq!(resolver.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_env_override_wins() {
        let var = "TRACE_LOGGER_TEST_PROJECT_ENV_WINS";
        std::env::set_var(var, "from-env");

        let resolver = ProjectResolver::new(ProjectConfig {
            project_id: Some("from-config".into()),
            ..config_with_env(var)
        });
        assert_eq!(resolver.resolve().await.as_deref(), Some("from-env"));
        assert_eq!(resolver.lookup_count(), 0);

        std::env::remove_var(var);
        assert_eq!(resolver.resolve().await.as_deref(), Some("from-config"));
    }

    #[tokio::test]
    async fn test_unreachable_metadata_is_absent_and_cached() {
        let resolver = ProjectResolver::new(config_with_env("TRACE_LOGGER_TEST_UNSET_1"));
        assert_eq!(resolver.state(), ProjectState::Unresolved);

        assert_eq!(resolver.resolve().await, None);
        assert_eq!(resolver.resolve().await, None);
        assert_eq!(resolver.state(), ProjectState::Absent);
        assert_eq!(resolver.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_reset_clears_cache() {
        let resolver = ProjectResolver::new(config_with_env("TRACE_LOGGER_TEST_UNSET_2"));
        resolver.resolve().await;
        assert_eq!(resolver.state(), ProjectState::Absent);

        resolver.reset();
        assert_eq!(resolver.state(), ProjectState::Unresolved);

        resolver.resolve().await;
        assert_eq!(resolver.lookup_count(), 2);
    }
}
