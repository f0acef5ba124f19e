use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use core_types::AppError;

use crate::traits::Provider;

/// Type-indexed provider lookup: `type -> name -> provider`. The
/// executor resolves a `Job`'s `{name, type}` reference through this at
/// dispatch time rather than holding its own provider handle, so
/// providers can be swapped or reconfigured without touching job
/// definitions.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    inner: Arc<RwLock<HashMap<String, HashMap<String, Arc<dyn Provider>>>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(
        &self,
        provider_type: &str,
        name: &str,
        provider: Arc<dyn Provider>,
    ) -> Result<(), AppError> {
        if name.is_empty() {
            return Err(AppError::InvalidArgument(
                "provider name must not be empty".into(),
            ));
        }
        let mut g = self.inner.write().await;
        let by_name = g.entry(provider_type.to_string()).or_default();
        if by_name.contains_key(name) {
            return Err(AppError::InvalidArgument(format!(
                "provider {name:?} already registered for type {provider_type:?}"
            )));
        }
        by_name.insert(name.to_string(), provider);
        Ok(())
    }

    pub async fn get(&self, provider_type: &str, name: &str) -> Option<Arc<dyn Provider>> {
        let g = self.inner.read().await;
        g.get(provider_type)?.get(name).cloned()
    }

    /// Removes `name` from whichever type bucket holds it. Names are
    /// only unique per-type, but the spec's `unregister` is name-only —
    /// the first bucket containing `name` wins.
    pub async fn unregister(&self, name: &str) -> bool {
        let mut g = self.inner.write().await;
        for by_name in g.values_mut() {
            if by_name.remove(name).is_some() {
                return true;
            }
        }
        false
    }

    /// All `(type, name)` pairs currently registered.
    pub async fn list(&self) -> Vec<(String, String)> {
        let g = self.inner.read().await;
        g.iter()
            .flat_map(|(t, names)| names.keys().map(move |n| (t.clone(), n.clone())))
            .collect()
    }

    pub async fn close(&self) {
        let mut g = self.inner.write().await;
        g.clear();
    }
}
