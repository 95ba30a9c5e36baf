use std::collections::BTreeMap;
use std::sync::Arc;

use super::backend::ObjectDetector;
use crate::error::AnalysisError;

/// Registry of loaded detector backends.
///
/// Populated once at process start. Backends are immutable after registration
/// and handed out as shared `Arc`s.
pub struct BackendRegistry {
    backends: BTreeMap<String, Arc<dyn ObjectDetector>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: BTreeMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: ObjectDetector + 'static>(&mut self, backend: B) {
        self.register_shared(Arc::new(backend));
    }

    pub fn register_shared(&mut self, backend: Arc<dyn ObjectDetector>) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        log::info!("BackendRegistry: registered detector '{}'", name);
        self.backends.insert(name, backend);
    }

    /// Get backend by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ObjectDetector>> {
        self.backends.get(name).cloned()
    }

    /// Get default backend.
    pub fn default_backend(&self) -> Option<Arc<dyn ObjectDetector>> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    /// List registered backends in name order.
    pub fn list(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }

    /// Resolve a backend for the analyzer: by name when given, else the default.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn ObjectDetector>, AnalysisError> {
        match name {
            Some(name) => self.get(name).ok_or_else(|| {
                AnalysisError::detector_unavailable(format!("backend '{}' is not loaded", name))
            }),
            None => self
                .default_backend()
                .ok_or_else(|| AnalysisError::detector_unavailable("no detector backend loaded")),
        }
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
