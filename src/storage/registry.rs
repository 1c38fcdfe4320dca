//! Factory registry mapping configured provider type strings to
//! constructors. Selection stays a plain lookup; the engine never inspects
//! concrete provider types at runtime.

use super::{Middleware, Source};
use crate::error::{EngineError, Result};
use crate::models::mandate::MandateConfig;
use std::collections::HashMap;
use std::sync::Arc;

pub type SourceFactory = Box<dyn Fn(&MandateConfig) -> Result<Arc<dyn Source>> + Send + Sync>;
pub type MiddlewareFactory =
    Box<dyn Fn(&MandateConfig) -> Result<Arc<dyn Middleware>> + Send + Sync>;

#[derive(Default)]
pub struct ProviderRegistry {
    sources: HashMap<String, SourceFactory>,
    middlewares: HashMap<String, MiddlewareFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_source<F>(&mut self, kind: &str, factory: F)
    where
        F: Fn(&MandateConfig) -> Result<Arc<dyn Source>> + Send + Sync + 'static,
    {
        self.sources.insert(kind.to_string(), Box::new(factory));
    }

    pub fn register_middleware<F>(&mut self, kind: &str, factory: F)
    where
        F: Fn(&MandateConfig) -> Result<Arc<dyn Middleware>> + Send + Sync + 'static,
    {
        self.middlewares.insert(kind.to_string(), Box::new(factory));
    }

    pub fn build_source(&self, kind: &str, config: &MandateConfig) -> Result<Arc<dyn Source>> {
        let factory = self
            .sources
            .get(kind)
            .ok_or_else(|| EngineError::UnknownProvider(kind.to_string()))?;
        factory(config)
    }

    pub fn build_middleware(
        &self,
        kind: &str,
        config: &MandateConfig,
    ) -> Result<Arc<dyn Middleware>> {
        let factory = self
            .middlewares
            .get(kind)
            .ok_or_else(|| EngineError::UnknownProvider(kind.to_string()))?;
        factory(config)
    }
}
