//! Host plugins loadable through `import()`.
//!
//! A plugin is identified by name. When instantiated it receives the DAG
//! builder and the call's argument map, and must return a record value
//! whose type fully describes its exposed members; anything else breaks
//! the contract and surfaces as a semantic error at import time.
//!
//! The registry is an explicit collection passed into evaluation rather
//! than a process-wide singleton, so tests and embedders can inject their
//! own plugins.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::dag::{DagBuilder, ValueMap, ValueRef};
use crate::error::FabError;
use crate::nom_tools::SpanInfo;
use crate::types::TypeContext;

/// A host-provided module, instantiable from build descriptions via
/// `import("name")`.
pub trait Plugin: std::fmt::Debug {
    fn name(&self) -> &str;

    /// Instantiates the plugin with the given arguments. The returned
    /// value must be a record.
    fn create(
        &self,
        builder: &mut DagBuilder,
        types: &mut TypeContext,
        arguments: ValueMap,
        source: &SpanInfo,
    ) -> Result<ValueRef, FabError>;
}

/// Statically-registered plugins, queried before the dynamic loader.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: IndexMap<String, Rc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Rc<dyn Plugin>) -> &mut Self {
        self.plugins.insert(plugin.name().to_string(), plugin);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<dyn Plugin>> {
        self.plugins.get(name).cloned()
    }
}

/// Loads plugins from platform-specific search paths.
///
/// The default loader finds nothing; hosts that support shared-library
/// plugins supply their own implementation.
pub trait PluginLoader {
    fn load(&mut self, name: &str) -> Option<Rc<dyn Plugin>>;
}

/// A loader with no search paths.
#[derive(Debug, Default)]
pub struct NullLoader;

impl PluginLoader for NullLoader {
    fn load(&mut self, _name: &str) -> Option<Rc<dyn Plugin>> {
        None
    }
}
