//! Built-in resource adapters.
//!
//! Each adapter declares one collection of the content backend; the
//! catalog registers them under their collection names.

mod careers;
mod events;
mod mails;
mod partners;
mod projects;
mod publications;
mod tasks;

use std::collections::BTreeMap;

use crate::listing::{Resource, ResourceError};

pub use projects::project_progress;

/// Registered resources by collection name.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    resources: BTreeMap<String, Resource>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every built-in adapter.
    pub fn builtin() -> Result<Self, ResourceError> {
        let mut catalog = Self::new();
        catalog.register(events::resource()?)?;
        catalog.register(publications::resource()?)?;
        catalog.register(careers::resource()?)?;
        catalog.register(mails::resource()?)?;
        catalog.register(projects::resource()?)?;
        catalog.register(tasks::resource()?)?;
        catalog.register(partners::resource()?)?;
        Ok(catalog)
    }

    /// Add a resource; names must be unique.
    pub fn register(&mut self, resource: Resource) -> Result<(), ResourceError> {
        if self.resources.contains_key(&resource.name) {
            return Err(ResourceError::DuplicateResource(resource.name));
        }
        tracing::debug!(resource = %resource.name, table = %resource.table, "registered resource");
        self.resources.insert(resource.name.clone(), resource);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    /// Resources in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
