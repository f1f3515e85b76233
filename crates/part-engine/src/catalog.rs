use std::collections::BTreeMap;

use crate::assembly::PartBuilder;
use crate::error::BuildError;

/// Part types by name.
#[derive(Default)]
pub struct PartCatalog {
    builders: BTreeMap<String, Box<dyn PartBuilder>>,
}

impl PartCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a builder under its own name, replacing any earlier one.
    pub fn register(&mut self, builder: impl PartBuilder + 'static) -> &mut Self {
        self.builders.insert(builder.name().to_string(), Box::new(builder));
        self
    }

    pub fn get(&self, name: &str) -> Result<&dyn PartBuilder, BuildError> {
        self.builders
            .get(name)
            .map(|b| b.as_ref())
            .ok_or_else(|| BuildError::UnknownPart { name: name.to_string() })
    }

    /// Names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}
