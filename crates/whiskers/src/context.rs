/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Partial lookup.
//!
//! Partials (`{{>name}}`) and inheritance parents (`{{<name}}`) are
//! resolved through a [`PartialContext`]. A missing partial renders
//! nothing.

use std::collections::HashMap;

use crate::error::ParseResult;
use crate::parser::Template;

/// Maps partial names to templates during a render.
pub trait PartialContext {
    fn get(&self, name: &str) -> Option<&Template>;
}

/// A context with no partials.
pub struct NoContext;

impl PartialContext for NoContext {
    fn get(&self, _name: &str) -> Option<&Template> {
        None
    }
}

impl PartialContext for HashMap<String, Template> {
    fn get(&self, name: &str) -> Option<&Template> {
        HashMap::get(self, name)
    }
}

/// An in-memory partial registry.
#[derive(Debug, Clone, Default)]
pub struct MemoryContext {
    partials: HashMap<String, Template>,
}

impl MemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles each named source into a registered partial.
    pub fn with_partials(
        partials: impl IntoIterator<Item = (impl Into<String>, impl AsRef<str>)>,
    ) -> ParseResult<Self> {
        let mut ctx = Self::new();
        for (name, source) in partials {
            ctx.insert(name, Template::compile(source.as_ref())?);
        }
        Ok(ctx)
    }

    pub fn insert(&mut self, name: impl Into<String>, template: Template) {
        self.partials.insert(name.into(), template);
    }
}

impl PartialContext for MemoryContext {
    fn get(&self, name: &str) -> Option<&Template> {
        self.partials.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_context_lookup() {
        let ctx = MemoryContext::with_partials([("greet", "hi {{name}}")]).unwrap();
        assert!(ctx.get("greet").is_some());
        assert!(ctx.get("other").is_none());
    }

    #[test]
    fn bad_partial_source_fails_up_front() {
        assert!(MemoryContext::with_partials([("broken", "{{")]).is_err());
    }

    #[test]
    fn no_context_is_empty() {
        assert!(NoContext.get("anything").is_none());
    }
}
