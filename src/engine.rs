//! Selector Engine
//!
//! Binds a component registry to the compiled-query cache, the `/=` regex
//! cache and the custom pseudo-class registry. Every entry point compiles
//! through the cache, so a selector string is parsed once until it is
//! evicted or the cache is cleared.

use crate::cache::{CacheStats, QueryCache, RegexCache};
use crate::component::{ComponentAccess, ComponentRegistry, NodeId};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::selector::{execute, is_match, Compiler, PseudoRegistry, Query, Scope};
use std::ops::ControlFlow;
use std::sync::Arc;

/// Compiles and runs selectors against a component registry
#[derive(Debug)]
pub struct SelectorEngine<R> {
    registry: R,
    config: EngineConfig,
    queries: QueryCache,
    regexes: RegexCache,
    pseudos: PseudoRegistry,
}

impl<R: ComponentRegistry> SelectorEngine<R> {
    /// Create an engine with the default cache sizes
    pub fn new(registry: R) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: R, config: EngineConfig) -> Self {
        SelectorEngine {
            registry,
            config,
            queries: QueryCache::new(config.query_capacity()),
            regexes: RegexCache::new(config.regex_capacity()),
            pseudos: PseudoRegistry::new(),
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Mutable access to the registry.
    ///
    /// Compiled queries hold no component references, so the caches stay
    /// valid across tree mutations.
    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn compiler(&self) -> Compiler<'_> {
        Compiler::new(&self.pseudos, &self.regexes).with_query_cache(&self.queries)
    }

    /// Compile a selector (or fetch it from the cache)
    pub fn compile(&self, selector: &str) -> Result<Arc<Query>> {
        self.compiler().compile(selector)
    }

    /// Find the components matching `selector` below `root`, or among all
    /// registered components when `root` is `None`.
    ///
    /// The empty selector returns every registered component.
    pub fn query(&self, selector: &str, root: Option<NodeId>) -> Result<Vec<NodeId>> {
        if selector.trim().is_empty() {
            return Ok(self.registry.all_components());
        }
        let query = self.compile(selector)?;
        let scope = match root {
            Some(root) => Scope::Root(root),
            None => Scope::Registry,
        };
        Ok(execute(&self.registry, &query, scope))
    }

    /// Filter an explicit candidate list with `selector`.
    ///
    /// The empty selector keeps every candidate.
    pub fn query_items(&self, selector: &str, items: &[NodeId]) -> Result<Vec<NodeId>> {
        if selector.trim().is_empty() {
            return Ok(items.to_vec());
        }
        let query = self.compile(selector)?;
        Ok(execute(&self.registry, &query, Scope::Items(items)))
    }

    /// Test whether one component matches `selector`; the empty selector
    /// always matches.
    pub fn is(&self, candidate: NodeId, selector: &str) -> Result<bool> {
        if selector.trim().is_empty() {
            return Ok(true);
        }
        let query = self.compile(selector)?;
        Ok(is_match(&self.registry, &query, candidate))
    }

    /// Register a custom pseudo-class, replacing any existing one of the same
    /// name (built-ins included).
    ///
    /// The query cache is cleared so previously compiled selectors pick up
    /// the new definition.
    pub fn register_pseudo<F>(&self, name: &str, function: F)
    where
        F: Fn(&dyn ComponentAccess, &[NodeId], &str) -> Vec<NodeId> + Send + Sync + 'static,
    {
        self.pseudos.register(name, Arc::new(function));
        self.queries.clear();
    }

    /// Drop every cached query and regex
    pub fn clear_cache(&self) {
        self.queries.clear();
        self.regexes.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.queries.hits(),
            misses: self.queries.misses(),
            queries: self.queries.len(),
            regexes: self.regexes.len(),
        }
    }

    /// Look a component up by its id
    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.registry.component_by_id(id)
    }

    /// Visit `root` and its subtree parents-first, calling `visitor` on every
    /// component that matches `selector`. Returning `ControlFlow::Break`
    /// stops the walk.
    pub fn visit_pre_order<F>(
        &self,
        selector: &str,
        root: NodeId,
        mut visitor: F,
    ) -> Result<ControlFlow<()>>
    where
        F: FnMut(NodeId) -> ControlFlow<()>,
    {
        let query = self.compile(selector)?;
        Ok(self.visit(&query, root, true, &mut visitor))
    }

    /// Like [`visit_pre_order`](Self::visit_pre_order), but children are
    /// visited before their parent.
    pub fn visit_post_order<F>(
        &self,
        selector: &str,
        root: NodeId,
        mut visitor: F,
    ) -> Result<ControlFlow<()>>
    where
        F: FnMut(NodeId) -> ControlFlow<()>,
    {
        let query = self.compile(selector)?;
        Ok(self.visit(&query, root, false, &mut visitor))
    }

    fn visit<F>(
        &self,
        query: &Query,
        node: NodeId,
        pre_order: bool,
        visitor: &mut F,
    ) -> ControlFlow<()>
    where
        F: FnMut(NodeId) -> ControlFlow<()>,
    {
        let matched = is_match(&self.registry, query, node);
        if pre_order && matched {
            visitor(node)?;
        }
        for child in self.registry.children_vec(node) {
            self.visit(query, child, pre_order, visitor)?;
        }
        if !pre_order && matched {
            visitor(node)?;
        }
        ControlFlow::Continue(())
    }
}
