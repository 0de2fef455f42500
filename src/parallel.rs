//! Parallel Selector Evaluation
//!
//! Uses Rayon to run several selectors against one registry at once. The
//! engine's caches are shared between worker threads.

use crate::component::{ComponentRegistry, NodeId};
use crate::engine::SelectorEngine;
use crate::error::Result;
use rayon::prelude::*;

impl<R: ComponentRegistry + Sync> SelectorEngine<R> {
    /// Run several selectors in parallel; results keep the input order
    pub fn query_parallel(
        &self,
        selectors: &[&str],
        root: Option<NodeId>,
    ) -> Vec<Result<Vec<NodeId>>> {
        selectors
            .par_iter()
            .map(|selector| self.query(selector, root))
            .collect()
    }

    /// Run one selector and map every match in parallel
    pub fn query_map<F, T>(
        &self,
        selector: &str,
        root: Option<NodeId>,
        mapper: F,
    ) -> Result<Vec<T>>
    where
        F: Fn(&R, NodeId) -> T + Sync + Send,
        T: Send,
    {
        let matches = self.query(selector, root)?;
        let registry = self.registry();
        Ok(matches.par_iter().map(|&id| mapper(registry, id)).collect())
    }

    /// Run keyed selectors in parallel, failing on the first syntax error
    pub fn query_keyed(
        &self,
        selectors: &[(&str, &str)],
        root: Option<NodeId>,
    ) -> Result<Vec<(String, Vec<NodeId>)>> {
        selectors
            .par_iter()
            .map(|(key, selector)| {
                self.query(selector, root)
                    .map(|ids| (key.to_string(), ids))
            })
            .collect()
    }
}
