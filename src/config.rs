//! Engine Configuration

use std::num::NonZeroUsize;

/// Default number of compiled queries kept in the LRU cache
pub const DEFAULT_QUERY_CACHE_SIZE: usize = 100;

/// Default number of compiled `/=` regexes kept in the LRU cache
pub const DEFAULT_REGEX_CACHE_SIZE: usize = 100;

/// Tunables for a [`SelectorEngine`](crate::SelectorEngine).
///
/// Cache sizes of zero are clamped to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub query_cache_size: usize,
    pub regex_cache_size: usize,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query_cache_size(mut self, size: usize) -> Self {
        self.query_cache_size = size;
        self
    }

    pub fn regex_cache_size(mut self, size: usize) -> Self {
        self.regex_cache_size = size;
        self
    }

    pub(crate) fn query_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.query_cache_size).unwrap_or(NonZeroUsize::MIN)
    }

    pub(crate) fn regex_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.regex_cache_size).unwrap_or(NonZeroUsize::MIN)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            query_cache_size: DEFAULT_QUERY_CACHE_SIZE,
            regex_cache_size: DEFAULT_REGEX_CACHE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.query_cache_size, 100);
        assert_eq!(config.regex_cache_size, 100);
    }

    #[test]
    fn test_zero_is_clamped() {
        let config = EngineConfig::new().query_cache_size(0).regex_cache_size(0);
        assert_eq!(config.query_capacity().get(), 1);
        assert_eq!(config.regex_capacity().get(), 1);
    }
}
