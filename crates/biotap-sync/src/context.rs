//! Explicit application context
//!
//! Views receive the collaborators they need through an [`AppContext`]
//! handed down by the application instead of reaching for globals.

use http::Extensions;
use std::any::type_name;

/// Typed map of shared capabilities, keyed by type
#[derive(Clone, Default, Debug)]
pub struct AppContext {
    extensions: Extensions,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide a value, returning the one it replaces
    pub fn insert<T>(&mut self, value: T) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.extensions.insert(value)
    }

    /// Builder form of [`AppContext::insert`]
    pub fn with<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.insert(value);
        self
    }

    pub fn get<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.extensions.get::<T>()
    }

    /// Look up a value that the application must have provided
    ///
    /// # Panics
    ///
    /// Panics if no `T` was provided. A missing capability is a wiring
    /// mistake in the application, not a runtime condition.
    pub fn require<T>(&self) -> &T
    where
        T: Send + Sync + 'static,
    {
        match self.get::<T>() {
            Some(value) => value,
            None => panic!(
                "{} must be used within a context that provides it",
                type_name::<T>()
            ),
        }
    }

    pub fn contains<T>(&self) -> bool
    where
        T: Send + Sync + 'static,
    {
        self.get::<T>().is_some()
    }

    pub fn remove<T>(&mut self) -> Option<T>
    where
        T: Send + Sync + 'static,
    {
        self.extensions.remove::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Theme(&'static str);

    #[test]
    fn test_insert_and_get() {
        let ctx = AppContext::new().with(Theme("dark"));
        assert_eq!(ctx.get::<Theme>(), Some(&Theme("dark")));
        assert_eq!(ctx.require::<Theme>(), &Theme("dark"));
        assert!(!ctx.contains::<u32>());
    }

    #[test]
    fn test_insert_replaces() {
        let mut ctx = AppContext::new();
        assert!(ctx.insert(Theme("dark")).is_none());
        assert_eq!(ctx.insert(Theme("light")), Some(Theme("dark")));
        assert_eq!(ctx.remove::<Theme>(), Some(Theme("light")));
        assert!(ctx.get::<Theme>().is_none());
    }

    #[test]
    #[should_panic(expected = "must be used within a context that provides it")]
    fn test_require_missing_panics() {
        AppContext::new().require::<Theme>();
    }
}
