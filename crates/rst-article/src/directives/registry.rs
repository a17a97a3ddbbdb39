//! Directive registry.
//!
//! Directives are looked up case-insensitively by every name they declare.
//! The global registry starts with the built-in directives; [`initialize`]
//! adds the extension directives exactly once per process.

use super::{
    AdmonitionDirective, CodeDirective, Directive, GenericAdmonitionDirective, ImageDirective, RawDirective,
    SourceCodeDirective, YoutubeDirective,
};
use crate::{ArticleError, Result};
use indexmap::IndexMap;
use once_cell::sync::{Lazy, OnceCell};
use std::sync::{Arc, RwLock};

/// Validate a plugin name before registration.
///
/// # Rules
///
/// - Name cannot be empty
/// - Name cannot contain whitespace
fn validate_plugin_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ArticleError::Plugin {
            message: "Plugin name cannot be empty".to_string(),
            plugin_name: String::new(),
        });
    }

    if name.contains(char::is_whitespace) {
        return Err(ArticleError::Plugin {
            message: format!("Plugin name '{}' cannot contain whitespace", name),
            plugin_name: name.to_string(),
        });
    }

    Ok(())
}

/// Registry for block directives.
///
/// # Thread Safety
///
/// The global instance sits behind an `RwLock`; it is written during
/// [`initialize`] and read by every parse.
pub struct DirectiveRegistry {
    directives: IndexMap<String, Arc<dyn Directive>>,
}

impl DirectiveRegistry {
    /// Create a registry holding only the built-in directives.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.insert(Arc::new(ImageDirective));
        registry.insert(Arc::new(CodeDirective));
        registry.insert(Arc::new(RawDirective));
        registry.insert(Arc::new(AdmonitionDirective));
        registry.insert(Arc::new(GenericAdmonitionDirective));
        registry
    }

    /// Create a registry with no directives at all.
    pub fn empty() -> Self {
        Self {
            directives: IndexMap::new(),
        }
    }

    fn insert(&mut self, directive: Arc<dyn Directive>) {
        for name in directive.names() {
            self.directives.insert(name.to_lowercase(), Arc::clone(&directive));
        }
    }

    /// Register a directive under all of its names.
    ///
    /// Re-registering a name replaces the previous directive.
    pub fn register(&mut self, directive: Arc<dyn Directive>) -> Result<()> {
        validate_plugin_name(directive.name())?;
        for name in directive.names() {
            validate_plugin_name(name)?;
        }

        directive.initialize()?;

        let replaced: Vec<Arc<dyn Directive>> = directive
            .names()
            .iter()
            .filter_map(|name| self.directives.get(&name.to_lowercase()))
            .filter(|existing| existing.name() != directive.name())
            .cloned()
            .collect();
        for existing in replaced {
            existing.shutdown()?;
        }

        tracing::debug!(directive = directive.name(), names = ?directive.names(), "registering directive");
        self.insert(directive);
        Ok(())
    }

    /// Look up a directive by any of its names.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Directive>> {
        self.directives.get(&name.to_lowercase()).cloned()
    }

    /// List all registered directive names in registration order.
    pub fn list(&self) -> Vec<String> {
        self.directives.keys().cloned().collect()
    }

    /// Remove a directive and every alias pointing at it.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let Some(directive) = self.directives.get(&name.to_lowercase()).cloned() else {
            return Ok(());
        };
        self.directives
            .retain(|_, existing| existing.name() != directive.name());
        directive.shutdown()
    }
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global directive registry singleton.
pub static DIRECTIVE_REGISTRY: Lazy<Arc<RwLock<DirectiveRegistry>>> =
    Lazy::new(|| Arc::new(RwLock::new(DirectiveRegistry::new())));

static EXTENSIONS: OnceCell<()> = OnceCell::new();

/// Get the global directive registry.
pub fn get_directive_registry() -> Arc<RwLock<DirectiveRegistry>> {
    DIRECTIVE_REGISTRY.clone()
}

/// Register the extension directives (`youtube`, `sourcecode`/`code-block`).
///
/// Only the first successful call registers; later and concurrent calls wait
/// for it and return `Ok(())`. A failed attempt leaves the guard unset so the
/// next call retries.
pub fn initialize() -> Result<()> {
    EXTENSIONS
        .get_or_try_init(|| {
            let registry = get_directive_registry();
            let mut registry = registry
                .write()
                .map_err(|e| ArticleError::LockPoisoned(format!("directive registry: {}", e)))?;
            registry.register(Arc::new(YoutubeDirective))?;
            registry.register(Arc::new(SourceCodeDirective))?;
            tracing::debug!("extension directives registered");
            Ok::<(), ArticleError>(())
        })
        .map(|_| ())
}

/// Whether [`initialize`] has completed.
pub fn is_initialized() -> bool {
    EXTENSIONS.get().is_some()
}
