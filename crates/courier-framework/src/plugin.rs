//! Plugins and the plugin registry.
//!
//! A [`Plugin`] names a logical group of handlers and carries an `enabled`
//! flag that operators can flip at runtime. Handlers refer to their plugin by
//! name only; the [`PluginRegistry`] is the single owner of plugin records.
//!
//! The enabled flag is an atomic and toggling it takes no lock, so a dispatch
//! cycle already in flight may observe the new value midway through.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{PluginError, PluginResult};

/// A named, toggleable group of handlers.
#[derive(Debug)]
pub struct Plugin {
    name: String,
    modspec: String,
    description: Option<String>,
    enabled: AtomicBool,
}

impl Plugin {
    /// Creates an enabled plugin.
    ///
    /// `modspec` is the top-level module name whose handlers belong to this
    /// plugin when registered without an explicit plugin.
    pub fn new(name: impl Into<String>, modspec: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modspec: modspec.into(),
            description: None,
            enabled: AtomicBool::new(true),
        }
    }

    /// Sets a one-line description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the initial enabled state.
    pub fn with_enabled(self, enabled: bool) -> Self {
        self.enabled.store(enabled, Ordering::Relaxed);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modspec(&self) -> &str {
        &self.modspec
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}

/// Registry of known plugins, keyed by unique name.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: RwLock<HashMap<String, Arc<Plugin>>>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin, replacing any plugin with the same name.
    pub fn register(&self, plugin: Plugin) -> Arc<Plugin> {
        self.insert(Arc::new(plugin))
    }

    /// Registers a dynamically typed plugin value.
    ///
    /// Accepts a boxed [`Plugin`] or `Arc<Plugin>`; anything else fails with
    /// [`PluginError::TypeMismatch`].
    pub fn register_any(&self, value: Box<dyn Any + Send + Sync>) -> PluginResult<Arc<Plugin>> {
        let plugin = match value.downcast::<Plugin>() {
            Ok(plugin) => Arc::new(*plugin),
            Err(value) => match value.downcast::<Arc<Plugin>>() {
                Ok(plugin) => *plugin,
                Err(_) => {
                    return Err(PluginError::TypeMismatch {
                        expected: std::any::type_name::<Plugin>(),
                    });
                }
            },
        };
        Ok(self.insert(plugin))
    }

    fn insert(&self, plugin: Arc<Plugin>) -> Arc<Plugin> {
        let name = plugin.name().to_string();
        let replaced = self
            .plugins
            .write()
            .insert(name.clone(), Arc::clone(&plugin))
            .is_some();

        info!(
            plugin = %name,
            modspec = %plugin.modspec(),
            enabled = plugin.is_enabled(),
            replaced,
            "Registered plugin"
        );
        plugin
    }

    /// Enables or disables a plugin.
    ///
    /// Unknown names are ignored; returns whether the plugin exists.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        match self.plugins.read().get(name) {
            Some(plugin) => {
                plugin.set_enabled(enabled);
                info!(plugin = %name, enabled, "Plugin toggled");
                true
            }
            None => {
                debug!(plugin = %name, "Ignoring toggle for unknown plugin");
                false
            }
        }
    }

    /// Looks up a plugin by name.
    pub fn get(&self, name: &str) -> Option<Arc<Plugin>> {
        self.plugins.read().get(name).cloned()
    }

    /// Returns whether handlers owned by `name` may run.
    ///
    /// Names with no registered plugin count as enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.plugins
            .read()
            .get(name)
            .is_none_or(|plugin| plugin.is_enabled())
    }

    /// Maps each plugin's modspec to the plugin.
    pub fn by_modspec(&self) -> HashMap<String, Arc<Plugin>> {
        self.plugins
            .read()
            .values()
            .map(|p| (p.modspec().to_string(), Arc::clone(p)))
            .collect()
    }

    /// Registered plugin names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let registry = PluginRegistry::new();
        registry.register(Plugin::new("weather", "weather").with_description("Forecasts"));

        let plugin = registry.get("weather").unwrap();
        assert_eq!(plugin.modspec(), "weather");
        assert_eq!(plugin.description(), Some("Forecasts"));
        assert!(plugin.is_enabled());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_reregistration_overwrites() {
        let registry = PluginRegistry::new();
        registry.register(Plugin::new("p", "old"));
        registry.register(Plugin::new("p", "new"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("p").unwrap().modspec(), "new");
    }

    #[test]
    fn test_set_enabled_unknown_is_noop() {
        let registry = PluginRegistry::new();
        assert!(!registry.set_enabled("ghost", false));
        assert!(registry.is_empty());
        assert!(registry.is_enabled("ghost"));
    }

    #[test]
    fn test_set_enabled_toggles() {
        let registry = PluginRegistry::new();
        let plugin = registry.register(Plugin::new("p", "p"));

        assert!(registry.set_enabled("p", false));
        assert!(!plugin.is_enabled());
        assert!(!registry.is_enabled("p"));

        registry.set_enabled("p", true);
        assert!(registry.is_enabled("p"));
    }

    #[test]
    fn test_register_any_type_mismatch() {
        let registry = PluginRegistry::new();

        let err = registry
            .register_any(Box::new("not a plugin".to_string()))
            .unwrap_err();
        assert!(matches!(err, PluginError::TypeMismatch { .. }));
        assert!(registry.is_empty());

        registry
            .register_any(Box::new(Plugin::new("a", "a")))
            .unwrap();
        registry
            .register_any(Box::new(Arc::new(Plugin::new("b", "b"))))
            .unwrap();
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_by_modspec() {
        let registry = PluginRegistry::new();
        registry.register(Plugin::new("Greeter", "greeter"));
        registry.register(Plugin::new("Admin", "admin_tools").with_enabled(false));

        let map = registry.by_modspec();
        assert_eq!(map["greeter"].name(), "Greeter");
        assert!(!map["admin_tools"].is_enabled());
    }
}
