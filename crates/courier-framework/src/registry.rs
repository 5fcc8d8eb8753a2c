//! Priority-ordered handler registry.
//!
//! Handlers live in buckets keyed by priority. Dispatch visits buckets in
//! ascending priority and each bucket in registration order; neither order
//! ever changes after registration.
//!
//! # Plugin association
//!
//! Each registered handler may name its owning plugin. When the caller does
//! not pass one, the registry looks at the first `::` segment of the handler's
//! [`module`](crate::Handler::module) and matches it against the registered
//! plugins' modspecs. Handlers with no owner always run.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::handler::{BoxedHandler, Handler, INTERNAL_PRIORITY};
use crate::plugin::PluginRegistry;

/// A handler together with its registration data.
pub struct HandlerEntry {
    handler: BoxedHandler,
    priority: i32,
    plugin: Option<String>,
}

impl HandlerEntry {
    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    pub fn name(&self) -> &str {
        self.handler.name()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Name of the owning plugin, if any.
    pub fn plugin(&self) -> Option<&str> {
        self.plugin.as_deref()
    }

    /// The command name for command-type handlers.
    pub fn command(&self) -> Option<&str> {
        self.handler.command()
    }
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("name", &self.name())
            .field("priority", &self.priority)
            .field("plugin", &self.plugin)
            .finish()
    }
}

/// Registry of handlers keyed by priority.
pub struct HandlerRegistry {
    plugins: Arc<PluginRegistry>,
    buckets: RwLock<BTreeMap<i32, Vec<Arc<HandlerEntry>>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry resolving plugins against `plugins`.
    pub fn new(plugins: Arc<PluginRegistry>) -> Self {
        Self {
            plugins,
            buckets: RwLock::new(BTreeMap::new()),
        }
    }

    /// Registers a handler at `priority`.
    ///
    /// When `plugin` is `None` the owner is inferred from the handler's module.
    /// Handlers are never deduplicated.
    pub fn register<H>(&self, handler: H, priority: i32, plugin: Option<&str>) -> Arc<HandlerEntry>
    where
        H: Handler,
    {
        self.register_boxed(Arc::new(handler), priority, plugin)
    }

    /// Registers an already shared handler.
    pub fn register_boxed(
        &self,
        handler: BoxedHandler,
        priority: i32,
        plugin: Option<&str>,
    ) -> Arc<HandlerEntry> {
        let plugin = match plugin {
            Some(name) => {
                if self.plugins.get(name).is_none() {
                    warn!(
                        handler = handler.name(),
                        plugin = name,
                        "Handler registered for an unknown plugin"
                    );
                }
                Some(name.to_string())
            }
            None => self.infer_plugin(handler.as_ref()),
        };

        info!(
            handler = handler.name(),
            priority,
            plugin = plugin.as_deref().unwrap_or("-"),
            "Adding handler"
        );

        let entry = Arc::new(HandlerEntry {
            handler,
            priority,
            plugin,
        });
        self.buckets
            .write()
            .entry(priority)
            .or_default()
            .push(Arc::clone(&entry));
        entry
    }

    fn infer_plugin(&self, handler: &dyn Handler) -> Option<String> {
        let module = handler.module()?;
        let root = module.split("::").next().unwrap_or(module);
        self.plugins
            .by_modspec()
            .get(root)
            .map(|plugin| plugin.name().to_string())
    }

    /// All entries in dispatch order.
    pub fn snapshot(&self) -> Vec<Arc<HandlerEntry>> {
        self.buckets.read().values().flatten().cloned().collect()
    }

    /// Entries owned by `plugin`, in dispatch order.
    pub fn handlers_for_plugin(&self, plugin: &str) -> Vec<Arc<HandlerEntry>> {
        self.buckets
            .read()
            .values()
            .flatten()
            .filter(|entry| entry.plugin() == Some(plugin))
            .cloned()
            .collect()
    }

    /// Command names paired with their handler entries, in dispatch order.
    ///
    /// With `exclude_internal`, priority-0 handlers and handlers without an
    /// owning plugin are left out. If a command is registered more than once,
    /// it keeps the position of its first entry and the entry seen last in
    /// dispatch order wins.
    pub fn commands(&self, exclude_internal: bool) -> Vec<(String, Arc<HandlerEntry>)> {
        let buckets = self.buckets.read();
        let mut result: Vec<(String, Arc<HandlerEntry>)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (&priority, entries) in buckets.iter() {
            if exclude_internal && priority == INTERNAL_PRIORITY {
                continue;
            }
            for entry in entries {
                if exclude_internal && entry.plugin().is_none() {
                    continue;
                }
                let Some(command) = entry.command() else {
                    continue;
                };
                match positions.get(command) {
                    Some(&idx) => result[idx].1 = Arc::clone(entry),
                    None => {
                        positions.insert(command.to_string(), result.len());
                        result.push((command.to_string(), Arc::clone(entry)));
                    }
                }
            }
        }

        result
    }

    /// Number of handlers per priority.
    pub fn stats(&self) -> HashMap<i32, usize> {
        self.buckets
            .read()
            .iter()
            .map(|(&priority, entries)| (priority, entries.len()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handler_count", &self.len())
            .finish_non_exhaustive()
    }
}
