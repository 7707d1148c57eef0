use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use lazy_static::lazy_static;

use super::{Console, Journal, OutputPlugin, Storage};

/// Builds a plugin bound to a location.
pub type PluginConstructor = fn(&str) -> Result<Box<dyn OutputPlugin>, String>;

type SharedConstructor = Arc<dyn Fn(&str) -> Result<Box<dyn OutputPlugin>, String> + Send + Sync>;

lazy_static! {
    static ref GLOBAL_PLUGINS: Mutex<HashMap<String, PluginConstructor>> = {
        let mut m = HashMap::new();
        m.insert(String::from("console"), Console::from_location as PluginConstructor);
        m.insert(String::from("storage"), Storage::from_location as PluginConstructor);
        m.insert(String::from("journal"), Journal::from_location as PluginConstructor);
        Mutex::new(m)
    };
}

/// Adds a plugin to the process-wide table used when no package is
/// given.
pub fn register_global(plugin: &str, constructor: PluginConstructor) {
    GLOBAL_PLUGINS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(plugin.to_string(), constructor);
}

/// Package-scoped plugins of a simulation.  A plugin requested without
/// package is looked up in the process-wide table.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    packages: HashMap<(String, String), SharedConstructor>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, package: &str, plugin: &str, constructor: F) -> Self
    where
        F: Fn(&str) -> Result<Box<dyn OutputPlugin>, String> + Send + Sync + 'static,
    {
        self.insert(package, plugin, constructor);
        self
    }

    pub fn insert<F>(&mut self, package: &str, plugin: &str, constructor: F)
    where
        F: Fn(&str) -> Result<Box<dyn OutputPlugin>, String> + Send + Sync + 'static,
    {
        self.packages
            .insert((package.to_string(), plugin.to_string()), Arc::new(constructor));
    }

    /// Builds the plugin, or explains why it cannot be.
    pub fn instantiate(&self, package: &str, plugin: &str, location: &str) -> Result<Box<dyn OutputPlugin>, String> {
        if package.is_empty() {
            let constructor = GLOBAL_PLUGINS
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(plugin)
                .copied();
            match constructor {
                Some(constructor) => constructor(location),
                None => Err(format!("no global output plug-in named '{}'", plugin)),
            }
        } else {
            match self.packages.get(&(package.to_string(), plugin.to_string())) {
                Some(constructor) => constructor(location),
                None => Err(format!(
                    "the package '{}' has no output plug-in named '{}'",
                    package, plugin
                )),
            }
        }
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self
            .packages
            .keys()
            .map(|(package, plugin)| format!("{}/{}", package, plugin))
            .collect();
        names.sort();
        f.debug_struct("PluginRegistry")
            .field("packages", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugins_resolve_by_package() {
        let registry = PluginRegistry::new().with("local", "storage", |_| Ok(Box::new(Storage::new())));
        assert!(registry.instantiate("local", "storage", "").is_ok());
        assert!(registry.instantiate("", "storage", "").is_ok());
        assert!(registry.instantiate("other", "storage", "").is_err());
        assert!(registry.instantiate("", "missing", "").is_err());
    }
}
