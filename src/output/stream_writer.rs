use std::sync::{MutexGuard, PoisonError};

use tracing::debug;

use super::{Matrix, OutputPlugin, PluginPtr, PluginRegistry};
use crate::dynamics::Time;
use crate::simulator::Simulator;
use crate::utils::errors::{InternalError, SimulationError};
use crate::Value;

/// Delivers the observations of a view to its output plugin,
/// synchronously and in call order.  Every call but [`StreamWriter::matrix`]
/// fails with [`InternalError::StreamWriterNotOpened`] before `open` and
/// with [`InternalError::StreamWriterClosed`] after `close`.
#[derive(Default)]
pub struct StreamWriter {
    plugin: Option<PluginPtr>,
    name: String,
    closed: bool,
}

impl StreamWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiates the plugin `plugin`, from `package` or from the global
    /// plugins if `package` is empty, and sends it its parameters.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        &mut self,
        registry: &PluginRegistry,
        plugin: &str,
        package: &str,
        location: &str,
        file: &str,
        parameters: Value,
        time: Time,
    ) -> Result<(), SimulationError> {
        let instance = registry
            .instantiate(package, plugin, location)
            .map_err(|cause| InternalError::PluginLoad {
                plugin: plugin.to_string(),
                cause,
            })?;
        debug!(plugin, package, location, file, "output plug-in opened");
        self.name = plugin.to_string();
        self.closed = false;
        self.plugin = Some(PluginPtr::new(std::sync::Mutex::new(instance)));
        self.lock()?
            .on_parameter(plugin, location, file, parameters, time)
    }

    pub fn is_opened(&self) -> bool {
        self.plugin.is_some() && !self.closed
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn plugin(&self) -> Option<&PluginPtr> {
        self.plugin.as_ref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Box<dyn OutputPlugin>>, InternalError> {
        if self.closed {
            return Err(InternalError::StreamWriterClosed(self.name.clone()));
        }
        self.plugin
            .as_ref()
            .map(|plugin| plugin.lock().unwrap_or_else(PoisonError::into_inner))
            .ok_or(InternalError::StreamWriterNotOpened)
    }

    pub fn process_new_observable(
        &self,
        simulator: &Simulator,
        port: &str,
        time: Time,
        view: &str,
    ) -> Result<(), SimulationError> {
        let mut plugin = self.lock()?;
        plugin.on_new_observable(simulator.name()?, simulator.parent()?, port, view, time)
    }

    pub fn process_remove_observable(
        &self,
        simulator: &Simulator,
        port: &str,
        time: Time,
        view: &str,
    ) -> Result<(), SimulationError> {
        let mut plugin = self.lock()?;
        plugin.on_del_observable(simulator.name()?, simulator.parent()?, port, view, time)
    }

    /// Forwards a value.  Without simulator, the model is gone and the
    /// value is sent with empty name and parent.
    pub fn process(
        &self,
        simulator: Option<&Simulator>,
        port: &str,
        time: Time,
        view: &str,
        value: Option<Value>,
    ) -> Result<(), SimulationError> {
        let mut plugin = self.lock()?;
        let (name, parent) = match simulator {
            Some(simulator) => (simulator.name()?, simulator.parent()?),
            None => ("", ""),
        };
        plugin.on_value(name, parent, port, view, time, value)
    }

    /// Closes the plugin.  The writer is unusable afterwards, except for
    /// reading the matrix the plugin kept.
    pub fn close(&mut self, time: Time) -> Result<(), SimulationError> {
        let result = self.lock()?.close(time);
        self.closed = true;
        debug!(plugin = %self.name, time, "output plug-in closed");
        result
    }

    pub fn matrix(&self) -> Option<Matrix> {
        self.plugin
            .as_ref()
            .and_then(|plugin| plugin.lock().unwrap_or_else(PoisonError::into_inner).matrix())
    }
}

impl std::fmt::Debug for StreamWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamWriter")
            .field("plugin", &self.name)
            .field("opened", &self.plugin.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}
