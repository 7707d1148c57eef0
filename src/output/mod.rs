//! The output module carries observations out of the kernel.  A view
//! writes to a [`StreamWriter`], which forwards every call, in order, to
//! an [`OutputPlugin`].  Plugins are resolved by name from a
//! [`PluginRegistry`].

use std::sync::{Arc, Mutex};

use crate::dynamics::Time;
use crate::utils::errors::SimulationError;
use crate::Value;

pub mod console;
pub mod journal;
pub mod matrix;
pub mod registry;
pub mod storage;
pub mod stream_writer;

pub use self::console::Console;
pub use self::journal::{Journal, JournalRecord, JournalTag};
pub use self::matrix::Matrix;
pub use self::registry::{PluginConstructor, PluginRegistry};
pub use self::storage::Storage;
pub use self::stream_writer::StreamWriter;

/// The `OutputPlugin` trait receives the observations of the views bound
/// to it.  `simulator` and `parent` are empty for a value which outlived
/// its model.
pub trait OutputPlugin: Send {
    fn on_parameter(
        &mut self,
        plugin: &str,
        location: &str,
        file: &str,
        parameters: Value,
        time: Time,
    ) -> Result<(), SimulationError>;

    fn on_new_observable(
        &mut self,
        simulator: &str,
        parent: &str,
        port: &str,
        view: &str,
        time: Time,
    ) -> Result<(), SimulationError>;

    fn on_del_observable(
        &mut self,
        simulator: &str,
        parent: &str,
        port: &str,
        view: &str,
        time: Time,
    ) -> Result<(), SimulationError>;

    #[allow(clippy::too_many_arguments)]
    fn on_value(
        &mut self,
        simulator: &str,
        parent: &str,
        port: &str,
        view: &str,
        time: Time,
        value: Option<Value>,
    ) -> Result<(), SimulationError>;

    fn close(&mut self, time: Time) -> Result<(), SimulationError>;

    /// The observations as a table, for plugins keeping them.
    fn matrix(&self) -> Option<Matrix> {
        None
    }

    fn is_serializable(&self) -> bool {
        false
    }

    fn serialize(&self) -> Value {
        Value::Null
    }
}

pub type PluginPtr = Arc<Mutex<Box<dyn OutputPlugin>>>;

/// Column name of an observable: `parent:simulator.port`.
pub fn column_name(parent: &str, simulator: &str, port: &str) -> String {
    if parent.is_empty() {
        format!("{}.{}", simulator, port)
    } else {
        format!("{}:{}.{}", parent, simulator, port)
    }
}
