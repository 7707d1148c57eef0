use super::{column_name, Matrix, OutputPlugin};
use crate::dynamics::Time;
use crate::utils::errors::SimulationError;
use crate::Value;

/// Keeps the observations in memory as a [`Matrix`].
#[derive(Debug, Clone, Default)]
pub struct Storage {
    matrix: Matrix,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_location(_location: &str) -> Result<Box<dyn OutputPlugin>, String> {
        Ok(Box::new(Self::new()))
    }
}

impl OutputPlugin for Storage {
    fn on_parameter(
        &mut self,
        _plugin: &str,
        _location: &str,
        _file: &str,
        _parameters: Value,
        _time: Time,
    ) -> Result<(), SimulationError> {
        Ok(())
    }

    fn on_new_observable(
        &mut self,
        simulator: &str,
        parent: &str,
        port: &str,
        _view: &str,
        _time: Time,
    ) -> Result<(), SimulationError> {
        self.matrix.add_column(&column_name(parent, simulator, port));
        Ok(())
    }

    fn on_del_observable(
        &mut self,
        _simulator: &str,
        _parent: &str,
        _port: &str,
        _view: &str,
        _time: Time,
    ) -> Result<(), SimulationError> {
        Ok(())
    }

    fn on_value(
        &mut self,
        simulator: &str,
        parent: &str,
        port: &str,
        _view: &str,
        time: Time,
        value: Option<Value>,
    ) -> Result<(), SimulationError> {
        let row = self.matrix.row_at(time);
        if !simulator.is_empty() {
            let column = self.matrix.add_column(&column_name(parent, simulator, port));
            self.matrix.set(row, column, value);
        }
        Ok(())
    }

    fn close(&mut self, _time: Time) -> Result<(), SimulationError> {
        Ok(())
    }

    fn matrix(&self) -> Option<Matrix> {
        Some(self.matrix.clone())
    }

    fn is_serializable(&self) -> bool {
        true
    }

    fn serialize(&self) -> Value {
        serde_json::to_value(&self.matrix).unwrap_or(Value::Null)
    }
}
