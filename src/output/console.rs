use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::{column_name, OutputPlugin};
use crate::dynamics::Time;
use crate::utils::errors::{InternalError, SimulationError};
use crate::Value;

/// Writes the observations as tab separated rows, one per observation
/// time, on the standard output or in `location/file`.  A row is written
/// once every value of its time was received.
pub struct Console {
    out: Box<dyn Write + Send>,
    header: bool,
    header_written: bool,
    columns: HashMap<String, usize>,
    names: Vec<String>,
    buffer: Vec<Option<Value>>,
    valid: Vec<bool>,
    time: Option<Time>,
}

impl Console {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            header: true,
            header_written: false,
            columns: HashMap::new(),
            names: Vec::new(),
            buffer: Vec::new(),
            valid: Vec::new(),
            time: None,
        }
    }

    pub fn from_location(_location: &str) -> Result<Box<dyn OutputPlugin>, String> {
        Ok(Box::new(Self::new()))
    }

    fn advance(&mut self, time: Time) -> Result<(), SimulationError> {
        match self.time {
            Some(current) if current != time => {
                self.flush(current)?;
                self.time = Some(time);
            }
            Some(_) => {}
            None => self.time = Some(time),
        }
        Ok(())
    }

    fn flush(&mut self, time: Time) -> Result<(), SimulationError> {
        if !self.valid.is_empty() && !self.valid.iter().any(|valid| *valid) {
            return Ok(());
        }
        if self.header && !self.header_written {
            let mut line = String::from("time");
            for name in &self.names {
                line.push('\t');
                line.push_str(name);
            }
            writeln!(self.out, "{}", line)?;
            self.header_written = true;
        }
        let mut line = time.to_string();
        for value in self.buffer.iter_mut() {
            line.push('\t');
            match value.take() {
                Some(Value::String(text)) => line.push_str(&text),
                Some(value) => line.push_str(&value.to_string()),
                None => line.push_str("NA"),
            }
        }
        writeln!(self.out, "{}", line)?;
        self.valid.iter_mut().for_each(|valid| *valid = false);
        Ok(())
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPlugin for Console {
    fn on_parameter(
        &mut self,
        _plugin: &str,
        location: &str,
        file: &str,
        parameters: Value,
        _time: Time,
    ) -> Result<(), SimulationError> {
        if let Some(header) = parameters.get("header").and_then(Value::as_bool) {
            self.header = header;
        }
        if !location.is_empty() && !file.is_empty() {
            let path = Path::new(location).join(file);
            self.out = Box::new(BufWriter::new(File::create(path)?));
        }
        Ok(())
    }

    fn on_new_observable(
        &mut self,
        simulator: &str,
        parent: &str,
        port: &str,
        _view: &str,
        time: Time,
    ) -> Result<(), SimulationError> {
        self.advance(time)?;
        let name = column_name(parent, simulator, port);
        if self.columns.contains_key(&name) {
            return Err(InternalError::Plugin {
                plugin: String::from("console"),
                message: format!("observable '{}' already exists", name),
            }
            .into());
        }
        self.columns.insert(name.clone(), self.names.len());
        self.names.push(name);
        self.buffer.push(None);
        self.valid.push(false);
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
        self.advance(time)?;
        if simulator.is_empty() {
            return Ok(());
        }
        let name = column_name(parent, simulator, port);
        let index = *self.columns.get(&name).ok_or_else(|| InternalError::Plugin {
            plugin: String::from("console"),
            message: format!("column '{}' does not exist, no observable?", name),
        })?;
        self.buffer[index] = value;
        self.valid[index] = true;
        Ok(())
    }

    fn close(&mut self, _time: Time) -> Result<(), SimulationError> {
        if let Some(time) = self.time.take() {
            self.flush(time)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn rows_are_written_per_time() {
        let shared = Shared::default();
        let mut console = Console::with_writer(Box::new(shared.clone()));
        console.on_parameter("console", "", "", json!({}), 0.0).unwrap();
        console.on_new_observable("a", "top", "count", "view", 0.0).unwrap();
        console.on_value("a", "top", "count", "view", 0.0, Some(json!(1))).unwrap();
        console.on_value("a", "top", "count", "view", 1.0, Some(json!(2))).unwrap();
        console.on_value("", "", "", "view", 2.0, None).unwrap();
        console.close(2.0).unwrap();
        let text = String::from_utf8(shared.0.lock().unwrap().clone()).unwrap();
        assert_eq!("time\ttop:a.count\n0\t1\n1\t2\n", text);
    }

    #[test]
    fn unknown_column_is_an_error() {
        let mut console = Console::with_writer(Box::new(io::sink()));
        assert!(console
            .on_value("a", "top", "count", "view", 0.0, Some(json!(1)))
            .is_err());
    }
}
