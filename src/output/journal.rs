use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Serialize, Serializer};
use serde_json::json;

use super::OutputPlugin;
use crate::dynamics::Time;
use crate::utils::errors::SimulationError;
use crate::Value;

/// Kind of a plugin call, numbered like the records of a network output
/// stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalTag {
    Parameter = 0,
    NewObservable = 1,
    DelObservable = 2,
    Value = 3,
    Close = 4,
    Serialize = 5,
}

impl Serialize for JournalTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalRecord {
    pub tag: JournalTag,
    pub time: Time,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub simulator: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub parent: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub port: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub view: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Records every call it receives, in order, and writes each one as a
/// JSON line in `location/file` when both are given.
#[derive(Default)]
pub struct Journal {
    records: Vec<JournalRecord>,
    out: Option<BufWriter<File>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_location(_location: &str) -> Result<Box<dyn OutputPlugin>, String> {
        Ok(Box::new(Self::new()))
    }

    pub fn records(&self) -> &[JournalRecord] {
        &self.records
    }

    fn record(&mut self, record: JournalRecord) -> Result<(), SimulationError> {
        if let Some(out) = self.out.as_mut() {
            serde_json::to_writer(&mut *out, &record)?;
            out.write_all(b"\n")?;
        }
        self.records.push(record);
        Ok(())
    }
}

fn record(tag: JournalTag, time: Time, simulator: &str, parent: &str, port: &str, view: &str) -> JournalRecord {
    JournalRecord {
        tag,
        time,
        simulator: simulator.to_string(),
        parent: parent.to_string(),
        port: port.to_string(),
        view: view.to_string(),
        value: None,
    }
}

impl OutputPlugin for Journal {
    fn on_parameter(
        &mut self,
        plugin: &str,
        location: &str,
        file: &str,
        parameters: Value,
        time: Time,
    ) -> Result<(), SimulationError> {
        if !location.is_empty() && !file.is_empty() {
            self.out = Some(BufWriter::new(File::create(Path::new(location).join(file))?));
        }
        let mut entry = record(JournalTag::Parameter, time, "", "", "", "");
        entry.value = Some(json!({
            "plugin": plugin,
            "location": location,
            "file": file,
            "parameters": parameters,
        }));
        self.record(entry)
    }

    fn on_new_observable(
        &mut self,
        simulator: &str,
        parent: &str,
        port: &str,
        view: &str,
        time: Time,
    ) -> Result<(), SimulationError> {
        self.record(record(JournalTag::NewObservable, time, simulator, parent, port, view))
    }

    fn on_del_observable(
        &mut self,
        simulator: &str,
        parent: &str,
        port: &str,
        view: &str,
        time: Time,
    ) -> Result<(), SimulationError> {
        self.record(record(JournalTag::DelObservable, time, simulator, parent, port, view))
    }

    fn on_value(
        &mut self,
        simulator: &str,
        parent: &str,
        port: &str,
        view: &str,
        time: Time,
        value: Option<Value>,
    ) -> Result<(), SimulationError> {
        let mut entry = record(JournalTag::Value, time, simulator, parent, port, view);
        entry.value = value;
        self.record(entry)
    }

    fn close(&mut self, time: Time) -> Result<(), SimulationError> {
        self.record(record(JournalTag::Close, time, "", "", "", ""))?;
        if let Some(out) = self.out.as_mut() {
            out.flush()?;
        }
        Ok(())
    }

    fn is_serializable(&self) -> bool {
        true
    }

    fn serialize(&self) -> Value {
        json!({
            "tag": JournalTag::Serialize,
            "records": self.records,
        })
    }
}
