// observation_recorder.rs

use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::control_system::signal_coordinator::{CycleStage, CycleTick};
use crate::error::SinkError;
use crate::monitoring::observation_sink::ObservationSink;
use crate::shared_data::{current_timestamp, JunctionId};

#[derive(Debug, Serialize)]
pub struct ObservationRecord<'a> {
    pub timestamp: u64,
    pub tick: u64,
    pub stage: CycleStage,
    pub junction: JunctionId,
    pub label: &'a str,
    pub countdown: String,
    pub remaining_seconds: u32,
}

/// Appends one CSV row per junction per tick. The header is only written to an empty file.
pub struct CsvObservationRecorder {
    writer: csv::Writer<File>,
    ticks: u64,
}

impl CsvObservationRecorder {
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;
        let writer = csv::WriterBuilder::new()
            .has_headers(is_empty)
            .from_writer(file);
        Ok(Self { writer, ticks: 0 })
    }
}

impl ObservationSink for CsvObservationRecorder {
    fn observe(&mut self, tick: &CycleTick) -> Result<(), SinkError> {
        self.ticks += 1;
        let timestamp = current_timestamp();
        for obs in &tick.observations {
            self.writer.serialize(ObservationRecord {
                timestamp,
                tick: self.ticks,
                stage: tick.state.stage(),
                junction: obs.junction,
                label: &obs.label,
                countdown: obs.countdown(),
                remaining_seconds: obs.remaining_seconds,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
