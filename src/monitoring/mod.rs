// monitoring/mod.rs
pub mod observation_recorder;
pub mod observation_sink;

pub use observation_recorder::CsvObservationRecorder;
pub use observation_sink::{
    ChannelObservationSink, FanOutSink, LogObservationSink, ObservationSink,
};
