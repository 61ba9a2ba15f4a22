//! Reporting of discovered containers and collection config results.
//!
//! Bindings send [`ReportEvent`]s through a bounded channel ([`Reporter`]) to
//! a dedicated [`Recorder`] task, which accumulates them in a [`RecordStore`].
//! The export loop periodically drains the store into [`LogEntry`] rows that
//! are shipped with the agent's own telemetry.
mod detail;
mod recorder;

pub use detail::{
    CONFIG_RESULT_DATA_TYPE, CONTAINER_DATA_TYPE, ConfigResult, ContainerDetail,
    DELETE_CONTAINERS_DATA_TYPE, LogEntry, join_ids,
};
pub use recorder::{RecordStore, Recorder, ReportEvent, Reporter, channel};
