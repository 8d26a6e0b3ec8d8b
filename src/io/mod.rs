//! Objects used to read configuration snapshots and write the results of solve requests.

mod json_result_writer;
pub use json_result_writer::JsonResultWriter;

mod json_snapshot_reader;
pub use json_snapshot_reader::JsonSnapshotReader;

mod specs;
pub use specs::ResultWriter;
pub use specs::SnapshotReader;

mod text_result_writer;
pub use text_result_writer::TextResultWriter;
