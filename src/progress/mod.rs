//! Progress extraction from job logs
//!
//! `parser` classifies a single log line, `tail` reads the last line of a log
//! cheaply, and `aggregator` folds every job's line into a fleet snapshot.

pub mod aggregator;
pub mod parser;
pub mod tail;

pub use aggregator::{fold, Aggregator, FleetSnapshot, Observation, ProgressSample, SampleMap};
pub use parser::{extract_counts, extract_eta, parse_last_line, LineEvent, SyncProgress};
pub use tail::read_last_line;
