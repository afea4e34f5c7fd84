pub mod app;
pub mod error;
pub mod jobs;
pub mod poll;
pub mod progress;
pub mod sink;
pub mod ui;
