pub mod config;
pub mod events;
pub mod state;
pub mod users;

pub use config::{CliOverrides, Config};
pub use events::{poll_event, Action, AppEvent};
pub use state::{AppState, JobRow};
pub use users::{load_users, UserSpec};
