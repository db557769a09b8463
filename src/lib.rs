pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod multi;
pub mod report;
pub mod state;
pub mod utils;

pub use error::{MultiError, Result};
pub use events::{EventKind, EventSource, RunEvent, Runner, TestInfo};
pub use multi::{Fanout, OutputRedirector, ReporterRegistry, ReporterSpec};
