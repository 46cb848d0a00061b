//! Observability: structured logging and log-file lifecycle.

mod logging;

pub use logging::{clean_logs, init_logging, CleanReport};
