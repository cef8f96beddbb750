//! Run report rendering.

mod format;
mod reporter;

pub use format::OutputFormat;
pub use reporter::{Banner, LogFile, Reporter, format_duration};
