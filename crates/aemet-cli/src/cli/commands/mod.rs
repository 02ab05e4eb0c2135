//! CLI command handlers. Each command is in its own file.

mod aggregate;
mod batch;
mod fetch;
mod status;

pub use aggregate::run_aggregate;
pub use batch::run_batch_cmd;
pub use fetch::run_fetch;
pub use status::run_status;
