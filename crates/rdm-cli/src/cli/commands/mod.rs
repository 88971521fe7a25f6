mod fetch;
mod get;

pub use fetch::run_fetch;
pub use get::run_get;
