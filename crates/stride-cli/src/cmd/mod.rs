pub mod agents;
pub mod convert;
pub mod formats;
pub mod metrics;
pub mod show;
pub mod status;
pub mod validate;
