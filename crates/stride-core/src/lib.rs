pub mod config;
pub mod emit;
pub mod error;
pub mod markdown;
pub mod metrics;
pub mod paths;
pub mod registry;
pub mod sprint;
pub mod template;
pub mod types;
pub mod validate;

pub use error::{Result, StrideError};
