pub mod discovery;
pub mod error;
pub mod executor;
pub mod history;
pub mod plan;
pub mod prompt;
pub mod session;
pub mod video;

pub use crate::error::{Error, Result};
