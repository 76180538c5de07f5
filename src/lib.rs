pub mod assistant;
pub mod backends;
pub mod config_loader;
pub mod dispatcher;
pub mod ear;
pub mod engine;
pub mod error;
pub mod intent;
pub mod locale;
pub mod narrator;
pub mod recognizer;
pub mod session;

pub use error::{Error, Result};
