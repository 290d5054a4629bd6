pub mod condition;
pub mod config;
pub mod dependency;
pub mod error;
pub mod generate;
pub mod model;
pub mod orchestrator;
pub mod reactive;
pub mod registry;
pub mod sync;
pub mod telemetry;
pub mod validation;

pub use error::{Error, Result};
pub use orchestrator::NetguardFacade;
