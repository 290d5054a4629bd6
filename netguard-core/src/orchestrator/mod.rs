//! Transactional Resource Orchestrator: wires the registry,
//! validator, reactive engine, condition manager and sync bridge into one
//! facade client code calls through.

pub mod cascade;
pub mod facade;
pub mod guard;

pub use facade::NetguardFacade;
pub use guard::WriterGuard;
