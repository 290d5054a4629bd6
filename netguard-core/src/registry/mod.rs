//! Resource storage, expressed entirely as traits. `memory` is the
//! only concrete implementation shipped here: a reference backend good
//! enough to drive the reactive engine, orchestrator and condition manager
//! end to end without naming a real persistence layer.

pub mod memory;
pub mod scope;
pub mod traits;

pub use memory::MemoryRegistry;
pub use scope::{Scope, SyncOp};
pub use traits::{Reader, Registry, Writer};
