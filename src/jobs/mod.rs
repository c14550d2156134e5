//! Collection jobs: the admission guard, the orchestrator and the external
//! collaborators it drives.

mod external;
mod guard;
mod orchestrator;

pub use external::*;
pub use guard::*;
pub use orchestrator::*;
