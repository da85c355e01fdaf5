pub mod bucket;
pub mod config;
pub mod goal;
pub mod snapshot;
pub mod task;
pub mod timer;

pub use bucket::*;
pub use config::*;
pub use goal::*;
pub use snapshot::*;
pub use task::*;
pub use timer::*;
