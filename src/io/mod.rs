pub mod config_io;
pub mod lock;
pub mod recovery;
pub mod snapshot_io;
pub mod state;
pub mod transform_client;
