/// Result structs for command output. Commands return these instead of
/// printing directly; main.rs formats them as human-readable or JSON based
/// on --json.
mod doctor;
mod export;
mod init;

pub use doctor::*;
pub use export::*;
pub use init::*;
