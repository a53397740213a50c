mod commands;
pub mod handlers;

pub use commands::{ArtifactTypeArg, Cli, Commands, ItemStatusArg, TrackAction};
