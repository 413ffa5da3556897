pub mod config;
pub mod file_loader;
mod workspace;

pub use config::RepoConfig;
pub use workspace::{PolicyFile, Repository};
