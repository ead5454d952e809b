//! Shared configuration types and loading for the schoolseed workspace.

pub mod environment;
pub mod load;
pub mod shared;

pub use load::{LoadConfigError, load_config};
