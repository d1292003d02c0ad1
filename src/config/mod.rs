//! Policy configuration
//!
//! - `BuddyConfig` - serde model of the JSON config file
//! - `load_config` / `load_from_path` - discovery and loading
//! - `PolicySnapshot` - compiled, read-only policy for one invocation

mod loader;
mod policy;
mod settings;

pub use loader::{candidate_paths, load_config, load_from_path, LoadedConfig};
pub use policy::{CommandPolicy, PolicySnapshot, ProtectionPolicy};
pub use settings::{BuddyConfig, CommandValidationConfig, FileProtectionConfig};
