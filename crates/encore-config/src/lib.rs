mod backend;
mod io;
mod paths;

pub use backend::{ConfigBackend, TomlConfigBackend};
pub use io::atomic_write_str;
pub use paths::{ConfigError, EncorePaths};

use once_cell::sync::Lazy;

// Process-wide paths (portable via ENCORE_BASE_DIR, or platform dirs)
pub static PATHS: Lazy<EncorePaths> = Lazy::new(|| EncorePaths::detect().expect("failed to init EncorePaths"));

// Process-wide config backend over PATHS
pub static CONFIG_BACKEND: Lazy<TomlConfigBackend> = Lazy::new(|| TomlConfigBackend::new(PATHS.clone()));
