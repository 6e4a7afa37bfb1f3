pub mod common;

pub use common::Settings;

use once_cell::sync::Lazy;

/// Process-wide settings, resolved from the environment on first use.
pub static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);
