use encore_config::{CONFIG_BACKEND, ConfigError};
use encore_core::domain::PhaseThresholds;

const FUNNEL_SECTION: &str = "funnel";

/// Phase thresholds from `[funnel]`, written back with defaults filled in.
/// Zero values are raised to one.
pub fn load_thresholds() -> Result<PhaseThresholds, ConfigError> {
  CONFIG_BACKEND.load_or_init_section(FUNNEL_SECTION).map(PhaseThresholds::normalized)
}
