use super::manager::Settings;
use crate::error::ChaseError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;

    /// Read the section from `settings` under `section`, falling back to the
    /// default for every key that is missing or malformed. Only unknown method
    /// names are errors.
    fn from_settings(settings: &Settings, section: &str) -> Result<Self, ChaseError>;

    /// Replace every field `validate` would reject with a usable value,
    /// keeping the rest of the section as loaded.
    fn repair(self, section: &str) -> Self;

    fn validate(&self) -> Result<(), ChaseError>;
}

/// Swap `value` for `fallback` with a warning naming the offending key.
pub(crate) fn reset_field<T: std::fmt::Debug>(
    section: &str,
    key: &str,
    value: &mut T,
    fallback: T,
    reason: &str,
) {
    log::warn!(
        "config: {}.{} = {:?} {}; using {:?}",
        section,
        key,
        value,
        reason,
        fallback
    );
    *value = fallback;
}
