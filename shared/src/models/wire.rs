//! Serde helpers for Mirador's Go-style JSON.
//!
//! Mirador Core marshals empty slices and maps as `null` and drops empty
//! optional strings. These helpers make the models read and write the same way.

use serde::{Deserialize, Deserializer};

/// Decodes `null` as the type's default value.
///
/// Use together with `#[serde(default)]` so a missing key decodes the same way.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// True for `None` and for `Some("")`.
#[allow(clippy::ref_option)]
pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

pub(crate) fn is_zero(value: &u64) -> bool {
    *value == 0
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
