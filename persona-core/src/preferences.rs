use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{
    DEFAULT_MAX_DAY, DEFAULT_MAX_FEE, DEFAULT_MAX_WALK, DEFAULT_MIN_CO2, DEFAULT_MODE,
};
use crate::numbers::canonical_number;

/// User-supplied filter ceilings, as stored by the preference collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_walk: Option<f64>,
    #[serde(default, rename = "minCO2", skip_serializing_if = "Option::is_none")]
    pub min_co2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_day: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<f64>,
}

/// Preference values after default substitution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPreferences {
    pub max_fee: f64,
    pub max_walk: f64,
    #[serde(rename = "minCO2")]
    pub min_co2: f64,
    pub max_day: f64,
    pub mode: f64,
}

impl Default for ResolvedPreferences {
    fn default() -> Self {
        Self {
            max_fee: DEFAULT_MAX_FEE,
            max_walk: DEFAULT_MAX_WALK,
            min_co2: DEFAULT_MIN_CO2,
            max_day: DEFAULT_MAX_DAY,
            mode: DEFAULT_MODE,
        }
    }
}

impl ResolvedPreferences {
    /// Concatenate the five values in fixed order with no separators.
    #[must_use]
    pub fn key(&self) -> String {
        [
            self.max_fee,
            self.max_walk,
            self.min_co2,
            self.max_day,
            self.mode,
        ]
        .into_iter()
        .map(canonical_number)
        .collect()
    }
}

/// Zero and NaN count as "not set" and take the default, like absent fields.
fn or_default(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v != 0.0 && !v.is_nan() => v,
        _ => default,
    }
}

impl PreferenceRecord {
    /// Every field set to its documented default.
    #[must_use]
    pub const fn explicit_defaults() -> Self {
        Self {
            max_fee: Some(DEFAULT_MAX_FEE),
            max_walk: Some(DEFAULT_MAX_WALK),
            min_co2: Some(DEFAULT_MIN_CO2),
            max_day: Some(DEFAULT_MAX_DAY),
            mode: Some(DEFAULT_MODE),
        }
    }

    #[must_use]
    pub fn resolve(&self) -> ResolvedPreferences {
        ResolvedPreferences {
            max_fee: or_default(self.max_fee, DEFAULT_MAX_FEE),
            max_walk: or_default(self.max_walk, DEFAULT_MAX_WALK),
            min_co2: or_default(self.min_co2, DEFAULT_MIN_CO2),
            max_day: or_default(self.max_day, DEFAULT_MAX_DAY),
            mode: or_default(self.mode, DEFAULT_MODE),
        }
    }

    #[must_use]
    pub fn key(&self) -> String {
        self.resolve().key()
    }

    /// Read a record from an already-parsed JSON value.
    ///
    /// Non-numeric fields are dropped (and so defaulted) rather than rejected;
    /// a value that is not an object yields the empty record.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            log::warn!("preferences are not a JSON object, using defaults");
            return Self::default();
        };
        Self {
            max_fee: numeric_field(map, "maxFee"),
            max_walk: numeric_field(map, "maxWalk"),
            min_co2: numeric_field(map, "minCO2"),
            max_day: numeric_field(map, "maxDay"),
            mode: numeric_field(map, "mode"),
        }
    }

    /// Parse a stored preference document, tolerating malformed fields.
    ///
    /// # Errors
    ///
    /// Returns an error only if `json` is not valid JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value))
    }

    /// Resolve the raw value a key-value store holds under the preference key.
    ///
    /// A missing entry is the empty record; an unparsable entry is logged and
    /// also treated as empty. A number outside the `f64` range (`1e400`) makes
    /// the whole document unparsable, so its valid sibling fields are lost too.
    #[must_use]
    pub fn from_stored(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        Self::from_json(raw).unwrap_or_else(|err| {
            log::warn!("stored preferences are not valid JSON, using defaults: {err}");
            Self::default()
        })
    }
}

fn numeric_field(map: &Map<String, Value>, name: &str) -> Option<f64> {
    match map.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(other) => {
            log::warn!("preference {name} is not a number ({other}), using default");
            None
        }
    }
}
