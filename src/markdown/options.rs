//! Option intake for the blank-line preprocessor.
//!
//! Hosts hand us whatever their config format produced (TOML, YAML, JSON,
//! env strings). Nothing in here fails: values that cannot be coerced fall
//! back to the documented defaults and a warning is logged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_HEIGHT_PER_BLANK: f64 = 1.0;
pub const DEFAULT_UNIT: &str = "em";
pub const DEFAULT_MAX_BLANKS: usize = 50;

/// Raw, uncoerced option values as supplied by a host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlankLineOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_per_blank: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_blanks: Option<Value>,
}

impl BlankLineOptions {
    /// Options built from plain strings, as they arrive from flags or env vars.
    pub fn from_strings(
        height_per_blank: Option<String>,
        unit: Option<String>,
        max_blanks: Option<String>,
    ) -> Self {
        Self {
            height_per_blank: height_per_blank.map(Value::String),
            unit: unit.map(Value::String),
            max_blanks: max_blanks.map(Value::String),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.height_per_blank.is_none() && self.unit.is_none() && self.max_blanks.is_none()
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(&mut self, other: BlankLineOptions) {
        if other.height_per_blank.is_some() {
            self.height_per_blank = other.height_per_blank;
        }
        if other.unit.is_some() {
            self.unit = other.unit;
        }
        if other.max_blanks.is_some() {
            self.max_blanks = other.max_blanks;
        }
    }
}

/// Validated, immutable settings used by the transformer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlankLineSettings {
    height_per_blank: f64,
    unit: String,
    max_blanks: usize,
}

impl Default for BlankLineSettings {
    fn default() -> Self {
        Self {
            height_per_blank: DEFAULT_HEIGHT_PER_BLANK,
            unit: DEFAULT_UNIT.to_string(),
            max_blanks: DEFAULT_MAX_BLANKS,
        }
    }
}

impl BlankLineSettings {
    /// Typed constructor. Invalid values are replaced by defaults, the same
    /// way [`BlankLineSettings::from_options`] treats them.
    pub fn new(height_per_blank: f64, unit: impl Into<String>, max_blanks: usize) -> Self {
        let unit = unit.into();
        Self {
            height_per_blank: valid_height(height_per_blank).unwrap_or_else(|| {
                tracing::warn!(
                    "Invalid height_per_blank {}, using {}",
                    height_per_blank,
                    DEFAULT_HEIGHT_PER_BLANK
                );
                DEFAULT_HEIGHT_PER_BLANK
            }),
            unit: valid_unit(&unit).unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            max_blanks,
        }
    }

    pub fn from_options(options: &BlankLineOptions) -> Self {
        Self {
            height_per_blank: coerce_height(options.height_per_blank.as_ref()),
            unit: coerce_unit(options.unit.as_ref()),
            max_blanks: coerce_max_blanks(options.max_blanks.as_ref()),
        }
    }

    #[inline]
    pub fn height_per_blank(&self) -> f64 {
        self.height_per_blank
    }

    #[inline]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    #[inline]
    pub fn max_blanks(&self) -> usize {
        self.max_blanks
    }
}

fn valid_height(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

fn valid_unit(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn coerce_height(value: Option<&Value>) -> f64 {
    let Some(value) = present(value) else {
        return DEFAULT_HEIGHT_PER_BLANK;
    };

    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.and_then(valid_height).unwrap_or_else(|| {
        tracing::warn!(
            "Invalid height_per_blank {}, using {}",
            value,
            DEFAULT_HEIGHT_PER_BLANK
        );
        DEFAULT_HEIGHT_PER_BLANK
    })
}

fn coerce_unit(value: Option<&Value>) -> String {
    let Some(value) = present(value) else {
        return DEFAULT_UNIT.to_string();
    };

    value.as_str().and_then(valid_unit).unwrap_or_else(|| {
        tracing::warn!("Invalid unit {}, using {:?}", value, DEFAULT_UNIT);
        DEFAULT_UNIT.to_string()
    })
}

fn coerce_max_blanks(value: Option<&Value>) -> usize {
    let Some(value) = present(value) else {
        return DEFAULT_MAX_BLANKS;
    };

    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed {
        // Negative clamps behave like zero: every run collapses to a paragraph break
        Some(n) => usize::try_from(n.max(0)).unwrap_or(usize::MAX),
        None => {
            tracing::warn!(
                "Invalid max_blanks {}, using {}",
                value,
                DEFAULT_MAX_BLANKS
            );
            DEFAULT_MAX_BLANKS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(height: Value, unit: Value, max: Value) -> BlankLineOptions {
        BlankLineOptions {
            height_per_blank: Some(height),
            unit: Some(unit),
            max_blanks: Some(max),
        }
    }

    #[test]
    fn test_defaults_when_absent() {
        let settings = BlankLineSettings::from_options(&BlankLineOptions::default());
        assert_eq!(settings, BlankLineSettings::default());
        assert_eq!(settings.height_per_blank(), 1.0);
        assert_eq!(settings.unit(), "em");
        assert_eq!(settings.max_blanks(), 50);
    }

    #[test]
    fn test_numeric_values() {
        let settings =
            BlankLineSettings::from_options(&options(json!(0.5), json!("px"), json!(10)));
        assert_eq!(settings.height_per_blank(), 0.5);
        assert_eq!(settings.unit(), "px");
        assert_eq!(settings.max_blanks(), 10);
    }

    #[test]
    fn test_numeric_strings() {
        let settings =
            BlankLineSettings::from_options(&options(json!(" 2.5 "), json!("rem"), json!("7")));
        assert_eq!(settings.height_per_blank(), 2.5);
        assert_eq!(settings.unit(), "rem");
        assert_eq!(settings.max_blanks(), 7);
    }

    #[test]
    fn test_invalid_height_falls_back() {
        for bad in [json!("tall"), json!(true), json!([1]), json!(0), json!(-2.0)] {
            let settings = BlankLineSettings::from_options(&BlankLineOptions {
                height_per_blank: Some(bad.clone()),
                ..Default::default()
            });
            assert_eq!(settings.height_per_blank(), 1.0, "value: {}", bad);
        }
    }

    #[test]
    fn test_invalid_unit_falls_back() {
        for bad in [json!(""), json!("   "), json!(3), json!(null), json!({"a": 1})] {
            let settings = BlankLineSettings::from_options(&BlankLineOptions {
                unit: Some(bad.clone()),
                ..Default::default()
            });
            assert_eq!(settings.unit(), "em", "value: {}", bad);
        }
    }

    #[test]
    fn test_max_blanks_coercion() {
        let cases = [
            (json!(3.9), 3),
            (json!(-4), 0),
            (json!("-1"), 0),
            (json!("many"), 50),
            (json!("2.5"), 50),
            (json!(false), 50),
        ];
        for (raw, expected) in cases {
            let settings = BlankLineSettings::from_options(&BlankLineOptions {
                max_blanks: Some(raw.clone()),
                ..Default::default()
            });
            assert_eq!(settings.max_blanks(), expected, "value: {}", raw);
        }
    }

    #[test]
    fn test_typed_constructor_validates() {
        let settings = BlankLineSettings::new(f64::NAN, "", 5);
        assert_eq!(settings.height_per_blank(), 1.0);
        assert_eq!(settings.unit(), "em");
        assert_eq!(settings.max_blanks(), 5);
    }

    #[test]
    fn test_merge_overrides_present_fields() {
        let mut base = BlankLineOptions::from_strings(Some("2".into()), Some("px".into()), None);
        base.merge(BlankLineOptions::from_strings(None, Some("rem".into()), Some("9".into())));

        assert_eq!(base.height_per_blank, Some(json!("2")));
        assert_eq!(base.unit, Some(json!("rem")));
        assert_eq!(base.max_blanks, Some(json!("9")));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let options: BlankLineOptions =
            toml::from_str("height_per_blank = 1.5\nunit = \"px\"\nmax_blanks = 20\n").unwrap();
        let settings = BlankLineSettings::from_options(&options);
        assert_eq!(settings.height_per_blank(), 1.5);
        assert_eq!(settings.unit(), "px");
        assert_eq!(settings.max_blanks(), 20);
    }
}
