use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator that introduces the lower bound of a range
pub const FROM_SEPARATOR: &str = "_From_";
/// Separator between the lower and upper bound of a range
pub const TO_SEPARATOR: &str = "_To_";
/// Separator that introduces the unit label
pub const UNIT_SEPARATOR: &str = "_Unit_";
/// Prefix the backend puts on every catalog parameter name
pub const CATALOG_PREFIX: &str = "EMS_NEW_";

lazy_static! {
    // Shortest base first, so the first `_From_` wins. After the bounds either
    // `_Unit_<unit>`, a lenient `_<unit>` or nothing may follow.
    static ref RANGE_REGEX: Regex =
        Regex::new(r"(?s)^(.*?)_From_([0-9]+)_To_([0-9]+)(?:_Unit_(.*)|_(.*))?$").unwrap();
}

/// Errors raised while turning user input into an encodable parameter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("Start range must be less than end range ({name}: {min} >= {max})")]
    InvalidRange { name: String, min: i64, max: i64 },

    #[error("Both start and end range must be set for '{name}'")]
    IncompleteRange { name: String },

    #[error("Range bound '{value}' is not an integer")]
    InvalidBound { value: String },

    #[error("Parameter name cannot be empty")]
    EmptyName,

    #[error("Parameter name '{name}' contains a reserved separator")]
    ReservedSeparator { name: String },

    #[error("Range bound {value} cannot be negative")]
    NegativeBound { value: i64 },

    #[error("'{token}' would not decode back to the same parameter")]
    Ambiguous { token: String },
}

/// A report template parameter
///
/// Every parameter is stored by the backend as one flat string token. The
/// three variants correspond to the three token shapes:
///
/// - `Bare`: `Humidity`
/// - `Unit`: `Pressure_Unit_kPa`
/// - `Ranged`: `Temperature_From_10_To_50` or `Temperature_From_10_To_50_Unit_C`
///
/// A `Ranged` parameter with an empty `unit` has no unit label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Parameter {
    Bare {
        name: String,
    },
    Unit {
        name: String,
        unit: String,
    },
    Ranged {
        name: String,
        min: i64,
        max: i64,
        unit: String,
    },
}

impl Parameter {
    /// Create a parameter with no range and no unit
    pub fn bare(name: impl Into<String>) -> Self {
        Parameter::Bare { name: name.into() }
    }

    /// Create a unit-only parameter
    ///
    /// An empty unit yields a `Bare` parameter, since the unit-only shape
    /// always carries a label.
    pub fn with_unit(name: impl Into<String>, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        if unit.is_empty() {
            Parameter::Bare { name: name.into() }
        } else {
            Parameter::Unit {
                name: name.into(),
                unit,
            }
        }
    }

    /// Create a ranged parameter, optionally with a unit (empty for none)
    ///
    /// The bounds are not checked here; see [`Parameter::validate_range`].
    pub fn ranged(name: impl Into<String>, min: i64, max: i64, unit: impl Into<String>) -> Self {
        Parameter::Ranged {
            name: name.into(),
            min,
            max,
            unit: unit.into(),
        }
    }

    /// Decode a stored parameter token
    ///
    /// Decoding never fails. Patterns are tried in a fixed order and the
    /// first match wins:
    ///
    /// 1. `<base>_From_<min>_To_<max>` optionally followed by `_Unit_<unit>`
    /// 2. `<base>_Unit_<unit>`, split at the first `_Unit_`
    /// 3. the whole token as a bare name
    ///
    /// Bounds are unsigned decimal integers. A bound that does not fit in an
    /// `i64` makes the range pattern fail, and decoding moves on to the unit
    /// pattern.
    ///
    /// # Arguments
    /// * `token` - Any string taken from a template's parameter list
    ///
    /// # Returns
    /// * `Parameter` - The decoded parameter
    ///
    /// # Examples
    /// ```
    /// use report_console::parameter::Parameter;
    ///
    /// let p = Parameter::decode("Temperature_From_10_To_50_Unit_C");
    /// assert_eq!(p, Parameter::ranged("Temperature", 10, 50, "C"));
    /// assert_eq!(p.display_name(), "Temperature (10-50 C)");
    /// ```
    pub fn decode(token: &str) -> Self {
        if let Some(parameter) = Self::decode_range(token) {
            return parameter;
        }

        if let Some(pos) = token.find(UNIT_SEPARATOR) {
            let name = &token[..pos];
            let unit = &token[pos + UNIT_SEPARATOR.len()..];
            return Parameter::with_unit(name, unit);
        }

        Parameter::bare(token)
    }

    fn decode_range(token: &str) -> Option<Self> {
        let caps = RANGE_REGEX.captures(token)?;
        let min = caps[2].parse::<i64>().ok()?;
        let max = caps[3].parse::<i64>().ok()?;
        let unit = caps
            .get(4)
            .or_else(|| caps.get(5))
            .map(|m| m.as_str())
            .unwrap_or("");

        Some(Parameter::ranged(&caps[1], min, max, unit))
    }

    /// Encode the parameter into its canonical token
    ///
    /// The token is checked by decoding it again, so a name or unit that
    /// would be read back differently is refused instead of written.
    ///
    /// # Returns
    /// * `Result<String, ParameterError>` - The token, `NegativeBound` for a
    ///   bound below zero, `InvalidRange` when `min >= max`, or `Ambiguous`
    ///   when the token would decode to another parameter
    ///
    /// # Examples
    /// ```
    /// use report_console::parameter::Parameter;
    ///
    /// let token = Parameter::ranged("Flow", 0, 100, "").encode().unwrap();
    /// assert_eq!(token, "Flow_From_0_To_100");
    /// ```
    pub fn encode(&self) -> Result<String, ParameterError> {
        let token = self.encode_unchecked()?;
        if Parameter::decode(&token) != *self {
            return Err(ParameterError::Ambiguous { token });
        }
        Ok(token)
    }

    fn encode_unchecked(&self) -> Result<String, ParameterError> {
        match self {
            Parameter::Bare { name } => Ok(name.clone()),
            Parameter::Unit { name, unit } => Ok(format!("{}{}{}", name, UNIT_SEPARATOR, unit)),
            Parameter::Ranged {
                name,
                min,
                max,
                unit,
            } => {
                check_bounds(*min, *max)?;
                if min >= max {
                    return Err(ParameterError::InvalidRange {
                        name: name.clone(),
                        min: *min,
                        max: *max,
                    });
                }

                let mut token = format!("{}{}{}{}{}", name, FROM_SEPARATOR, min, TO_SEPARATOR, max);
                if !unit.is_empty() {
                    token.push_str(UNIT_SEPARATOR);
                    token.push_str(unit);
                }
                Ok(token)
            }
        }
    }

    /// Check the range invariant
    ///
    /// # Returns
    /// * `bool` - False only when a range is present and `min >= max`
    pub fn validate_range(&self) -> bool {
        match self {
            Parameter::Ranged { min, max, .. } => min < max,
            _ => true,
        }
    }

    pub fn base_name(&self) -> &str {
        match self {
            Parameter::Bare { name } | Parameter::Unit { name, .. } | Parameter::Ranged { name, .. } => {
                name
            }
        }
    }

    /// Unit label, empty when the parameter has none
    pub fn unit(&self) -> &str {
        match self {
            Parameter::Bare { .. } => "",
            Parameter::Unit { unit, .. } | Parameter::Ranged { unit, .. } => unit,
        }
    }

    pub fn range(&self) -> Option<(i64, i64)> {
        match self {
            Parameter::Ranged { min, max, .. } => Some((*min, *max)),
            _ => None,
        }
    }

    /// Human readable label, e.g. `Temperature (10-50 C)` or `Pressure (kPa)`
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Bare { name } => write!(f, "{}", name),
            Parameter::Unit { name, unit } => write!(f, "{} ({})", name, unit),
            Parameter::Ranged {
                name,
                min,
                max,
                unit,
            } => {
                if unit.is_empty() {
                    write!(f, "{} ({}-{})", name, min, max)
                } else {
                    write!(f, "{} ({}-{} {})", name, min, max, unit)
                }
            }
        }
    }
}

impl FromStr for Parameter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Parameter::decode(s))
    }
}

impl From<&str> for Parameter {
    fn from(token: &str) -> Self {
        Parameter::decode(token)
    }
}

impl Serialize for Parameter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let token = self.encode().map_err(ser::Error::custom)?;
        serializer.serialize_str(&token)
    }
}

struct TokenVisitor;

impl<'de> Visitor<'de> for TokenVisitor {
    type Value = Parameter;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an encoded parameter string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Parameter, E> {
        Ok(Parameter::decode(v))
    }
}

impl<'de> Deserialize<'de> for Parameter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(TokenVisitor)
    }
}

/// Decode a stored parameter token. See [`Parameter::decode`].
pub fn decode(token: &str) -> Parameter {
    Parameter::decode(token)
}

/// Encode a parameter into its canonical token. See [`Parameter::encode`].
pub fn encode(parameter: &Parameter) -> Result<String, ParameterError> {
    parameter.encode()
}

/// Check the range invariant of a parameter. See [`Parameter::validate_range`].
pub fn validate_range(parameter: &Parameter) -> bool {
    parameter.validate_range()
}

/// Strip the backend catalog prefix for display
///
/// # Examples
/// ```
/// use report_console::parameter::short_label;
///
/// assert_eq!(short_label("EMS_NEW_Temperature"), "Temperature");
/// assert_eq!(short_label("Revenue"), "Revenue");
/// ```
pub fn short_label(name: &str) -> &str {
    name.strip_prefix(CATALOG_PREFIX).unwrap_or(name)
}

/// Parameter as it is being edited
///
/// Unlike [`Parameter`], a draft may hold a one-sided range while the user is
/// still typing. It has to pass [`ParameterDraft::to_parameter`] before it
/// can be encoded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParameterDraft {
    #[serde(rename = "baseName")]
    pub base_name: String,
    pub min: Option<i64>,
    pub max: Option<i64>,
    #[serde(default)]
    pub unit: String,
    /// Stored token the draft was opened from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ParameterDraft {
    /// Blank draft for a freshly selected parameter
    pub fn new(base_name: impl Into<String>) -> Self {
        ParameterDraft {
            base_name: base_name.into(),
            ..Default::default()
        }
    }

    /// Draft for a stored token, remembering the token itself
    pub fn from_token(token: &str) -> Self {
        ParameterDraft {
            token: Some(token.to_string()),
            ..ParameterDraft::from(&Parameter::decode(token))
        }
    }

    /// The stored token, as long as none of the fields were edited
    pub fn unchanged_token(&self) -> Option<&str> {
        let token = self.token.as_deref()?;
        let stored = ParameterDraft::from(&Parameter::decode(token));
        let unchanged = stored.base_name == self.base_name
            && stored.min == self.min
            && stored.max == self.max
            && stored.unit == self.unit;
        unchanged.then_some(token)
    }

    /// Token to save for this draft
    ///
    /// An untouched draft keeps its stored token byte for byte, even when
    /// that token is not in canonical form. Edited drafts are encoded.
    pub fn to_token(&self) -> Result<String, ParameterError> {
        match self.unchanged_token() {
            Some(token) => Ok(token.to_string()),
            None => self.to_parameter()?.encode(),
        }
    }

    /// Set the lower bound from an input field; empty text clears it
    pub fn set_min_text(&mut self, text: &str) -> Result<(), ParameterError> {
        self.min = parse_bound(text)?;
        Ok(())
    }

    /// Set the upper bound from an input field; empty text clears it
    pub fn set_max_text(&mut self, text: &str) -> Result<(), ParameterError> {
        self.max = parse_bound(text)?;
        Ok(())
    }

    /// False only when both bounds are set and `min >= max`
    pub fn validate_range(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min < max,
            _ => true,
        }
    }

    /// Turn the draft into an encodable parameter
    ///
    /// # Returns
    /// * `Result<Parameter, ParameterError>` - The parameter, or an error when
    ///   the name is empty or reserved, the range is inverted, or only one
    ///   bound is set
    pub fn to_parameter(&self) -> Result<Parameter, ParameterError> {
        check_name(&self.base_name)?;

        match (self.min, self.max) {
            (Some(min), Some(max)) => {
                check_bounds(min, max)?;
                if min >= max {
                    return Err(ParameterError::InvalidRange {
                        name: self.base_name.clone(),
                        min,
                        max,
                    });
                }
                Ok(Parameter::ranged(self.base_name.clone(), min, max, self.unit.clone()))
            }
            (None, None) => Ok(Parameter::with_unit(self.base_name.clone(), self.unit.clone())),
            _ => Err(ParameterError::IncompleteRange {
                name: self.base_name.clone(),
            }),
        }
    }
}

impl From<&Parameter> for ParameterDraft {
    fn from(parameter: &Parameter) -> Self {
        let (min, max) = match parameter.range() {
            Some((min, max)) => (Some(min), Some(max)),
            None => (None, None),
        };

        ParameterDraft {
            base_name: parameter.base_name().to_string(),
            min,
            max,
            unit: parameter.unit().to_string(),
            token: None,
        }
    }
}

fn parse_bound(text: &str) -> Result<Option<i64>, ParameterError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let value = text.parse::<i64>().map_err(|_| ParameterError::InvalidBound {
        value: text.to_string(),
    })?;
    if value < 0 {
        return Err(ParameterError::NegativeBound { value });
    }
    Ok(Some(value))
}

/// Bounds are written as plain digits, so neither may be negative
fn check_bounds(min: i64, max: i64) -> Result<(), ParameterError> {
    match [min, max].into_iter().find(|v| *v < 0) {
        Some(value) => Err(ParameterError::NegativeBound { value }),
        None => Ok(()),
    }
}

/// Reject names that would not survive an encode/decode round trip
///
/// Besides the `_From_` and `_Unit_` separators themselves, a name may not
/// end in `_Unit`: followed by the unit separator it would form an earlier
/// `_Unit_` marker.
pub fn check_name(name: &str) -> Result<(), ParameterError> {
    if name.is_empty() {
        return Err(ParameterError::EmptyName);
    }
    if name.contains(FROM_SEPARATOR)
        || name.contains(UNIT_SEPARATOR)
        || name.ends_with(&UNIT_SEPARATOR[..UNIT_SEPARATOR.len() - 1])
    {
        return Err(ParameterError::ReservedSeparator {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_range_with_unit() {
        let p = decode("Temperature_From_10_To_50_Unit_C");
        assert_eq!(p, Parameter::ranged("Temperature", 10, 50, "C"));
        assert_eq!(p.display_name(), "Temperature (10-50 C)");
    }

    #[test]
    fn decodes_unit_only() {
        let p = decode("Pressure_Unit_kPa");
        assert_eq!(p, Parameter::with_unit("Pressure", "kPa"));
        assert_eq!(p.range(), None);
        assert_eq!(p.display_name(), "Pressure (kPa)");
    }

    #[test]
    fn decodes_bare_name() {
        let p = decode("Humidity");
        assert_eq!(p, Parameter::bare("Humidity"));
        assert_eq!(p.unit(), "");
        assert_eq!(p.display_name(), "Humidity");
    }

    #[test]
    fn unit_may_contain_underscores_and_symbols() {
        let p = decode("Efficiency_From_50_To_100_Unit_%_per_hour");
        assert_eq!(p.unit(), "%_per_hour");
        assert_eq!(p.range(), Some((50, 100)));

        let p = decode("Flow_Unit_m3_h");
        assert_eq!(p, Parameter::with_unit("Flow", "m3_h"));
    }

    #[test]
    fn unit_splits_at_first_marker() {
        assert_eq!(decode("Fan_Unit_Unit_rpm"), Parameter::with_unit("Fan", "Unit_rpm"));

        let mass = Parameter::with_unit("Mass", "Unit_a");
        assert_eq!(mass.encode().unwrap(), "Mass_Unit_Unit_a");
        assert_eq!(decode("Mass_Unit_Unit_a"), mass);
    }

    #[test]
    fn units_with_underscores_at_the_edges_survive() {
        for unit in ["_x", "x_", "Unit_", "_Unit_", "a_Unit_b"] {
            let unit_only = Parameter::with_unit("Mass", unit);
            assert_eq!(decode(&unit_only.encode().unwrap()), unit_only);

            let ranged = Parameter::ranged("Mass", 1, 2, unit);
            assert_eq!(decode(&ranged.encode().unwrap()), ranged);
        }
    }

    #[test]
    fn negative_bounds_never_encode() {
        assert_eq!(
            Parameter::ranged("Level", -5, 5, "m").encode(),
            Err(ParameterError::NegativeBound { value: -5 })
        );
        assert_eq!(
            Parameter::ranged("Level", 0, -1, "").encode(),
            Err(ParameterError::NegativeBound { value: -1 })
        );
    }

    #[test]
    fn lossy_tokens_are_refused() {
        // read back as a range, not as a unit
        assert!(matches!(
            Parameter::with_unit("Rate", "From_1_To_2").encode(),
            Err(ParameterError::Ambiguous { .. })
        ));
        assert!(matches!(
            Parameter::bare("Rate_Unit_kW").encode(),
            Err(ParameterError::Ambiguous { .. })
        ));
        assert!(matches!(
            Parameter::with_unit("Fan_Unit", "rpm").encode(),
            Err(ParameterError::Ambiguous { .. })
        ));
    }

    #[test]
    fn range_without_unit_has_short_label() {
        let p = decode("Quality_From_1_To_10");
        assert_eq!(p, Parameter::ranged("Quality", 1, 10, ""));
        assert_eq!(p.display_name(), "Quality (1-10)");
    }

    #[test]
    fn lenient_tail_is_taken_as_unit() {
        let p = decode("Speed_From_0_To_90_kmh");
        assert_eq!(p, Parameter::ranged("Speed", 0, 90, "kmh"));
        assert_eq!(p.encode().unwrap(), "Speed_From_0_To_90_Unit_kmh");
    }

    #[test]
    fn empty_unit_after_marker_decodes_bare() {
        assert_eq!(decode("Pressure_Unit_"), Parameter::bare("Pressure"));
        assert_eq!(decode("Flow_From_1_To_2_Unit_"), Parameter::ranged("Flow", 1, 2, ""));
    }

    #[test]
    fn non_numeric_bounds_fall_through() {
        assert_eq!(decode("Level_From_low_To_high"), Parameter::bare("Level_From_low_To_high"));
        assert_eq!(
            decode("Level_From_-5_To_5_Unit_m"),
            Parameter::with_unit("Level_From_-5_To_5", "m")
        );
    }

    #[test]
    fn oversized_bounds_fall_through() {
        let token = "Count_From_99999999999999999999_To_1";
        assert_eq!(decode(token), Parameter::bare(token));
    }

    #[test]
    fn first_from_occurrence_wins() {
        let p = decode("A_From_1_To_2_Unit_x_From_3_To_4");
        assert_eq!(p, Parameter::ranged("A", 1, 2, "x_From_3_To_4"));
    }

    #[test]
    fn encodes_each_shape() {
        assert_eq!(encode(&Parameter::bare("Output")).unwrap(), "Output");
        assert_eq!(encode(&Parameter::with_unit("Profit", "USD")).unwrap(), "Profit_Unit_USD");
        assert_eq!(encode(&Parameter::ranged("Flow", 0, 100, "")).unwrap(), "Flow_From_0_To_100");
        assert_eq!(
            encode(&Parameter::ranged("Temperature", 10, 50, "C")).unwrap(),
            "Temperature_From_10_To_50_Unit_C"
        );
    }

    #[test]
    fn encode_refuses_inverted_range() {
        let err = encode(&Parameter::ranged("Flow", 100, 0, "")).unwrap_err();
        assert_eq!(
            err,
            ParameterError::InvalidRange {
                name: "Flow".to_string(),
                min: 100,
                max: 0
            }
        );
        assert!(encode(&Parameter::ranged("Flow", 5, 5, "")).is_err());
    }

    #[test]
    fn validate_range_cases() {
        assert!(!validate_range(&Parameter::ranged("X", 10, 5, "")));
        assert!(validate_range(&Parameter::ranged("X", 5, 10, "")));
        assert!(validate_range(&Parameter::bare("X")));
        assert!(validate_range(&Parameter::with_unit("X", "kg")));
    }

    #[test]
    fn draft_allows_one_sided_range_while_editing() {
        let mut draft = ParameterDraft::new("Voltage");
        draft.set_min_text("10").unwrap();
        assert!(draft.validate_range());
        assert_eq!(
            draft.to_parameter(),
            Err(ParameterError::IncompleteRange {
                name: "Voltage".to_string()
            })
        );

        draft.set_max_text("5").unwrap();
        assert!(!draft.validate_range());
        assert!(matches!(draft.to_parameter(), Err(ParameterError::InvalidRange { .. })));

        draft.set_max_text("240").unwrap();
        draft.unit = "V".to_string();
        assert_eq!(draft.to_parameter().unwrap(), Parameter::ranged("Voltage", 10, 240, "V"));
    }

    #[test]
    fn draft_text_inputs() {
        let mut draft = ParameterDraft::new("Current");
        assert_eq!(
            draft.set_min_text("ten"),
            Err(ParameterError::InvalidBound {
                value: "ten".to_string()
            })
        );
        draft.set_min_text(" 3 ").unwrap();
        assert_eq!(draft.min, Some(3));
        draft.set_min_text("").unwrap();
        assert_eq!(draft.min, None);
    }

    #[test]
    fn draft_refuses_negative_bounds() {
        let mut draft = ParameterDraft::new("Level");
        assert_eq!(draft.set_min_text("-5"), Err(ParameterError::NegativeBound { value: -5 }));
        assert_eq!(draft.min, None);

        draft.min = Some(-5);
        draft.max = Some(5);
        assert_eq!(draft.to_parameter(), Err(ParameterError::NegativeBound { value: -5 }));
    }

    #[test]
    fn untouched_draft_keeps_stored_token() {
        let legacy = "Level_From_-5_To_5_Unit_m";
        let draft = ParameterDraft::from_token(legacy);
        assert_eq!(draft.base_name, "Level_From_-5_To_5");
        assert_eq!(draft.to_token().unwrap(), legacy);

        let lenient = ParameterDraft::from_token("Speed_From_0_To_90_kmh");
        assert_eq!(lenient.to_token().unwrap(), "Speed_From_0_To_90_kmh");

        let mut edited = ParameterDraft::from_token("Speed_From_0_To_90_kmh");
        edited.set_max_text("120").unwrap();
        assert_eq!(edited.unchanged_token(), None);
        assert_eq!(edited.to_token().unwrap(), "Speed_From_0_To_120_Unit_kmh");

        let mut renamed = ParameterDraft::from_token(legacy);
        renamed.unit = "cm".to_string();
        assert!(matches!(renamed.to_token(), Err(ParameterError::ReservedSeparator { .. })));
    }

    #[test]
    fn draft_round_trips_through_parameter() {
        for token in ["Humidity", "Pressure_Unit_kPa", "Flow_From_0_To_100", "T_From_1_To_9_Unit_C"] {
            let p = decode(token);
            let draft = ParameterDraft::from(&p);
            assert_eq!(draft.to_parameter().unwrap(), p);
        }
    }

    #[test]
    fn draft_rejects_reserved_names() {
        assert_eq!(ParameterDraft::new("").to_parameter(), Err(ParameterError::EmptyName));
        assert!(matches!(
            ParameterDraft::new("A_Unit_B").to_parameter(),
            Err(ParameterError::ReservedSeparator { .. })
        ));
        assert!(matches!(check_name("Fan_Unit"), Err(ParameterError::ReservedSeparator { .. })));
        assert!(check_name("Fan_Units").is_ok());
        assert!(check_name("Flow_To_Zone").is_ok());
    }

    #[test]
    fn serde_uses_token_form() {
        let list = vec![Parameter::ranged("Revenue", 1000, 5000, ""), Parameter::with_unit("Profit", "USD")];
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"["Revenue_From_1000_To_5000","Profit_Unit_USD"]"#);

        let back: Vec<Parameter> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, list);

        assert!(serde_json::to_string(&Parameter::ranged("Bad", 9, 1, "")).is_err());
    }

    #[test]
    fn catalog_prefix_is_stripped() {
        assert_eq!(short_label("EMS_NEW_Flow_Rate"), "Flow_Rate");
        assert_eq!(short_label("Flow_Rate"), "Flow_Rate");
    }
}
