use proptest::prelude::*;
use report_console::parameter::{Parameter, ParameterError, check_name, decode, encode, validate_range};

fn base_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,15}".prop_filter("reserved separator", |n| check_name(n).is_ok())
}

/// Units with underscores anywhere, including a leading `Unit_`
fn unit_label() -> impl Strategy<Value = String> {
    "(Unit_|_)?[A-Za-z0-9%/_]{0,8}_?"
        .prop_filter("empty unit", |u| !u.is_empty())
        .prop_filter("range text", |u| !format!("_{}", u).contains("_From_"))
}

fn bounds() -> impl Strategy<Value = (i64, i64)> {
    (0i64..1_000_000, 1i64..1_000_000).prop_map(|(min, span)| (min, min + span))
}

/// Bound pairs where at least one side is negative
fn signed_bounds() -> impl Strategy<Value = (i64, i64)> {
    (-1_000_000i64..1_000_000, -1_000_000i64..1_000_000).prop_filter("needs a negative", |(a, b)| *a < 0 || *b < 0)
}

proptest! {
    #[test]
    fn plain_names_decode_bare(name in base_name()) {
        let p = decode(&name);
        prop_assert_eq!(p.range(), None);
        prop_assert_eq!(p.unit(), "");
        prop_assert_eq!(p, Parameter::bare(name));
    }

    #[test]
    fn ranged_with_unit_survives(name in base_name(), (min, max) in bounds(), unit in unit_label()) {
        let original = Parameter::ranged(name, min, max, unit);
        let token = encode(&original).unwrap();
        prop_assert_eq!(decode(&token), original);
    }

    #[test]
    fn ranged_without_unit_has_no_unit_segment(name in base_name(), (min, max) in bounds()) {
        let original = Parameter::ranged(name, min, max, "");
        let token = encode(&original).unwrap();
        prop_assert!(!token.contains("_Unit_"));
        prop_assert_eq!(decode(&token), original);
    }

    #[test]
    fn unit_only_survives(name in base_name(), unit in unit_label()) {
        let original = Parameter::with_unit(name, unit);
        let token = encode(&original).unwrap();
        prop_assert_eq!(decode(&token), original);
    }

    #[test]
    fn inverted_ranges_never_encode(name in base_name(), (min, max) in bounds()) {
        let inverted = Parameter::ranged(name, max, min, "");
        prop_assert!(!validate_range(&inverted));
        let is_invalid_range = matches!(encode(&inverted), Err(ParameterError::InvalidRange { .. }));
        prop_assert!(is_invalid_range);
    }

    #[test]
    fn negative_bounds_are_refused(name in base_name(), (min, max) in signed_bounds()) {
        let is_negative = matches!(
            encode(&Parameter::ranged(name, min, max, "")),
            Err(ParameterError::NegativeBound { .. })
        );
        prop_assert!(is_negative);
    }

    #[test]
    fn encode_is_never_lossy(name in "\\PC{1,16}", unit in "\\PC{0,16}", (min, max) in bounds()) {
        for p in [Parameter::with_unit(name.clone(), unit.clone()), Parameter::ranged(name.clone(), min, max, unit.clone())] {
            match encode(&p) {
                Ok(token) => prop_assert_eq!(decode(&token), p),
                Err(e) => prop_assert!(matches!(e, ParameterError::Ambiguous { .. }), "unexpected {:?}", e),
            }
        }
    }

    #[test]
    fn decode_is_total(token in "\\PC{0,40}") {
        let p = decode(&token);
        prop_assert!(token.starts_with(p.base_name()));
    }
}

#[test]
fn validate_range_scenarios() {
    assert!(!validate_range(&Parameter::ranged("X", 10, 5, "")));
    assert!(validate_range(&Parameter::ranged("X", 5, 10, "")));
    assert!(validate_range(&Parameter::bare("X")));
    assert!(!validate_range(&Parameter::ranged("X", 7, 7, "")));
}

#[test]
fn decode_scenarios() {
    let t = decode("Temperature_From_10_To_50_Unit_C");
    assert_eq!(t.base_name(), "Temperature");
    assert_eq!(t.range(), Some((10, 50)));
    assert_eq!(t.unit(), "C");
    assert_eq!(t.display_name(), "Temperature (10-50 C)");

    let p = decode("Pressure_Unit_kPa");
    assert_eq!(p.base_name(), "Pressure");
    assert_eq!(p.range(), None);
    assert_eq!(p.unit(), "kPa");
    assert_eq!(p.display_name(), "Pressure (kPa)");

    let h = decode("Humidity");
    assert_eq!(h.base_name(), "Humidity");
    assert_eq!(h.range(), None);
    assert_eq!(h.unit(), "");
    assert_eq!(h.display_name(), "Humidity");
}

#[test]
fn encode_scenario() {
    assert_eq!(encode(&Parameter::ranged("Flow", 0, 100, "")).unwrap(), "Flow_From_0_To_100");
}

#[test]
fn tokens_from_existing_templates() {
    let stored = [
        "Revenue_From_1000_To_5000",
        "Profit_Unit_USD",
        "Customers",
        "Efficiency_From_50_To_100_Unit_%",
        "Quality_From_1_To_10",
    ];
    for token in stored {
        assert_eq!(decode(token).encode().unwrap(), token);
    }
}
