use super::*;

#[test]
fn endpoints_are_exact() {
    for e in [
        Ease::Linear,
        Ease::Ease,
        Ease::EaseIn,
        Ease::EaseOut,
        Ease::EaseInOut,
        Ease::EaseInBack,
        Ease::EaseOutBack,
        Ease::EaseInOutBack,
    ] {
        assert_eq!(e.apply(0.0), 0.0, "{e}");
        assert_eq!(e.apply(1.0), 1.0, "{e}");
    }
}

#[test]
fn input_is_clamped() {
    assert_eq!(Ease::EaseInOut.apply(-3.0), 0.0);
    assert_eq!(Ease::EaseInOut.apply(7.0), 1.0);
}

#[test]
fn ease_in_out_is_symmetric_around_midpoint() {
    let mid = Ease::EaseInOut.apply(0.5);
    assert!((mid - 0.5).abs() < 1e-4, "mid={mid}");
    let a = Ease::EaseInOut.apply(0.2);
    let b = Ease::EaseInOut.apply(0.8);
    assert!((a + b - 1.0).abs() < 1e-4);
}

#[test]
fn ease_in_starts_slow_and_ease_out_starts_fast() {
    assert!(Ease::EaseIn.apply(0.25) < 0.25);
    assert!(Ease::EaseOut.apply(0.25) > 0.25);
}

#[test]
fn back_curves_overshoot() {
    let peak = (1..100)
        .map(|i| Ease::EaseOutBack.apply(f64::from(i) / 100.0))
        .fold(f64::MIN, f64::max);
    assert!(peak > 1.0, "peak={peak}");

    let dip = (1..100)
        .map(|i| Ease::EaseInBack.apply(f64::from(i) / 100.0))
        .fold(f64::MAX, f64::min);
    assert!(dip < 0.0, "dip={dip}");
}

#[test]
fn parse_accepts_authoring_aliases() {
    assert_eq!(Ease::parse("EASE_IN_AND_OUT").unwrap(), Ease::EaseInOut);
    assert_eq!(Ease::parse("ease_out").unwrap(), Ease::EaseOut);
    assert_eq!(
        Ease::parse("EASE_IN_AND_OUT_BACK").unwrap(),
        Ease::EaseInOutBack
    );
    assert_eq!(
        Ease::parse("cubic-bezier(0.1, 0.2, 0.3, 0.4)").unwrap(),
        Ease::CubicBezier(0.1, 0.2, 0.3, 0.4)
    );
    assert!(Ease::parse("bouncy").is_err());
    assert!(Ease::parse("cubic-bezier(0.1, 0.2, 1.3, 0.4)").is_err());
    assert!(Ease::parse("cubic-bezier(0.1, 0.2)").is_err());
}

#[test]
fn css_uses_keywords_where_available() {
    assert_eq!(Ease::EaseInOut.css(), "ease-in-out");
    assert_eq!(Ease::EaseOutBack.css(), "cubic-bezier(0.45, 1.45, 0.8, 1)");
}

#[test]
fn serde_accepts_names_and_points() {
    let e: Ease = serde_json::from_value(serde_json::json!("EASE_OUT")).unwrap();
    assert_eq!(e, Ease::EaseOut);
    let e: Ease = serde_json::from_value(serde_json::json!([0.2, 0.0, 0.4, 1.0])).unwrap();
    assert_eq!(e, Ease::CubicBezier(0.2, 0.0, 0.4, 1.0));
    let e: Ease =
        serde_json::from_value(serde_json::json!({ "cubic_bezier": [0.2, 0.0, 0.4, 1.0] }))
            .unwrap();
    assert_eq!(e, Ease::CubicBezier(0.2, 0.0, 0.4, 1.0));
    assert_eq!(
        serde_json::to_value(Ease::EaseInBack).unwrap(),
        serde_json::json!("ease-in-back")
    );
}
