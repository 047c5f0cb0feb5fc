use super::*;
use serde_json::json;

#[test]
fn parses_hex_forms() {
    let c: Color = serde_json::from_value(json!("#ff0000")).unwrap();
    assert_eq!(c, Color::rgba(1.0, 0.0, 0.0, 1.0));

    let c: Color = serde_json::from_value(json!("#0000ff80")).unwrap();
    assert!((c.b - 1.0).abs() < 1e-9);
    assert!((c.a - (128.0 / 255.0)).abs() < 1e-9);

    let c: Color = serde_json::from_value(json!("#0f0")).unwrap();
    assert_eq!(c, Color::rgba(0.0, 1.0, 0.0, 1.0));

    assert!(serde_json::from_value::<Color>(json!("#12345")).is_err());
    assert!(serde_json::from_value::<Color>(json!("#zzzzzz")).is_err());
}

#[test]
fn parses_rgba_object_and_array() {
    let c: Color = serde_json::from_value(json!({"r": 0.25, "g": 0.5, "b": 0.75})).unwrap();
    assert_eq!(c, Color::rgba(0.25, 0.5, 0.75, 1.0));

    let c: Color = serde_json::from_value(json!([0.25, 0.5, 0.75, 0.9])).unwrap();
    assert_eq!(c, Color::rgba(0.25, 0.5, 0.75, 0.9));

    assert!(serde_json::from_value::<Color>(json!([0.1, 0.2])).is_err());
}

#[test]
fn parses_hsla_object() {
    let c: Color = serde_json::from_value(json!({"h": 120.0, "s": 1.0, "l": 0.5})).unwrap();
    assert!(c.approx_eq(&Color::rgba(0.0, 1.0, 0.0, 1.0)));
}

#[test]
fn approx_eq_tolerates_rounding_but_not_real_changes() {
    let a = Color::rgba(0.2, 0.4, 0.6, 1.0);
    assert!(a.approx_eq(&Color::rgba(0.2 + 1e-4, 0.4, 0.6, 1.0)));
    assert!(!a.approx_eq(&Color::rgba(0.2, 0.4, 0.6, 0.9)));
    assert!(!a.approx_eq(&Color::rgba(0.25, 0.4, 0.6, 1.0)));
}

#[test]
fn css_output() {
    assert_eq!(
        Color::rgba(1.0, 0.5, 0.0, 0.5).to_css(),
        "rgba(255, 128, 0, 0.5)"
    );
    assert_eq!(
        Color::rgba(1.0, 1.0, 1.0, 0.8).with_opacity(0.5).to_css(),
        "rgba(255, 255, 255, 0.4)"
    );
}
