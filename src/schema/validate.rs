use crate::scene::model::{DOCUMENT_VERSION, DocumentDef, ElementDef, ElementKind, TriggerKind};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SchemaPathElem {
    Field(&'static str),
    Index(usize),
}

/// One schema violation, addressed by a JSON path such as `$.root.children[2].id`.
#[derive(Debug, Clone)]
pub struct SchemaError {
    pub(crate) path: Vec<SchemaPathElem>,
    pub(crate) message: String,
}

impl SchemaError {
    fn at(path: &[SchemaPathElem], message: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            message: message.into(),
        }
    }

    /// Rendered JSON path of the offending value.
    pub fn path(&self) -> String {
        format_path(&self.path)
    }

    /// Human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return write!(f, "{}", self.message);
        }
        write!(f, "{}: {}", format_path(&self.path), self.message)
    }
}

fn format_path(path: &[SchemaPathElem]) -> String {
    let mut s = String::from("$");
    for p in path {
        match *p {
            SchemaPathElem::Field(name) => {
                s.push('.');
                s.push_str(name);
            }
            SchemaPathElem::Index(i) => {
                s.push('[');
                s.push_str(&i.to_string());
                s.push(']');
            }
        }
    }
    s
}

/// Every violation found in one document, in document order.
#[derive(Debug, Clone)]
pub struct SchemaErrors {
    pub(crate) errors: Vec<SchemaError>,
}

impl SchemaErrors {
    /// Individual violations.
    pub fn errors(&self) -> &[SchemaError] {
        &self.errors
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

pub(crate) fn validate_document(def: &DocumentDef) -> Result<(), SchemaErrors> {
    let mut errors = Vec::new();

    if def.version != DOCUMENT_VERSION {
        errors.push(SchemaError::at(
            &[SchemaPathElem::Field("version")],
            format!("version must be \"{DOCUMENT_VERSION}\""),
        ));
    }

    let mut ids = HashSet::<&str>::new();
    validate_element(
        &def.root,
        &mut vec![SchemaPathElem::Field("root")],
        &mut ids,
        &mut errors,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaErrors { errors })
    }
}

fn field_path(path: &[SchemaPathElem], field: &'static str) -> Vec<SchemaPathElem> {
    [path, &[SchemaPathElem::Field(field)]].concat()
}

fn validate_element<'a>(
    el: &'a ElementDef,
    path: &mut Vec<SchemaPathElem>,
    ids: &mut HashSet<&'a str>,
    errors: &mut Vec<SchemaError>,
) {
    if el.id.trim().is_empty() {
        errors.push(SchemaError::at(
            &field_path(path, "id"),
            "element id must be non-empty",
        ));
    } else if !ids.insert(el.id.as_str()) {
        errors.push(SchemaError::at(
            &field_path(path, "id"),
            format!("duplicate element id \"{}\"", el.id),
        ));
    }

    for (field, v) in [
        ("x", el.x),
        ("y", el.y),
        ("width", el.width),
        ("height", el.height),
        ("rotation", el.rotation),
    ] {
        if !v.is_finite() {
            errors.push(SchemaError::at(&field_path(path, field), "must be finite"));
        }
    }
    if el.width < 0.0 || el.height < 0.0 {
        errors.push(SchemaError::at(
            &field_path(path, "width"),
            "width and height must be >= 0",
        ));
    }
    if let Some(o) = el.opacity {
        if !o.is_finite() || !(0.0..=1.0).contains(&o) {
            errors.push(SchemaError::at(
                &field_path(path, "opacity"),
                "opacity must be finite and within [0, 1]",
            ));
        }
    }
    for (field, paints) in [("fills", &el.fills), ("strokes", &el.strokes)] {
        for (i, p) in paints.iter().enumerate() {
            if !p.is_finite() {
                errors.push(SchemaError::at(
                    &[
                        path.as_slice(),
                        &[SchemaPathElem::Field(field), SchemaPathElem::Index(i)],
                    ]
                    .concat(),
                    "paint values must be finite",
                ));
            }
        }
    }

    if let Some(t) = &el.transition {
        if let Some(d) = t.duration_seconds {
            if !d.is_finite() || d < 0.0 {
                errors.push(SchemaError::at(
                    &[
                        path.as_slice(),
                        &[
                            SchemaPathElem::Field("transition"),
                            SchemaPathElem::Field("duration_seconds"),
                        ],
                    ]
                    .concat(),
                    "duration must be finite and >= 0",
                ));
            }
        }
    }

    for (i, t) in el.triggers.iter().enumerate() {
        let tpath = [
            path.as_slice(),
            &[SchemaPathElem::Field("triggers"), SchemaPathElem::Index(i)],
        ]
        .concat();
        if t.target.trim().is_empty() {
            errors.push(SchemaError::at(
                &field_path(&tpath, "target"),
                "trigger target must be non-empty",
            ));
        }
        match t.on {
            TriggerKind::Timer if t.delay_ms.is_none() => errors.push(SchemaError::at(
                &field_path(&tpath, "delay_ms"),
                "timer trigger requires delay_ms",
            )),
            TriggerKind::Key if t.key.as_deref().is_none_or(|k| k.trim().is_empty()) => {
                errors.push(SchemaError::at(
                    &field_path(&tpath, "key"),
                    "key trigger requires a non-empty key",
                ))
            }
            TriggerKind::Controller if t.button.is_none() => errors.push(SchemaError::at(
                &field_path(&tpath, "button"),
                "controller trigger requires button",
            )),
            _ => {}
        }
    }

    if el.kind == ElementKind::VariantGroup
        && !el.children.iter().any(|c| c.kind == ElementKind::Variant)
    {
        errors.push(SchemaError::at(
            &field_path(path, "children"),
            "variant-group must contain at least one variant",
        ));
    }

    for (i, child) in el.children.iter().enumerate() {
        path.push(SchemaPathElem::Field("children"));
        path.push(SchemaPathElem::Index(i));
        validate_element(child, path, ids, errors);
        path.pop();
        path.pop();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schema/validate.rs"]
mod tests;
