use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{DiagramError, DiagramResult};
use crate::model::{DiagramSnapshot, NodeKind, SettingType, FORMAT_VERSION, SETTINGS_SCHEMA};

use super::invariants;

/// Outcome of validating one snapshot
///
/// Errors make the snapshot unusable; warnings describe cosmetic or settings
/// problems the consumer papers over with defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Offending `formatVersion` value when the format check failed
    #[serde(skip)]
    format_error: Option<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether one of the errors is a missing or foreign `formatVersion`
    pub fn has_format_error(&self) -> bool {
        self.format_error.is_some()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Turn the report into the domain error it implies, keeping warnings
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` when the format check failed, otherwise
    /// `InvalidSnapshot` carrying every error line.
    pub fn into_result(self) -> DiagramResult<Vec<String>> {
        if self.is_ok() {
            return Ok(self.warnings);
        }
        if let Some(found) = self.format_error {
            return Err(DiagramError::UnsupportedFormat {
                found,
                expected: FORMAT_VERSION.to_string(),
            });
        }
        Err(DiagramError::InvalidSnapshot {
            errors: self.errors,
        })
    }
}

fn node_label(index: usize, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("node[{}] (id '{}')", index, id),
        None => format!("node[{}]", index),
    }
}

/// Validate an untrusted snapshot value
///
/// Never fails: every problem becomes an error or warning line. A format
/// mismatch does not stop the remaining checks, so the report shows
/// everything wrong with the input at once.
pub fn validate_value(value: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Some(root) = value.as_object() else {
        report.error("snapshot must be a JSON object");
        return report;
    };

    check_format_version(root, &mut report);

    match root.get("nodes") {
        None => report.error("missing 'nodes' array"),
        Some(Value::Array(nodes)) => check_nodes(nodes, &mut report),
        Some(_) => report.error("'nodes' must be an array"),
    }

    match root.get("settings").or_else(|| root.get("globalSettings")) {
        None => report.warn("missing 'settings'; defaults will be used"),
        Some(Value::Object(settings)) => check_settings(settings, &mut report),
        Some(_) => report.warn("'settings' is not an object; defaults will be used"),
    }

    match root.get("layoutMetadata") {
        None => report.warn("missing 'layoutMetadata'; defaults will be used"),
        Some(Value::Object(meta)) => check_layout_metadata(meta, &mut report),
        Some(_) => report.warn("'layoutMetadata' is not an object; defaults will be used"),
    }

    match root.get("timestamp") {
        None => report.warn("missing 'timestamp'"),
        Some(t) if t.is_number() => {}
        Some(_) => report.warn("'timestamp' is not a number"),
    }

    report
}

/// Validate a typed snapshot by checking its JSON form
///
/// Serialising first means non-finite geometry (written as `null`) is caught
/// by the same rules that guard imports.
pub fn validate_snapshot(snapshot: &DiagramSnapshot) -> ValidationReport {
    match snapshot.to_value() {
        Ok(value) => validate_value(&value),
        Err(err) => ValidationReport {
            errors: vec![format!("snapshot could not be serialised: {}", err)],
            ..ValidationReport::default()
        },
    }
}

fn check_format_version(root: &Map<String, Value>, report: &mut ValidationReport) {
    match root.get("formatVersion") {
        Some(Value::String(v)) if v == FORMAT_VERSION => {}
        Some(other) => {
            let shown = other.as_str().map_or_else(|| other.to_string(), str::to_string);
            report.error(format!(
                "unsupported formatVersion '{}' (expected '{}')",
                shown, FORMAT_VERSION
            ));
            report.format_error = Some(shown);
        }
        None => {
            report.error(format!("missing formatVersion (expected '{}')", FORMAT_VERSION));
            report.format_error = Some(String::new());
        }
    }
}

fn check_nodes(nodes: &[Value], report: &mut ValidationReport) {
    if nodes.is_empty() {
        report.warn("diagram has no nodes");
        return;
    }

    for (index, node) in nodes.iter().enumerate() {
        check_node(index, node, report);
    }

    let entries = invariants::index_nodes(nodes);

    for (id, indices) in invariants::find_duplicate_ids(&entries) {
        let at: Vec<String> = indices.iter().map(usize::to_string).collect();
        report.error(format!(
            "duplicate node id '{}' at indices {}",
            id,
            at.join(", ")
        ));
    }

    for (index, id, parent) in invariants::find_dangling_parents(&entries) {
        report.error(format!(
            "{}: parentId '{}' does not match any node",
            node_label(index, Some(&id)),
            parent
        ));
    }

    for (index, id, parent, kind) in invariants::find_non_container_parents(&entries) {
        report.error(format!(
            "{}: parent '{}' is a {} and cannot contain nodes",
            node_label(index, Some(&id)),
            parent,
            kind
        ));
    }

    for cycle in invariants::find_cycles(&entries) {
        report.error(format!(
            "cycle in parent chain: {}",
            cycle.join(" -> ")
        ));
    }
}

fn check_node(index: usize, node: &Value, report: &mut ValidationReport) {
    let Some(obj) = node.as_object() else {
        report.error(format!("{}: must be an object", node_label(index, None)));
        return;
    };

    let id = match obj.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Some(id.as_str()),
        Some(Value::String(_)) => {
            report.error(format!("{}: id is empty", node_label(index, None)));
            None
        }
        Some(_) => {
            report.error(format!("{}: id must be a string", node_label(index, None)));
            None
        }
        None => {
            report.error(format!("{}: missing id", node_label(index, None)));
            None
        }
    };
    let label = node_label(index, id);

    let kind = match obj.get("kind") {
        Some(Value::String(k)) => match NodeKind::parse(k) {
            Some(kind) => Some(kind),
            None => {
                report.error(format!("{}: unknown kind '{}'", label, k));
                None
            }
        },
        Some(_) => {
            report.error(format!("{}: kind must be a string", label));
            None
        }
        None => {
            report.error(format!("{}: missing kind", label));
            None
        }
    };

    match obj.get("parentId") {
        None | Some(Value::Null) => {
            if kind.is_some_and(|k| k != NodeKind::Root) {
                report.warn(format!("{}: has no parent and sits on the canvas", label));
            }
        }
        Some(Value::String(parent)) => {
            if kind == Some(NodeKind::Root) {
                report.error(format!(
                    "{}: root node cannot have parentId '{}'",
                    label, parent
                ));
            }
            if id == Some(parent.as_str()) {
                // also surfaces as a one-node cycle
                report.error(format!("{}: is its own parent", label));
            }
        }
        Some(_) => report.error(format!("{}: parentId must be a string", label)),
    }

    for field in ["x", "y", "w", "h"] {
        match obj.get(field).and_then(Value::as_f64) {
            Some(v) if v.is_finite() => {
                if (field == "w" || field == "h") && v <= 0.0 {
                    report.error(format!("{}: {} must be positive (got {})", label, field, v));
                }
            }
            _ => report.error(format!("{}: {} must be a finite number", label, field)),
        }
    }

    check_presentation(obj, &label, report);
}

fn check_presentation(obj: &Map<String, Value>, label: &str, report: &mut ValidationReport) {
    for field in ["label", "description", "color", "fontWeight"] {
        if let Some(v) = obj.get(field) {
            if !v.is_string() && !v.is_null() {
                report.warn(format!("{}: {} should be a string", label, field));
            }
        }
    }
    if let Some(v) = obj.get("fontSize") {
        if !v.is_number() && !v.is_null() {
            report.warn(format!("{}: fontSize should be a number", label));
        }
    }
    for field in ["locked", "sizeLocked"] {
        if let Some(v) = obj.get(field) {
            if !v.is_boolean() {
                report.warn(format!("{}: {} should be a boolean", label, field));
            }
        }
    }
}

fn check_settings(settings: &Map<String, Value>, report: &mut ValidationReport) {
    for (key, expected) in SETTINGS_SCHEMA {
        let Some(value) = settings.get(*key) else {
            continue;
        };
        let matches = match expected {
            SettingType::Number => value.as_f64().is_some_and(f64::is_finite),
            SettingType::Bool => value.is_boolean(),
            SettingType::String => value.is_string(),
            SettingType::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        };
        if !matches {
            report.warn(format!(
                "settings.{} should be {}; default will be used",
                key,
                expected.describe()
            ));
        }
    }
}

fn check_layout_metadata(meta: &Map<String, Value>, report: &mut ValidationReport) {
    if let Some(v) = meta.get("algorithm") {
        if !v.is_string() {
            report.warn("layoutMetadata.algorithm should be a string");
        }
    }
    for field in ["isUserArranged", "preservePositions"] {
        if let Some(v) = meta.get(field) {
            if !v.is_boolean() {
                report.warn(format!("layoutMetadata.{} should be a boolean", field));
            }
        }
    }
    if let Some(bbox) = meta.get("boundingBox") {
        let finite = |k: &str| bbox.get(k).and_then(Value::as_f64).is_some_and(f64::is_finite);
        if !finite("w") || !finite("h") {
            report.warn("layoutMetadata.boundingBox should hold finite w and h");
        }
    }
}
