use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Expected JSON type of a settings entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingType {
    Number,
    Bool,
    String,
    StringArray,
}

impl SettingType {
    pub fn describe(&self) -> &'static str {
        match self {
            SettingType::Number => "a number",
            SettingType::Bool => "a boolean",
            SettingType::String => "a string",
            SettingType::StringArray => "an array of strings",
        }
    }
}

/// Known settings keys and their types, in wire order
pub const SETTINGS_SCHEMA: &[(&str, SettingType)] = &[
    ("gridSize", SettingType::Number),
    ("fixedLeafWidth", SettingType::Number),
    ("fixedLeafHeight", SettingType::Number),
    ("fontFamily", SettingType::String),
    ("fontSize", SettingType::Number),
    ("borderWidth", SettingType::Number),
    ("borderRadius", SettingType::Number),
    ("margin", SettingType::Number),
    ("padding", SettingType::Number),
    ("layoutAlgorithm", SettingType::String),
    ("colorPalette", SettingType::StringArray),
    ("snapToGrid", SettingType::Bool),
    ("showGrid", SettingType::Bool),
];

/// Global diagram configuration
///
/// Keys outside [`SETTINGS_SCHEMA`] are kept in `extra` and written back
/// unchanged, so settings produced by a newer editor survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub grid_size: f64,
    pub fixed_leaf_width: f64,
    pub fixed_leaf_height: f64,
    pub font_family: String,
    pub font_size: f64,
    pub border_width: f64,
    pub border_radius: f64,
    pub margin: f64,
    pub padding: f64,
    pub layout_algorithm: String,
    pub color_palette: Vec<String>,
    pub snap_to_grid: bool,
    pub show_grid: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            fixed_leaf_width: 160.0,
            fixed_leaf_height: 80.0,
            font_family: "Inter".to_string(),
            font_size: 14.0,
            border_width: 1.0,
            border_radius: 4.0,
            margin: 16.0,
            padding: 12.0,
            layout_algorithm: "grid".to_string(),
            color_palette: vec![
                "#4f46e5".to_string(),
                "#0ea5e9".to_string(),
                "#10b981".to_string(),
                "#f59e0b".to_string(),
                "#ef4444".to_string(),
            ],
            snap_to_grid: true,
            show_grid: true,
            extra: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Build settings from an untrusted JSON object
    ///
    /// Entries of the wrong type keep the default value. Anything that is not
    /// an object yields the defaults.
    pub fn from_value_lenient(value: &Value) -> Self {
        let mut settings = Settings::default();
        let Some(map) = value.as_object() else {
            return settings;
        };

        let number = |key: &str, slot: &mut f64| {
            if let Some(v) = map.get(key).and_then(Value::as_f64) {
                *slot = v;
            }
        };
        number("gridSize", &mut settings.grid_size);
        number("fixedLeafWidth", &mut settings.fixed_leaf_width);
        number("fixedLeafHeight", &mut settings.fixed_leaf_height);
        number("fontSize", &mut settings.font_size);
        number("borderWidth", &mut settings.border_width);
        number("borderRadius", &mut settings.border_radius);
        number("margin", &mut settings.margin);
        number("padding", &mut settings.padding);

        if let Some(v) = map.get("fontFamily").and_then(Value::as_str) {
            settings.font_family = v.to_string();
        }
        if let Some(v) = map.get("layoutAlgorithm").and_then(Value::as_str) {
            settings.layout_algorithm = v.to_string();
        }
        if let Some(items) = map.get("colorPalette").and_then(Value::as_array) {
            settings.color_palette = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = map.get("snapToGrid").and_then(Value::as_bool) {
            settings.snap_to_grid = v;
        }
        if let Some(v) = map.get("showGrid").and_then(Value::as_bool) {
            settings.show_grid = v;
        }

        settings.extra = unknown_entries(map);
        settings
    }
}

fn unknown_entries(map: &Map<String, Value>) -> BTreeMap<String, Value> {
    map.iter()
        .filter(|(key, _)| !SETTINGS_SCHEMA.iter().any(|(known, _)| known == key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
