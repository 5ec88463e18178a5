use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const DEFAULT_MIN: i64 = 0;
pub const DEFAULT_MAX: i64 = 999999;
pub const DEFAULT_LIST_SEPARATOR: &str = ",";

/// The closed set of field kinds a configuration may declare.
///
/// Unknown kind strings deserialize to `Unsupported` instead of failing the
/// whole document; the form builder skips such fields with a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Number,
    Counter,
    Range,
    Boolean,
    Select,
    MultiSelect,
    Timer,
    Image,
    Unsupported,
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "text" => FieldKind::Text,
            "number" => FieldKind::Number,
            "counter" => FieldKind::Counter,
            "range" => FieldKind::Range,
            "boolean" => FieldKind::Boolean,
            "select" => FieldKind::Select,
            "multi-select" => FieldKind::MultiSelect,
            "timer" => FieldKind::Timer,
            "image" => FieldKind::Image,
            _ => FieldKind::Unsupported,
        })
    }
}

/// What a field reverts to (or doesn't) when the form is reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResetBehavior {
    #[default]
    Reset,
    Preserve,
    Increment,
}

impl<'de> Deserialize<'de> for ResetBehavior {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        // Only the exact strings are special; anything else behaves as reset.
        Ok(match s.as_str() {
            "preserve" => ResetBehavior::Preserve,
            "increment" => ResetBehavior::Increment,
            _ => ResetBehavior::Reset,
        })
    }
}

/// Aggregation applied to a timer's lap history in the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TimerOutput {
    #[default]
    Average,
    Total,
    List,
    Unsupported,
}

impl<'de> Deserialize<'de> for TimerOutput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "average" => TimerOutput::Average,
            "total" => TimerOutput::Total,
            "list" => TimerOutput::List,
            _ => TimerOutput::Unsupported,
        })
    }
}

/// One data-entry unit as declared by the configuration.
///
/// `default_value` is kind-dependent and kept as raw JSON until the widget
/// is built: a string for text, an integer for counter/range, a bool for
/// boolean, a key or key-array for select/multi-select, a source for image.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub title: String,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(default)]
    pub choices: Option<serde_json::Map<String, Value>>,
    #[serde(rename = "formResetBehavior", default)]
    pub reset_behavior: ResetBehavior,
    #[serde(default)]
    pub output_type: TimerOutput,
    #[serde(default)]
    pub list_separator: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub width: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl FieldSpec {
    /// Fills the optional attributes with concrete defaults so widget
    /// construction never special-cases missing values. Pure defaulting.
    pub fn normalize(&mut self) {
        if matches!(self.kind, FieldKind::Counter | FieldKind::Range) {
            let min = *self.min.get_or_insert(DEFAULT_MIN);
            self.max.get_or_insert(DEFAULT_MAX);
            if self.default_value.is_none() {
                self.default_value = Some(Value::from(min));
            }
        }
        if self.kind == FieldKind::Timer && self.list_separator.is_none() {
            self.list_separator = Some(DEFAULT_LIST_SEPARATOR.to_string());
        }
    }

    pub fn min(&self) -> i64 {
        self.min.unwrap_or(DEFAULT_MIN)
    }

    pub fn max(&self) -> i64 {
        self.max.unwrap_or(DEFAULT_MAX)
    }

    pub fn list_separator(&self) -> &str {
        self.list_separator.as_deref().unwrap_or(DEFAULT_LIST_SEPARATOR)
    }

    /// Default for text-shaped widgets, coerced to a display string.
    pub fn default_text(&self) -> String {
        self.default_value.as_ref().map(value_to_string).unwrap_or_default()
    }

    /// Default for counter/range widgets; falls back to `min`.
    pub fn default_int(&self) -> i64 {
        self.default_value
            .as_ref()
            .and_then(value_as_int)
            .unwrap_or_else(|| self.min())
    }

    /// Default checked state for boolean widgets (truthiness of the raw value).
    pub fn default_bool(&self) -> bool {
        self.default_value.as_ref().map(value_truthy).unwrap_or(false)
    }

    /// Default selection keys for select/multi-select widgets.
    pub fn default_keys(&self) -> Vec<String> {
        match self.default_value.as_ref() {
            Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
            Some(v) => vec![value_to_string(v)],
            None => vec![],
        }
    }
}

/// Coerces a raw JSON value to the string a widget would display.
pub fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn value_as_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Null => false,
        _ => true,
    }
}
