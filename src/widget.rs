use std::time::Instant;

use itertools::Itertools;

use crate::field::{value_to_string, FieldKind, FieldSpec};
use crate::timer::LapTimer;

/// One option of a select/multi-select widget, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub key: String,
    pub label: String,
}

/// Per-kind runtime state. Each variant carries only what its kind needs;
/// `baseline` is the value a structural reset reverts to.
#[derive(Debug, Clone)]
pub enum WidgetState {
    Text {
        value: String,
        baseline: String,
    },
    Number {
        value: String,
        baseline: String,
    },
    Counter {
        value: i64,
        baseline: i64,
        min: i64,
        max: i64,
    },
    Range {
        value: i64,
        baseline: i64,
        min: i64,
        max: i64,
    },
    Boolean {
        checked: bool,
        baseline: bool,
    },
    Select {
        choices: Vec<Choice>,
        selected: Option<usize>,
        baseline: Option<usize>,
    },
    MultiSelect {
        choices: Vec<Choice>,
        selected: Vec<bool>,
        baseline: Vec<bool>,
        cursor: usize,
    },
    Image {
        source: String,
        value: Option<String>,
    },
    Timer(LapTimer),
}

/// A live form element bound to one normalized [`FieldSpec`].
#[derive(Debug, Clone)]
pub struct Widget {
    pub spec: FieldSpec,
    pub state: WidgetState,
}

impl Widget {
    /// Builds the runtime state for a spec. Returns `None` for unsupported
    /// kinds so the form builder can skip the field and keep going.
    pub fn from_spec(spec: &FieldSpec) -> Option<Self> {
        let state = match spec.kind {
            FieldKind::Text => WidgetState::Text {
                value: spec.default_text(),
                baseline: spec.default_text(),
            },
            FieldKind::Number => WidgetState::Number {
                value: spec.default_text(),
                baseline: spec.default_text(),
            },
            FieldKind::Counter => WidgetState::Counter {
                value: spec.default_int(),
                baseline: spec.default_int(),
                min: spec.min(),
                max: spec.max(),
            },
            FieldKind::Range => WidgetState::Range {
                value: spec.default_int(),
                baseline: spec.default_int(),
                min: spec.min(),
                max: spec.max(),
            },
            FieldKind::Boolean => WidgetState::Boolean {
                checked: spec.default_bool(),
                baseline: spec.default_bool(),
            },
            FieldKind::Select => {
                let choices = spec_choices(spec);
                let keys = spec.default_keys();
                let selected = choices.iter().position(|c| keys.contains(&c.key));
                WidgetState::Select {
                    choices,
                    selected,
                    baseline: selected,
                }
            }
            FieldKind::MultiSelect => {
                let choices = spec_choices(spec);
                let keys = spec.default_keys();
                let selected: Vec<bool> =
                    choices.iter().map(|c| keys.contains(&c.key)).collect();
                WidgetState::MultiSelect {
                    choices,
                    baseline: selected.clone(),
                    selected,
                    cursor: 0,
                }
            }
            FieldKind::Timer => WidgetState::Timer(LapTimer::new(
                spec.output_type,
                spec.list_separator(),
            )),
            FieldKind::Image => WidgetState::Image {
                source: spec
                    .default_value
                    .as_ref()
                    .map(value_to_string)
                    .unwrap_or_else(|| "none".to_string()),
                value: spec.value.clone(),
            },
            FieldKind::Unsupported => return None,
        };

        Some(Self {
            spec: spec.clone(),
            state,
        })
    }

    /// The widget's contribution to the assembled payload.
    pub fn encode(&self, now: Instant) -> String {
        match &self.state {
            WidgetState::Text { value, .. } | WidgetState::Number { value, .. } => value.clone(),
            WidgetState::Counter { value, .. } | WidgetState::Range { value, .. } => {
                value.to_string()
            }
            WidgetState::Boolean { checked, .. } => {
                (if *checked { "Y" } else { "N" }).to_string()
            }
            WidgetState::Select { choices, selected, .. } => selected
                .map(|i| choices[i].key.clone())
                .unwrap_or_default(),
            WidgetState::MultiSelect {
                choices, selected, ..
            } => choices
                .iter()
                .zip(selected)
                .filter(|(_, picked)| **picked)
                .map(|(c, _)| c.key.as_str())
                .join(","),
            WidgetState::Image { source, value } => {
                value.clone().unwrap_or_else(|| source.clone())
            }
            WidgetState::Timer(timer) => timer.output(now),
        }
    }

    /// Makes the current value the one a structural reset reverts to.
    pub fn commit_baseline(&mut self) {
        match &mut self.state {
            WidgetState::Text { value, baseline }
            | WidgetState::Number { value, baseline } => *baseline = value.clone(),
            WidgetState::Counter { value, baseline, .. }
            | WidgetState::Range { value, baseline, .. } => *baseline = *value,
            WidgetState::Boolean { checked, baseline } => *baseline = *checked,
            WidgetState::Select {
                selected, baseline, ..
            } => *baseline = *selected,
            WidgetState::MultiSelect {
                selected, baseline, ..
            } => *baseline = selected.clone(),
            WidgetState::Image { .. } | WidgetState::Timer(_) => {}
        }
    }

    /// Reverts to the baseline; for timers this is a full timer reset.
    pub fn reset_to_baseline(&mut self) {
        match &mut self.state {
            WidgetState::Text { value, baseline }
            | WidgetState::Number { value, baseline } => *value = baseline.clone(),
            WidgetState::Counter { value, baseline, .. }
            | WidgetState::Range { value, baseline, .. } => *value = *baseline,
            WidgetState::Boolean { checked, baseline } => *checked = *baseline,
            WidgetState::Select {
                selected, baseline, ..
            } => *selected = *baseline,
            WidgetState::MultiSelect {
                selected, baseline, ..
            } => *selected = baseline.clone(),
            WidgetState::Image { .. } => {}
            WidgetState::Timer(timer) => timer.reset(),
        }
    }

    /// Parses the current value as an integer, adds one, and installs the
    /// result as both value and baseline. Errs on non-numeric values and
    /// kinds with no numeric interpretation; the caller records the
    /// diagnostic and leaves the field as-is.
    pub fn increment_value(&mut self) -> Result<i64, String> {
        match &mut self.state {
            WidgetState::Text { value, baseline }
            | WidgetState::Number { value, baseline } => {
                let parsed: i64 = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("cannot increment non-numeric value '{value}'"))?;
                let next = parsed + 1;
                *value = next.to_string();
                *baseline = value.clone();
                Ok(next)
            }
            WidgetState::Counter { value, baseline, .. }
            | WidgetState::Range { value, baseline, .. } => {
                *value += 1;
                *baseline = *value;
                Ok(*value)
            }
            _ => Err(format!(
                "cannot increment a {} field",
                self.spec.kind
            )),
        }
    }

    /// Character input routed to the focused widget. Returns whether the
    /// encodable value changed. Timer events never report a change: the
    /// timer is not baseline-managed.
    pub fn handle_char(&mut self, c: char, now: Instant) -> bool {
        match &mut self.state {
            WidgetState::Text { value, .. } => {
                if c.is_control() {
                    return false;
                }
                value.push(c);
                true
            }
            WidgetState::Number { value, .. } => {
                if c.is_ascii_digit() || (c == '-' && value.is_empty()) {
                    value.push(c);
                    true
                } else {
                    false
                }
            }
            WidgetState::Counter {
                value, min, max, ..
            }
            | WidgetState::Range {
                value, min, max, ..
            } => match c {
                '+' | '=' => step_clamped(value, 1, *min, *max),
                '-' => step_clamped(value, -1, *min, *max),
                _ => false,
            },
            WidgetState::Boolean { checked, .. } => {
                if c == ' ' {
                    *checked = !*checked;
                    true
                } else {
                    false
                }
            }
            WidgetState::MultiSelect {
                choices,
                selected,
                cursor,
                ..
            } => {
                if c == ' ' && !choices.is_empty() {
                    selected[*cursor] = !selected[*cursor];
                    true
                } else {
                    false
                }
            }
            WidgetState::Select { .. } | WidgetState::Image { .. } => false,
            WidgetState::Timer(timer) => {
                match c {
                    ' ' | 's' => timer.toggle(now),
                    'l' => timer.lap(now),
                    'r' => timer.reset(),
                    _ => {}
                }
                false
            }
        }
    }

    pub fn pop_char(&mut self) -> bool {
        match &mut self.state {
            WidgetState::Text { value, .. } | WidgetState::Number { value, .. } => {
                value.pop().is_some()
            }
            _ => false,
        }
    }

    /// Left arrow: decrement, previous selection, or move the choice cursor.
    pub fn left(&mut self) -> bool {
        match &mut self.state {
            WidgetState::Counter {
                value, min, max, ..
            }
            | WidgetState::Range {
                value, min, max, ..
            } => step_clamped(value, -1, *min, *max),
            WidgetState::Select {
                choices, selected, ..
            } => {
                if choices.is_empty() {
                    return false;
                }
                // Cycles through the empty selection, like the blank
                // leading option of the original dropdown.
                *selected = match *selected {
                    None => Some(choices.len() - 1),
                    Some(0) => None,
                    Some(i) => Some(i - 1),
                };
                true
            }
            WidgetState::MultiSelect { cursor, .. } => {
                *cursor = cursor.saturating_sub(1);
                false
            }
            _ => false,
        }
    }

    /// Right arrow: increment, next selection, or move the choice cursor.
    pub fn right(&mut self) -> bool {
        match &mut self.state {
            WidgetState::Counter {
                value, min, max, ..
            }
            | WidgetState::Range {
                value, min, max, ..
            } => step_clamped(value, 1, *min, *max),
            WidgetState::Select {
                choices, selected, ..
            } => {
                if choices.is_empty() {
                    return false;
                }
                *selected = match *selected {
                    None => Some(0),
                    Some(i) if i + 1 < choices.len() => Some(i + 1),
                    Some(_) => None,
                };
                true
            }
            WidgetState::MultiSelect {
                choices, cursor, ..
            } => {
                if *cursor + 1 < choices.len() {
                    *cursor += 1;
                }
                false
            }
            _ => false,
        }
    }

    /// Enter on a timer commits a lap; inert for other kinds.
    pub fn activate(&mut self, now: Instant) -> bool {
        if let WidgetState::Timer(timer) = &mut self.state {
            timer.lap(now);
        }
        false
    }

    pub fn timer(&self) -> Option<&LapTimer> {
        match &self.state {
            WidgetState::Timer(timer) => Some(timer),
            _ => None,
        }
    }

    pub fn timer_mut(&mut self) -> Option<&mut LapTimer> {
        match &mut self.state {
            WidgetState::Timer(timer) => Some(timer),
            _ => None,
        }
    }
}

fn spec_choices(spec: &FieldSpec) -> Vec<Choice> {
    spec.choices
        .as_ref()
        .map(|choices| {
            choices
                .iter()
                .map(|(key, label)| Choice {
                    key: key.clone(),
                    label: value_to_string(label),
                })
                .collect()
        })
        .unwrap_or_default()
}

// Clamps per direction so a misconfigured min > max cannot panic.
fn step_clamped(value: &mut i64, delta: i64, min: i64, max: i64) -> bool {
    let next = if delta > 0 {
        (*value + delta).min(max)
    } else {
        (*value + delta).max(min)
    };
    let changed = next != *value;
    *value = next;
    changed
}
