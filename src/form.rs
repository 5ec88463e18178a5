use std::time::Instant;

use itertools::Itertools;

use crate::config::GameConfig;
use crate::reset;
use crate::widget::Widget;

/// One titled run of widgets, in declaration order.
#[derive(Debug)]
pub struct FormSection {
    pub name: String,
    pub widgets: Vec<Widget>,
}

/// A live form built from one configuration snapshot.
///
/// Widget count and order are fixed at build time, so repeated assembly
/// against unchanged state is byte-identical except for running timers.
#[derive(Debug)]
pub struct Form {
    pub title: String,
    pub page_title: String,
    pub delimiter: String,
    pub sections: Vec<FormSection>,
    /// Build-time diagnostics (skipped fields), surfaced in the UI.
    pub warnings: Vec<String>,
}

impl Form {
    pub fn build(config: &GameConfig) -> Self {
        let mut warnings = vec![];

        let sections = config
            .sections
            .iter()
            .map(|section| {
                let widgets = section
                    .fields
                    .iter()
                    .filter_map(|field| match Widget::from_spec(field) {
                        Some(widget) => Some(widget),
                        None => {
                            warnings.push(format!(
                                "unsupported field type for '{}': skipped",
                                field.title
                            ));
                            None
                        }
                    })
                    .collect();
                FormSection {
                    name: section.name.clone(),
                    widgets,
                }
            })
            .collect();

        Self {
            title: config.title().to_string(),
            page_title: config.page_title().to_string(),
            delimiter: config.delimiter().to_string(),
            sections,
            warnings,
        }
    }

    pub fn widgets(&self) -> impl Iterator<Item = &Widget> {
        self.sections.iter().flat_map(|s| s.widgets.iter())
    }

    pub fn widgets_mut(&mut self) -> impl Iterator<Item = &mut Widget> {
        self.sections.iter_mut().flat_map(|s| s.widgets.iter_mut())
    }

    pub fn widget_count(&self) -> usize {
        self.sections.iter().map(|s| s.widgets.len()).sum()
    }

    /// The widget at `index` in flat declaration order.
    pub fn widget_at_mut(&mut self, index: usize) -> Option<&mut Widget> {
        self.widgets_mut().nth(index)
    }

    pub fn widget_by_code_mut(&mut self, code: &str) -> Option<&mut Widget> {
        self.widgets_mut().find(|w| w.spec.code == code)
    }

    pub fn any_timer_running(&self) -> bool {
        self.widgets()
            .filter_map(|w| w.timer())
            .any(|t| t.is_running())
    }

    /// Assembles the payload: every widget's encoded value in declaration
    /// order, joined by the delimiter. No trailing delimiter, no escaping
    /// of delimiter characters inside values.
    pub fn assemble(&self, now: Instant) -> String {
        self.widgets().map(|w| w.encode(now)).join(&self.delimiter)
    }

    /// Structural form reset: applies every field's reset policy and
    /// returns the diagnostics of fields that refused (parse failures).
    pub fn reset(&mut self) -> Vec<String> {
        self.widgets_mut().filter_map(reset::apply_reset).collect()
    }
}
