use crate::field::ResetBehavior;
use crate::widget::{Widget, WidgetState};

/// Change-observation hook. `preserve` fields commit their baseline on
/// every edit, which makes a later structural reset a no-op for them.
pub fn on_value_changed(widget: &mut Widget) {
    if widget.spec.reset_behavior == ResetBehavior::Preserve {
        widget.commit_baseline();
    }
}

/// Applies one field's reset policy during a structural form reset.
/// Returns a diagnostic when an `increment` parse fails; the field is
/// left unchanged in that case.
pub fn apply_reset(widget: &mut Widget) -> Option<String> {
    match widget.spec.reset_behavior {
        ResetBehavior::Preserve => None,
        ResetBehavior::Reset => {
            widget.reset_to_baseline();
            None
        }
        ResetBehavior::Increment => {
            // Timers have no numeric value to advance; only `preserve`
            // exempts them from the reset.
            if matches!(widget.state, WidgetState::Timer(_)) {
                widget.reset_to_baseline();
                return None;
            }
            match widget.increment_value() {
                Ok(_) => None,
                Err(err) => Some(format!("field '{}': {}", widget.spec.code, err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSpec;
    use std::time::{Duration, Instant};

    fn widget(json: &str) -> Widget {
        let mut spec: FieldSpec = serde_json::from_str(json).unwrap();
        spec.normalize();
        Widget::from_spec(&spec).unwrap()
    }

    #[test]
    fn test_reset_policy_reverts_to_build_time_baseline() {
        let mut w = widget(r#"{"code":"n","type":"text","title":"N","defaultValue":"base"}"#);
        let now = Instant::now();

        w.handle_char('!', now);
        on_value_changed(&mut w);

        assert_eq!(apply_reset(&mut w), None);
        assert_eq!(w.encode(now), "base");
    }

    #[test]
    fn test_preserve_policy_survives_structural_reset() {
        let mut w = widget(
            r#"{"code":"n","type":"text","title":"N","defaultValue":"base",
                "formResetBehavior":"preserve"}"#,
        );
        let now = Instant::now();

        w.handle_char('!', now);
        on_value_changed(&mut w);

        assert_eq!(apply_reset(&mut w), None);
        assert_eq!(w.encode(now), "base!");
    }

    #[test]
    fn test_preserve_without_hook_still_skips_reset() {
        // The policy itself never touches the widget; the hook only
        // matters for keeping the baseline in sync.
        let mut w = widget(
            r#"{"code":"n","type":"text","title":"N","formResetBehavior":"preserve"}"#,
        );
        let now = Instant::now();

        w.handle_char('x', now);
        assert_eq!(apply_reset(&mut w), None);
        assert_eq!(w.encode(now), "x");
    }

    #[test]
    fn test_increment_policy_advances_numeric_value() {
        let mut w = widget(
            r#"{"code":"match","type":"number","title":"Match","defaultValue":12,
                "formResetBehavior":"increment"}"#,
        );
        let now = Instant::now();

        assert_eq!(apply_reset(&mut w), None);
        assert_eq!(w.encode(now), "13");

        // A second reset keeps advancing from the committed baseline.
        assert_eq!(apply_reset(&mut w), None);
        assert_eq!(w.encode(now), "14");
    }

    #[test]
    fn test_increment_policy_logs_and_skips_non_numeric() {
        let mut w = widget(
            r#"{"code":"n","type":"text","title":"N","defaultValue":"abc",
                "formResetBehavior":"increment"}"#,
        );
        let now = Instant::now();

        let diag = apply_reset(&mut w);
        assert!(diag.is_some());
        assert!(diag.unwrap().contains("'n'"));
        assert_eq!(w.encode(now), "abc");
    }

    #[test]
    fn test_timer_resets_under_reset_and_increment_policies() {
        for behavior in ["reset", "increment"] {
            let mut w = widget(&format!(
                r#"{{"code":"t","type":"timer","title":"T","outputType":"list",
                    "formResetBehavior":"{behavior}"}}"#,
            ));
            let t0 = Instant::now();

            let timer = w.timer_mut().unwrap();
            timer.start(t0);
            timer.lap(t0 + Duration::from_millis(250));

            assert_eq!(apply_reset(&mut w), None);
            let timer = w.timer().unwrap();
            assert!(timer.laps().is_empty());
            assert!(!timer.is_running());
        }
    }

    #[test]
    fn test_timer_preserve_policy_is_a_no_op() {
        let mut w = widget(
            r#"{"code":"t","type":"timer","title":"T","outputType":"list",
                "formResetBehavior":"preserve"}"#,
        );
        let t0 = Instant::now();

        let timer = w.timer_mut().unwrap();
        timer.start(t0);
        timer.lap(t0 + Duration::from_millis(250));

        assert_eq!(apply_reset(&mut w), None);
        let timer = w.timer().unwrap();
        assert_eq!(timer.laps().len(), 1);
        assert!(timer.is_running());
    }

    #[test]
    fn test_boolean_reset_restores_checked_baseline() {
        let mut w = widget(
            r#"{"code":"b","type":"boolean","title":"B","defaultValue":true}"#,
        );
        let now = Instant::now();

        w.handle_char(' ', now);
        assert_eq!(w.encode(now), "N");

        apply_reset(&mut w);
        assert_eq!(w.encode(now), "Y");
    }
}
