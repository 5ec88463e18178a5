use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use qscout::config::GameConfig;
use qscout::form::Form;
use qscout::runtime::{FixedTicker, FormEvent, Runner, TestEventSource};

fn build_form(json: &str) -> Form {
    let mut cfg: GameConfig = serde_json::from_str(json).unwrap();
    cfg.normalize();
    Form::build(&cfg)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// End-to-end: boolean + select + total-output timer, comma delimiter.
#[test]
fn headless_payload_with_timer_total() {
    let mut form = build_form(
        r#"{
            "delimiter": ",",
            "sections": [{"name": "Match", "fields": [
                {"code": "scored", "type": "boolean", "title": "Scored?",
                 "defaultValue": true},
                {"code": "zone", "type": "select", "title": "Zone",
                 "choices": {"A": "Alpha", "B": "Beta"}, "defaultValue": "B"},
                {"code": "cycle", "type": "timer", "title": "Cycle",
                 "outputType": "total"}
            ]}]
        }"#,
    );
    let t0 = Instant::now();

    let timer = form.widget_by_code_mut("cycle").unwrap().timer_mut().unwrap();
    timer.start(t0);
    timer.lap(t0 + ms(1200));
    timer.lap(t0 + ms(2000));

    // 500ms into the third (uncommitted) lap.
    assert_eq!(form.assemble(t0 + ms(2500)), "Y,B,2.500");
}

// End-to-end: list output with a custom separator.
#[test]
fn headless_payload_with_timer_list() {
    let mut form = build_form(
        r#"{"sections": [{"name": "S", "fields": [
            {"code": "laps", "type": "timer", "title": "Laps",
             "outputType": "list", "listSeparator": ";"}
        ]}]}"#,
    );
    let t0 = Instant::now();

    let timer = form.widget_by_code_mut("laps").unwrap().timer_mut().unwrap();
    timer.start(t0);
    timer.lap(t0 + ms(333));
    timer.lap(t0 + ms(1333));

    assert_eq!(form.assemble(t0 + ms(1400)), "0.333;1.000");
}

// End-to-end: multi-select encodes declaration order, not click order.
#[test]
fn headless_multi_select_declaration_order() {
    let mut form = build_form(
        r#"{"sections": [{"name": "S", "fields": [
            {"code": "paths", "type": "multi-select", "title": "Paths",
             "choices": {"X": "Ex", "Y": "Why", "Z": "Zed"}}
        ]}]}"#,
    );
    let now = Instant::now();

    let widget = form.widget_by_code_mut("paths").unwrap();
    // Pick Z first, then X.
    widget.right();
    widget.right();
    widget.handle_char(' ', now);
    widget.left();
    widget.left();
    widget.handle_char(' ', now);

    assert_eq!(form.assemble(now), "X,Z");
}

// Drives form edits through the runner the way the app loop does,
// without a TTY.
#[test]
fn headless_runner_event_flow() {
    let mut form = build_form(
        r#"{"delimiter": "|", "sections": [{"name": "S", "fields": [
            {"code": "ok", "type": "boolean", "title": "Ok?"},
            {"code": "count", "type": "counter", "title": "Count", "max": 5}
        ]}]}"#,
    );

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(5)));

    tx.send(FormEvent::Key(KeyEvent::new(
        KeyCode::Char(' '),
        KeyModifiers::NONE,
    )))
    .unwrap();
    tx.send(FormEvent::Key(KeyEvent::new(
        KeyCode::Right,
        KeyModifiers::NONE,
    )))
    .unwrap();
    tx.send(FormEvent::Resize).unwrap();

    let now = Instant::now();
    let mut focus = 0usize;
    for _ in 0..20u32 {
        match runner.step() {
            FormEvent::Tick => break, // queue drained
            FormEvent::Resize => {}
            FormEvent::Key(key) => {
                let widget = form.widget_at_mut(focus).unwrap();
                match key.code {
                    KeyCode::Char(c) => {
                        widget.handle_char(c, now);
                        focus += 1; // move on after the toggle
                    }
                    KeyCode::Right => {
                        widget.right();
                    }
                    _ => {}
                }
            }
        }
    }

    assert_eq!(form.assemble(now), "Y|1");
}

// Ticks never mutate timer state; only events do.
#[test]
fn headless_ticks_do_not_advance_stopped_timer() {
    let mut form = build_form(
        r#"{"sections": [{"name": "S", "fields": [
            {"code": "t", "type": "timer", "title": "T", "outputType": "total"}
        ]}]}"#,
    );
    let t0 = Instant::now();

    let timer = form.widget_by_code_mut("t").unwrap().timer_mut().unwrap();
    timer.start(t0);
    timer.lap(t0 + ms(100));
    timer.stop(t0 + ms(150));

    let (_tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(1)));

    for _ in 0..10u32 {
        if let FormEvent::Tick = runner.step() {
            // The app would only redraw here.
        }
    }

    // 100ms committed + 50ms retained, long after the ticks.
    assert_eq!(form.assemble(t0 + ms(60000)), "0.150");
}
