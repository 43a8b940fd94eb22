// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON Lines exporter.
//!
//! [`export`] writes one JSON object per recorded event, in order. Every
//! object carries `"ts"` (microseconds) and `"kind"`; the remaining fields
//! depend on the kind.

use std::io::{self, Write};

use serde_json::{Value, json};

use relayout_core::engine::Lifecycle;
use relayout_core::trace::ThrottleDecision;

use crate::pretty::{decision_name, lifecycle_name, registration_name, trigger_name};
use crate::recorder::RecordedEvent;

/// Converts one recorded event to a JSON object.
#[must_use]
pub fn to_value(event: &RecordedEvent) -> Value {
    match event {
        RecordedEvent::Lifecycle(e) => json!({
            "ts": e.timestamp.ticks(),
            "kind": "lifecycle",
            "from": lifecycle_name(e.from),
            "to": lifecycle_name(e.to),
            "ready_listener": matches!(e.to, Lifecycle::Observing { ready_listener: true }),
        }),
        RecordedEvent::Registration(e) => json!({
            "ts": e.timestamp.ticks(),
            "kind": "registration",
            "outcome": registration_name(e.kind),
            "handler_count": e.handler_count,
        }),
        RecordedEvent::Dispatch(e) => json!({
            "ts": e.timestamp.ticks(),
            "kind": "dispatch",
            "trigger": trigger_name(e.trigger),
            "handler_count": e.handler_count,
        }),
        RecordedEvent::Throttle(e) => {
            let mut value = json!({
                "ts": e.timestamp.ticks(),
                "kind": "throttle",
                "decision": decision_name(e.decision),
            });
            if let ThrottleDecision::Scheduled(delay) = e.decision {
                value["delay_us"] = json!(delay.ticks());
            }
            value
        }
    }
}

/// Writes `events` as JSON Lines.
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    for event in events {
        serde_json::to_writer(&mut *writer, &to_value(event))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayout_core::host::Trigger;
    use relayout_core::time::{Duration, HostTime};
    use relayout_core::trace::{DispatchEvent, ThrottleEvent};

    #[test]
    fn exports_one_line_per_event() {
        let events = [
            RecordedEvent::Dispatch(DispatchEvent {
                timestamp: HostTime(10),
                trigger: Trigger::Mutation,
                handler_count: 2,
            }),
            RecordedEvent::Throttle(ThrottleEvent {
                timestamp: HostTime(20),
                decision: ThrottleDecision::Scheduled(Duration(90)),
            }),
        ];
        let mut out = Vec::new();
        export(&events, &mut out).expect("write to Vec");
        let text = String::from_utf8(out).expect("utf-8");
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).expect("valid json"))
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "dispatch");
        assert_eq!(lines[0]["trigger"], "mutation");
        assert_eq!(lines[0]["handler_count"], 2);
        assert_eq!(lines[1]["decision"], "scheduled");
        assert_eq!(lines[1]["delay_us"], 90);
        assert_eq!(lines[1]["ts"], 20);
    }

    #[test]
    fn empty_recording_writes_nothing() {
        let mut out = Vec::new();
        export(&[], &mut out).expect("write to Vec");
        assert!(out.is_empty());
    }
}
