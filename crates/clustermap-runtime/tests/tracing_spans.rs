#![forbid(unsafe_code)]

//! Tracing instrumentation of the draw cycle.
//!
//! The runtime logs through `tracing` unconditionally, so these run without
//! extra features:
//!   cargo test -p clustermap-runtime --test tracing_spans

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clustermap_layout::{Size, TreeNode};
use clustermap_runtime::{DrawSession, FixedTicks, SessionConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
    parent_name: Option<String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    message: String,
    fields: HashMap<String, String>,
    span_name: Option<String>,
}

/// A tracing Layer that records spans and events.
#[derive(Clone, Default)]
struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl Capture {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn event(&self, message: &str) -> Option<CapturedEvent> {
        self.events().into_iter().find(|e| e.message == message)
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        let parent_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span| span.name().to_string());
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
            parent_name,
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.remove("message").unwrap_or_default();
        let span_name = ctx.lookup_current().map(|span| span.name().to_string());
        self.events.lock().unwrap().push(CapturedEvent {
            message,
            fields,
            span_name,
        });
    }
}

fn with_capture(f: impl FnOnce()) -> Capture {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    capture
}

fn tree(ids: &[&str]) -> Option<Arc<TreeNode>> {
    Some(Arc::new(TreeNode::internal(
        "root",
        ids.iter().map(|id| TreeNode::leaf(*id, 1.0)),
    )))
}

fn session() -> DrawSession {
    DrawSession::new(SessionConfig::default().with_canvas(Size::new(100.0, 100.0))).unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn draw_span_wraps_reconcile_and_schedule() {
    let capture = with_capture(|| {
        session().draw(tree(&["a", "b"])).unwrap();
    });
    let spans = capture.spans();

    let draw = spans.iter().find(|s| s.name == "draw").expect("draw span");
    assert_eq!(draw.fields.get("weight_mode").map(String::as_str), Some("proportional"));
    assert_eq!(draw.fields.get("draw").map(String::as_str), Some("0"));

    for child in ["reconcile", "schedule"] {
        let span = spans.iter().find(|s| s.name == child).expect(child);
        assert_eq!(span.parent_name.as_deref(), Some("draw"), "{child}");
    }
    let reconcile = spans.iter().find(|s| s.name == "reconcile").unwrap();
    assert_eq!(reconcile.fields.get("previous").map(String::as_str), Some("0"));
    assert_eq!(reconcile.fields.get("next").map(String::as_str), Some("3"));
}

#[test]
fn reconcile_event_reports_group_sizes() {
    let capture = with_capture(|| {
        let mut s = session();
        s.draw(tree(&["a", "b"])).unwrap();
        s.draw(tree(&["b", "c"])).unwrap();
    });
    let events: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| e.message == "reconcile complete")
        .collect();
    assert_eq!(events.len(), 2);
    let last = &events[1];
    assert_eq!(last.span_name.as_deref(), Some("reconcile"));
    assert_eq!(last.fields["entering"], "1");
    assert_eq!(last.fields["updating"], "2");
    assert_eq!(last.fields["exiting"], "1");
}

#[test]
fn interruption_is_logged() {
    let capture = with_capture(|| {
        let mut s = session();
        s.draw(tree(&["a", "b"])).unwrap();
        s.tick(Duration::from_millis(100)).unwrap();
        s.draw(tree(&["b"])).unwrap();
    });
    let event = capture.event("interrupted transition").expect("interruption event");
    assert_eq!(event.fields["cancelled"], "0");
}

#[test]
fn completion_is_logged_once() {
    let capture = with_capture(|| {
        let mut s = session();
        s.draw(tree(&["a"])).unwrap();
        s.run(&mut FixedTicks::new(Duration::from_millis(100)), |_| {});
    });
    let complete: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| e.message == "transition complete")
        .collect();
    assert_eq!(complete.len(), 1);
    assert!(capture.event("run finished").is_some());
}

#[test]
fn layout_failure_is_warned() {
    let capture = with_capture(|| {
        let mut s = session();
        let bad = Some(Arc::new(TreeNode::internal(
            "root",
            [TreeNode::leaf("a", -3.0)],
        )));
        assert!(s.draw(bad).is_err());
    });
    let event = capture.event("layout failed").expect("warning");
    assert!(event.fields["error"].contains("root/a"));
}
