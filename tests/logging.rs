//! Log levels emitted while querying.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use jebixml::xpath::{evaluate, nodes_for_xpath};
use jebixml::Document;
use tracing::Level;
use tracing_subscriber::prelude::*;

struct LevelRecorder(Arc<Mutex<Vec<Level>>>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LevelRecorder {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        self.0.lock().unwrap().push(*event.metadata().level());
    }
}

#[test]
fn test_queries_log_at_trace_only() {
    let doc = Document::parse_str("<r><a/><a/></r>").unwrap();
    let levels = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(LevelRecorder(levels.clone()));

    tracing::subscriber::with_default(subscriber, || {
        assert_eq!(nodes_for_xpath(&doc, doc.root(), "//a").unwrap().len(), 2);
        evaluate(&doc, doc.root(), "count(//a)").unwrap();
    });

    let levels = levels.lock().unwrap();
    assert!(!levels.is_empty());
    assert!(levels.iter().all(|&level| level == Level::TRACE), "{levels:?}");
}
