//! Diagnostic log lines emitted by guard evaluation

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use warden_guards::builtin::{PERSISTED, USER_IS_LOGGED_IN};
use warden_guards::prelude::*;

const PERSISTED_REASON: &str = "Cannot call this method before its target has been persisted.";

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture(run: impl FnOnce()) -> Vec<String> {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_max_level(tracing::Level::DEBUG)
        .without_time()
        .finish();
    tracing::subscriber::with_default(subscriber, run);
    captured.lines()
}

/// `name=value`, with or without quotes around the value.
fn has_field(line: &str, name: &str, value: &str) -> bool {
    line.contains(&format!("{name}={value}")) || line.contains(&format!("{name}=\"{value}\""))
}

struct Document {
    saved: bool,
}

impl Subject for Document {
    fn type_name(&self) -> Option<&str> {
        Some("Document")
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

struct Host;

impl HostEnvironment for Host {
    fn user_id(&self) -> Option<String> {
        Some("ada".to_string())
    }

    fn is_server(&self) -> bool {
        true
    }

    fn user_exists(&self, _user_id: &str) -> bool {
        true
    }

    fn is_persisted(&self, subject: &dyn Subject) -> bool {
        subject
            .as_any()
            .downcast_ref::<Document>()
            .is_some_and(|doc| doc.saved)
    }
}

fn rename(warden: &Warden) -> GuardedOperation<Document, (), String> {
    warden.install_builtins(Arc::new(Host)).unwrap();
    warden
        .guard("rename", |_: &Document, _: &[Value]| Ok::<_, String>(()))
        .attach(USER_IS_LOGGED_IN, vec![])
        .unwrap()
        .attach(PERSISTED, vec![])
        .unwrap()
}

#[test]
fn failure_is_a_warning_tagged_with_subject_and_method() {
    let warden = Warden::default();
    let op = rename(&warden);
    let lines = capture(|| {
        assert!(op.invoke(&Document { saved: false }, &[json!("x")]).is_err());
    });

    let expected = format!("✘ Document#rename : failed guard 'persisted' ( {PERSISTED_REASON} )");
    let line = lines
        .iter()
        .find(|line| line.contains(&expected))
        .unwrap_or_else(|| panic!("no failure line in {lines:#?}"));
    assert!(line.contains("WARN"));
    assert!(has_field(line, "guard", "persisted"));
    assert!(has_field(line, "subject", "Document"));
    assert!(has_field(line, "method", "rename"));
}

#[test]
fn pass_is_logged_at_debug() {
    let warden = Warden::default();
    let op = rename(&warden);
    let lines = capture(|| {
        assert!(op.invoke(&Document { saved: true }, &[]).is_ok());
    });

    let line = lines
        .iter()
        .find(|line| {
            line.contains("✔ Document#rename : passed guard 'userIsLoggedIn' ( Must be logged in. )")
        })
        .unwrap_or_else(|| panic!("no pass line in {lines:#?}"));
    assert!(line.contains("DEBUG"));
    assert!(has_field(line, "method", "rename"));
    assert!(!lines.iter().any(|line| line.contains("WARN")));
}

#[test]
fn disabled_pass_logging_keeps_failures() {
    let warden = Warden::new(EngineConfig {
        log_passes: false,
        ..EngineConfig::default()
    });
    let op = rename(&warden);
    let lines = capture(|| {
        assert!(op.invoke(&Document { saved: false }, &[]).is_err());
    });
    assert!(!lines.iter().any(|line| line.contains("passed guard")));
    assert!(lines.iter().any(|line| line.contains("failed guard 'persisted'")));
}

#[test]
fn locking_silences_passes_of_guards_bound_earlier() {
    let warden = Warden::default();
    let op = rename(&warden);
    warden.lock();
    let lines = capture(|| {
        assert!(op.invoke(&Document { saved: true }, &[]).is_ok());
        assert!(op.invoke(&Document { saved: false }, &[]).is_err());
    });
    assert!(!lines.iter().any(|line| line.contains("passed guard")));
    assert!(lines.iter().any(|line| line.contains("failed guard 'persisted'")));
}
