use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

pub type EventPayload = Map<String, Value>;

/// JSONL log of one interactive session.
///
/// Every line carries `type`, `session_id`, a 1-based `seq` in emit order
/// and `ts`; event fields come after and may shadow them. Lines are written
/// whole, so a worker thread and the REPL can share one writer.
#[derive(Debug, Clone)]
pub struct EventWriter {
    shared: Arc<SessionLog>,
}

#[derive(Debug)]
struct SessionLog {
    path: PathBuf,
    session_id: String,
    next_seq: Mutex<u64>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(SessionLog {
                path: path.into(),
                session_id: session_id.into(),
                next_seq: Mutex::new(1),
            }),
        }
    }

    pub fn for_new_session(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Uuid::new_v4().to_string())
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn session_id(&self) -> &str {
        &self.shared.session_id
    }

    pub fn emit(&self, event_type: &str, payload: EventPayload) -> anyhow::Result<Value> {
        let mut next_seq = self
            .shared
            .next_seq
            .lock()
            .map_err(|_| anyhow::anyhow!("session log lock poisoned"))?;

        let mut event = Map::new();
        event.insert("type".to_string(), json!(event_type));
        event.insert("session_id".to_string(), json!(self.shared.session_id));
        event.insert("seq".to_string(), json!(*next_seq));
        event.insert("ts".to_string(), json!(now_utc_iso()));
        event.extend(payload);

        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        if let Some(parent) = self.shared.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.shared.path)?
            .write_all(&line)?;
        *next_seq += 1;

        Ok(Value::Object(event))
    }
}

/// Event log that is off unless the user opts in with a path.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    writer: Option<EventWriter>,
}

impl EventSink {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Some(EventWriter::for_new_session(path)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn writer(&self) -> Option<&EventWriter> {
        self.writer.as_ref()
    }

    pub fn emit(&self, event_type: &str, payload: EventPayload) -> anyhow::Result<Option<Value>> {
        match &self.writer {
            Some(writer) => writer.emit(event_type, payload).map(Some),
            None => Ok(None),
        }
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::DateTime;

    use super::*;

    #[test]
    fn emit_writes_compact_jsonl_line() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let writer = EventWriter::new(&path, "session-123");

        let mut payload = EventPayload::new();
        payload.insert("state".to_string(), Value::String("loading".to_string()));
        let emitted = writer.emit("state_changed", payload)?;

        let content = fs::read_to_string(&path)?;
        let line = content.lines().next().unwrap_or("");
        let parsed: Value = serde_json::from_str(line)?;

        assert_eq!(parsed, emitted);
        assert_eq!(parsed["type"], Value::String("state_changed".to_string()));
        assert_eq!(parsed["session_id"], Value::String("session-123".to_string()));
        assert_eq!(parsed["state"], Value::String("loading".to_string()));

        let ts = parsed["ts"].as_str().unwrap_or("");
        DateTime::parse_from_rfc3339(ts)?;
        Ok(())
    }

    #[test]
    fn payload_can_override_default_keys() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let writer = EventWriter::new(temp.path().join("events.jsonl"), "session-123");

        let mut payload = EventPayload::new();
        payload.insert("type".to_string(), Value::String("override".to_string()));
        let emitted = writer.emit("session_started", payload)?;

        assert_eq!(emitted["type"], Value::String("override".to_string()));
        Ok(())
    }

    #[test]
    fn emit_appends_lines() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("logs").join("events.jsonl");
        let writer = EventWriter::for_new_session(&path);

        writer.emit("one", EventPayload::new())?;
        writer.emit("two", EventPayload::new())?;

        let content = fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0])?;
        let second: Value = serde_json::from_str(lines[1])?;
        assert_eq!(first["type"], Value::String("one".to_string()));
        assert_eq!(second["session_id"], first["session_id"]);
        assert_eq!(first["seq"], json!(1));
        assert_eq!(second["seq"], json!(2));
        assert!(Uuid::parse_str(writer.session_id()).is_ok());
        Ok(())
    }

    #[test]
    fn disabled_sink_writes_nothing() -> anyhow::Result<()> {
        let sink = EventSink::disabled();
        assert!(!sink.is_enabled());
        assert_eq!(sink.emit("state_changed", EventPayload::new())?, None);
        Ok(())
    }
}
