//! The full-history persistence backend: keeps every snapshot and
//! round-trips history through JSON using a `node_id`-keyed tagged union
//! (§4.B, §4.C, §6).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::graph::{BaseNode, End, NodeRegistry};
use crate::util::{ids::parse_seq, now_utc, IdAllocator};

use super::{EndSnapshot, NodeSnapshot, PersistenceError, RecordGuard, Snapshot, StatePersistence, Status};

/// Keeps every snapshot appended during a run. Every capture clones its
/// `state` and `node` payloads, matching the faithful-audit policy the
/// source documents as this backend's default: a later mutation of the
/// live state or node can never retroactively alter a recorded snapshot.
pub struct FullStatePersistence<S, D, R> {
    history: Vec<Snapshot<S, D, R>>,
    ids: IdAllocator,
}

impl<S, D, R> FullStatePersistence<S, D, R> {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            ids: IdAllocator::new(),
        }
    }

    /// The full, ordered history recorded so far.
    pub fn history(&self) -> &[Snapshot<S, D, R>] {
        &self.history
    }
}

impl<S, D, R> Default for FullStatePersistence<S, D, R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S, D, R> StatePersistence<S, D, R> for FullStatePersistence<S, D, R>
where
    S: Clone + Send + Sync + 'static,
    D: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    async fn snapshot_node(&mut self, state: &S, next_node: &dyn BaseNode<S, D, R>) -> String {
        let id = self.ids.alloc_node_id(&next_node.id());
        self.history.push(Snapshot::Node(NodeSnapshot {
            id: id.clone(),
            state: state.clone(),
            node: next_node.clone_node(),
            start_ts: None,
            duration: None,
            status: Status::Created,
        }));
        id
    }

    async fn snapshot_end(&mut self, state: &S, end: End<R>) -> String {
        let id = self.ids.alloc_end_id();
        self.history.push(Snapshot::End(EndSnapshot {
            id: id.clone(),
            state: state.clone(),
            result: end,
            ts: now_utc(),
        }));
        id
    }

    fn record_run(&mut self, snapshot_id: &str) -> Result<RecordGuard<'_>, PersistenceError> {
        let snapshot = self
            .history
            .iter_mut()
            .find(|s| s.id() == snapshot_id)
            .ok_or_else(|| PersistenceError::NotFound(snapshot_id.to_string()))?;
        match snapshot {
            Snapshot::Node(n) => Ok(RecordGuard::enter(&mut n.status, &mut n.start_ts, &mut n.duration)),
            Snapshot::End(_) => Err(PersistenceError::WrongKind(snapshot_id.to_string())),
        }
    }

    fn restore(&self) -> Option<&Snapshot<S, D, R>> {
        self.history.last()
    }
}

impl<S, D, R> FullStatePersistence<S, D, R>
where
    S: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    D: Send + Sync + 'static,
    R: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Serializes the full history to JSON (§6). `indent` selects
    /// pretty-printing with that many spaces per level; `None` produces
    /// compact output.
    pub fn dump_json(&self, indent: Option<usize>) -> String {
        let items: Vec<Value> = self
            .history
            .iter()
            .map(|snapshot| match snapshot {
                Snapshot::Node(n) => node_snapshot_to_json(n),
                Snapshot::End(e) => end_snapshot_to_json(e),
            })
            .collect();
        render_json(&Value::Array(items), indent)
    }

    /// Replaces this backend's history by decoding a JSON document
    /// produced by [`FullStatePersistence::dump_json`] (or hand-written
    /// history lacking `id` fields). Missing IDs are assigned continuing
    /// after the maximum `seq` found anywhere in the document, so they
    /// never collide with snapshots appended afterward (§4.F).
    pub fn load_json(&mut self, json: &str, registry: &NodeRegistry<S, D, R>) -> Result<(), PersistenceError> {
        let document: Value = serde_json::from_str(json)?;
        let items = document.as_array().ok_or(PersistenceError::NotAnArray)?;

        for item in items {
            if let Some(seq) = item.get("id").and_then(Value::as_str).and_then(parse_seq) {
                self.ids.bump_past(seq);
            }
        }

        let mut history = Vec::with_capacity(items.len());
        for item in items {
            history.push(self.decode_snapshot(item, registry)?);
        }
        self.history = history;
        Ok(())
    }

    fn decode_snapshot(&mut self, item: &Value, registry: &NodeRegistry<S, D, R>) -> Result<Snapshot<S, D, R>, PersistenceError> {
        let kind = item.get("kind").and_then(Value::as_str).unwrap_or("node");
        match kind {
            "end" => {
                let state = serde_json::from_value(item.get("state").cloned().unwrap_or(Value::Null))?;
                let result = serde_json::from_value(item.get("result").cloned().unwrap_or(Value::Null))?;
                let ts = item
                    .get("ts")
                    .and_then(Value::as_str)
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(now_utc);
                let id = item
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| self.ids.alloc_end_id());
                Ok(Snapshot::End(EndSnapshot { id, state, result, ts }))
            }
            _ => {
                let state = serde_json::from_value(item.get("state").cloned().unwrap_or(Value::Null))?;
                let node_value = item.get("node").cloned().unwrap_or(Value::Null);
                let node_id = node_value
                    .get("node_id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| PersistenceError::UnknownNodeId(String::new()))?
                    .to_string();
                let node = registry
                    .decode(&node_id, node_value)
                    .ok_or_else(|| PersistenceError::UnknownNodeId(node_id.clone()))??;
                let start_ts = item
                    .get("start_ts")
                    .and_then(Value::as_str)
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.with_timezone(&Utc));
                let duration = item.get("duration").and_then(Value::as_f64);
                let status = item
                    .get("status")
                    .and_then(|v| serde_json::from_value::<Status>(v.clone()).ok())
                    .unwrap_or(Status::Created);
                let id = item
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| self.ids.alloc_node_id(&node_id));
                Ok(Snapshot::Node(NodeSnapshot {
                    id,
                    state,
                    node,
                    start_ts,
                    duration,
                    status,
                }))
            }
        }
    }
}

fn node_snapshot_to_json<S, D, R>(snapshot: &NodeSnapshot<S, D, R>) -> Value
where
    S: Serialize,
{
    let mut map = serde_json::Map::new();
    map.insert("kind".to_string(), Value::String("node".to_string()));
    map.insert("state".to_string(), serde_json::to_value(&snapshot.state).unwrap_or(Value::Null));
    map.insert("node".to_string(), snapshot.node.to_json());
    map.insert(
        "start_ts".to_string(),
        snapshot.start_ts.map(|ts| Value::String(ts.to_rfc3339())).unwrap_or(Value::Null),
    );
    map.insert("duration".to_string(), snapshot.duration.map(|d| serde_json::json!(d)).unwrap_or(Value::Null));
    map.insert("status".to_string(), serde_json::to_value(snapshot.status).unwrap_or(Value::Null));
    map.insert("id".to_string(), Value::String(snapshot.id.clone()));
    Value::Object(map)
}

fn end_snapshot_to_json<S, R>(snapshot: &EndSnapshot<S, R>) -> Value
where
    S: Serialize,
    R: Serialize,
{
    let mut map = serde_json::Map::new();
    map.insert("kind".to_string(), Value::String("end".to_string()));
    map.insert("state".to_string(), serde_json::to_value(&snapshot.state).unwrap_or(Value::Null));
    map.insert("result".to_string(), serde_json::to_value(&snapshot.result).unwrap_or(Value::Null));
    map.insert("ts".to_string(), Value::String(snapshot.ts.to_rfc3339()));
    map.insert("id".to_string(), Value::String(snapshot.id.clone()));
    Value::Object(map)
}

fn render_json(value: &Value, indent: Option<usize>) -> String {
    match indent {
        None => serde_json::to_string(value).unwrap_or_default(),
        Some(width) => {
            let spaces = " ".repeat(width);
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(spaces.as_bytes());
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            value.serialize(&mut ser).expect("serde_json::Value serialization cannot fail");
            String::from_utf8(buf).expect("json output is valid utf8")
        }
    }
}
