use serde_json::{Map, Value};

/// A single ingested record: an opaque JSON object.
///
/// The pipeline never inspects record contents. Records are treated as
/// immutable values owned by whichever component currently holds them
/// (queue, worker batch, or sink during a write).
pub type Record = Map<String, Value>;
