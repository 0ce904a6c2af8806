use serde_json::{Map, Value};

/// Flatten the backend's envelope conventions: the real record may sit one or
/// more levels down under `data`, and once more under `content`. Sibling keys
/// at the outer level are kept unless the inner record redefines them, in
/// which case the inner value wins. Arrays are never unwrapped; an
/// array-valued `data`/`content` terminates unwrapping at that level.
///
/// Best-effort: non-object input (including arrays and null) comes back
/// unchanged, and the whole operation is idempotent.
pub fn unwrap_data(payload: Value) -> Value {
    let mut current = match payload {
        Value::Object(map) => map,
        other => return other,
    };

    while matches!(current.get("data"), Some(Value::Object(_))) {
        if let Some(Value::Object(inner)) = current.remove("data") {
            merge_into(&mut current, inner);
        }
    }

    // `content` is unwrapped a single level, not repeatedly.
    if matches!(current.get("content"), Some(Value::Object(_))) {
        if let Some(Value::Object(inner)) = current.remove("content") {
            merge_into(&mut current, inner);
        }
    }

    Value::Object(current)
}

fn merge_into(outer: &mut Map<String, Value>, inner: Map<String, Value>) {
    for (key, value) in inner {
        outer.insert(key, value);
    }
}
