use serde_json::{Map, Value};

/// Flattens nested relation objects into single-level keys using an
/// underscore-joined key path (`centre_nom`). Arrays are kept as one column
/// holding their JSON text rather than being expanded into multiple columns.
pub fn flatten_row(row: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    if let Value::Object(obj) = row {
        flatten_into(obj, "", &mut out);
    }
    out
}

fn flatten_into(obj: &Map<String, Value>, prefix: &str, out: &mut Vec<(String, Value)>) {
    for (key, value) in obj {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}_{}", prefix, key)
        };
        match value {
            Value::Object(nested) => flatten_into(nested, &path, out),
            Value::Array(_) => {
                out.push((path, Value::String(value.to_string())));
            }
            other => out.push((path, other.clone())),
        }
    }
}

/// Object form of a flattened row, for formats that ship JSON to the caller.
pub fn flatten_row_object(row: &Value) -> Map<String, Value> {
    flatten_row(row).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_join_with_underscore() {
        let row = json!({
            "nom": "Kabongo",
            "centre": { "nom": "CRGM", "province": { "nom": "Kinshasa" } }
        });
        let flat = flatten_row(&row);
        let keys: Vec<&str> = flat.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"nom"));
        assert!(keys.contains(&"centre_nom"));
        assert!(keys.contains(&"centre_province_nom"));
    }

    #[test]
    fn arrays_become_json_string_literals() {
        let row = json!({
            "titre": "Etude",
            "auteurs": [{ "nom": "Kabongo" }, { "nom": "Mbuyi" }]
        });
        let flat = flatten_row_object(&row);
        let auteurs = flat.get("auteurs").unwrap();
        let text = auteurs.as_str().expect("array should be a string literal");
        // round-trips through a JSON parser
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[test]
    fn null_relation_stays_a_scalar() {
        let row = json!({ "nom": "CRGM", "directeur": null });
        let flat = flatten_row_object(&row);
        assert_eq!(flat.get("directeur"), Some(&Value::Null));
    }
}
