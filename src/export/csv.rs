use serde_json::Value;

/// Renders flattened rows as CSV. The header row comes from the first row's
/// keys; null values become empty fields; fields containing a comma, a quote
/// or a newline are quoted with embedded quotes doubled.
pub fn to_csv(rows: &[Vec<(String, Value)>]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let headers: Vec<&str> = first.iter().map(|(k, _)| k.as_str()).collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| escape_field(h))
            .collect::<Vec<_>>()
            .join(","),
    );

    for row in rows {
        let line = headers
            .iter()
            .map(|header| {
                let value = row
                    .iter()
                    .find(|(k, _)| k == header)
                    .map(|(_, v)| v)
                    .unwrap_or(&Value::Null);
                render_field(value)
            })
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }

    lines.join("\n")
}

fn render_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape_field(s),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => escape_field(&other.to_string()),
    }
}

fn escape_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn header_comes_from_first_row() {
        let rows = vec![row(&[("nom", json!("CRGM")), ("ville", json!("Goma"))])];
        let csv = to_csv(&rows);
        assert_eq!(csv, "nom,ville\nCRGM,Goma");
    }

    #[test]
    fn comma_values_are_quoted() {
        let rows = vec![row(&[("adresse", json!("12, avenue de la Science"))])];
        let csv = to_csv(&rows);
        assert_eq!(csv.lines().nth(1).unwrap(), "\"12, avenue de la Science\"");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let rows = vec![row(&[("titre", json!("Etude \"pilote\", phase 1"))])];
        let csv = to_csv(&rows);
        assert_eq!(
            csv.lines().nth(1).unwrap(),
            "\"Etude \"\"pilote\"\", phase 1\""
        );
    }

    #[test]
    fn quoting_round_trips_through_a_csv_parser() {
        // minimal RFC-4180 field parser, enough to verify the round trip
        fn parse_line(line: &str) -> Vec<String> {
            let mut fields = Vec::new();
            let mut field = String::new();
            let mut chars = line.chars().peekable();
            let mut quoted = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' if !quoted && field.is_empty() => quoted = true,
                    '"' if quoted => {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            field.push('"');
                        } else {
                            quoted = false;
                        }
                    }
                    ',' if !quoted => {
                        fields.push(std::mem::take(&mut field));
                    }
                    c => field.push(c),
                }
            }
            fields.push(field);
            fields
        }

        let original = "a \"quoted\" value, with comma";
        let rows = vec![row(&[("v", json!(original))])];
        let csv = to_csv(&rows);
        let parsed = parse_line(csv.lines().nth(1).unwrap());
        assert_eq!(parsed, vec![original.to_string()]);
    }

    #[test]
    fn null_becomes_empty_field() {
        let rows = vec![row(&[("nom", json!("CRGM")), ("email", Value::Null)])];
        let csv = to_csv(&rows);
        assert_eq!(csv.lines().nth(1).unwrap(), "CRGM,");
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(to_csv(&[]), "");
    }
}
