//! Structured-data transcoding: JSON, CSV, XML, and pass-through text.
//!
//! [`transcode`] never fails across the pipeline boundary. A parse failure
//! produces a `Conversion Error: …` marker embedded in the output text, so
//! the batch pipeline treats every data conversion as resolvable.
//!
//! The CSV side is deliberately minimal: no quoted-field parsing on input,
//! and no escaping of embedded commas on output beyond JSON-string quoting.
//! This is an accepted simplification, not a general CSV codec.

use serde_json::{Map, Value};

/// Convert `content` between textual structured formats.
///
/// Recognised pairs: `json → csv`, `csv → json`, `xml → json`. Conversions
/// targeting plain text, and any unrecognised pair, are pass-through: the
/// output equals the input unchanged.
pub fn transcode(content: &str, from: &str, to: &str) -> String {
    let from = from.to_ascii_lowercase();
    let to = to.to_ascii_lowercase();
    let result = match (from.as_str(), to.as_str()) {
        ("json", "csv") => json_to_csv(content),
        ("csv", "json") => csv_to_json(content),
        ("xml", "json") => xml_to_json(content),
        _ => return content.to_string(),
    };
    result.unwrap_or_else(|detail| format!("Conversion Error: {detail}"))
}

// ── JSON → CSV ───────────────────────────────────────────────────────────

/// Header row from the first element's keys (insertion order), one line per
/// element, every cell JSON-serialized. Falsy values (null, false, 0, the
/// empty string) and missing keys serialize as the quoted empty string.
fn json_to_csv(content: &str) -> Result<String, String> {
    let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let rows = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    let first = rows.first().ok_or_else(|| "empty input sequence".to_string())?;
    let headers: Vec<String> = first
        .as_object()
        .ok_or_else(|| "first element is not an object".to_string())?
        .keys()
        .cloned()
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));
    for row in &rows {
        let cells: Vec<String> = headers.iter().map(|h| csv_cell(row.get(h))).collect();
        lines.push(cells.join(","));
    }
    Ok(lines.join("\n"))
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        Some(v) if !is_falsy(v) => serde_json::to_string(v).unwrap_or_else(|_| "\"\"".into()),
        _ => "\"\"".to_string(),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

// ── CSV → JSON ───────────────────────────────────────────────────────────

/// First non-empty line is the header; bare-comma splits; each data line is
/// zipped against the trimmed headers. Keys with no corresponding value are
/// omitted. Output is a 2-space-indented JSON array.
fn csv_to_json(content: &str) -> Result<String, String> {
    let mut lines = content.split('\n').filter(|l| !l.is_empty());
    let head = lines.next().ok_or_else(|| "missing header row".to_string())?;
    let headers: Vec<&str> = head.split(',').collect();

    let mut records = Vec::new();
    for line in lines {
        let values: Vec<&str> = line.split(',').collect();
        let mut record = Map::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(value) = values.get(i) {
                record.insert(
                    header.trim().to_string(),
                    Value::String(value.trim().to_string()),
                );
            }
        }
        records.push(Value::Object(record));
    }
    serde_json::to_string_pretty(&Value::Array(records)).map_err(|e| e.to_string())
}

// ── XML → JSON ───────────────────────────────────────────────────────────

/// Recursive document-to-mapping projection.
///
/// Element attributes land under an `"@attributes"` key. Each child is
/// keyed by its node name; a repeated sibling name converts that key into
/// a sequence (the first two occurrences become a 2-element sequence,
/// later ones are appended). An element with no attributes whose only
/// content is text projects to the raw string; mixed content keys text
/// runs under `"#text"`. Whitespace-only text is skipped. No namespace
/// handling.
fn xml_to_json(content: &str) -> Result<String, String> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut root = Map::new();
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(start) => {
                let name = qname_string(start.name().as_ref());
                let attrs = attribute_map(&start)?;
                let child = parse_element(&mut reader, attrs)?;
                insert_child(&mut root, name, child);
            }
            Event::Empty(start) => {
                let name = qname_string(start.name().as_ref());
                let attrs = attribute_map(&start)?;
                insert_child(&mut root, name, Value::Object(attrs));
            }
            Event::Text(_) | Event::CData(_) => {}
            Event::End(_) => return Err("unbalanced closing tag".to_string()),
            Event::Eof => break,
            _ => {}
        }
    }
    serde_json::to_string_pretty(&Value::Object(root)).map_err(|e| e.to_string())
}

/// Parse the children of an already-opened element into its projection.
fn parse_element(
    reader: &mut quick_xml::Reader<&[u8]>,
    attrs: Map<String, Value>,
) -> Result<Value, String> {
    use quick_xml::events::Event;

    let has_attributes = !attrs.is_empty();
    let mut map = attrs;
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(start) => {
                let name = qname_string(start.name().as_ref());
                let child_attrs = attribute_map(&start)?;
                let child = parse_element(reader, child_attrs)?;
                insert_child(&mut map, name, child);
            }
            Event::Empty(start) => {
                let name = qname_string(start.name().as_ref());
                let child_attrs = attribute_map(&start)?;
                insert_child(&mut map, name, Value::Object(child_attrs));
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(|e| e.to_string())?;
                if !value.trim().is_empty() {
                    insert_child(&mut map, "#text".to_string(), Value::String(value.into_owned()));
                }
            }
            Event::CData(cdata) => {
                let value = String::from_utf8_lossy(&cdata).into_owned();
                if !value.trim().is_empty() {
                    insert_child(&mut map, "#text".to_string(), Value::String(value));
                }
            }
            Event::End(_) => break,
            Event::Eof => return Err("unexpected end of document".to_string()),
            _ => {}
        }
    }

    // A text-only element without attributes projects to the raw string.
    if !has_attributes && map.len() == 1 {
        if let Some(Value::String(text)) = map.get("#text") {
            return Ok(Value::String(text.clone()));
        }
    }
    Ok(Value::Object(map))
}

fn attribute_map(start: &quick_xml::events::BytesStart<'_>) -> Result<Map<String, Value>, String> {
    let mut map = Map::new();
    let mut attrs = Map::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        attrs.insert(
            qname_string(attr.key.as_ref()),
            Value::String(attr.unescape_value().map_err(|e| e.to_string())?.into_owned()),
        );
    }
    if !attrs.is_empty() {
        map.insert("@attributes".to_string(), Value::Object(attrs));
    }
    Ok(map)
}

fn qname_string(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Insert a child under `name`, converting to a sequence on repeats.
fn insert_child(map: &mut Map<String, Value>, name: String, child: Value) {
    match map.get_mut(&name) {
        None => {
            map.insert(name, child);
        }
        Some(Value::Array(seq)) => seq.push(child),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, child]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_to_csv_uniform_objects() {
        let input = r#"[{"name":"ada","age":36},{"name":"grace","age":45}]"#;
        let out = transcode(input, "json", "csv");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "name,age");
        assert_eq!(lines[1], "\"ada\",36");
        assert_eq!(lines[2], "\"grace\",45");
    }

    #[test]
    fn json_to_csv_wraps_single_object() {
        let out = transcode(r#"{"x":1}"#, "json", "csv");
        assert_eq!(out, "x\n1");
    }

    #[test]
    fn json_to_csv_falsy_and_missing_cells() {
        let input = r#"[{"a":1,"b":"set"},{"a":0,"c":"extra"}]"#;
        let out = transcode(input, "json", "csv");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "a,b");
        // 0 and a missing key both become the quoted empty string.
        assert_eq!(lines[2], "\"\",\"\"");
    }

    #[test]
    fn json_parse_failure_yields_error_marker() {
        let out = transcode("{not json", "json", "csv");
        assert!(out.starts_with("Conversion Error:"), "got: {out}");
    }

    #[test]
    fn csv_to_json_basic_round_trip() {
        let out = transcode("a,b\n1,2", "csv", "json");
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!([{"a": "1", "b": "2"}]));
        // 2-space indentation.
        assert!(out.contains("  {"), "got: {out}");
    }

    #[test]
    fn csv_to_json_skips_blank_lines_and_short_rows() {
        let out = transcode("a,b\n\n1\n", "csv", "json");
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!([{"a": "1"}]));
    }

    #[test]
    fn csv_to_json_trims_headers_and_values() {
        let out = transcode(" a , b \n 1 , 2 ", "csv", "json");
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!([{"a": "1", "b": "2"}]));
    }

    #[test]
    fn xml_repeated_siblings_become_sequence() {
        let out = transcode("<r><x>1</x><x>2</x></r>", "xml", "json");
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!({"r": {"x": ["1", "2"]}}));
    }

    #[test]
    fn xml_three_siblings_append_to_sequence() {
        let out = transcode("<r><x>1</x><x>2</x><x>3</x></r>", "xml", "json");
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!({"r": {"x": ["1", "2", "3"]}}));
    }

    #[test]
    fn xml_attributes_project_under_marker_key() {
        let out = transcode(r#"<r id="7"><x>1</x></r>"#, "xml", "json");
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"r": {"@attributes": {"id": "7"}, "x": "1"}})
        );
    }

    #[test]
    fn xml_mixed_content_keys_text_runs() {
        let out = transcode("<r>before<x>1</x></r>", "xml", "json");
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!({"r": {"#text": "before", "x": "1"}}));
    }

    #[test]
    fn xml_parse_failure_yields_error_marker() {
        let out = transcode("<r><unclosed>", "xml", "json");
        assert!(out.starts_with("Conversion Error:"), "got: {out}");
    }

    #[test]
    fn txt_target_is_pass_through() {
        let input = "anything at all, even <xml> or {json}";
        assert_eq!(transcode(input, "json", "txt"), input);
    }

    #[test]
    fn unrecognised_pair_is_pass_through() {
        let input = "SELECT 1;";
        assert_eq!(transcode(input, "sql", "yaml"), input);
    }
}
