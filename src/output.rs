//! Rendering of controller resources for the terminal.
//!
//! Single resources render as an aligned key-value dictionary and
//! collections as a header-plus-rows table. Nested or opaque fields
//! (metadata, host info, connection info) render as compact JSON.

use serde_json::Value;

/// Renders one resource as an aligned `Property | Value` dictionary,
/// restricted to the given wire-format keys in order.
#[must_use]
pub fn render_dict(resource: &Value, keys: &[&str]) -> String {
    let rows: Vec<(String, String)> = keys
        .iter()
        .map(|key| ((*key).to_owned(), cell(resource.get(*key))))
        .collect();

    let width = rows
        .iter()
        .map(|(key, _)| key.len())
        .max()
        .unwrap_or_default()
        .max("Property".len());

    let mut out = String::new();
    push_row(&mut out, "Property", "Value", width);
    for (key, value) in &rows {
        push_row(&mut out, key, value, width);
    }
    out
}

/// Renders a collection of resources as a table with one column per key.
#[must_use]
pub fn render_table(resources: &[Value], keys: &[&str]) -> String {
    let mut widths: Vec<usize> = keys.iter().map(|key| key.len()).collect();
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(resources.len());
    for resource in resources {
        let row: Vec<String> = keys.iter().map(|key| cell(resource.get(*key))).collect();
        for (width, value) in widths.iter_mut().zip(&row) {
            *width = (*width).max(value.len());
        }
        rows.push(row);
    }

    let mut out = String::new();
    push_cells(&mut out, keys.iter().map(|key| (*key).to_owned()), &widths);
    for row in rows {
        push_cells(&mut out, row.into_iter(), &widths);
    }
    out
}

/// Formats a single field the way the dictionary and table renderers do:
/// strings verbatim, everything else as compact JSON.
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn push_row(out: &mut String, key: &str, value: &str, width: usize) {
    out.push_str(&format!("{key:<width$} | {value}\n"));
}

fn push_cells(out: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    let mut first = true;
    for (value, width) in cells.zip(widths) {
        if first {
            first = false;
        } else {
            out.push_str("  ");
        }
        out.push_str(&format!("{value:<width$}"));
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn dict_renders_scalars_and_nested_json() {
        let resource = json!({
            "id": "vol-1",
            "size": 2,
            "metadata": {"pool": "default"},
        });

        let rendered = render_dict(&resource, &["id", "size", "metadata"]);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.first().copied(), Some("Property | Value"));
        assert!(rendered.contains("id       | vol-1"));
        assert!(rendered.contains("size     | 2"));
        assert!(rendered.contains(r#"metadata | {"pool":"default"}"#));
    }

    #[test]
    fn dict_renders_missing_fields_as_blank() {
        let resource = json!({"id": "vol-1"});
        let rendered = render_dict(&resource, &["id", "status"]);
        assert!(rendered.contains("status   |"));
    }

    #[test]
    fn table_aligns_columns_to_widest_value() {
        let resources = vec![
            json!({"id": "vol-1", "name": "alpha"}),
            json!({"id": "vol-22", "name": "a-much-longer-name"}),
        ];

        let rendered = render_table(&resources, &["id", "name"]);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines.first().copied(), Some("id      name"));
        assert!(rendered.contains("vol-22  a-much-longer-name"));
    }

    #[test]
    fn table_with_no_rows_renders_header_only() {
        let rendered = render_table(&[], &["id", "name"]);
        assert_eq!(rendered, "id  name\n");
    }
}
