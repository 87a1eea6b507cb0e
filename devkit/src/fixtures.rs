/*!
Payload builders for the two remote endpoints

- `completer_body`: JSON answer of `/metrics/find?format=completer`
- `raw_line`: one `path,start,end,step|v1,v2,...` line of `/render?format=raw`
*/

use serde_json::{json, Value};

/// Completer JSON for `(path, is_leaf)` entries
pub fn completer_body(entries: &[(&str, bool)]) -> Value {
    let metrics: Vec<Value> = entries
        .iter()
        .map(|(path, is_leaf)| {
            json!({ "path": path, "is_leaf": is_leaf, "name": last_segment(path) })
        })
        .collect();
    json!({ "metrics": metrics })
}

/// Raw render line; `None` points are written as the `None` token
pub fn raw_line(path: &str, start: i64, end: i64, step: i64, points: &[Option<f64>]) -> String {
    let values: Vec<String> = points
        .iter()
        .map(|point| match point {
            Some(v) => v.to_string(),
            None => "None".to_string(),
        })
        .collect();
    format!("{},{},{},{}|{}", path, start, end, step, values.join(","))
}

fn last_segment(path: &str) -> &str {
    path.trim_end_matches(['.', '/'])
        .rsplit(['.', '/'])
        .next()
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_line_format() {
        assert_eq!(
            raw_line("a.b.c", 100, 200, 10, &[Some(1.5), None, Some(3.0)]),
            "a.b.c,100,200,10|1.5,None,3"
        );
        assert_eq!(raw_line("a.b", 0, 60, 60, &[]), "a.b,0,60,60|");
    }

    #[test]
    fn test_completer_body() {
        let body = completer_body(&[("a.b.", false), ("a.b.c", true)]);
        assert_eq!(body["metrics"][0]["path"], "a.b.");
        assert_eq!(body["metrics"][0]["is_leaf"], false);
        assert_eq!(body["metrics"][0]["name"], "b");
        assert_eq!(body["metrics"][1]["name"], "c");
    }
}
