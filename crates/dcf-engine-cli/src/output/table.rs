use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::SCHEDULE_KEYS;

/// Format output as tables using the tabled crate: a summary of the
/// scalar result fields, then one table per year-by-year schedule, then
/// warnings and methodology from the envelope.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_tables(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => print_schedule_table("", arr),
        _ => println!("{}", value),
    }
}

fn print_result_tables(result: &Value, envelope: &serde_json::Map<String, Value>) {
    if let Value::Object(res_map) = result {
        // Scalar summary first, nested objects flattened to JSON
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in res_map {
            if SCHEDULE_KEYS.contains(&key.as_str()) {
                continue;
            }
            if key == "standalone" {
                // The nested standalone run gets its own summary below
                continue;
            }
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));

        // Standalone leg of a synergy-adjusted run
        if let Some(standalone) = res_map.get("standalone") {
            println!("\nStandalone valuation:");
            print_result_tables(standalone, &serde_json::Map::new());
        }

        for key in SCHEDULE_KEYS {
            if let Some(Value::Array(rows)) = res_map.get(key) {
                println!();
                print_schedule_table(key, rows);
            }
        }
    } else {
        print_flat_object(result);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }
}

fn print_schedule_table(label: &str, rows: &[Value]) {
    if rows.is_empty() {
        return;
    }
    if !label.is_empty() {
        println!("{}:", label);
    }

    if let Some(Value::Object(first)) = rows.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for row in rows {
            if let Value::Object(map) = row {
                let record: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(record);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        for row in rows {
            println!("{}", format_value(row));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(map) => {
            // Period objects read better as their label
            if let Some(Value::String(label)) = map.get("label") {
                label.clone()
            } else {
                serde_json::to_string(value).unwrap_or_default()
            }
        }
    }
}
