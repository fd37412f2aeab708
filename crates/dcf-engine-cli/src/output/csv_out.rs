use serde_json::Value;
use std::io;

use super::SCHEDULE_KEYS;

/// Write output as CSV to stdout. When the result carries a year-by-year
/// schedule (projections or a synergy schedule), that schedule becomes
/// the CSV body; otherwise a two-column field/value dump is written.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => {
                    write_field_value(&mut wtr, map);
                    let _ = wtr.flush();
                    return;
                }
            };

            let schedule = SCHEDULE_KEYS
                .iter()
                .find_map(|key| match result.get(*key) {
                    Some(Value::Array(rows)) if !rows.is_empty() => Some(rows),
                    _ => None,
                });

            match schedule {
                Some(rows) => write_schedule_csv(&mut wtr, rows),
                None => write_field_value(&mut wtr, result),
            }
        }
        Value::Array(arr) => write_schedule_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_field_value(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &serde_json::Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_schedule_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    if rows.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = rows.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for row in rows {
            if let Value::Object(map) = row {
                let record: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&record);
            }
        }
    } else {
        for row in rows {
            let _ = wtr.write_record([&format_csv_value(row)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Object(map) => {
            if let Some(Value::Number(year)) = map.get("year") {
                year.to_string()
            } else {
                serde_json::to_string(value).unwrap_or_default()
            }
        }
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
