use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object. Row results
/// reduce to their single most useful number.
pub fn print_minimal(value: &Value) {
    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Row results: the schedule's payment or the series' latest value.
    if let Value::Array(rows) = result_obj {
        if let Some(Value::Object(first)) = rows.first() {
            if let Some(payment) = first.get("payment_amount") {
                println!("{}", format_minimal(payment));
                return;
            }
        }
        if let Some(Value::Object(last)) = rows.last() {
            if let Some(price) = last.get("value") {
                println!("{}", format_minimal(price));
                return;
            }
        }
        println!("{} rows", rows.len());
        return;
    }

    // Priority list of key output fields
    let priority_keys = [
        "premium",
        "purchase_price",
        "adjusted_amount",
        "effective_annual_rate",
    ];

    if let Value::Object(map) = result_obj {
        // Try priority keys first (skip null values)
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    // Not an object, just print directly
    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
