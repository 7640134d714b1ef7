use serde_json::{json, Value};
use std::io::Read;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::validation::format_phone_for_display;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
        OutputFormat::Text => println!("✓ {}", message),
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({ "error": true, "message": message });
            if let Some(code) = error_code {
                response["code"] = json!(code);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => eprintln!("Error: {}", message),
    }
    Ok(())
}

/// JSON body from a file, or from stdin when no file is given.
pub fn read_json_input(file: Option<&Path>) -> anyhow::Result<Value> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("input is not valid JSON: {}", e))
}

fn text(value: &Value, key: &str) -> String {
    value.get(key).and_then(Value::as_str).unwrap_or("-").to_string()
}

/// One line per school for list output.
pub fn school_line(school: &Value) -> String {
    let phone = school
        .get("phoneNumber1")
        .and_then(Value::as_str)
        .map(format_phone_for_display)
        .unwrap_or_else(|| "-".to_string());
    let city = school
        .get("address")
        .map(|a| text(a, "city"))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:>6}  {:<40}  {:<18}  {}",
        school.get("id").and_then(Value::as_i64).unwrap_or_default(),
        text(school, "name"),
        phone,
        city
    )
}

/// Multi-line detail view of a single school.
pub fn school_details(school: &Value) -> String {
    let mut lines = vec![format!(
        "#{} {}",
        school.get("id").and_then(Value::as_i64).unwrap_or_default(),
        text(school, "name")
    )];
    for key in ["phoneNumber1", "phoneNumber2", "phoneNumber3"] {
        if let Some(phone) = school.get(key).and_then(Value::as_str) {
            lines.push(format!("  Phone:    {}", format_phone_for_display(phone)));
        }
    }
    lines.push(format!("  Email:    {}", text(school, "email")));
    lines.push(format!("  Website:  {}", text(school, "website")));
    if let Some(address) = school.get("address") {
        lines.push(format!(
            "  Address:  {}, {}, {}",
            text(address, "street"),
            text(address, "district"),
            text(address, "city")
        ));
    }
    lines.push(format!("  Owner:    {}", text(school, "createdBy")));
    lines.join("\n")
}

/// Print a school list in either shape the API returns.
pub fn output_school_list(output_format: OutputFormat, body: &Value) -> anyhow::Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(body)?);
        return Ok(());
    }

    let rows = body
        .as_array()
        .or_else(|| body.get("data").and_then(Value::as_array))
        .cloned()
        .unwrap_or_default();
    if rows.is_empty() {
        println!("No schools found");
    }
    for row in &rows {
        println!("{}", school_line(row));
    }
    if let Some(p) = body.get("pagination") {
        println!(
            "Page {} of {} ({} schools)",
            p["page"], p["totalPages"], p["totalCount"]
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn school_line_formats_phone() {
        let school = json!({
            "id": 7,
            "name": "Alpha",
            "phoneNumber1": "+995577189127",
            "address": { "city": "Tbilisi" }
        });
        let line = school_line(&school);
        assert!(line.contains("+995 577 18 91 27"), "{}", line);
        assert!(line.contains("Tbilisi"));
    }

    #[test]
    fn details_tolerate_missing_fields() {
        let details = school_details(&json!({ "id": 1, "name": "Bare" }));
        assert!(details.starts_with("#1 Bare"));
        assert!(details.contains("Email:    -"));
    }
}
