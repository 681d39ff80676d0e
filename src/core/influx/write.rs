use chrono::{DateTime, Utc};

/// A single sample headed for the line-protocol write endpoint.
///
/// Built fluently and rendered with [`Point::to_line`]; timestamps are
/// rendered at millisecond precision to match the write request.
#[derive(Debug, Clone)]
pub struct Point {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
enum FieldValue {
    Float(f64),
    Integer(i64),
    Text(String),
}

impl Point {
    pub fn new(measurement: &str) -> Self {
        Point {
            measurement: measurement.to_string(),
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp: None,
        }
    }

    /// Tags with empty values are dropped; line protocol rejects them.
    pub fn tag(mut self, key: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.tags.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn float_field(mut self, key: &str, value: f64) -> Self {
        self.fields.push((key.to_string(), FieldValue::Float(value)));
        self
    }

    pub fn int_field(mut self, key: &str, value: i64) -> Self {
        self.fields.push((key.to_string(), FieldValue::Integer(value)));
        self
    }

    pub fn string_field(mut self, key: &str, value: &str) -> Self {
        self.fields
            .push((key.to_string(), FieldValue::Text(value.to_string())));
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    /// Renders one line of line protocol, or `None` for a point with no
    /// fields (the store rejects whole batches over a single bad line).
    pub fn to_line(&self) -> Option<String> {
        if self.fields.is_empty() {
            return None;
        }

        let mut line = escape_name(&self.measurement);
        for (key, value) in &self.tags {
            line.push(',');
            line.push_str(&escape_tag(key));
            line.push('=');
            line.push_str(&escape_tag(value));
        }

        line.push(' ');
        let rendered_fields = self
            .fields
            .iter()
            .map(|(key, value)| format!("{}={}", escape_tag(key), render_field(value)))
            .collect::<Vec<_>>()
            .join(",");
        line.push_str(&rendered_fields);

        if let Some(at) = self.timestamp {
            line.push(' ');
            line.push_str(&at.timestamp_millis().to_string());
        }

        Some(line)
    }
}

/// Joins points into a write body, skipping field-less points.
pub fn to_line_protocol(points: &[Point]) -> String {
    points
        .iter()
        .filter_map(Point::to_line)
        .collect::<Vec<_>>()
        .join("\n")
}

// Measurements escape commas and spaces; tag and field keys and tag values
// additionally escape equals signs.

fn escape_name(value: &str) -> String {
    value.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_tag(value: &str) -> String {
    value
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

fn render_field(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => {
            if v.fract() == 0.0 && v.is_finite() {
                // Keep a decimal point so the store types the field as float
                format!("{v:.1}")
            } else {
                v.to_string()
            }
        }
        FieldValue::Integer(v) => format!("{v}i"),
        FieldValue::Text(v) => format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")),
    }
}
