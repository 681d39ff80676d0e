use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::errors::QueryError;

/// One record from an annotated-CSV Flux response, keyed by column name.
///
/// Values stay as the raw CSV text; the typed accessors parse on demand so a
/// column whose type changes between queries (the count pipeline reuses
/// `_time` for a row count) needs no schema tracking here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FluxRow {
    columns: HashMap<String, String>,
}

impl FluxRow {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        FluxRow {
            columns: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Raw cell text; empty cells count as absent.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column)?.parse().ok()
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column)?.parse().ok()
    }

    pub fn get_time(&self, column: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.get(column)?)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Tag value with wrapping quotes stripped. Older writers stored some tag
    /// values pre-quoted; those quotes are transport noise, not data.
    pub fn tag(&self, column: &str) -> Option<String> {
        let stripped = strip_wrapping_quotes(self.get(column)?);
        if stripped.is_empty() {
            None
        } else {
            Some(stripped.to_string())
        }
    }

    fn from_cells(header: &[String], cells: Vec<String>) -> Self {
        let columns = header
            .iter()
            .zip(cells)
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.clone(), value))
            .collect();
        FluxRow { columns }
    }
}

/// Removes one leading and one trailing double quote independently.
pub fn strip_wrapping_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

/// Parses an annotated-CSV response body into rows.
///
/// A response carries one or more tables, each preceded by `#` annotation
/// lines and a header row; a blank line also separates tables. Line protocol
/// forbids raw newlines inside values, so splitting on lines before CSV
/// parsing is safe for data written by this service.
pub fn parse_annotated_csv(body: &str) -> Result<Vec<FluxRow>, QueryError> {
    let mut rows = Vec::new();
    let mut header: Option<Vec<String>> = None;
    let mut expect_header = true;

    for line in body.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            header = None;
            expect_header = true;
            continue;
        }
        if line.starts_with('#') {
            expect_header = true;
            continue;
        }

        let cells = split_csv_line(line)?;
        if expect_header {
            header = Some(cells);
            expect_header = false;
            continue;
        }
        if let Some(header) = header.as_ref() {
            rows.push(FluxRow::from_cells(header, cells));
        }
    }

    Ok(rows)
}

fn split_csv_line(line: &str) -> Result<Vec<String>, QueryError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => Ok(record.iter().map(str::to_string).collect()),
        Ok(false) => Ok(Vec::new()),
        Err(err) => Err(QueryError::Decode(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PIVOTED_BODY: &str = "\
#datatype,string,long,dateTime:RFC3339,dateTime:RFC3339,dateTime:RFC3339,string,string,double,double\r
#group,false,false,true,true,false,true,true,false,false\r
#default,_result,,,,,,,,\r
,result,table,_start,_stop,_time,_measurement,project,download,upload\r
,,0,2024-03-01T00:00:00Z,2024-03-02T00:00:00Z,2024-03-01T00:05:00Z,bandwidth_usage,proj-a,12.5,40.25\r
,,0,2024-03-01T00:00:00Z,2024-03-02T00:00:00Z,2024-03-01T00:10:00Z,bandwidth_usage,proj-a,,41\r
\r
";

    #[test]
    fn parses_pivoted_tables_with_annotations() {
        let rows = parse_annotated_csv(PIVOTED_BODY).unwrap();
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(
            first.get_time("_time"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 5, 0).unwrap())
        );
        assert_eq!(first.get_f64("upload"), Some(40.25));
        assert_eq!(first.get_f64("download"), Some(12.5));
        assert_eq!(first.tag("project").as_deref(), Some("proj-a"));

        // Missing cell reads as absent, not as zero
        assert_eq!(rows[1].get_f64("download"), None);
    }

    #[test]
    fn later_tables_pick_up_their_own_header() {
        let body = "\
#datatype,string,long,dateTime:RFC3339,double\n\
#group,false,false,false,false\n\
#default,_result,,,\n\
,result,table,_time,upload\n\
,,0,2024-03-01T00:00:00Z,1.5\n\
\n\
#datatype,string,long,string\n\
#group,false,false,true\n\
#default,_result,,\n\
,result,table,region\n\
,,1,eu-west\n";
        let rows = parse_annotated_csv(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_f64("upload"), Some(1.5));
        assert_eq!(rows[1].get("region"), Some("eu-west"));
        assert_eq!(rows[1].get("upload"), None);
    }

    #[test]
    fn quoted_cells_keep_embedded_commas_and_quotes() {
        let body = ",result,table,project\n,,0,\"a,\"\"b\"\"\"\n";
        let rows = parse_annotated_csv(body).unwrap();
        assert_eq!(rows[0].get("project"), Some("a,\"b\""));
    }

    #[test]
    fn error_tables_surface_their_columns() {
        let body = "\
#datatype,string,string\n\
#group,true,true\n\
#default,,\n\
,error,reference\n\
,failed to parse query: unexpected token,\n";
        let rows = parse_annotated_csv(body).unwrap();
        assert_eq!(
            rows[0].get("error"),
            Some("failed to parse query: unexpected token")
        );
    }

    #[test]
    fn empty_body_parses_to_no_rows() {
        assert!(parse_annotated_csv("").unwrap().is_empty());
        assert!(parse_annotated_csv("\r\n").unwrap().is_empty());
    }

    #[test]
    fn strips_wrapping_quotes_only() {
        assert_eq!(strip_wrapping_quotes("\"proj-a\""), "proj-a");
        assert_eq!(strip_wrapping_quotes("\"proj-a"), "proj-a");
        assert_eq!(strip_wrapping_quotes("pro\"ject"), "pro\"ject");
        assert_eq!(strip_wrapping_quotes("plain"), "plain");
    }
}
