use crate::extract::errors::ExtractError;

/// Parse a CSV payload into normalized comma-joined lines.
///
/// Structured parsing is best-effort: if the payload is not valid tabular
/// data, the raw bytes are decoded as UTF-8 (lossily) instead of failing the
/// pipeline. Downstream classification can still work with the raw text.
pub fn extract(data: &[u8]) -> Result<String, ExtractError> {
    match parse_records(data) {
        Ok(text) => Ok(text),
        Err(err) => {
            tracing::warn!(%err, "structured CSV parse failed, falling back to plain text");
            Ok(String::from_utf8_lossy(data).into_owned())
        }
    }
}

fn parse_records(data: &[u8]) -> Result<String, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record?;
        lines.push(record.iter().collect::<Vec<_>>().join(","));
    }
    Ok(lines.join("\n"))
}
