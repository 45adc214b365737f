use crate::message::{Direction, SmsMessage};
use chrono::{DateTime, Utc};

/// Parse the raw text dump produced by
/// `adb shell content query --uri content://sms ...` into message records.
///
/// The dump is line-oriented: a line starting with `Row:` carries all
/// fields as `key=value` pairs, with `body=` running to the end of the
/// line. Non-blank lines that do not start with `Row:` are continuations
/// of the previous body (multi-line SMS), joined with a newline.
///
/// Malformed rows are dropped silently; this function never fails.
pub fn parse(raw: &str) -> Vec<SmsMessage> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let mut messages = Vec::new();
    let mut current: Option<SmsMessage> = None;

    for line in raw.split('\n') {
        let line = line.trim_end_matches('\r');

        if line.starts_with("Row:") {
            if let Some(msg) = current.take() {
                messages.push(msg);
            }
            current = parse_row(line);
        } else if !line.trim().is_empty() {
            // Body continuation. Lines following an invalid row are
            // discarded along with it.
            if let Some(msg) = current.as_mut() {
                msg.body.push('\n');
                msg.body.push_str(line);
            }
        }
    }

    if let Some(msg) = current.take() {
        messages.push(msg);
    }

    messages
}

/// Parse one `Row:` line, e.g.
/// `Row: 0 _id=42, address=BANK, date=1700000000000, read=1, type=1, body=hello`
///
/// Field order is fixed by the projection we query with. `_id`, `address`,
/// `date` and `body` are required; a row missing any of them yields `None`.
/// `read` and `type` default to 0 and 1 when absent.
fn parse_row(line: &str) -> Option<SmsMessage> {
    let id_start = line.find("_id=")?;
    let address_start = line.find("address=")?;
    let date_start = line.find("date=")?;
    let body_start = line.find("body=")?;
    let read_start = line.find("read=");
    let type_start = line.find("type=");

    let id = extract_i64(line, id_start + 4, Some(address_start));
    let address = extract_field(line, address_start + 8, Some(date_start)).to_string();

    let date_end = read_start.or(type_start).unwrap_or(body_start);
    let date_ms = extract_i64(line, date_start + 5, Some(date_end));

    let read = match read_start {
        Some(start) => extract_i64(line, start + 5, Some(type_start.unwrap_or(body_start))) == 1,
        None => false,
    };
    let direction = match type_start {
        Some(start) => Direction::from_code(extract_i64(line, start + 5, Some(body_start))),
        None => Direction::Received,
    };

    let body = line[body_start + 5..].to_string();

    Some(SmsMessage {
        id,
        address,
        body,
        timestamp: DateTime::<Utc>::from_timestamp_millis(date_ms)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        direction,
        read,
    })
}

/// Slice the value between a field's start offset and the start of the
/// next field, trimming whitespace and the trailing field separator.
fn extract_field(line: &str, start: usize, next_field_start: Option<usize>) -> &str {
    let end = match next_field_start {
        Some(end) if end > start && end <= line.len() => end,
        _ => line.len(),
    };
    line[start..end].trim().trim_end_matches(',').trim_end()
}

fn extract_i64(line: &str, start: usize, next_field_start: Option<usize>) -> i64 {
    extract_field(line, start, next_field_start)
        .parse()
        .unwrap_or(0)
}
