use chrono::{DateTime, Utc};

/// A single SMS record as reported by the device's content provider.
/// Immutable once parsed; `id` is unique within one device snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SmsMessage {
    pub id: i64,
    pub address: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub read: bool,
}

impl SmsMessage {
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Received,
    Sent,
}

impl Direction {
    /// The content provider encodes direction as a small integer:
    /// 1 = received, 2 = sent. Anything else is treated as received.
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => Direction::Sent,
            _ => Direction::Received,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Received => "RECEIVED",
            Direction::Sent => "SENT",
        }
    }
}
