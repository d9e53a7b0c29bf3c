//! Line format for trace-log files.
//!
//! One entry per line, fields separated by tabs, CRLF terminated:
//!
//! ```text
//! 2012.01.01. 8:00:00<TAB>Informational<TAB>Server<TAB>123<TAB>TestOp<TAB>Message<TAB><extra><CR><LF>
//! ```
//!
//! Field values are written as-is. A tab, CR or LF inside a value will break
//! the line apart; callers that need those characters must strip them first.

use chrono::{NaiveDateTime, TimeZone, Utc};

use crate::entry::LogEntry;
use crate::error::{TraceLogError, TraceLogResult};
use crate::pattern::{DatePattern, DEFAULT_TIMESTAMP_PATTERN};

pub const FIELD_SEPARATOR: char = '\t';
pub const LINE_TERMINATOR: &str = "\r\n";

const FIELD_COUNT: usize = 7;

/// Turns entries into lines and back.
#[derive(Debug, Clone)]
pub struct EntryFormatter {
    timestamp: DatePattern,
}

impl Default for EntryFormatter {
    fn default() -> Self {
        Self::new(DatePattern::parse(DEFAULT_TIMESTAMP_PATTERN).expect("default pattern compiles"))
    }
}

impl EntryFormatter {
    /// Create a formatter that renders timestamps with `timestamp`.
    pub fn new(timestamp: DatePattern) -> Self {
        Self { timestamp }
    }

    /// Pattern used for the timestamp field.
    pub fn timestamp_pattern(&self) -> &DatePattern {
        &self.timestamp
    }

    /// Format one entry, including the trailing CRLF.
    pub fn format(&self, entry: &LogEntry) -> String {
        let mut line = String::with_capacity(
            48 + entry.server_name().len()
                + entry.operation().len()
                + entry.message().len()
                + entry.extra().len(),
        );

        self.timestamp.render_into(&entry.timestamp(), &mut line);
        line.push(FIELD_SEPARATOR);
        line.push_str(entry.entry_type().as_str());
        line.push(FIELD_SEPARATOR);
        line.push_str(entry.server_name());
        line.push(FIELD_SEPARATOR);
        line.push_str(&entry.thread_id().to_string());
        line.push(FIELD_SEPARATOR);
        line.push_str(entry.operation());
        line.push(FIELD_SEPARATOR);
        line.push_str(entry.message());
        line.push(FIELD_SEPARATOR);
        line.push_str(entry.extra());
        line.push_str(LINE_TERMINATOR);
        line
    }

    /// Parse a line written by a formatter with the same timestamp pattern.
    ///
    /// The line terminator is optional. Sub-second precision is lost unless
    /// the timestamp pattern carries it.
    pub fn parse(&self, line: &str) -> TraceLogResult<LogEntry> {
        let line = line.strip_suffix(LINE_TERMINATOR).unwrap_or(line);
        let line = line.strip_suffix('\n').unwrap_or(line);

        let fields: Vec<&str> = line.splitn(FIELD_COUNT, FIELD_SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return Err(TraceLogError::Parse(format!(
                "expected {FIELD_COUNT} tab-separated fields, found {}",
                fields.len()
            )));
        }

        let timestamp = self.parse_timestamp(fields[0])?;
        let entry_type = fields[1].parse()?;
        let thread_id = fields[3]
            .parse::<u64>()
            .map_err(|e| TraceLogError::Parse(format!("bad thread id {:?}: {e}", fields[3])))?;

        Ok(
            LogEntry::new(timestamp, entry_type, fields[2], thread_id, fields[4], fields[5])
                .with_extra(fields[6]),
        )
    }

    fn parse_timestamp(&self, field: &str) -> TraceLogResult<chrono::DateTime<Utc>> {
        NaiveDateTime::parse_from_str(field, self.timestamp.strftime())
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(|e| TraceLogError::Parse(format!("bad timestamp {field:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;

    fn sample() -> LogEntry {
        LogEntry::new(
            Utc.with_ymd_and_hms(2012, 1, 1, 8, 0, 0).unwrap(),
            EntryType::Informational,
            "Server",
            123,
            "TestOp",
            "Message",
        )
    }

    #[test]
    fn test_format_matches_reference_line() {
        let line = EntryFormatter::default().format(&sample());
        assert_eq!(
            line,
            "2012.01.01. 8:00:00\tInformational\tServer\t123\tTestOp\tMessage\t\r\n"
        );
    }

    #[test]
    fn test_format_writes_extra_into_trailing_field() {
        let entry = sample().with_extra("boom");
        let line = EntryFormatter::default().format(&entry);
        assert!(line.ends_with("\tMessage\tboom\r\n"));
    }

    #[test]
    fn test_format_with_custom_timestamp_pattern() {
        let formatter = EntryFormatter::new(DatePattern::parse("yyyy-MM-dd HH:mm:ss").unwrap());
        let line = formatter.format(&sample());
        assert!(line.starts_with("2012-01-01 08:00:00\t"));
    }

    #[test]
    fn test_parse_reverses_format() {
        let formatter = EntryFormatter::default();
        let entry = sample().with_extra("stack trace");
        let parsed = formatter.parse(&formatter.format(&entry)).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_parse_two_digit_hour() {
        let formatter = EntryFormatter::default();
        let parsed = formatter
            .parse("2012.01.01. 17:04:05\tWarning\tweb01\t9\tSync\tslow\t")
            .unwrap();
        assert_eq!(
            parsed.timestamp(),
            Utc.with_ymd_and_hms(2012, 1, 1, 17, 4, 5).unwrap()
        );
        assert_eq!(parsed.entry_type(), EntryType::Warning);
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        let formatter = EntryFormatter::default();
        assert!(matches!(
            formatter.parse("not a log line"),
            Err(TraceLogError::Parse(_))
        ));
        assert!(matches!(
            formatter.parse("2012.01.01. 8:00:00\tInformational\tServer\tabc\tOp\tMsg\t"),
            Err(TraceLogError::Parse(_))
        ));
        assert!(matches!(
            formatter.parse("2012.01.01. 8:00:00\tNoise\tServer\t1\tOp\tMsg\t"),
            Err(TraceLogError::Parse(_))
        ));
    }
}
