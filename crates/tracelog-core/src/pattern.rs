//! Date/time patterns in `yyyy.MM.dd HH:mm:ss` token syntax.
//!
//! A pattern is compiled once into a chrono strftime string and rendered
//! against UTC instants. Supported tokens:
//!
//! | Token | Output |
//! |-------|--------|
//! | `yyyy`, `yy` | year, 4 or 2 digits |
//! | `MMMM`, `MMM`, `MM`, `M` | month name, short name, padded, unpadded |
//! | `dddd`, `ddd`, `dd`, `d` | weekday name, short name, padded day, unpadded |
//! | `HH`, `H` | hour 0-23 |
//! | `hh`, `h` | hour 1-12 |
//! | `mm`, `m` | minute |
//! | `ss`, `s` | second |
//! | `fff`, `ffffff`, `fffffffff` | fractional second digits |
//! | `tt` | AM/PM |
//!
//! Quoted text (`'..'` or `".."`) and backslash-escaped characters are
//! copied verbatim, as is any character that is not a token letter.

use std::fmt::{self, Write};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};

use crate::error::{TraceLogError, TraceLogResult};

/// Timestamp layout used for the first field of every line.
pub const DEFAULT_TIMESTAMP_PATTERN: &str = "yyyy.MM.dd. H:mm:ss";

/// A compiled date pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    source: String,
    strftime: String,
}

impl DatePattern {
    /// Compile a pattern. An unsupported token width is a configuration error.
    pub fn parse(pattern: &str) -> TraceLogResult<Self> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut strftime = String::with_capacity(pattern.len() * 2);
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '\'' | '"' => {
                    let close = chars[i + 1..]
                        .iter()
                        .position(|&q| q == c)
                        .ok_or_else(|| {
                            TraceLogError::Config(format!(
                                "unterminated quote in date pattern {pattern:?}"
                            ))
                        })?;
                    for &lit in &chars[i + 1..i + 1 + close] {
                        push_literal(&mut strftime, lit);
                    }
                    i += close + 2;
                }
                '\\' => {
                    let lit = chars.get(i + 1).ok_or_else(|| {
                        TraceLogError::Config(format!(
                            "trailing escape in date pattern {pattern:?}"
                        ))
                    })?;
                    push_literal(&mut strftime, *lit);
                    i += 2;
                }
                'y' | 'M' | 'd' | 'H' | 'h' | 'm' | 's' | 'f' | 't' => {
                    let run = chars[i..].iter().take_while(|&&r| r == c).count();
                    strftime.push_str(token(c, run).ok_or_else(|| {
                        TraceLogError::Config(format!(
                            "unsupported token {:?} in date pattern {pattern:?}",
                            c.to_string().repeat(run)
                        ))
                    })?);
                    i += run;
                }
                _ => {
                    push_literal(&mut strftime, c);
                    i += 1;
                }
            }
        }

        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(TraceLogError::Config(format!(
                "date pattern {pattern:?} does not compile"
            )));
        }

        Ok(Self {
            source: pattern.to_string(),
            strftime,
        })
    }

    /// The pattern as it was written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The compiled chrono layout.
    pub(crate) fn strftime(&self) -> &str {
        &self.strftime
    }

    /// Render `timestamp` through this pattern.
    pub fn render(&self, timestamp: &DateTime<Utc>) -> String {
        let mut out = String::new();
        self.render_into(timestamp, &mut out);
        out
    }

    /// Render `timestamp`, appending to `out`.
    pub fn render_into(&self, timestamp: &DateTime<Utc>, out: &mut String) {
        // Items were validated in `parse`, so formatting cannot fail.
        let _ = write!(out, "{}", timestamp.format(&self.strftime));
    }
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn token(letter: char, run: usize) -> Option<&'static str> {
    let spec = match (letter, run) {
        ('y', 4) => "%Y",
        ('y', 2) => "%y",
        ('M', 4) => "%B",
        ('M', 3) => "%b",
        ('M', 2) => "%m",
        ('M', 1) => "%-m",
        ('d', 4) => "%A",
        ('d', 3) => "%a",
        ('d', 2) => "%d",
        ('d', 1) => "%-d",
        ('H', 2) => "%H",
        ('H', 1) => "%-H",
        ('h', 2) => "%I",
        ('h', 1) => "%-I",
        ('m', 2) => "%M",
        ('m', 1) => "%-M",
        ('s', 2) => "%S",
        ('s', 1) => "%-S",
        ('f', 3) => "%3f",
        ('f', 6) => "%6f",
        ('f', 9) => "%9f",
        ('t', 2) => "%p",
        _ => return None,
    };
    Some(spec)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}
