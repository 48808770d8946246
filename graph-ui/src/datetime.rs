//! Date formatting for tooltips
//!
//! Timestamps arrive as ISO-8601 strings. They are shown in UTC, in the
//! viewer's local time and, when it differs, in the DAG's configured timezone.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use shared_types::Reported;

/// `YYYY-MM-DD, HH:mm:ss`
pub const DEFAULT_FORMAT: &str = "%Y-%m-%d, %H:%M:%S";

const INVALID_DATE: &str = "Invalid date";

/// The viewer's clock. The offset is looked up per instant so dates on either
/// side of a DST change each get their own offset.
pub trait LocalZone: fmt::Debug {
    fn offset_at(&self, instant: &DateTime<Utc>) -> FixedOffset;
}

impl LocalZone for FixedOffset {
    fn offset_at(&self, _instant: &DateTime<Utc>) -> FixedOffset {
        *self
    }
}

impl LocalZone for Tz {
    fn offset_at(&self, instant: &DateTime<Utc>) -> FixedOffset {
        self.offset_from_utc_datetime(&instant.naive_utc()).fix()
    }
}

/// Timezone a DAG is scheduled in, as configured by the page (`dagTZ`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DagTimezone {
    Utc,
    Offset(FixedOffset),
    /// An IANA zone such as `America/New_York`.
    Named(Tz),
    /// A name the tz database does not know.
    Unknown(String),
}

impl DagTimezone {
    /// Accepts `UTC`, fixed offsets (`+HH:MM`, `-HHMM`, `UTC+HH:MM`) and IANA
    /// zone names in any case.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let upper = trimmed.to_ascii_uppercase();
        if upper.is_empty() || upper == "UTC" || upper == "Z" || upper == "ETC/UTC" {
            return DagTimezone::Utc;
        }

        let offset_part = upper
            .strip_prefix("UTC")
            .or_else(|| upper.strip_prefix("GMT"))
            .unwrap_or(upper.as_str());
        if let Some(offset) = parse_offset(offset_part) {
            return if offset.local_minus_utc() == 0 {
                DagTimezone::Utc
            } else {
                DagTimezone::Offset(offset)
            };
        }

        match Tz::from_str_insensitive(trimmed) {
            Ok(tz) => DagTimezone::Named(tz),
            Err(_) => DagTimezone::Unknown(trimmed.to_string()),
        }
    }
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parses an ISO-8601 timestamp; naive timestamps are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Renders a run timestamp as `YYYY-MM-DD, HH:mm:ss UTC`.
pub fn format_utc(value: &Reported<String>) -> String {
    match value {
        Reported::Absent => "undefined".to_string(),
        Reported::Null => INVALID_DATE.to_string(),
        Reported::Present(raw) => match parse_timestamp(raw) {
            Some(ts) => format!("{} UTC", ts.format(DEFAULT_FORMAT)),
            None => INVALID_DATE.to_string(),
        },
    }
}

/// Label for an offset, e.g. `UTC+05:30 (+05:30)`.
pub fn offset_label(offset: &FixedOffset) -> String {
    if offset.local_minus_utc() == 0 {
        return "UTC (+00:00)".to_string();
    }
    format!("UTC{offset} ({offset})")
}

fn started_ended<Tz2: TimeZone>(start: DateTime<Tz2>, end: Option<DateTime<Tz2>>) -> String
where
    Tz2::Offset: fmt::Display,
{
    let mut html = format!("Started: {} <br>", start.format(DEFAULT_FORMAT));
    if let Some(end) = end {
        html.push_str(&format!("Ended: {} <br>", end.format(DEFAULT_FORMAT)));
    }
    html
}

fn in_local<L: LocalZone + ?Sized>(local: &L, ts: &DateTime<Utc>) -> DateTime<FixedOffset> {
    ts.with_timezone(&local.offset_at(ts))
}

/// Start/end block of the tooltip.
///
/// The DAG section is left out for UTC DAGs and when the DAG's offset at the
/// start date matches the viewer's.
pub fn tooltip_datetime<L: LocalZone + ?Sized>(
    start_date: &Reported<String>,
    end_date: &Reported<String>,
    dag_tz: &DagTimezone,
    local: &L,
) -> String {
    let Some(start) = start_date.as_option().and_then(|raw| parse_timestamp(raw)) else {
        return "<br><em>Not yet started</em>".to_string();
    };
    let end = end_date.as_option().and_then(|raw| parse_timestamp(raw));

    let mut html = String::from("<br><strong>UTC:</strong><br>");
    html.push_str(&started_ended(start, end));

    let local_start = in_local(local, &start);
    html.push_str(&format!(
        "<br><strong>Local: {}</strong><br>",
        offset_label(local_start.offset())
    ));
    html.push_str(&started_ended(local_start, end.map(|e| in_local(local, &e))));

    match dag_tz {
        DagTimezone::Offset(offset) if *offset != *local_start.offset() => {
            html.push_str(&format!(
                "<br><strong>DAG's TZ: {}</strong><br>",
                offset_label(offset)
            ));
            html.push_str(&started_ended(
                start.with_timezone(offset),
                end.map(|e| e.with_timezone(offset)),
            ));
        }
        DagTimezone::Named(tz) => {
            let dag_start = start.with_timezone(tz);
            if dag_start.offset().fix() != *local_start.offset() {
                html.push_str(&format!(
                    "<br><strong>DAG's TZ: {}</strong><br>",
                    dag_start.format("%Z (%:z)")
                ));
                html.push_str(&started_ended(dag_start, end.map(|e| e.with_timezone(tz))));
            }
        }
        // Unknown zones are reported once when the tooltip context is built.
        _ => {}
    }

    html
}
