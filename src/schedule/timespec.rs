//! Decoder for the compact schedule strings printed in the report.
//!
//! A schedule string is one or more segments joined by `" y "`, each segment a
//! comma-separated run of day codes followed by an interval:
//!
//! ```text
//! LU,MA 08:00 a 10:00 y MI 10:00 a 12:00
//! ```
//!
//! The text is free-form legacy output, so decoding is best-effort: segments
//! that don't match are dropped rather than failing the whole string.

use chrono::NaiveTime;
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

use crate::schedule::models::{Day, TimeBlock};

const SEGMENT_SEPARATOR: &str = " y ";

static SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z,]+)\s+(\d{2}:\d{2})\s+a\s+(\d{2}:\d{2})").expect("valid segment regex")
});

/// Expand a schedule string into one [`TimeBlock`] per (day, interval) pair.
///
/// Returns an empty vector for empty or entirely undecodable input.
pub fn parse_schedule(raw: &str) -> Vec<TimeBlock> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    raw.split(SEGMENT_SEPARATOR)
        .flat_map(|segment| parse_segment(segment.trim()))
        .collect()
}

fn parse_segment(segment: &str) -> Vec<TimeBlock> {
    let Some(caps) = SEGMENT_RE.captures(segment) else {
        trace!(segment, "schedule segment does not match day/time pattern");
        return Vec::new();
    };

    let (Some(start), Some(end)) = (parse_clock(&caps[2]), parse_clock(&caps[3])) else {
        trace!(segment, "schedule segment has an unreadable time");
        return Vec::new();
    };

    caps[1]
        .split(',')
        .map(str::trim)
        .filter_map(|token| {
            let day = Day::from_code(token);
            if day.is_none() && !token.is_empty() {
                trace!(token, segment, "dropping unknown day token");
            }
            day
        })
        .filter_map(|day| match TimeBlock::new(day, start, end) {
            Ok(block) => Some(block),
            Err(reason) => {
                trace!(segment, reason = %reason, "dropping schedule segment");
                None
            }
        })
        .collect()
}

fn parse_clock(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M").ok()
}
