//! Canonical catalog types produced by the schedule pipeline.
//!
//! Everything here is built once per run and never mutated afterwards. The
//! serialized shape is what the web frontend reads, so field names are camelCase.

use chrono::{DateTime, NaiveTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Weekday on which a class meets. The source system never schedules Sundays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Day {
    #[serde(rename = "LU")]
    Monday,
    #[serde(rename = "MA")]
    Tuesday,
    #[serde(rename = "MI")]
    Wednesday,
    #[serde(rename = "JU")]
    Thursday,
    #[serde(rename = "VI")]
    Friday,
    #[serde(rename = "SA")]
    Saturday,
}

impl Day {
    /// Parse a two-letter day code as printed in schedule strings (`"LU"`, `"MI"`, ...).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "LU" => Some(Self::Monday),
            "MA" => Some(Self::Tuesday),
            "MI" => Some(Self::Wednesday),
            "JU" => Some(Self::Thursday),
            "VI" => Some(Self::Friday),
            "SA" => Some(Self::Saturday),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Monday => "LU",
            Self::Tuesday => "MA",
            Self::Wednesday => "MI",
            Self::Thursday => "JU",
            Self::Friday => "VI",
            Self::Saturday => "SA",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// `"HH:MM"` serialization for meeting times.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// One weekly meeting: a day plus a time interval with the invariant `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TimeBlock {
    pub day: Day,
    #[serde(with = "hhmm")]
    #[ts(type = "string")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    #[ts(type = "string")]
    pub end: NaiveTime,
}

impl TimeBlock {
    /// Creates a new `TimeBlock`, returning an error unless `start` is before `end`.
    pub fn new(day: Day, start: NaiveTime, end: NaiveTime) -> Result<Self, String> {
        if start >= end {
            return Err(format!(
                "invalid time block on {day}: start ({start}) is not before end ({end})"
            ));
        }
        Ok(Self { day, start, end })
    }
}

/// One scheduled offering of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GroupRecord {
    pub group_id: String,
    pub instructor: String,
    pub room: String,
    pub blocks: Vec<TimeBlock>,
}

/// All groups offered for one course code within a program.
///
/// The code is the key of [`ProgramCatalog::courses`] and is not repeated in
/// the serialized object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct CourseRecord {
    #[serde(skip)]
    #[ts(skip)]
    pub code: String,
    pub name: String,
    pub semester: String,
    pub groups: Vec<GroupRecord>,
}

/// Every course of one degree program, as retrieved in a single run.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProgramCatalog {
    pub code: String,
    pub name: String,
    pub retrieved_at: DateTime<Utc>,
    pub courses: IndexMap<String, CourseRecord>,
}

impl ProgramCatalog {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        courses: IndexMap<String, CourseRecord>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            retrieved_at: Utc::now(),
            courses,
        }
    }

    /// Catalog for a program whose report came back without any schedule data.
    pub fn empty(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(code, name, IndexMap::new())
    }

    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    pub fn group_count(&self) -> usize {
        self.courses.values().map(|c| c.groups.len()).sum()
    }
}
