//! Parser for the group-saturation report table.
//!
//! The report is one big `<table>` where groups are introduced by a header row
//! (`"3 SEMESTRE:4 GRUPO:9021"`) and followed by one row per course offered in
//! that group. Course rows carry a 4-digit course code somewhere in their first
//! few cells; the cells after it are, in order, name, schedule, instructor and room.
//! Everything else in the table is layout filler.

use html_scraper::{ElementRef, Html, Selector};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, trace};
use unicode_normalization::UnicodeNormalization;

use crate::schedule::models::TimeBlock;
use crate::schedule::timespec::parse_schedule;

/// Number of leading cells searched for the course-code anchor.
const ANCHOR_SCAN_CELLS: usize = 9;

const DEFAULT_SEMESTER: &str = "00";
const DEFAULT_GROUP: &str = "0000";

const MISSING_NAME: &str = "Sin nombre";
const MISSING_INSTRUCTOR: &str = "Sin profesor";
const MISSING_ROOM: &str = "Sin salón";

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\s+SEMESTRE:").expect("valid header regex"));
static SEMESTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SEMESTRE:\s*(\d+)").expect("valid semester regex"));
static GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"GRUPO:\s*(\w+)").expect("valid group regex"));

/// The report body did not contain anything resembling the schedule table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no schedule table found in report")]
pub struct NoTableFound;

/// One course row as read from the table, before aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub code: String,
    pub name: String,
    pub semester: String,
    pub group_id: String,
    pub instructor: String,
    pub room: String,
    pub blocks: Vec<TimeBlock>,
    /// The schedule cell as printed, kept for diagnostics.
    pub schedule_raw: String,
}

/// Text content of one `<tr>`: the whole row plus each `td`/`th` cell, normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCells {
    pub text: String,
    pub cells: Vec<String>,
}

impl RowCells {
    fn from_element(row: ElementRef<'_>, cell_sel: &Selector) -> Self {
        Self {
            text: normalize_text(row.text()),
            cells: row
                .select(cell_sel)
                .map(|cell| normalize_text(cell.text()))
                .collect(),
        }
    }
}

/// Group context carried from a header row to the course rows beneath it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub semester: Option<String>,
    pub group: Option<String>,
}

/// What a single row means given the current scan state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Header { semester: String, group: String },
    Course(RawRecord),
    Filler,
}

/// Fields positioned relative to the course-code anchor cell.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AnchoredFields {
    code: String,
    name: String,
    schedule: String,
    instructor: String,
    room: String,
}

/// Read the course fields that follow the anchor cell, substituting placeholders
/// for cells the row doesn't have.
fn fields_from_anchor(cells: &[String], anchor: usize) -> AnchoredFields {
    let at = |offset: usize, fallback: &str| {
        cells
            .get(anchor + offset)
            .cloned()
            .unwrap_or_else(|| fallback.to_owned())
    };

    AnchoredFields {
        code: cells[anchor].clone(),
        name: at(1, MISSING_NAME),
        schedule: at(2, ""),
        instructor: at(3, MISSING_INSTRUCTOR),
        room: at(4, MISSING_ROOM),
    }
}

fn is_course_code(text: &str) -> bool {
    text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit())
}

fn find_anchor(cells: &[String]) -> Option<usize> {
    cells
        .iter()
        .take(ANCHOR_SCAN_CELLS)
        .position(|cell| is_course_code(cell))
}

fn parse_header(text: &str) -> Option<(String, String)> {
    if !HEADER_RE.is_match(text) {
        return None;
    }

    let semester = SEMESTER_RE
        .captures(text)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| DEFAULT_SEMESTER.to_owned());
    let group = GROUP_RE
        .captures(text)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| DEFAULT_GROUP.to_owned());

    Some((semester, group))
}

/// Classify one row against the current scan state.
pub fn classify_row(state: &ScanState, row: &RowCells) -> RowKind {
    if let Some((semester, group)) = parse_header(&row.text) {
        return RowKind::Header { semester, group };
    }

    let Some(group_id) = state.group.as_deref() else {
        return RowKind::Filler;
    };
    let Some(anchor) = find_anchor(&row.cells) else {
        return RowKind::Filler;
    };

    let fields = fields_from_anchor(&row.cells, anchor);
    let blocks = parse_schedule(&fields.schedule);
    if blocks.is_empty() {
        debug!(
            code = %fields.code,
            group = group_id,
            schedule = %fields.schedule,
            "course row has no decodable schedule, skipping"
        );
        return RowKind::Filler;
    }

    RowKind::Course(RawRecord {
        code: fields.code,
        name: fields.name,
        semester: state
            .semester
            .clone()
            .unwrap_or_else(|| DEFAULT_SEMESTER.to_owned()),
        group_id: group_id.to_owned(),
        instructor: fields.instructor,
        room: fields.room,
        blocks,
        schedule_raw: fields.schedule,
    })
}

/// Fold rows top-to-bottom into the course records they describe.
pub fn scan_rows<I>(rows: I) -> Vec<RawRecord>
where
    I: IntoIterator<Item = RowCells>,
{
    let (_, records) = rows.into_iter().fold(
        (ScanState::default(), Vec::new()),
        |(mut state, mut records), row| {
            match classify_row(&state, &row) {
                RowKind::Header { semester, group } => {
                    trace!(semester = %semester, group = %group, "entering group");
                    state.semester = Some(semester);
                    state.group = Some(group);
                }
                RowKind::Course(record) => records.push(record),
                RowKind::Filler => {}
            }
            (state, records)
        },
    );
    records
}

/// Find the report table: by its known id, then the first table, then anything
/// whose id looks like a table.
///
/// The last tier only avoids `NoTableFound`: the HTML parser drops `<tr>`
/// elements outside a `<table>`, so such a container yields no rows.
fn locate_table(doc: &Html) -> Option<ElementRef<'_>> {
    const CANDIDATES: [&str; 3] = ["table#despimp", "table", r#"[id*="table"]"#];

    CANDIDATES.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        doc.select(&selector).next()
    })
}

/// Parse a report body into raw course records.
pub fn parse_report(html: &str) -> Result<Vec<RawRecord>, NoTableFound> {
    let doc = Html::parse_document(html);
    let table = locate_table(&doc).ok_or(NoTableFound)?;

    let row_sel = Selector::parse("tr").expect("valid row selector");
    let cell_sel = Selector::parse("td, th").expect("valid cell selector");

    let rows: Vec<RowCells> = table
        .select(&row_sel)
        .map(|row| RowCells::from_element(row, &cell_sel))
        .collect();
    debug!(rows = rows.len(), "scanning report table");

    Ok(scan_rows(rows))
}

/// Join text nodes with spaces, NFC-normalize, and collapse whitespace runs.
fn normalize_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let joined: String = parts.collect::<Vec<_>>().join(" ").nfc().collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}
