//! HTML report → canonical course catalog.
//!
//! Pure data transforms: [`table`] reads rows, [`timespec`] decodes schedule
//! strings, [`aggregate`] folds rows into courses. Nothing here does I/O.

pub mod aggregate;
pub mod models;
pub mod table;
pub mod timespec;

pub use aggregate::aggregate_courses;
pub use models::{CourseRecord, Day, GroupRecord, ProgramCatalog, TimeBlock};
pub use table::{NoTableFound, RawRecord, parse_report};
pub use timespec::parse_schedule;

use crate::acatlan::ProgramRef;

/// Parse a populated report body into the catalog for `program`.
pub fn build_catalog(program: &ProgramRef, html: &str) -> Result<ProgramCatalog, NoTableFound> {
    let records = parse_report(html)?;
    let courses = aggregate_courses(records);
    Ok(ProgramCatalog::new(
        program.code.as_str(),
        program.name.as_str(),
        courses,
    ))
}
