use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::schedule::models::{CourseRecord, GroupRecord};
use crate::schedule::table::RawRecord;

/// Fold raw rows into one [`CourseRecord`] per course code.
///
/// The first row seen for a code decides the course name and semester; every
/// row contributes a group, in stream order.
pub fn aggregate_courses<I>(records: I) -> IndexMap<String, CourseRecord>
where
    I: IntoIterator<Item = RawRecord>,
{
    records
        .into_iter()
        .fold(IndexMap::new(), |mut courses, record| {
            let group = GroupRecord {
                group_id: record.group_id,
                instructor: record.instructor,
                room: record.room,
                blocks: record.blocks,
            };

            match courses.entry(record.code) {
                Entry::Occupied(mut entry) => entry.get_mut().groups.push(group),
                Entry::Vacant(entry) => {
                    let code = entry.key().clone();
                    entry.insert(CourseRecord {
                        code,
                        name: record.name,
                        semester: record.semester,
                        groups: vec![group],
                    });
                }
            }
            courses
        })
}
