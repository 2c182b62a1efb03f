//! Grouping projected records by owning policy assignment.
//!
//! Reduced projections drop `policyAssignmentId`, so each projected record is
//! matched back to its raw source by `name`. Collections are at most a few
//! hundred records per subscription, so the lookup is a linear scan.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::projection::ProjectedRecord;
use crate::record::ExemptionRecord;

/// Projected records keyed by assignment name, both levels sorted.
pub type GroupedExemptions = BTreeMap<String, Vec<ProjectedRecord>>;

/// Group `projected` by the last path segment of each record's policy assignment.
///
/// Records whose source has no usable `policyAssignmentId` are dropped. Keys
/// are ordered ordinally; members are ordered by `name`, missing names first.
pub fn group_by_assignment(
    projected: Vec<ProjectedRecord>,
    raw: &[ExemptionRecord],
) -> GroupedExemptions {
    let mut groups = GroupedExemptions::new();
    for record in projected {
        let Some(key) = lookup_assignment_id(&record, raw).and_then(assignment_key) else {
            continue;
        };
        groups.entry(key.to_owned()).or_default().push(record);
    }
    for members in groups.values_mut() {
        members.sort_by(compare_by_name);
    }
    groups
}

/// Last non-empty `/`-delimited segment of an assignment id.
pub fn assignment_key(assignment_id: &str) -> Option<&str> {
    assignment_id.split('/').rev().find(|segment| !segment.is_empty())
}

/// `policyAssignmentId` of the first raw record sharing this record's name.
fn lookup_assignment_id<'a>(
    record: &ProjectedRecord,
    raw: &'a [ExemptionRecord],
) -> Option<&'a str> {
    let name = record.get("name").and_then(Value::as_str)?;
    raw.iter()
        .filter(|source| source.name() == Some(name))
        .find_map(|source| source.property("policyAssignmentId"))
        .and_then(Value::as_str)
}

fn compare_by_name(a: &ProjectedRecord, b: &ProjectedRecord) -> Ordering {
    fn name(record: &ProjectedRecord) -> Option<&str> {
        record.get("name").and_then(Value::as_str)
    }
    name(a).cmp(&name(b))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
