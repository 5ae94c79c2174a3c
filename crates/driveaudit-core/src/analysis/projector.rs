/// Row projector: record + share lookup + window → report row.
use crate::model::{FileRecord, ReportRow, ShareLookup, TimeWindow};

/// Build the report row for one record.
///
/// `modified_in_window` holds when the record was modified at or after the
/// boundary; `stale_but_recently_modified` additionally requires that it
/// was created before the boundary.
pub fn project(
    record: &FileRecord,
    share: &ShareLookup,
    queried_owner: &str,
    window: &TimeWindow,
) -> ReportRow {
    let modified_in_window = window.contains(record.modified_time);
    let stale_but_recently_modified = !window.contains(record.created_time) && modified_in_window;
    let info = share.info();

    ReportRow {
        title: record.name.clone(),
        queried_owner: queried_owner.to_string(),
        file_id: record.id.to_string(),
        modified_time: record.modified_time,
        owner_email: record.owner_email().to_string(),
        mime_type: record.mime_type.to_string(),
        created_time: record.created_time,
        modified_in_window,
        stale_but_recently_modified,
        shared_with_others: info.shared_with_others,
        share_count: info.share_count,
    }
}
