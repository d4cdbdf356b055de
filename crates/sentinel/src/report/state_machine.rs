//! Report state machine (C11).
//!
//! Grounded on `certificatesentinel_controller_reports.go`'s
//! `processReport`: per-watch reporting cadence, with the unset-status
//! heuristic that forces a dispatch on a watch's very first pass.

use crate::types::ReportInterval;

pub const DAILY_SECS: i64 = 86_400;
pub const WEEKLY_SECS: i64 = 604_800;
pub const MONTHLY_SECS: i64 = 2_592_000;
pub const DEBUG_SECS: i64 = 300;

pub fn interval_seconds(interval: &ReportInterval) -> i64 {
    match interval {
        ReportInterval::Daily | ReportInterval::Unknown => DAILY_SECS,
        ReportInterval::Weekly => WEEKLY_SECS,
        ReportInterval::Monthly => MONTHLY_SECS,
        ReportInterval::Debug => DEBUG_SECS,
    }
}

/// `stored_last_report_sent == 0` means the watch has never dispatched;
/// treat it as "now" for this pass's decision, without writing it back
/// (the actual status write only happens after a successful dispatch, I6).
pub fn effective_last_report_sent(stored: i64, now: i64) -> i64 {
    if stored == 0 {
        now
    } else {
        stored
    }
}

pub fn should_dispatch(effective_last_report_sent: i64, now: i64, interval_secs: i64) -> bool {
    now >= effective_last_report_sent + interval_secs || effective_last_report_sent == now
}
