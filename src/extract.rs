//! Sequential dump-to-records extraction.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::time::Instant;

use crate::dump::{process_page, scan_pages, PageOutcome, Stats};

/// Spinner for long scans, hidden when `quiet`.
pub fn progress_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb
}

pub(crate) fn report_progress(pb: &ProgressBar, stats: &Stats, start_time: Instant) {
    if stats.pages_processed % 10000 != 0 {
        return;
    }
    let rate = stats.pages_processed as f64 / start_time.elapsed().as_secs_f64();
    pb.set_message(format!(
        "Pages: {} | Records: {} | Rate: {:.0} pg/s",
        stats.pages_processed, stats.records_written, rate
    ));
}

/// Count `outcome` and write its record, if any, as one JSON line.
///
/// Returns `true` once `limit` records have been written.
pub fn write_outcome<W: Write>(
    outcome: PageOutcome,
    stats: &mut Stats,
    writer: &mut W,
    limit: Option<usize>,
) -> std::io::Result<bool> {
    stats.record_outcome(&outcome);
    if let PageOutcome::Record(record) = outcome {
        serde_json::to_writer(&mut *writer, &record)?;
        writer.write_all(b"\n")?;
        stats.records_written += 1;
        stats.entries_written += record.entries().len();
    }
    Ok(limit.is_some_and(|l| stats.records_written >= l))
}

/// Extract every page on the calling thread.
pub fn run_sequential<W: Write>(
    reader: impl BufRead,
    writer: &mut W,
    limit: Option<usize>,
    quiet: bool,
) -> std::io::Result<Stats> {
    let start_time = Instant::now();
    let mut stats = Stats::default();
    let pb = progress_spinner(quiet);
    let mut write_error = None;

    scan_pages(reader, |page_xml| {
        let outcome = process_page(&page_xml);
        match write_outcome(outcome, &mut stats, writer, limit) {
            Ok(limit_reached) => {
                report_progress(&pb, &stats, start_time);
                !limit_reached
            }
            Err(e) => {
                write_error = Some(e);
                false
            }
        }
    })?;

    if let Some(e) = write_error {
        return Err(e);
    }
    writer.flush()?;
    pb.finish_and_clear();

    stats.elapsed = start_time.elapsed();
    tracing::debug!(
        pages = stats.pages_processed,
        records = stats.records_written,
        "sequential extraction finished"
    );
    Ok(stats)
}
