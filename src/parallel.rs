//! Multi-threaded extraction with deterministic output order.
//!
//! A reader thread splits the dump into pages, worker threads run the
//! extraction, and the calling thread writes results back in page order.

use std::collections::BTreeMap;
use std::io::{BufRead, BufWriter, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::dump::{process_page, scan_pages, PageOutcome, Stats};
use crate::extract::{progress_spinner, report_progress, write_outcome};

#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Worker threads running the extraction.
    pub num_workers: usize,
    /// Capacity of the page and result channels.
    pub channel_buffer: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        let cpus = thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        Self {
            channel_buffer: 10000,
            num_workers: cpus.saturating_sub(1).max(1),
        }
    }
}

impl ParallelConfig {
    /// Total thread count, reader included. Zero keeps the default.
    pub fn with_threads(mut self, threads: usize) -> Self {
        if threads > 0 {
            self.num_workers = threads.saturating_sub(1).max(1);
        }
        self
    }
}

/// Outcome of one page, tagged with its position in the dump.
#[derive(Debug)]
struct ProcessedPage {
    page_id: usize,
    outcome: PageOutcome,
}

/// Extract pages on `config.num_workers` threads.
///
/// Output is byte-identical to the sequential run. With a `limit`, the run
/// stops once that many records have been written.
pub fn process_channel_pipeline<W: Write>(
    reader: impl BufRead + Send + 'static,
    writer: W,
    config: &ParallelConfig,
    limit: Option<usize>,
    quiet: bool,
) -> std::io::Result<Stats> {
    let (page_tx, page_rx): (SyncSender<(usize, String)>, Receiver<(usize, String)>) =
        sync_channel(config.channel_buffer);
    let (result_tx, result_rx): (SyncSender<ProcessedPage>, Receiver<ProcessedPage>) =
        sync_channel(config.channel_buffer);

    let limit_reached = Arc::new(AtomicBool::new(false));
    let start_time = Instant::now();

    let reader_limit_flag = Arc::clone(&limit_reached);
    let reader_handle = thread::spawn(move || read_pages_to_channel(reader, page_tx, &reader_limit_flag));

    let page_rx = Arc::new(Mutex::new(page_rx));
    let worker_handles: Vec<JoinHandle<()>> = (0..config.num_workers.max(1))
        .map(|_| {
            let rx = Arc::clone(&page_rx);
            let tx = result_tx.clone();
            let limit_flag = Arc::clone(&limit_reached);
            thread::spawn(move || process_pages_worker(rx, tx, &limit_flag))
        })
        .collect();

    // Both channels close once every worker is done, which also unblocks a
    // reader stuck sending after the limit was reached.
    drop(page_rx);
    drop(result_tx);

    let written = write_results_sorted(result_rx, writer, limit, &limit_reached, quiet, start_time);

    let read = reader_handle
        .join()
        .unwrap_or_else(|_| Err(std::io::Error::other("page reader panicked")));
    for handle in worker_handles {
        if handle.join().is_err() {
            tracing::error!("extraction worker panicked");
        }
    }

    let mut stats = written?;
    let pages_read = read?;
    if !limit_reached.load(Ordering::SeqCst) && pages_read != stats.pages_processed {
        return Err(std::io::Error::other(format!(
            "read {} pages but wrote results for {}",
            pages_read, stats.pages_processed
        )));
    }

    stats.elapsed = start_time.elapsed();
    tracing::debug!(
        workers = config.num_workers,
        pages = stats.pages_processed,
        records = stats.records_written,
        "pipeline extraction finished"
    );
    Ok(stats)
}

fn read_pages_to_channel(
    reader: impl BufRead,
    tx: SyncSender<(usize, String)>,
    limit_reached: &AtomicBool,
) -> std::io::Result<usize> {
    let mut page_id: usize = 0;
    scan_pages(reader, |page_xml| {
        if limit_reached.load(Ordering::Relaxed) {
            return false;
        }
        if tx.send((page_id, page_xml)).is_err() {
            return false;
        }
        page_id += 1;
        true
    })?;
    Ok(page_id)
}

fn process_pages_worker(
    rx: Arc<Mutex<Receiver<(usize, String)>>>,
    tx: SyncSender<ProcessedPage>,
    limit_reached: &AtomicBool,
) {
    loop {
        if limit_reached.load(Ordering::Relaxed) {
            break;
        }

        let item = {
            let lock = rx.lock().ok();
            lock.and_then(|guard| guard.recv().ok())
        };

        let Some((page_id, xml)) = item else {
            break;
        };
        // Skipped pages are sent too; the writer waits on every id.
        let outcome = process_page(&xml);
        if tx.send(ProcessedPage { page_id, outcome }).is_err() {
            break;
        }
    }
}

/// Write results in page order through a streaming reorder buffer.
///
/// Out-of-order results wait in a `BTreeMap` until their predecessors have
/// been written.
fn write_results_sorted<W: Write>(
    rx: Receiver<ProcessedPage>,
    writer: W,
    limit: Option<usize>,
    limit_reached: &AtomicBool,
    quiet: bool,
    start_time: Instant,
) -> std::io::Result<Stats> {
    let mut writer = BufWriter::with_capacity(256 * 1024, writer);
    let mut stats = Stats::default();
    let pb = progress_spinner(quiet);

    let mut pending: BTreeMap<usize, PageOutcome> = BTreeMap::new();
    let mut next_expected: usize = 0;

    for result in rx {
        pending.insert(result.page_id, result.outcome);

        while let Some(outcome) = pending.remove(&next_expected) {
            next_expected += 1;
            if write_outcome(outcome, &mut stats, &mut writer, limit)? {
                limit_reached.store(true, Ordering::SeqCst);
                writer.flush()?;
                pb.finish_and_clear();
                return Ok(stats);
            }
            report_progress(&pb, &stats, start_time);
        }
    }

    if !pending.is_empty() {
        tracing::warn!(stranded = pending.len(), next_expected, "results left in reorder buffer");
    }

    writer.flush()?;
    pb.finish_and_clear();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::run_sequential;
    use crate::extract::tests::{page, sample_dump};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Cursor;

    fn config(workers: usize) -> ParallelConfig {
        ParallelConfig {
            num_workers: workers,
            channel_buffer: 4,
        }
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(8)]
    fn pipeline_output_matches_sequential(#[case] workers: usize) {
        let mut sequential = Vec::new();
        let expected = run_sequential(Cursor::new(sample_dump()), &mut sequential, None, true).unwrap();

        let mut piped = Vec::new();
        let stats = process_channel_pipeline(
            Cursor::new(sample_dump()),
            &mut piped,
            &config(workers),
            None,
            true,
        )
        .unwrap();

        assert_eq!(String::from_utf8(piped).unwrap(), String::from_utf8(sequential).unwrap());
        assert_eq!(stats.pages_processed, expected.pages_processed);
        assert_eq!(stats.records_written, expected.records_written);
        assert_eq!(stats.redirects, 1);
    }

    #[test]
    fn pipeline_honours_record_limit() {
        let mut sequential = Vec::new();
        run_sequential(Cursor::new(sample_dump()), &mut sequential, Some(5), true).unwrap();

        let mut piped = Vec::new();
        let stats =
            process_channel_pipeline(Cursor::new(sample_dump()), &mut piped, &config(3), Some(5), true)
                .unwrap();

        assert_eq!(stats.records_written, 5);
        assert_eq!(piped, sequential);
    }

    #[test]
    fn limit_with_full_page_channel_returns() {
        let mut xml = String::from("<mediawiki>\n");
        for i in 0..2000 {
            xml.push_str(&page(
                &format!("w{}", i),
                "==German==\n===Adverb===\n{{de-adv}}\n\n# quickly\n",
            ));
        }
        xml.push_str("</mediawiki>\n");

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let mut out = Vec::new();
            let stats = process_channel_pipeline(Cursor::new(xml), &mut out, &config(2), Some(1), true);
            done_tx.send(stats.map(|s| s.records_written)).ok();
        });

        let written = done_rx
            .recv_timeout(std::time::Duration::from_secs(20))
            .expect("pipeline did not finish after reaching its limit");
        assert_eq!(written.unwrap(), 1);
    }

    #[test]
    fn empty_dump_writes_nothing() {
        let mut out = Vec::new();
        let stats =
            process_channel_pipeline(Cursor::new("<mediawiki/>"), &mut out, &config(2), None, true).unwrap();
        assert_eq!(stats.pages_processed, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn thread_count_leaves_room_for_the_reader() {
        assert_eq!(ParallelConfig::default().with_threads(4).num_workers, 3);
        assert_eq!(ParallelConfig::default().with_threads(1).num_workers, 1);
        let default_workers = ParallelConfig::default().num_workers;
        assert_eq!(ParallelConfig::default().with_threads(0).num_workers, default_workers);
    }
}
