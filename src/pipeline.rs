//! Streaming fan-out/fan-in over input lines.
//!
//! One producer reads lines and hands them to a pool of workers in batches.
//! Each worker pushes every line's result onto a shared result stream, which
//! the calling thread drains into the output and error sinks. Lines are not
//! ordered relative to each other; the rows of a single line stay together
//! and in allele order.
//!
//! The result stream may only close once every dispatched line has been
//! pushed. The producer counts lines in on a [`Completion`], workers count
//! them out after sending, and the producer holds its own handle to the
//! stream until the count returns to zero.

use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::process::{write_output_header, LineProcessor, LineResult};
use crate::site::{trim_line_end, Header};

const BATCH_SIZE: usize = 64;
const BATCHES_PER_WORKER: usize = 2;
const FLUSH_THRESHOLD: usize = 100_000;

type Batch = Vec<Vec<u8>>;

/// Count of dispatched lines whose results have not been pushed yet.
#[derive(Debug, Default)]
pub struct Completion {
    pending: Mutex<usize>,
    drained: Condvar,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        // The count stays consistent even if a holder panicked
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add(&self, n: usize) {
        *self.lock() += n;
    }

    pub fn done(&self, n: usize) {
        let mut pending = self.lock();
        *pending = pending.saturating_sub(n);

        if *pending == 0 {
            self.drained.notify_all();
        }
    }

    pub fn pending(&self) -> usize {
        *self.lock()
    }

    /// Blocks until every added line has been marked done.
    pub fn wait(&self) {
        let pending = self.lock();
        let _drained = self
            .drained
            .wait_while(pending, |pending| *pending > 0)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
    }

    /// Tracks the lines of one batch; whatever is left unmarked is marked done
    /// on drop, so a panicking worker cannot leave the producer waiting.
    pub fn ticket(&self, n: usize) -> Ticket<'_> {
        Ticket {
            completion: self,
            remaining: n,
        }
    }
}

pub struct Ticket<'a> {
    completion: &'a Completion,
    remaining: usize,
}

impl Ticket<'_> {
    pub fn done_one(&mut self) {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.completion.done(1);
        }
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        if self.remaining > 0 {
            self.completion.done(self.remaining);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Non-blank input lines after the header.
    pub lines: u64,
    pub rows: u64,
    pub rejected: u64,
}

#[derive(Debug, Default)]
struct Drained {
    results: u64,
    rows: u64,
    rejected: u64,
}

/// Converts the whole stream: header first, then one site per line.
///
/// Rows go to `out`, rejected lines to `err` exactly as read.
pub fn run<R, W, E>(
    mut reader: R,
    out: &mut W,
    err: &mut E,
    config: &Config,
) -> Result<RunSummary>
where
    R: BufRead + Send,
    W: Write,
    E: Write,
{
    config.validate()?;

    let header = read_header(&mut reader)?;
    info!(
        "Found {} samples across {} header columns",
        header.n_samples(),
        header.n_columns()
    );

    if config.write_header {
        let mut buffer = Vec::new();
        write_output_header(&mut buffer);
        out.write_all(&buffer)?;
    }

    let processor = LineProcessor::new(header, config.clone());
    let summary = stream(reader, out, err, &processor, config.threads)?;

    info!(
        "Processed {} lines: wrote {} rows, rejected {} lines, cached {} allele patterns",
        summary.lines,
        summary.rows,
        summary.rejected,
        processor.cache().len()?
    );

    Ok(summary)
}

/// Runs the producer, `threads` workers and the consumer over the lines
/// following the header.
fn stream<R, W, E>(
    reader: R,
    out: &mut W,
    err: &mut E,
    processor: &LineProcessor,
    threads: usize,
) -> Result<RunSummary>
where
    R: BufRead + Send,
    W: Write,
    E: Write,
{
    let completion = Completion::new();
    let aborted = AtomicBool::new(false);

    let (work_tx, work_rx) = bounded::<Batch>(threads * BATCHES_PER_WORKER);
    let (result_tx, result_rx) = bounded::<LineResult>(threads * BATCH_SIZE);

    thread::scope(|s| -> Result<RunSummary> {
        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let completion = &completion;

                s.spawn(move || work(processor, work_rx, result_tx, completion))
            })
            .collect();
        drop(work_rx);

        let producer = {
            let completion = &completion;
            let aborted = &aborted;

            s.spawn(move || dispatch(reader, work_tx, result_tx, completion, aborted))
        };

        let drained = drain(result_rx, out, err);
        if drained.is_err() {
            aborted.store(true, Ordering::Relaxed);
        }

        let lines = producer
            .join()
            .map_err(|_| Error::coordination("line reader panicked"))?;

        let mut worker_failure = None;
        for worker in workers {
            let outcome = worker
                .join()
                .map_err(|_| Error::coordination("line worker panicked"))
                .and_then(|outcome| outcome);

            if let Err(e) = outcome {
                worker_failure.get_or_insert(e);
            }
        }

        let drained = drained?;
        let lines = lines?;
        if let Some(e) = worker_failure {
            return Err(e);
        }

        if completion.pending() != 0 || drained.results != lines {
            return Err(Error::coordination(format!(
                "result stream closed after {} of {} lines",
                drained.results, lines
            )));
        }

        Ok(RunSummary {
            lines,
            rows: drained.rows,
            rejected: drained.rejected,
        })
    })
}

fn read_header<R: BufRead>(reader: &mut R) -> Result<Header> {
    let mut line = Vec::with_capacity(10_000);

    if reader.read_until(b'\n', &mut line)? == 0 {
        return Err(Error::header("input is empty"));
    }

    let line = std::str::from_utf8(trim_line_end(&line))
        .map_err(|_| Error::header("header is not valid UTF-8"))?;

    Header::parse(line)
}

/// Producer: reads and batches lines, then closes its side of both channels,
/// the result stream only after every dispatched line is done.
fn dispatch<R: BufRead>(
    mut reader: R,
    work_tx: Sender<Batch>,
    result_tx: Sender<LineResult>,
    completion: &Completion,
    aborted: &AtomicBool,
) -> Result<u64> {
    let mut n_lines: u64 = 0;
    let mut lines: Batch = Vec::with_capacity(BATCH_SIZE);

    let read = loop {
        if aborted.load(Ordering::Relaxed) {
            break Ok(());
        }

        let mut buf: Vec<u8> = Vec::new();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break Ok(()),
            Ok(_) => {}
            Err(e) => break Err(Error::from(e)),
        }

        if trim_line_end(&buf).is_empty() {
            continue;
        }

        lines.push(buf);
        n_lines += 1;

        if lines.len() >= BATCH_SIZE {
            let batch = std::mem::replace(&mut lines, Vec::with_capacity(BATCH_SIZE));
            if let Err(e) = send_batch(&work_tx, batch, completion) {
                break Err(e);
            }
        }
    };

    let read = read.and_then(|_| {
        if lines.is_empty() {
            Ok(())
        } else {
            send_batch(&work_tx, lines, completion)
        }
    });

    drop(work_tx);
    completion.wait();
    drop(result_tx);

    read.map(|_| n_lines)
}

fn send_batch(work_tx: &Sender<Batch>, batch: Batch, completion: &Completion) -> Result<()> {
    let n = batch.len();
    completion.add(n);

    if work_tx.send(batch).is_err() {
        completion.done(n);
        return Err(Error::coordination("no line workers left to take work"));
    }

    Ok(())
}

/// Worker: processes each line and pushes its result as one unit.
///
/// After a cache failure the worker stops processing but keeps draining its
/// batches so the completion count still reaches zero.
fn work(
    processor: &LineProcessor,
    batches: Receiver<Batch>,
    results: Sender<LineResult>,
    completion: &Completion,
) -> Result<()> {
    let mut failure: Option<Error> = None;

    for batch in batches.iter() {
        let mut ticket = completion.ticket(batch.len());

        for line in batch {
            if failure.is_none() {
                match processor.process_line(line) {
                    // Fails only once the consumer is gone, which it reports itself
                    Ok(result) => {
                        let _ = results.send(result);
                    }
                    Err(e) => failure = Some(e),
                }
            }

            ticket.done_one();
        }
    }

    failure.map_or(Ok(()), Err)
}

/// Consumer: the only writer to the sinks.
fn drain<W: Write, E: Write>(
    results: Receiver<LineResult>,
    out: &mut W,
    err: &mut E,
) -> Result<Drained> {
    let mut drained = Drained::default();
    let mut buffer: Vec<u8> = Vec::with_capacity(FLUSH_THRESHOLD);

    for result in results.iter() {
        drained.results += 1;

        match result {
            LineResult::Rows(rows) => {
                for row in rows.iter() {
                    row.write_tsv(&mut buffer);
                }
                drained.rows += rows.len() as u64;

                if buffer.len() >= FLUSH_THRESHOLD {
                    out.write_all(&buffer)?;
                    buffer.clear();
                }
            }
            LineResult::Rejected(raw, _) => {
                drained.rejected += 1;
                err.write_all(&raw)?;
                if !raw.ends_with(b"\n") {
                    err.write_all(b"\n")?;
                }
            }
        }
    }

    out.write_all(&buffer)?;
    out.flush()?;
    err.flush()?;

    Ok(drained)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn completion_wait_returns_when_counter_drains() {
        let completion = Completion::new();
        let finished = AtomicUsize::new(0);

        completion.add(8);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    finished.fetch_add(1, Ordering::SeqCst);
                    completion.done(1);
                });
            }

            completion.wait();
            assert_eq!(finished.load(Ordering::SeqCst), 8);
        });

        assert_eq!(completion.pending(), 0);
    }

    #[test]
    fn dropped_ticket_releases_remaining_lines() {
        let completion = Completion::new();
        completion.add(5);

        {
            let mut ticket = completion.ticket(5);
            ticket.done_one();
            ticket.done_one();
            assert_eq!(completion.pending(), 3);
        }

        assert_eq!(completion.pending(), 0);
        completion.wait();
    }

    #[test]
    fn empty_input_is_a_header_error() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = run(&b""[..], &mut out, &mut err, &Config::default());
        assert!(matches!(result, Err(Error::Header { .. })));
    }

    #[test]
    fn invalid_config_fails_before_reading() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let config = Config {
            threads: 0,
            ..Config::default()
        };
        let result = run(&b"Fragment"[..], &mut out, &mut err, &config);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let input = "Fragment\tPosition\tReference\tAlleles\tAllele_counts\tType\tS1\t \n\
                     \n\
                     chr1\t1\tC\tT\t1\tSNP\tT\t1\r\n\
                     \r\n";

        let mut out = Vec::new();
        let mut err = Vec::new();
        let config = Config {
            threads: 2,
            ..Config::default()
        };

        let summary = run(input.as_bytes(), &mut out, &mut err, &config).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                lines: 1,
                rows: 1,
                rejected: 0,
            }
        );
        assert_eq!(out, b"chr1\t1\tC\tT\tSNP\t!\tS1\t!\n");
        assert!(err.is_empty());
    }

    #[test]
    fn worker_failure_fails_the_run_without_hanging() {
        let columns = "Fragment\tPosition\tReference\tAlleles\tAllele_counts\tType\tS1\t ";
        let processor = LineProcessor::new(Header::parse(columns).unwrap(), Config::default());
        processor.cache().poison();

        let mut input = String::new();
        for idx in 0..(BATCH_SIZE * 10) {
            input.push_str(&format!("chr1\t{}\tC\tA,T\t1\tSNP\tW\t1\n", idx));
        }

        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = stream(input.as_bytes(), &mut out, &mut err, &processor, 4);

        assert!(matches!(result, Err(Error::Coordination { .. })));
        assert!(out.is_empty());
    }
}
