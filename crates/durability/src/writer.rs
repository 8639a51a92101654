//! Asynchronous audit writer.
//!
//! Producers enqueue records into a bounded FIFO queue; one dedicated
//! consumer thread drains it into a [`RotatingFile`]. A full queue blocks
//! producers until the consumer catches up.
//!
//! The consumer also drives the periodic work: `rotate_if_needed` after every
//! record, and a rotation plus retention check every `check_interval` even
//! when no records arrive.

use crate::rotation::{RotatingFile, SharedRotatingFile};
use auditlog_core::{Error, FileWriterConfig, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, error, warn};

struct QueueState {
    records: VecDeque<String>,
    stopped: bool,
}

struct WriterInner {
    queue: Mutex<QueueState>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
    done: Mutex<bool>,
    done_cond: Condvar,
}

#[derive(Debug, Clone, Copy)]
struct ConsumerSettings {
    poll_timeout: Duration,
    check_interval: Duration,
    auto_flush: bool,
}

/// Bounded, single-consumer writer in front of a [`RotatingFile`].
///
/// Records are written in the order they were accepted. `write` blocks while
/// the queue is full and fails with [`Error::WriterClosed`] once the writer
/// is shut down. Dropping the writer shuts it down.
pub struct AsyncWriter {
    inner: Arc<WriterInner>,
    file: SharedRotatingFile,
    consumer: Mutex<Option<JoinHandle<()>>>,
    shutdown_timeout: Duration,
}

impl AsyncWriter {
    /// Open the active file at `path` and start the consumer thread.
    pub fn open(path: impl Into<PathBuf>, config: &FileWriterConfig) -> Result<Self> {
        let file = RotatingFile::open(path, config)?;
        Self::start(file, config)
    }

    /// Start a consumer thread over an already opened file.
    ///
    /// Use this to install rotation hooks before any record is written.
    pub fn start(file: RotatingFile, config: &FileWriterConfig) -> Result<Self> {
        config.validate()?;

        let inner = Arc::new(WriterInner {
            queue: Mutex::new(QueueState {
                records: VecDeque::with_capacity(config.buffer_capacity.min(1024)),
                stopped: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity: config.buffer_capacity,
            done: Mutex::new(false),
            done_cond: Condvar::new(),
        });
        let file: SharedRotatingFile = Arc::new(Mutex::new(file));
        let settings = ConsumerSettings {
            poll_timeout: config.poll_timeout,
            check_interval: config.check_interval,
            auto_flush: config.auto_flush,
        };

        let inner_clone = Arc::clone(&inner);
        let file_clone = Arc::clone(&file);
        let handle = std::thread::Builder::new()
            .name("auditlog-writer".to_string())
            .spawn(move || consumer_loop(&inner_clone, &file_clone, settings))?;

        debug!(target: "auditlog::writer", capacity = config.buffer_capacity, "Started writer thread");

        Ok(AsyncWriter {
            inner,
            file,
            consumer: Mutex::new(Some(handle)),
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Enqueue a record, blocking while the queue is full.
    pub fn write(&self, record: impl Into<String>) -> Result<()> {
        let mut queue = self.inner.queue.lock();
        loop {
            if queue.stopped {
                return Err(Error::WriterClosed);
            }
            if queue.records.len() < self.inner.capacity {
                break;
            }
            self.inner.not_full.wait(&mut queue);
        }
        queue.records.push_back(record.into());
        self.inner.not_empty.notify_one();
        Ok(())
    }

    /// Flush the active file. Failures are logged, not returned.
    pub fn flush(&self) {
        if let Err(e) = self.file.lock().flush() {
            error!(target: "auditlog::writer", error = %e, "Failed to flush audit file");
        }
    }

    /// Rotate now if a rotation rule fires.
    pub fn rotate_if_needed(&self) -> Result<bool> {
        self.file.lock().rotate_if_needed()
    }

    /// Rotate now regardless of the rules.
    pub fn force_rotation(&self) -> Result<bool> {
        self.file.lock().force_rotation()
    }

    /// Bytes written to the active file.
    pub fn bytes_written(&self) -> u64 {
        self.file.lock().bytes_written()
    }

    /// Time of the last rotation (creation of the active file).
    pub fn last_rotation_time(&self) -> SystemTime {
        self.file.lock().last_rotation_time()
    }

    /// Records accepted but not yet handed to the file.
    pub fn queued(&self) -> usize {
        self.inner.queue.lock().records.len()
    }

    /// Shared handle to the underlying file.
    ///
    /// Holding its lock stalls the consumer thread.
    pub fn file(&self) -> &SharedRotatingFile {
        &self.file
    }

    /// Stop accepting records, drain the queue and close the file.
    ///
    /// Waits up to the configured shutdown timeout for the consumer thread.
    /// Calling it again is a no-op.
    pub fn shutdown(&self) {
        let Some(handle) = self.consumer.lock().take() else {
            return;
        };

        // Set the flag under the queue lock so a waiting producer or the
        // consumer cannot miss the wakeup.
        {
            let mut queue = self.inner.queue.lock();
            queue.stopped = true;
            self.inner.not_empty.notify_all();
            self.inner.not_full.notify_all();
        }

        let deadline = Instant::now() + self.shutdown_timeout;
        let finished = {
            let mut done = self.inner.done.lock();
            while !*done {
                if self.inner.done_cond.wait_until(&mut done, deadline).timed_out() {
                    break;
                }
            }
            *done
        };

        if finished {
            if handle.join().is_err() {
                error!(target: "auditlog::writer", "Writer thread panicked");
            }
            debug!(target: "auditlog::writer", "Writer thread stopped");
        } else {
            warn!(
                target: "auditlog::writer",
                timeout = ?self.shutdown_timeout,
                "Writer thread did not stop in time; detaching"
            );
        }
    }
}

impl Drop for AsyncWriter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Marks the consumer as finished on drop, including when it panics.
struct DoneGuard<'a> {
    inner: &'a WriterInner,
}

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        let mut done = self.inner.done.lock();
        *done = true;
        self.inner.done_cond.notify_all();
    }
}

fn consumer_loop(inner: &WriterInner, file: &Mutex<RotatingFile>, settings: ConsumerSettings) {
    let _guard = DoneGuard { inner };
    let mut last_check = Instant::now();

    loop {
        let (batch, stopped) = {
            let mut queue = inner.queue.lock();
            if queue.records.is_empty() && !queue.stopped {
                inner.not_empty.wait_for(&mut queue, settings.poll_timeout);
            }
            let batch: Vec<String> = queue.records.drain(..).collect();
            if !batch.is_empty() {
                inner.not_full.notify_all();
            }
            (batch, queue.stopped)
        };

        if !batch.is_empty() {
            let mut file = file.lock();
            for record in &batch {
                if let Err(e) = file.write(record) {
                    error!(target: "auditlog::writer", error = %e, "Failed to write audit record");
                }
                if let Err(e) = file.rotate_if_needed() {
                    error!(target: "auditlog::writer", error = %e, "Failed to rotate audit file");
                }
            }
            if settings.auto_flush {
                if let Err(e) = file.flush() {
                    error!(target: "auditlog::writer", error = %e, "Failed to flush audit file");
                }
            }
        }

        if !settings.check_interval.is_zero() && last_check.elapsed() >= settings.check_interval {
            let mut file = file.lock();
            if let Err(e) = file.rotate_if_needed() {
                error!(target: "auditlog::writer", error = %e, "Failed to rotate audit file");
            }
            file.enforce_retention();
            last_check = Instant::now();
        }

        // producers cannot enqueue once stopped, so this batch was the last
        if stopped {
            break;
        }
    }

    if let Err(e) = file.lock().close() {
        error!(target: "auditlog::writer", error = %e, "Failed to close audit file");
    }
}
