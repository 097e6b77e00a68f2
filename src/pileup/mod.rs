//! Seekable per-position pileup statistics over indexed BAM/CRAM files.
//!
//! [`PileupCursor`] pulls alignments from an indexed reader, hands them
//! to the [`WindowEngine`], turns each finalized position into a
//! [`PositionStatistics`] record and buffers results in a [`ResultQueue`]
//! until the caller asks for them. `seek` repositions the underlying
//! reader and uses the queue's suppression watermark so no position below
//! the target ever surfaces; `next` delivers records in non-decreasing
//! `(reference, position)` order.

pub mod queue;
pub mod read_filter;
mod stats;
pub mod types;
pub mod window;

pub use queue::ResultQueue;
pub use read_filter::{DefaultReadFilter, ReadFilter};
pub use types::{ChannelMetrics, Observation, PositionStatistics, PositionWindow, NUCLEOTIDES};
pub use window::WindowEngine;

use std::path::Path;

use log::debug;
use rust_htslib::bam::record::Record;
use rust_htslib::bam::{self, FetchDefinition, Read};

use crate::error::{PileupError, Result};
use crate::utils::bam_reader::BamReaderFactory;

/// Where the cursor stands in its delivery protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Opened, nothing pulled yet.
    Idle,
    /// Inside a `seek` call, scanning toward the target.
    Seeking,
    /// Delivering records.
    Streaming,
    /// The source ran dry; `next` returns `None`.
    Exhausted,
}

/// Cursor over the per-position statistics of one alignment file.
///
/// Single-threaded and single-consumer: the cursor owns its reader,
/// engine and queue outright, and `seek` invalidates everything buffered
/// before it returns.
pub struct PileupCursor<F: ReadFilter = DefaultReadFilter> {
    reader: bam::IndexedReader,
    engine: WindowEngine,
    queue: ResultQueue,
    filter: F,
    /// Reusable decode buffer.
    record: Record,
    state: CursorState,
    /// After a seek, the reference currently being fetched; the cursor
    /// advances reference by reference from here once each region runs
    /// dry. `None` means a whole-file scan.
    region_ref: Option<u32>,
}

impl PileupCursor<DefaultReadFilter> {
    /// Open an indexed BAM/CRAM for a linear whole-file scan, keeping
    /// every mapped record.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_filter(path, None, DefaultReadFilter::new(0))
    }
}

impl<F: ReadFilter> PileupCursor<F> {
    /// Open with an explicit read filter and, for CRAM input, an optional
    /// reference FASTA.
    pub fn open_with_filter<P: AsRef<Path>>(
        path: P,
        reference: Option<&Path>,
        filter: F,
    ) -> Result<Self> {
        let mut reader = BamReaderFactory::open_indexed(path.as_ref(), reference)?;
        reader.fetch(FetchDefinition::All)?;
        Ok(PileupCursor {
            reader,
            engine: WindowEngine::new(),
            queue: ResultQueue::new(),
            filter,
            record: Record::new(),
            state: CursorState::Idle,
            region_ref: None,
        })
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Names of the reference sequences, in target-id order. Stable for
    /// the lifetime of the cursor.
    pub fn reference_names(&self) -> Vec<String> {
        let header = self.reader.header();
        (0..header.target_count())
            .map(|tid| String::from_utf8_lossy(header.tid2name(tid)).into_owned())
            .collect()
    }

    /// Numeric target id for a reference name.
    pub fn reference_id(&self, name: &str) -> Result<u32> {
        self.reader
            .header()
            .tid(name.as_bytes())
            .ok_or_else(|| PileupError::UnknownReference(name.to_string()))
    }

    /// Jump to the first covered position at or after `pos` (1-based) on
    /// the named reference.
    ///
    /// Everything buffered beforehand is dropped. On return the cursor is
    /// either `Streaming` with its first record at or past the target (or
    /// on a later reference, when the target reference has nothing left),
    /// or `Exhausted` when no covered position remains anywhere downstream.
    /// An unknown name fails with `InvalidReference` and leaves the cursor
    /// untouched.
    pub fn seek(&mut self, name: &str, pos: i64) -> Result<()> {
        let ref_id = self
            .reader
            .header()
            .tid(name.as_bytes())
            .ok_or_else(|| PileupError::InvalidReference(name.to_string()))?;
        debug!("seek to {}:{} (tid {})", name, pos, ref_id);

        self.state = CursorState::Seeking;
        self.engine.clear();
        self.queue.clear();
        self.queue.arm_suppression(ref_id, pos);

        let start = (pos - 1).max(0);
        let stop = self.target_stop(ref_id, start);
        self.reader.fetch((ref_id, start, stop))?;
        self.region_ref = Some(ref_id);

        loop {
            if !self.pull_alignment()? {
                // End of stream: whatever is still buffered is final.
                self.engine.flush();
                self.drain_ready()?;
                self.queue.discard_front_before(ref_id, pos);
                self.state = if self.queue.front_is_at_or_past(ref_id, pos) {
                    CursorState::Streaming
                } else {
                    CursorState::Exhausted
                };
                return Ok(());
            }
            self.drain_ready()?;
            if self.queue.is_empty() {
                continue;
            }
            self.queue.discard_front_before(ref_id, pos);
            if self.queue.front_is_at_or_past(ref_id, pos) {
                self.state = CursorState::Streaming;
                return Ok(());
            }
        }
    }

    /// Deliver the next statistics record, pulling alignments as needed.
    /// `None` means the source is exhausted, not an error.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<PositionStatistics>> {
        if !self.queue.is_empty() {
            return Ok(Some(self.queue.pop()?));
        }
        if self.state == CursorState::Exhausted {
            return Ok(None);
        }
        loop {
            if !self.pull_alignment()? {
                self.engine.flush();
                self.drain_ready()?;
                if self.queue.is_empty() {
                    self.state = CursorState::Exhausted;
                    return Ok(None);
                }
                self.state = CursorState::Streaming;
                return Ok(Some(self.queue.pop()?));
            }
            self.drain_ready()?;
            if !self.queue.is_empty() {
                self.state = CursorState::Streaming;
                return Ok(Some(self.queue.pop()?));
            }
        }
    }

    /// Read one usable record into the engine. `Ok(false)` means the
    /// source is exhausted, including any follow-on references after a
    /// seek.
    fn pull_alignment(&mut self) -> Result<bool> {
        loop {
            match self.reader.read(&mut self.record) {
                Some(Ok(())) => {
                    if self.record.is_unmapped() || self.record.tid() < 0 {
                        continue;
                    }
                    if !self.filter.filter_read(&self.record) {
                        continue;
                    }
                    self.engine.add_alignment(&self.record);
                    return Ok(true);
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    if !self.advance_region()? {
                        return Ok(false);
                    }
                }
            }
        }
    }

    /// After a seek region runs dry, move on to the next reference so the
    /// stream continues through the rest of the file, the way a raw file
    /// jump would.
    fn advance_region(&mut self) -> Result<bool> {
        let Some(current) = self.region_ref else {
            return Ok(false);
        };
        let next = current + 1;
        if next >= self.reader.header().target_count() {
            return Ok(false);
        }
        let stop = self.target_stop(next, 0);
        debug!("region {} exhausted, continuing with tid {}", current, next);
        self.reader.fetch((next, 0i64, stop))?;
        self.region_ref = Some(next);
        Ok(true)
    }

    /// Compute statistics for every finalized window and queue them,
    /// subject to the suppression watermark.
    fn drain_ready(&mut self) -> Result<()> {
        while let Some(window) = self.engine.pop_ready() {
            let stat = PositionStatistics::from_window(&window)?;
            self.queue.push(stat);
        }
        Ok(())
    }

    fn target_stop(&self, ref_id: u32, start: i64) -> i64 {
        let len = self.reader.header().target_len(ref_id).unwrap_or(0) as i64;
        len.max(start + 1)
    }
}
