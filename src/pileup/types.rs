//! Data types shared by the windowing engine, the statistics computer
//! and the cursor.

use serde::Serialize;

/// Channel order for the per-base indices stored in
/// [`PositionStatistics::major_base`] and [`PositionStatistics::minor_base`].
pub const NUCLEOTIDES: [u8; 4] = *b"ACGT";

/// Index of the aggregate channel in the internal channel array.
pub(crate) const TOTAL: usize = 4;

/// One read base observed at one reference position.
///
/// Produced by the windowing engine, consumed by the statistics computer
/// and dropped immediately afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    /// Base call as stored in the record, any case. Meaningless for
    /// deletions.
    pub base: u8,
    /// Phred base quality. Meaningless for deletions.
    pub base_qual: u8,
    /// Mapping quality of the read this base belongs to.
    pub map_qual: u8,
    /// 0-based offset of the base within the read sequence, soft clips
    /// included. Meaningless for deletions.
    pub offset: usize,
    /// Length of the read sequence.
    pub read_len: usize,
    /// Read aligns to the reverse strand.
    pub reverse: bool,
    /// The read is deleted at this position. Deletions count toward the
    /// entropy denominator and nothing else.
    pub deletion: bool,
}

impl Observation {
    pub(crate) fn deletion(map_qual: u8, read_len: usize, reverse: bool) -> Self {
        Observation {
            base: b'*',
            base_qual: 0,
            map_qual,
            offset: 0,
            read_len,
            reverse,
            deletion: true,
        }
    }
}

/// The finalized set of observations covering one reference position.
///
/// Windows leave the engine in non-decreasing `(ref_id, pos)` order and
/// are guaranteed complete: no later record can add an observation here.
#[derive(Debug, Clone)]
pub struct PositionWindow {
    /// Target id of the reference sequence.
    pub ref_id: u32,
    /// 0-based reference position.
    pub pos: i64,
    pub observations: Vec<Observation>,
}

/// Fixed-width metric tuple for one channel. Downstream consumers expect
/// six slots per channel; the last two are always zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelMetrics {
    pub count: u64,
    pub qual_sum: u64,
    pub mapq_sum: u64,
    /// Folds distance-to-read-end and a reverse-strand indicator into a
    /// single sum; the two components are not recoverable afterwards.
    /// Suspect metric, kept for output compatibility.
    pub pos_signal: u64,
    pub reserved: [u64; 2],
}

/// Per-position nucleotide statistics, the record handed to callers.
///
/// Immutable once computed; produced exactly once per covered position
/// and moved (not copied) out of the result queue on delivery.
#[derive(Debug, Clone, Serialize)]
pub struct PositionStatistics {
    /// Target id of the reference sequence.
    pub ref_id: u32,
    /// 1-based reference position.
    pub pos: i64,
    pub a: ChannelMetrics,
    pub c: ChannelMetrics,
    pub g: ChannelMetrics,
    pub t: ChannelMetrics,
    pub total: ChannelMetrics,
    /// Index into [`NUCLEOTIDES`] of the most frequent base.
    pub major_base: u8,
    /// Index into [`NUCLEOTIDES`] of the second most frequent base.
    pub minor_base: u8,
    /// Number of N observations at this position.
    pub ambiguous: u64,
    pub reserved_a: u64,
    /// Shannon entropy (natural log) over the four base-count proportions.
    pub entropy: f64,
    pub reserved_b: u64,
}

impl PositionStatistics {
    /// Channels in A, C, G, T order.
    pub fn channels(&self) -> [&ChannelMetrics; 4] {
        [&self.a, &self.c, &self.g, &self.t]
    }
}
