//! Per-position statistics computation.
//!
//! This is a pure transformation: one finalized [`PositionWindow`] in,
//! one [`PositionStatistics`] out. No state is kept between positions.

use crate::error::{PileupError, Result};
use crate::pileup::types::{ChannelMetrics, Observation, PositionStatistics, PositionWindow, TOTAL};

impl PositionStatistics {
    /// Aggregate a window's observations into a statistics record.
    ///
    /// Deletions are skipped entirely, `N` bases (any case) are tallied
    /// as ambiguous, and any other non-ACGT base aborts the position
    /// with [`PileupError::MalformedBase`]: no partial record is emitted.
    pub fn from_window(window: &PositionWindow) -> Result<Self> {
        let mut channels = [ChannelMetrics::default(); 5];
        let mut ambiguous = 0u64;

        for obs in &window.observations {
            if obs.deletion {
                continue;
            }
            let idx = match obs.base.to_ascii_uppercase() {
                b'A' => 0,
                b'C' => 1,
                b'G' => 2,
                b'T' => 3,
                b'N' => {
                    ambiguous += 1;
                    continue;
                }
                other => {
                    return Err(PileupError::MalformedBase {
                        base: other as char,
                        ref_id: window.ref_id,
                        pos: window.pos + 1,
                    })
                }
            };
            for slot in [idx, TOTAL] {
                let channel = &mut channels[slot];
                channel.count += 1;
                channel.qual_sum += obs.base_qual as u64;
                channel.mapq_sum += obs.map_qual as u64;
                channel.pos_signal += position_signal(obs);
            }
        }

        // Strictly greater, so ties keep the earlier channel.
        let mut major = 0usize;
        for idx in 1..4 {
            if channels[idx].count > channels[major].count {
                major = idx;
            }
        }

        // Start from any channel that is not the major one, then scan with
        // the same strict-greater, first-wins rule. The major channel is
        // never eligible.
        let mut minor = (major + 1) % 4;
        for idx in 0..4 {
            if channels[idx].count > channels[minor].count && idx != major {
                minor = idx;
            }
        }

        // Probabilities are taken over every observation in the window,
        // deletions and ambiguous bases included, so they may sum to less
        // than one. Kept for output compatibility.
        let depth = window.observations.len();
        let mut entropy = 0.0f64;
        if depth > 0 {
            for channel in channels.iter().take(4) {
                let probability = channel.count as f64 / depth as f64;
                if probability != 0.0 {
                    entropy -= probability * probability.ln();
                }
            }
        }

        Ok(PositionStatistics {
            ref_id: window.ref_id,
            // 0-based internally, 1-based toward callers
            pos: window.pos + 1,
            a: channels[0],
            c: channels[1],
            g: channels[2],
            t: channels[3],
            total: channels[TOTAL],
            major_base: major as u8,
            minor_base: minor as u8,
            ambiguous,
            reserved_a: 0,
            entropy,
            reserved_b: 0,
        })
    }
}

/// Distance of the base from the 5' end of its read, plus one when the
/// read is reversed. See [`ChannelMetrics::pos_signal`].
fn position_signal(obs: &Observation) -> u64 {
    if obs.reverse {
        (obs.read_len - obs.offset - 1) as u64 + 1
    } else {
        obs.offset as u64
    }
}
