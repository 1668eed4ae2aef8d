//! CPU time collector
//!
//! Samples the kernel's cumulative per-state CPU tick counters and
//! publishes them as seconds spent in each scheduling state. The counters
//! only ever grow (the kernel resets them at boot, never at runtime), so
//! the published values form monotonic counters without any bookkeeping
//! here: every cycle re-reads the kernel and converts ticks to seconds
//! with the statistics clock rate read in the same cycle.

use crate::collector::Collector;
use crate::error::{HoststatError, Result};
use crate::metrics::NAMESPACE;
use crate::sysctl::RawStatsSource;
use async_trait::async_trait;
use prometheus::{CounterVec, Opts, Registry};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Number of CPU scheduling states the kernel accounts for.
pub const CPUSTATES: usize = 5;

const WORD: usize = std::mem::size_of::<u64>();

/// CPU scheduling states, in the kernel's `kern.cp_time` buffer order.
///
/// The ordinal mapping is load-bearing: the counter for a state sits at
/// byte offset `index() * 8` in the raw buffer. Keep [`CpuState::ALL`],
/// [`CpuState::index`], and [`CpuState::label`] in sync with the kernel
/// enumeration (CP_USER through CP_IDLE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuState {
    User,
    Nice,
    System,
    Interrupt,
    Idle,
}

impl CpuState {
    /// All states in buffer order.
    pub const ALL: [CpuState; CPUSTATES] = [
        CpuState::User,
        CpuState::Nice,
        CpuState::System,
        CpuState::Interrupt,
        CpuState::Idle,
    ];

    /// Ordinal position of this state's counter in the raw buffer.
    pub const fn index(self) -> usize {
        match self {
            CpuState::User => 0,
            CpuState::Nice => 1,
            CpuState::System => 2,
            CpuState::Interrupt => 3,
            CpuState::Idle => 4,
        }
    }

    /// Label value attached to the emitted metric.
    pub const fn label(self) -> &'static str {
        match self {
            CpuState::User => "user",
            CpuState::Nice => "nice",
            CpuState::System => "system",
            CpuState::Interrupt => "interrupt",
            CpuState::Idle => "idle",
        }
    }
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decode a raw `kern.cp_time` reply into per-state tick counts.
///
/// The buffer is walked in 8-byte native-endian words in buffer order.
/// Fewer words than [`CPUSTATES`] is a truncated kernel reply and fails;
/// excess trailing bytes are ignored, so a kernel reporting additional
/// states keeps working.
pub fn decode_cp_time(buf: &[u8]) -> Result<[u64; CPUSTATES]> {
    let need = CPUSTATES * WORD;
    if buf.len() < need {
        return Err(HoststatError::Decode {
            what: "kern.cp_time",
            got: buf.len(),
            need,
        });
    }

    let mut ticks = [0u64; CPUSTATES];
    for (i, slot) in ticks.iter_mut().enumerate() {
        let mut word = [0u8; WORD];
        word.copy_from_slice(&buf[i * WORD..(i + 1) * WORD]);
        *slot = u64::from_ne_bytes(word);
    }
    Ok(ticks)
}

/// Convert tick counts to seconds and hand one sample per state to the
/// publish sink, in enumeration order. The caller guarantees `hz > 0`.
pub fn emit(ticks: &[u64; CPUSTATES], hz: f64, mut publish: impl FnMut(CpuState, f64)) {
    for state in CpuState::ALL {
        publish(state, ticks[state.index()] as f64 / hz);
    }
}

/// Collector for `hoststat_cpu_seconds_total{cpu="<state>"}`.
pub struct CpuCollector {
    source: Arc<dyn RawStatsSource>,
    seconds: CounterVec,
}

impl CpuCollector {
    pub fn new(source: Arc<dyn RawStatsSource>) -> Result<Self> {
        let seconds = CounterVec::new(
            Opts::new("cpu_seconds_total", "Seconds the CPUs spent in each mode.")
                .namespace(NAMESPACE),
            &["cpu"],
        )?;
        Ok(Self { source, seconds })
    }
}

#[async_trait]
impl Collector for CpuCollector {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.seconds.clone()))?;
        Ok(())
    }

    /// One collection cycle: clock rate first, then the tick buffer, then
    /// decode and publish. Any failure aborts before a single sample is
    /// written, so a cycle is all-or-nothing.
    async fn update(&self) -> Result<()> {
        let hz = self.source.clock_rate()?;
        if !(hz > 0.0) {
            return Err(HoststatError::InvalidClockRate(hz));
        }

        let buf = self.source.cpu_ticks()?;
        let ticks = decode_cp_time(&buf)?;
        debug!("cpu ticks at {} Hz: {:?}", hz, ticks);

        emit(&ticks, hz, |state, value| {
            let counter = self.seconds.with_label_values(&[state.label()]);
            // Counters can only be advanced, so publish the cumulative
            // value as a delta from what the handle already holds. The
            // kernel counter never decreases between cycles.
            let delta = value - counter.get();
            if delta > 0.0 {
                counter.inc_by(delta);
            }
        });
        Ok(())
    }
}
