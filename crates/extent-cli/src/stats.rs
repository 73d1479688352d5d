use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use extent_rs::metrics::{BlockOp, ExtentOp, ExtentOpType, IoOpType, MetricsSink};

/// Counts every block and extent operation the engine reports.
#[derive(Default)]
pub struct OpCounters {
    block_reads: AtomicU64,
    block_writes: AtomicU64,
    extent_ops: [AtomicU64; 5],
    extent_errors: AtomicU64,
    bytes_in: AtomicU64,
    bytes_out: AtomicU64,
    latency_micros: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub block_reads: u64,
    pub block_writes: u64,
    pub creates: u64,
    pub gets: u64,
    pub puts: u64,
    pub getattrs: u64,
    pub removes: u64,
    pub errors: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub latency_micros: u64,
}

const fn slot(op: ExtentOpType) -> usize {
    match op {
        ExtentOpType::Create => 0,
        ExtentOpType::Get => 1,
        ExtentOpType::Put => 2,
        ExtentOpType::Getattr => 3,
        ExtentOpType::Remove => 4,
    }
}

impl OpCounters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> Snapshot {
        let ops = |op| self.extent_ops[slot(op)].load(Ordering::Relaxed);
        Snapshot {
            block_reads: self.block_reads.load(Ordering::Relaxed),
            block_writes: self.block_writes.load(Ordering::Relaxed),
            creates: ops(ExtentOpType::Create),
            gets: ops(ExtentOpType::Get),
            puts: ops(ExtentOpType::Put),
            getattrs: ops(ExtentOpType::Getattr),
            removes: ops(ExtentOpType::Remove),
            errors: self.extent_errors.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
            latency_micros: self.latency_micros.load(Ordering::Relaxed),
        }
    }

    pub fn log_summary(&self) {
        let s = self.snapshot();
        info!(
            "exit: creates={}, gets={}, puts={}, getattrs={}, removes={}, errors={}, bytes_in={}, bytes_out={}, block_reads={}, block_writes={}, busy_us={}",
            s.creates,
            s.gets,
            s.puts,
            s.getattrs,
            s.removes,
            s.errors,
            s.bytes_in,
            s.bytes_out,
            s.block_reads,
            s.block_writes,
            s.latency_micros
        );
    }
}

impl MetricsSink for OpCounters {
    fn record_block_op(&self, op: BlockOp) {
        let counter = match op.op {
            IoOpType::Read => &self.block_reads,
            IoOpType::Write => &self.block_writes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_extent_op(&self, op: ExtentOp) {
        self.extent_ops[slot(op.op)].fetch_add(1, Ordering::Relaxed);
        if op.error {
            self.extent_errors.fetch_add(1, Ordering::Relaxed);
        }
        match op.op {
            ExtentOpType::Put => {
                self.bytes_in.fetch_add(op.bytes, Ordering::Relaxed);
            }
            ExtentOpType::Get => {
                self.bytes_out.fetch_add(op.bytes, Ordering::Relaxed);
            }
            _ => {}
        }
        let micros = (op.latency_seconds * 1e6) as u64;
        self.latency_micros.fetch_add(micros, Ordering::Relaxed);
    }
}
