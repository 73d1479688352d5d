use std::sync::{Arc, OnceLock};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IoOpType {
    Read,
    Write,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExtentOpType {
    Create,
    Get,
    Put,
    Getattr,
    Remove,
}

#[derive(Copy, Clone, Debug)]
pub struct BlockOp {
    pub block: u32,
    pub op: IoOpType,
}

#[derive(Copy, Clone, Debug)]
pub struct ExtentOp {
    pub op: ExtentOpType,
    pub inum: u32,
    pub bytes: u64,
    pub latency_seconds: f64,
    pub error: bool,
}

pub trait MetricsSink: Send + Sync + 'static {
    fn record_block_op(&self, op: BlockOp);
    fn record_extent_op(&self, op: ExtentOp);
}

static METRICS_SINK: OnceLock<Arc<dyn MetricsSink>> = OnceLock::new();

pub fn install_metrics_sink(sink: Arc<dyn MetricsSink>) -> bool {
    METRICS_SINK.set(sink).is_ok()
}

pub fn is_enabled() -> bool {
    METRICS_SINK.get().is_some()
}

pub fn record_block_op(op: BlockOp) {
    if let Some(sink) = METRICS_SINK.get() {
        sink.record_block_op(op);
    }
}

pub fn record_extent_op(op: ExtentOp) {
    if let Some(sink) = METRICS_SINK.get() {
        sink.record_extent_op(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const PROBE_BLOCK: u32 = 0xDEAD_0001;
    const PROBE_INUM: u32 = 0xDEAD_0002;

    struct TestSink {
        block_ops: Mutex<Vec<BlockOp>>,
        extent_ops: Mutex<Vec<ExtentOp>>,
    }

    impl MetricsSink for TestSink {
        fn record_block_op(&self, op: BlockOp) {
            self.block_ops.lock().unwrap().push(op);
        }

        fn record_extent_op(&self, op: ExtentOp) {
            self.extent_ops.lock().unwrap().push(op);
        }
    }

    #[test]
    fn installed_sink_sees_block_and_extent_ops() {
        let sink = Arc::new(TestSink {
            block_ops: Mutex::new(Vec::new()),
            extent_ops: Mutex::new(Vec::new()),
        });

        assert!(install_metrics_sink(sink.clone()));
        assert!(is_enabled());

        record_block_op(BlockOp {
            block: PROBE_BLOCK,
            op: IoOpType::Write,
        });
        record_extent_op(ExtentOp {
            op: ExtentOpType::Put,
            inum: PROBE_INUM,
            bytes: 512,
            latency_seconds: 0.05,
            error: true,
        });

        // Other tests in this binary may drive the engine concurrently, so only
        // look at the probe values recorded here.
        let block_ops = sink.block_ops.lock().unwrap();
        let probe: Vec<_> = block_ops.iter().filter(|op| op.block == PROBE_BLOCK).collect();
        assert_eq!(probe.len(), 1);
        assert_eq!(probe[0].op, IoOpType::Write);

        let extent_ops = sink.extent_ops.lock().unwrap();
        let probe: Vec<_> = extent_ops.iter().filter(|op| op.inum == PROBE_INUM).collect();
        assert_eq!(probe.len(), 1);
        assert_eq!(probe[0].op, ExtentOpType::Put);
        assert_eq!(probe[0].bytes, 512);
        assert!(probe[0].error);
    }
}
