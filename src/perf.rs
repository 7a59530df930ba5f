use std::cell::Cell;
use std::time::Instant;

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
}

/// 性能统计 Guard：记录 elapsed_ms + 处理行数 + 嵌套深度
///
/// 使用方式：
/// ```ignore
/// let _perf = schedule_import::perf::PerfGuard::new("parse_file").with_rows(120);
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    rows: Option<usize>,
    depth: u32,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        let depth = PERF_DEPTH.with(|d| {
            let depth = d.get();
            d.set(depth.saturating_add(1));
            depth
        });
        Self {
            op,
            start: Instant::now(),
            rows: None,
            depth,
        }
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn set_rows(&mut self, rows: usize) {
        self.rows = Some(rows);
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();

        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms,
            rows = self.rows,
            depth = self.depth,
            "done"
        );

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
