use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static MULTITHREAD_ENABLED: AtomicBool = AtomicBool::new(true);
static PARALLEL_MIN_ROWS: AtomicUsize = AtomicUsize::new(1024);

pub fn is_multithread_enabled() -> bool {
    cfg!(feature = "multithread") && MULTITHREAD_ENABLED.load(Ordering::Relaxed)
}

pub fn set_multithread_enabled(val: bool) {
    MULTITHREAD_ENABLED.store(val, Ordering::Relaxed)
}

// Row-wise products with fewer rows stay on the calling thread.
pub fn parallel_min_rows() -> usize {
    PARALLEL_MIN_ROWS.load(Ordering::Relaxed)
}

pub fn set_parallel_min_rows(n: usize) {
    PARALLEL_MIN_ROWS.store(n, Ordering::Relaxed)
}

pub(crate) fn should_parallelize(nrows: usize) -> bool {
    is_multithread_enabled() && nrows >= parallel_min_rows()
}
