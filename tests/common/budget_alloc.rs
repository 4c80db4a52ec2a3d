use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Allocation totals of one measured closure.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllocReport {
    pub peak_bytes: usize,
    pub allocations: usize,
}

/// Global allocator that tracks live bytes, their high-water mark and the
/// number of allocations.
pub struct BudgetAlloc {
    live: AtomicUsize,
    peak: AtomicUsize,
    count: AtomicUsize,
}

impl BudgetAlloc {
    pub const fn new() -> Self {
        Self {
            live: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            count: AtomicUsize::new(0),
        }
    }

    /// Run `f` and report the heap it used above the bytes already live.
    pub fn measure<T>(&self, f: impl FnOnce() -> T) -> (T, AllocReport) {
        let base = self.live.load(Ordering::SeqCst);
        self.peak.store(base, Ordering::SeqCst);
        let count_before = self.count.load(Ordering::SeqCst);
        let out = f();
        let report = AllocReport {
            peak_bytes: self.peak.load(Ordering::SeqCst).saturating_sub(base),
            allocations: self.count.load(Ordering::SeqCst) - count_before,
        };
        (out, report)
    }

    fn grow(&self, bytes: usize) {
        let live = self.live.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.peak.fetch_max(live, Ordering::SeqCst);
    }

    fn shrink(&self, bytes: usize) {
        let _ = self
            .live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                Some(live.saturating_sub(bytes))
            });
    }
}

unsafe impl GlobalAlloc for BudgetAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            self.grow(layout.size());
            self.count.fetch_add(1, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        self.shrink(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            if new_size >= layout.size() {
                self.grow(new_size - layout.size());
            } else {
                self.shrink(layout.size() - new_size);
            }
            self.count.fetch_add(1, Ordering::SeqCst);
        }
        new_ptr
    }
}
