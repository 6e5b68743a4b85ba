//! Heap traffic attributable to `Function` storage, measured with a counting global allocator.
//!
//! Counters are thread-local, so tests running in parallel do not see each other's allocations.

use {
    minifunction::{Function, INLINE_CAPACITY},
    std::{
        alloc::{GlobalAlloc, Layout, System},
        cell::Cell,
    },
};

struct CountingAllocator;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
    static DEALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|n| n.set(n.get() + 1));
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let _ = DEALLOCATIONS.try_with(|n| n.set(n.get() + 1));
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Counts {
    allocs: usize,
    deallocs: usize,
}

fn counts() -> Counts {
    Counts {
        allocs: ALLOCATIONS.with(Cell::get),
        deallocs: DEALLOCATIONS.with(Cell::get),
    }
}

/// Runs `f`, returning its result and the allocations / deallocations it performed on this thread.
fn measure<T>(f: impl FnOnce() -> T) -> (T, Counts) {
    let before = counts();
    let result = f();
    let after = counts();

    (
        result,
        Counts {
            allocs: after.allocs - before.allocs,
            deallocs: after.deallocs - before.deallocs,
        },
    )
}

type Shift = Function<fn(u64) -> u64>;

fn small() -> Shift {
    let offset = 1u64;
    Shift::from_fn(move |x: u64| x + offset)
}

fn large() -> Shift {
    let table = [2u64; INLINE_CAPACITY / 8 + 1];
    Shift::from_fn(move |x: u64| x + table[0])
}

/// Exercises every storage path once, so one-time setup (e.g. logging callsite registration)
/// is not attributed to the measured code.
fn warm_up() {
    let a = small();
    let b = large();
    let mut c = a.clone();
    c.clone_from(&b);
    c.assign(|x: u64| x);
    c.clear();
    assert_eq!(a.call((1,)) + b.call((1,)), 5);
}

#[test]
fn inline_does_not_allocate() {
    warm_up();

    let (result, delta) = measure(|| {
        let f = small();
        assert!(f.is_inline());
        let copy = f.clone();
        assert!(copy.is_inline());
        f.call((1,)) + copy.call((2,))
    });

    assert_eq!(result, 5);
    assert_eq!(
        delta,
        Counts {
            allocs: 0,
            deallocs: 0
        }
    );
}

#[test]
fn heap_allocates_once_and_frees_once() {
    warm_up();

    let (f, delta) = measure(large);
    assert!(f.is_heap());
    assert_eq!(delta.allocs, 1);
    assert_eq!(delta.deallocs, 0);

    let (result, delta) = measure(|| f.call((40,)));
    assert_eq!(result, 42);
    assert_eq!(delta.allocs, 0);

    let (_, delta) = measure(move || drop(f));
    assert_eq!(
        delta,
        Counts {
            allocs: 0,
            deallocs: 1
        }
    );
}

#[test]
fn heap_copy_is_a_separate_allocation() {
    warm_up();

    let f = large();

    let (copy, delta) = measure(|| f.clone());
    assert!(copy.is_heap());
    assert_eq!(delta.allocs, 1);

    let (_, delta) = measure(move || drop(f));
    assert_eq!(delta.deallocs, 1);

    // The copy survives the original.
    assert_eq!(copy.call((0,)), 2);

    let (_, delta) = measure(move || drop(copy));
    assert_eq!(delta.deallocs, 1);
}

#[test]
fn reassignment_does_not_leak() {
    warm_up();

    let (_, delta) = measure(|| {
        let mut f = Shift::new();
        let heaped = large();

        for _ in 0..100 {
            f.assign(|x: u64| x + 3);
            assert!(f.is_inline());

            f.clone_from(&heaped);
            assert!(f.is_heap());

            let table = [4u64; INLINE_CAPACITY];
            f.assign(move |x: u64| x + table[0]);
            assert!(f.is_heap());
            assert_eq!(f.call((1,)), 5);
        }
    });

    assert_eq!(delta.allocs, delta.deallocs);
    // One for `heaped`, two per iteration.
    assert_eq!(delta.allocs, 1 + 2 * 100);
}
