use {
    crate::{
        error::BadFunctionCall,
        signature::{Callable, Signature},
        wrapper::{box_erased, VTable, Wrap, Wrapper},
    },
    static_assertions::{assert_impl_all, assert_not_impl_any, const_assert, const_assert_eq},
    std::{
        cell::UnsafeCell,
        fmt,
        mem::{self, align_of, size_of, MaybeUninit},
        ptr::{self, NonNull},
    },
    tracing::trace,
};

/// Size in bytes of the buffer embedded in every [`Function`].
///
/// Wrappers larger than this are stored on the heap.
///
/// [`Function`]: struct.Function.html
pub const INLINE_CAPACITY: usize = 32;

/// Alignment of the embedded buffer.
///
/// Wrappers with a stricter alignment are stored on the heap.
pub const INLINE_ALIGN: usize = 16;

/// Raw byte buffer used to store the wrapper, if it fits in `INLINE_CAPACITY` bytes.
///
/// `UnsafeCell` because callables invoked through `&self` may mutate their captures via interior mutability.
#[repr(C, align(16))]
struct InlineBuffer(UnsafeCell<[MaybeUninit<u8>; INLINE_CAPACITY]>);

const_assert_eq!(size_of::<InlineBuffer>(), INLINE_CAPACITY);
const_assert_eq!(align_of::<InlineBuffer>(), INLINE_ALIGN);

impl InlineBuffer {
    const fn uninit() -> Self {
        Self(UnsafeCell::new([MaybeUninit::uninit(); INLINE_CAPACITY]))
    }

    fn as_ptr(&self) -> NonNull<u8> {
        // `UnsafeCell::get` never returns null.
        unsafe { NonNull::new_unchecked(self.0.get().cast()) }
    }
}

/// Explicit storage tag, with the vtable of the live wrapper (if any).
enum Slot<S: Signature> {
    /// No wrapper; the inline buffer is uninitialized.
    Empty,
    /// The wrapper lives in the inline buffer.
    Inline(&'static VTable<S>),
    /// The wrapper lives in an exclusively owned heap allocation.
    Heap(&'static VTable<S>, NonNull<u8>),
}

impl<S: Signature> Clone for Slot<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Signature> Copy for Slot<S> {}

/// Where a [`Function`]'s callable is stored.
///
/// [`Function`]: struct.Function.html
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Storage {
    /// No callable.
    Empty,
    /// The callable lives in the buffer embedded in the [`Function`].
    ///
    /// [`Function`]: struct.Function.html
    Inline,
    /// The callable lives in a heap allocation owned by the [`Function`].
    ///
    /// [`Function`]: struct.Function.html
    Heap,
}

/// A copyable container for any callable with the signature `S`.
///
/// `S` is a function pointer type naming the call signature, e.g. `Function<fn(i32, i32) -> i32>`.
/// Any `Fn` with that signature which is also `Clone` and `'static` may be stored:
/// free functions, function pointers, closures.
///
/// Internally uses the small function optimization: callables whose wrapper fits
/// in [`INLINE_CAPACITY`] bytes (with at most [`INLINE_ALIGN`] alignment) are stored in the object itself;
/// larger ones are stored on the heap. The placement is decided once, when the callable is stored,
/// and is carried over by copies.
///
/// Not `Send` / `Sync`: a `Function` is a single-owner value.
///
/// [`INLINE_CAPACITY`]: constant.INLINE_CAPACITY.html
/// [`INLINE_ALIGN`]: constant.INLINE_ALIGN.html
pub struct Function<S: Signature> {
    slot: Slot<S>,
    buffer: InlineBuffer,
}

assert_impl_all!(Function<fn(i32, i32)>: Clone, Default, fmt::Debug);
assert_not_impl_any!(Function<fn(i32, i32)>: Send, Sync);
const_assert!(size_of::<Function<fn()>>() <= INLINE_CAPACITY + 2 * INLINE_ALIGN);

impl<S: Signature> Function<S> {
    /// Creates an empty [`Function`].
    ///
    /// [`Function`]: struct.Function.html
    pub const fn new() -> Self {
        Self {
            slot: Slot::Empty,
            buffer: InlineBuffer::uninit(),
        }
    }

    /// Creates a [`Function`] which contains the callable `f`.
    ///
    /// `f` is stored inline if [`fits_inline`]; otherwise it is moved to the heap.
    ///
    /// [`Function`]: struct.Function.html
    /// [`fits_inline`]: #method.fits_inline
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Callable<S> + Clone + 'static,
    {
        let mut result = Self::new();
        result.store(f);
        result
    }

    /// Replaces the contained callable, if any, with `f`.
    ///
    /// The previous callable is dropped (and its heap storage freed, if any) before `f` is stored.
    pub fn assign<F>(&mut self, f: F)
    where
        F: Callable<S> + Clone + 'static,
    {
        self.release();
        self.store(f);
    }

    /// Drops the contained callable, if any, leaving the [`Function`] empty.
    ///
    /// [`Function`]: struct.Function.html
    pub fn clear(&mut self) {
        self.release();
    }

    /// Returns `true` if a callable of type `F` would be stored inline.
    pub fn fits_inline<F>() -> bool {
        size_of::<Wrapper<F>>() <= INLINE_CAPACITY && align_of::<Wrapper<F>>() <= INLINE_ALIGN
    }

    /// Returns where the contained callable is stored, or [`Storage::Empty`].
    ///
    /// [`Storage::Empty`]: enum.Storage.html#variant.Empty
    pub fn storage(&self) -> Storage {
        match self.slot {
            Slot::Empty => Storage::Empty,
            Slot::Inline(_) => Storage::Inline,
            Slot::Heap(..) => Storage::Heap,
        }
    }

    /// If the [`Function`] contains no callable, returns `true`; otherwise returns `false`.
    ///
    /// [`Function`]: struct.Function.html
    pub fn is_empty(&self) -> bool {
        self.storage() == Storage::Empty
    }

    /// Returns `true` if the contained callable is stored in the embedded buffer.
    pub fn is_inline(&self) -> bool {
        self.storage() == Storage::Inline
    }

    /// Returns `true` if the contained callable is stored on the heap.
    pub fn is_heap(&self) -> bool {
        self.storage() == Storage::Heap
    }

    /// Calls the contained callable with `args`, returning its result.
    ///
    /// # Errors
    ///
    /// Returns [`BadFunctionCall`], carrying the location of this call, if the [`Function`] is empty.
    ///
    /// [`BadFunctionCall`]: ../error/struct.BadFunctionCall.html
    /// [`Function`]: struct.Function.html
    #[track_caller]
    pub fn try_call(&self, args: S::Args) -> Result<S::Output, BadFunctionCall> {
        let (vtable, this) = match self.slot {
            Slot::Empty => return Err(BadFunctionCall::here()),
            Slot::Inline(vtable) => (vtable, self.buffer.as_ptr()),
            Slot::Heap(vtable, ptr) => (vtable, ptr),
        };

        Ok(unsafe { (vtable.invoke)(this, args) })
    }

    /// Calls the contained callable with `args`, returning its result.
    ///
    /// # Panics
    ///
    /// Panics with the [`BadFunctionCall`] message if the [`Function`] is empty.
    ///
    /// [`BadFunctionCall`]: ../error/struct.BadFunctionCall.html
    /// [`Function`]: struct.Function.html
    #[track_caller]
    pub fn call(&self, args: S::Args) -> S::Output {
        match self.try_call(args) {
            Ok(output) => output,
            Err(err) => panic!("{}", err),
        }
    }

    fn store<F>(&mut self, f: F)
    where
        F: Callable<S> + Clone + 'static,
    {
        debug_assert!(self.is_empty());

        let vtable = <Wrapper<F> as Wrap<S>>::VTABLE;
        let wrapper = Wrapper::new(f);

        if Self::fits_inline::<F>() {
            debug_assert!(vtable.align <= INLINE_ALIGN);

            unsafe {
                ptr::write(self.buffer.as_ptr().cast::<Wrapper<F>>().as_ptr(), wrapper);
            }
            self.slot = Slot::Inline(vtable);

            trace!(size = vtable.size, "stored callable inline");
        } else {
            self.slot = Slot::Heap(vtable, box_erased(wrapper));

            trace!(
                size = vtable.size,
                align = vtable.align,
                "stored callable on the heap"
            );
        }
    }

    /// Copies `other`'s wrapper into `self`, keeping `other`'s placement.
    fn copy_from(&mut self, other: &Self) {
        debug_assert!(self.is_empty());

        match other.slot {
            Slot::Empty => {}
            Slot::Inline(vtable) => {
                unsafe {
                    (vtable.copy_into)(other.buffer.as_ptr(), self.buffer.as_ptr());
                }
                self.slot = Slot::Inline(vtable);
            }
            Slot::Heap(vtable, ptr) => {
                let copy = unsafe { (vtable.clone_to_heap)(ptr) };
                self.slot = Slot::Heap(vtable, copy);
            }
        }
    }

    /// Drops the wrapper, if any, and frees its heap storage, if any.
    ///
    /// The tag is reset before the wrapper is dropped, so a panicking destructor cannot lead to a double drop.
    fn release(&mut self) {
        match mem::replace(&mut self.slot, Slot::Empty) {
            Slot::Empty => {}
            Slot::Inline(vtable) => {
                trace!(size = vtable.size, "dropping inline callable");

                unsafe {
                    (vtable.drop_in_place)(self.buffer.as_ptr());
                }
            }
            Slot::Heap(vtable, ptr) => {
                trace!(size = vtable.size, "dropping heap callable");

                unsafe {
                    (vtable.drop_boxed)(ptr);
                }
            }
        }
    }
}

impl<S: Signature> Default for Function<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Signature> Clone for Function<S> {
    fn clone(&self) -> Self {
        let mut result = Self::new();
        result.copy_from(self);
        result
    }

    /// Drops the contained callable, then copies `source`'s.
    ///
    /// If cloning `source`'s callable panics, `self` is left empty.
    fn clone_from(&mut self, source: &Self) {
        self.release();
        self.copy_from(source);
    }
}

impl<S: Signature> Drop for Function<S> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<S: Signature> fmt::Debug for Function<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("storage", &self.storage())
            .finish()
    }
}
