use {
    crate::signature::{Callable, Signature},
    std::{
        mem::{align_of, size_of},
        ptr::{self, NonNull},
    },
};

/// Calls the wrapper at the type-erased pointer with the packed arguments.
pub(crate) type Invoke<S> =
    unsafe fn(NonNull<u8>, <S as Signature>::Args) -> <S as Signature>::Output;

/// Writes a copy of the wrapper at the first pointer into the (uninitialized) storage at the second one.
pub(crate) type CopyInto = unsafe fn(NonNull<u8>, NonNull<u8>);

/// Allocates a copy of the wrapper on the heap; the caller owns the result.
pub(crate) type CloneToHeap = unsafe fn(NonNull<u8>) -> NonNull<u8>;

/// Ends the life of the wrapper at the pointer.
pub(crate) type DropHandler = unsafe fn(NonNull<u8>);

/// Vtable for a concrete wrapper type which knows
/// 1) how to call the wrapped callable;
/// 2) how to copy it into raw inline storage;
/// 3) how to copy it onto the heap;
/// 4) how to drop it in place (inline) or drop it and free its allocation (heap).
/// A static pointer to this is stored in the [`Function`] alongside its storage tag.
///
/// [`Function`]: ../function/struct.Function.html
pub(crate) struct VTable<S: Signature> {
    pub(crate) invoke: Invoke<S>,
    pub(crate) copy_into: CopyInto,
    pub(crate) clone_to_heap: CloneToHeap,
    pub(crate) drop_in_place: DropHandler,
    pub(crate) drop_boxed: DropHandler,
    pub(crate) size: usize,
    pub(crate) align: usize,
}

/// Owns a callable by value.
///
/// One instantiation per concrete callable type; its footprint decides inline vs. heap placement.
#[derive(Clone)]
#[repr(transparent)]
pub(crate) struct Wrapper<F> {
    functor: F,
}

impl<F> Wrapper<F> {
    pub(crate) fn new(functor: F) -> Self {
        Self { functor }
    }
}

/// Capabilities of a stored wrapper, independent of the callable inside it.
///
/// The type-erased [`VTABLE`] is generated from these once per implementing type.
///
/// [`VTABLE`]: #associatedconstant.VTABLE
pub(crate) trait Wrap<S: Signature>: Sized + 'static {
    fn invoke(&self, args: S::Args) -> S::Output;

    /// Constructs a copy of `self` at `dst`.
    ///
    /// # Safety
    ///
    /// `dst` must be valid for writes of `Self` and suitably aligned.
    /// Whatever `dst` pointed to is overwritten without being dropped.
    unsafe fn copy_into(&self, dst: NonNull<u8>);

    /// Moves a copy of `self` into a new heap allocation.
    /// The returned pointer owns it and must be released with the vtable's `drop_boxed`.
    fn clone_to_heap(&self) -> NonNull<u8>;

    const VTABLE: &'static VTable<S> = &VTable {
        invoke: invoke_erased::<S, Self>,
        copy_into: copy_into_erased::<S, Self>,
        clone_to_heap: clone_to_heap_erased::<S, Self>,
        drop_in_place: drop_in_place_erased::<Self>,
        drop_boxed: drop_boxed_erased::<Self>,
        size: size_of::<Self>(),
        align: align_of::<Self>(),
    };
}

impl<S, F> Wrap<S> for Wrapper<F>
where
    S: Signature,
    F: Callable<S> + Clone + 'static,
{
    #[inline]
    fn invoke(&self, args: S::Args) -> S::Output {
        Callable::<S>::invoke(&self.functor, args)
    }

    unsafe fn copy_into(&self, dst: NonNull<u8>) {
        // Clone first: a panicking clone leaves `dst` untouched.
        let copy = self.clone();
        ptr::write(dst.cast::<Self>().as_ptr(), copy);
    }

    fn clone_to_heap(&self) -> NonNull<u8> {
        box_erased(self.clone())
    }
}

/// Moves `value` to the heap, returning the owning, type-erased pointer.
pub(crate) fn box_erased<T>(value: T) -> NonNull<u8> {
    NonNull::from(Box::leak(Box::new(value))).cast()
}

unsafe fn invoke_erased<S: Signature, W: Wrap<S>>(this: NonNull<u8>, args: S::Args) -> S::Output {
    this.cast::<W>().as_ref().invoke(args)
}

unsafe fn copy_into_erased<S: Signature, W: Wrap<S>>(this: NonNull<u8>, dst: NonNull<u8>) {
    this.cast::<W>().as_ref().copy_into(dst)
}

unsafe fn clone_to_heap_erased<S: Signature, W: Wrap<S>>(this: NonNull<u8>) -> NonNull<u8> {
    this.cast::<W>().as_ref().clone_to_heap()
}

unsafe fn drop_in_place_erased<W>(this: NonNull<u8>) {
    ptr::drop_in_place(this.cast::<W>().as_ptr());
}

unsafe fn drop_boxed_erased<W>(this: NonNull<u8>) {
    drop(Box::from_raw(this.cast::<W>().as_ptr()));
}
