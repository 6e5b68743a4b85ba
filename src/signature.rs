/// A call signature: the result type plus the ordered argument types.
///
/// Implemented for function pointer types `fn(A1, .., An) -> R` with up to 8 arguments,
/// so a [`Function`] is spelled the way its signature reads, e.g. `Function<fn(i32, i32) -> i32>`.
///
/// Argument and result types must be `'static` (owned); signatures with borrowed arguments are not supported.
///
/// [`Function`]: ../function/struct.Function.html
pub trait Signature: 'static {
    /// Argument types, packed into a tuple in declaration order.
    type Args;
    /// Result type.
    type Output;
    /// Number of arguments.
    const ARITY: usize;
}

/// Anything invocable with the arguments of the signature `S`, producing its result.
///
/// Blanket-implemented for every `Fn(A1, .., An) -> R`: free functions, function pointers and closures.
/// Implement it by hand to make a function object (any `Clone` struct) storable in a [`Function`].
///
/// Closures passed where a `Callable` is expected need their argument types spelled out
/// (`|a: i32, b: i32| a + b`), since the signature is not deduced from the closure.
///
/// [`Function`]: ../function/struct.Function.html
pub trait Callable<S: Signature> {
    /// Unpacks `args` and calls `self` with them.
    fn invoke(&self, args: S::Args) -> S::Output;
}

macro_rules! count {
    () => { 0 };
    ($head:ident $($tail:ident)*) => { 1 + count!($($tail)*) };
}

macro_rules! impl_signature {
    ($($arg:ident),*) => {
        impl<R: 'static, $($arg: 'static),*> Signature for fn($($arg),*) -> R {
            type Args = ($($arg,)*);
            type Output = R;
            const ARITY: usize = count!($($arg)*);
        }

        impl<Func, R: 'static, $($arg: 'static),*> Callable<fn($($arg),*) -> R> for Func
        where
            Func: Fn($($arg),*) -> R,
        {
            #[allow(non_snake_case)]
            #[inline]
            fn invoke(&self, ($($arg,)*): ($($arg,)*)) -> R {
                (self)($($arg),*)
            }
        }
    };
}

impl_signature!();
impl_signature!(A1);
impl_signature!(A1, A2);
impl_signature!(A1, A2, A3);
impl_signature!(A1, A2, A3, A4);
impl_signature!(A1, A2, A3, A4, A5);
impl_signature!(A1, A2, A3, A4, A5, A6);
impl_signature!(A1, A2, A3, A4, A5, A6, A7);
impl_signature!(A1, A2, A3, A4, A5, A6, A7, A8);
