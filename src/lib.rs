//! A copyable, signature-typed container for callables with the small function optimization.
//!
//! A [`Function<S>`] holds any free function, function pointer or closure matching the call
//! signature `S` (spelled as a function pointer type), stores it inline when its footprint fits
//! in [`INLINE_CAPACITY`] bytes and on the heap otherwise, and calls it uniformly.
//!
//! ```
//! use minifunction::Function;
//!
//! fn sum(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//!
//! let mut func0: Function<fn(i32, i32) -> i32> = Function::new();
//! assert!(func0.try_call((1, 2)).is_err());
//!
//! func0.assign(sum);
//! assert_eq!(func0.call((120182, 24893)), 145075);
//!
//! let func = func0.clone();
//! assert_eq!(func.call((10, 15)), 25);
//!
//! let capture = [1i32; 16];
//! let large = Function::<fn(i32, i32) -> i32>::from_fn(move |a: i32, b: i32| a + b + capture[0]);
//! assert!(large.is_heap());
//! assert_eq!(large.call((1, 1)), 3);
//! ```
//!
//! [`Function<S>`]: function/struct.Function.html
//! [`INLINE_CAPACITY`]: function/constant.INLINE_CAPACITY.html

pub mod error;
pub mod function;
pub mod signature;
mod wrapper;

pub use {
    error::BadFunctionCall,
    function::{Function, Storage, INLINE_ALIGN, INLINE_CAPACITY},
    signature::{Callable, Signature},
};
