//! Stores a plain function, calls it, copies the container and calls the copy.
//!
//! Run with `RUST_LOG=minifunction=trace` to see where the callable is stored.

use {minifunction::Function, tracing_subscriber::EnvFilter};

fn print(a: i32, b: i32) {
    println!("{}", a + b);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut func0: Function<fn(i32, i32)> = Function::new();
    func0.assign(print);
    func0.call((120182, 24893));

    let func = func0.clone();
    func.call((10, 15));
}
