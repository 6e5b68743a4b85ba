use {std::panic::Location, thiserror::Error};

const BAD_CALL_MESSAGE: &str = "Bad function call";

/// Raised when an empty [`Function`] is invoked.
///
/// Records the source location of the offending [`call`] \ [`try_call`], and displays as
/// `<file>:<line>: Bad function call`.
///
/// [`Function`]: ../function/struct.Function.html
/// [`call`]: ../function/struct.Function.html#method.call
/// [`try_call`]: ../function/struct.Function.html#method.try_call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{}:{}: {}", .location.file(), .location.line(), BAD_CALL_MESSAGE)]
pub struct BadFunctionCall {
    location: &'static Location<'static>,
}

impl BadFunctionCall {
    /// Creates the error for the location of the (`#[track_caller]`) caller.
    #[track_caller]
    pub(crate) fn here() -> Self {
        Self {
            location: Location::caller(),
        }
    }

    /// Call site of the failed invocation.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Source file of the failed invocation.
    pub fn file(&self) -> &'static str {
        self.location.file()
    }

    /// Line of the failed invocation.
    pub fn line(&self) -> u32 {
        self.location.line()
    }

    /// The fixed diagnostic, `"Bad function call"`, without the location.
    pub fn message(&self) -> &'static str {
        BAD_CALL_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let line = line!() + 1;
        let err = BadFunctionCall::here();

        assert_eq!(err.file(), file!());
        assert_eq!(err.line(), line);
        assert_eq!(err.message(), "Bad function call");
        assert_eq!(
            err.to_string(),
            format!("{}:{}: Bad function call", file!(), line)
        );
    }

    #[test]
    fn distinct_call_sites() {
        let a = BadFunctionCall::here();
        let b = BadFunctionCall::here();

        assert_ne!(a, b);
        assert_eq!(a.file(), b.file());
        assert!(b.to_string().ends_with(b.message()));
    }
}
