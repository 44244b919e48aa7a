//! Unwrap helpers with good error messages.
//!
//! Test code uses these instead of `unwrap()` and `expect()`; the
//! `#[track_caller]` attribute keeps the panic location at the call site.

use std::fmt::Debug;

/// Unwrap a `Result`, panicking with the error value on `Err`.
///
/// ```rust
/// use ble_ota_test_helpers::must;
///
/// let value = must(Ok::<u32, &str>(500));
/// assert_eq!(value, 500);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with `msg` on `None`.
///
/// # Panics
///
/// Panics if the option is `None`.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Unwrap a `Result` with a context message.
///
/// # Panics
///
/// Panics if the result is `Err`, with the context and error value.
#[track_caller]
pub fn must_with<T, E: Debug>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must_with: {context}: {e:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_must_ok() {
        assert_eq!(must(Ok::<i32, &str>(42)), 42);
    }

    #[test]
    #[should_panic(expected = "must: unexpected Err")]
    fn test_must_err() {
        let _ = must(Err::<i32, &str>("link lost"));
    }

    #[test]
    fn test_must_some_present() {
        assert_eq!(must_some(Some(3), "expected attempts"), 3);
    }

    #[test]
    #[should_panic(expected = "must_some: expected a version")]
    fn test_must_some_none() {
        let _ = must_some(None::<String>, "expected a version");
    }

    #[test]
    #[should_panic(expected = "must_with: loading image")]
    fn test_must_with_err() {
        let _ = must_with(Err::<(), &str>("empty"), "loading image");
    }
}
