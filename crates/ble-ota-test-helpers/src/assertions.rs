//! Assertion macros for update outcomes and packet streams.

/// Assert that an [`UpdateOutcome`](ble_ota_update::UpdateOutcome) reports
/// success.
///
/// ```rust,ignore
/// assert_update_succeeded!(outcome);
/// ```
#[macro_export]
macro_rules! assert_update_succeeded {
    ($outcome:expr $(,)?) => {{
        let outcome = &$outcome;
        if !outcome.success || outcome.error.is_some() {
            panic!(
                "assertion failed: update did not succeed\n  success: {}\n    error: {:?}",
                outcome.success, outcome.error
            );
        }
    }};
}

/// Assert that an [`UpdateOutcome`](ble_ota_update::UpdateOutcome) failed
/// with an error matching `pattern`.
///
/// ```rust,ignore
/// assert_update_failed!(outcome, OtaError::Device(ErrorCode::FlashWriteFailed));
/// ```
#[macro_export]
macro_rules! assert_update_failed {
    ($outcome:expr, $pattern:pat $(,)?) => {{
        let outcome = &$outcome;
        match &outcome.error {
            Some($pattern) if !outcome.success && outcome.new_version.is_none() => {}
            other => panic!(
                "assertion failed: expected failure matching `{}`\n  success: {}\n    error: {:?}",
                stringify!($pattern),
                outcome.success,
                other
            ),
        }
    }};
}

/// Assert that sequence numbers count up from zero without gaps, wrapping
/// at `u16::MAX`.
///
/// ```rust
/// use ble_ota_test_helpers::assert_contiguous_seq;
///
/// assert_contiguous_seq!([0u16, 1, 2]);
/// ```
#[macro_export]
macro_rules! assert_contiguous_seq {
    ($seqs:expr $(,)?) => {{
        let seqs = &$seqs;
        for (i, seq) in seqs.iter().enumerate() {
            let expected = (i % (usize::from(u16::MAX) + 1)) as u16;
            if *seq != expected {
                panic!(
                    "assertion failed: sequence gap at index {}: expected {}, got {}\n  seqs: {:?}",
                    i, expected, seq, seqs
                );
            }
        }
    }};
}
