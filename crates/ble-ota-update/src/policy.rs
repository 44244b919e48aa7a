//! Caller-supplied decisions before risky updates.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::version::VersionCode;

/// Question put to the caller before flashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyQuestion {
    /// Image carries the version already installed
    SameVersion,
    /// Image is older than the installed firmware
    Downgrade,
}

impl std::fmt::Display for PolicyQuestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyQuestion::SameVersion => f.write_str("firmware version is already installed"),
            PolicyQuestion::Downgrade => f.write_str("firmware would downgrade the device"),
        }
    }
}

/// Decides whether an update may proceed.
///
/// Any `Fn(PolicyQuestion) -> bool` closure is a policy.
pub trait UpdatePolicy: Send + Sync {
    /// Return `true` to proceed.
    fn confirm(&self, question: PolicyQuestion) -> bool;
}

impl<F> UpdatePolicy for F
where
    F: Fn(PolicyQuestion) -> bool + Send + Sync,
{
    fn confirm(&self, question: PolicyQuestion) -> bool {
        self(question)
    }
}

/// Proceeds in every case.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl UpdatePolicy for AutoConfirm {
    fn confirm(&self, _question: PolicyQuestion) -> bool {
        true
    }
}

/// Refuses same-version reflashes and downgrades.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyRisky;

impl UpdatePolicy for DenyRisky {
    fn confirm(&self, _question: PolicyQuestion) -> bool {
        false
    }
}

/// Which question, if any, an update from `current` to `candidate` raises.
///
/// Nothing is asked unless both versions are known.
pub fn evaluate_gate(
    current: Option<&VersionCode>,
    candidate: Option<&VersionCode>,
) -> Option<PolicyQuestion> {
    let (current, candidate) = (current?, candidate?);
    match candidate.compare(current) {
        Ordering::Equal => Some(PolicyQuestion::SameVersion),
        Ordering::Less => Some(PolicyQuestion::Downgrade),
        Ordering::Greater => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> VersionCode {
        VersionCode::parse(s)
    }

    #[test]
    fn gate_questions() {
        assert_eq!(
            evaluate_gate(Some(&v("1.0.0")), Some(&v("1.0.0"))),
            Some(PolicyQuestion::SameVersion)
        );
        assert_eq!(
            evaluate_gate(Some(&v("2.0.0")), Some(&v("1.9.9"))),
            Some(PolicyQuestion::Downgrade)
        );
        assert_eq!(evaluate_gate(Some(&v("1.0.0")), Some(&v("1.0.1"))), None);
    }

    #[test]
    fn gate_needs_both_versions() {
        assert_eq!(evaluate_gate(None, Some(&v("1.0.0"))), None);
        assert_eq!(evaluate_gate(Some(&v("1.0.0")), None), None);
    }

    #[test]
    fn closures_are_policies() {
        let only_same = |q: PolicyQuestion| q == PolicyQuestion::SameVersion;
        assert!(only_same.confirm(PolicyQuestion::SameVersion));
        assert!(!only_same.confirm(PolicyQuestion::Downgrade));
        assert!(AutoConfirm.confirm(PolicyQuestion::Downgrade));
        assert!(!DenyRisky.confirm(PolicyQuestion::SameVersion));
    }
}
