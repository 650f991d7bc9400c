//! Quote status state machine.
//!
//! The default policy is permissive: any enumerated status is reachable from
//! any other, which matches how shops actually use quotes (correcting a
//! mis-click on an accepted quote, re-sending an expired one). A strict
//! forward-only policy is available behind configuration.

use anyhow::anyhow;
use service_core::error::AppError;
use std::collections::{HashMap, HashSet};

use crate::models::QuoteStatus;

/// Allowed-transition set. `allowed: None` means every enumerated status is
/// reachable from every other.
#[derive(Debug, Clone, Default)]
pub struct TransitionPolicy {
    allowed: Option<HashMap<QuoteStatus, HashSet<QuoteStatus>>>,
}

impl TransitionPolicy {
    /// Any enumerated status reachable from any other.
    pub fn permissive() -> Self {
        Self { allowed: None }
    }

    /// Forward-only graph: draft -> sent -> accepted/rejected/expired.
    pub fn forward_only() -> Self {
        let mut allowed = HashMap::new();
        allowed.insert(
            QuoteStatus::Draft,
            HashSet::from([QuoteStatus::Sent, QuoteStatus::Expired]),
        );
        allowed.insert(
            QuoteStatus::Sent,
            HashSet::from([
                QuoteStatus::Accepted,
                QuoteStatus::Rejected,
                QuoteStatus::Expired,
            ]),
        );
        allowed.insert(QuoteStatus::Accepted, HashSet::new());
        allowed.insert(QuoteStatus::Rejected, HashSet::new());
        allowed.insert(QuoteStatus::Expired, HashSet::new());
        Self {
            allowed: Some(allowed),
        }
    }

    pub fn from_custom(allowed: HashMap<QuoteStatus, HashSet<QuoteStatus>>) -> Self {
        Self {
            allowed: Some(allowed),
        }
    }

    /// Validate a transition between two already-parsed statuses.
    pub fn validate(&self, from: QuoteStatus, to: QuoteStatus) -> Result<(), AppError> {
        let Some(allowed) = &self.allowed else {
            return Ok(());
        };
        if from == to {
            return Ok(());
        }
        let reachable = allowed.get(&from).map(|set| set.contains(&to)).unwrap_or(false);
        if reachable {
            Ok(())
        } else {
            Err(AppError::InvalidTransition(anyhow!(
                "Cannot move quote from '{}' to '{}'",
                from.as_str(),
                to.as_str()
            )))
        }
    }

    /// Parse a caller-supplied status literal, rejecting values outside the
    /// enumerated set.
    pub fn parse_target(&self, literal: &str) -> Result<QuoteStatus, AppError> {
        QuoteStatus::try_parse(literal)
            .ok_or_else(|| AppError::InvalidTransition(anyhow!("Unknown status '{}'", literal)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissive_policy_allows_everything() {
        let policy = TransitionPolicy::permissive();
        for from in QuoteStatus::all() {
            for to in QuoteStatus::all() {
                assert!(policy.validate(from, to).is_ok());
            }
        }
    }

    #[test]
    fn permissive_policy_allows_reopening_accepted() {
        // Terminal states are not hard-terminal under the default policy.
        let policy = TransitionPolicy::permissive();
        assert!(policy
            .validate(QuoteStatus::Accepted, QuoteStatus::Draft)
            .is_ok());
    }

    #[test]
    fn forward_only_policy_follows_the_graph() {
        let policy = TransitionPolicy::forward_only();
        assert!(policy
            .validate(QuoteStatus::Draft, QuoteStatus::Sent)
            .is_ok());
        assert!(policy
            .validate(QuoteStatus::Sent, QuoteStatus::Accepted)
            .is_ok());
        assert!(policy
            .validate(QuoteStatus::Accepted, QuoteStatus::Draft)
            .is_err());
        assert!(policy
            .validate(QuoteStatus::Draft, QuoteStatus::Accepted)
            .is_err());
    }

    #[test]
    fn same_status_is_always_a_no_op() {
        let policy = TransitionPolicy::forward_only();
        assert!(policy
            .validate(QuoteStatus::Accepted, QuoteStatus::Accepted)
            .is_ok());
    }

    #[test]
    fn unknown_literal_is_rejected() {
        let policy = TransitionPolicy::permissive();
        assert!(policy.parse_target("cancelled").is_err());
        assert!(matches!(
            policy.parse_target("sent"),
            Ok(QuoteStatus::Sent)
        ));
    }
}
