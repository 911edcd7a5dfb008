//! Role transition table and routing.
//!
//! Given the role that produced the latest message and the phase it
//! declared, [`route`] returns the worker that runs next. Pairs absent from
//! [`TRANSITIONS`] are terminal.

use serde::Serialize;

use crate::domain::phase::Phase;
use crate::domain::role::Role;

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: Role,
    pub phase: Phase,
    pub to: Role,
}

const fn t(from: Role, phase: Phase, to: Role) -> Transition {
    Transition { from, phase, to }
}

/// The complete transition table.
pub const TRANSITIONS: &[Transition] = &[
    t(Role::EndUser, Phase::Init, Role::Manager),
    t(Role::EndUser, Phase::Revise, Role::Manager),
    t(Role::Manager, Phase::Analysis, Role::Analyst),
    t(Role::Manager, Phase::Design, Role::Architect),
    t(Role::Manager, Phase::Code, Role::Implementer),
    t(Role::Manager, Phase::Test, Role::Tester),
    t(Role::Manager, Phase::Review, Role::Reviewer),
    t(Role::Manager, Phase::Deploy, Role::Deployer),
    t(Role::Analyst, Phase::Design, Role::Architect),
    t(Role::Architect, Phase::Test, Role::Tester),
    t(Role::Architect, Phase::Code, Role::Implementer),
    t(Role::Tester, Phase::Code, Role::Implementer),
    t(Role::Implementer, Phase::Retest, Role::Tester),
    t(Role::Implementer, Phase::Review, Role::Reviewer),
    t(Role::Reviewer, Phase::Deploy, Role::Deployer),
];

/// Raw table lookup, ignoring test-driven mode.
pub fn next_role(from: Role, phase: Phase) -> Option<Role> {
    TRANSITIONS
        .iter()
        .find(|row| row.from == from && row.phase == phase)
        .map(|row| row.to)
}

/// Route to the next worker.
///
/// With test-driven mode off the tester never runs: a transition resolving
/// to it invokes the implementer instead.
pub fn route(from: Role, phase: Phase, tdd_enabled: bool) -> Option<Role> {
    match next_role(from, phase)? {
        Role::Tester if !tdd_enabled => Some(Role::Implementer),
        next => Some(next),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_has_no_duplicate_keys() {
        let keys: HashSet<(Role, Phase)> = TRANSITIONS.iter().map(|r| (r.from, r.phase)).collect();
        assert_eq!(keys.len(), TRANSITIONS.len());
    }

    #[test]
    fn test_end_user_never_a_target() {
        assert!(TRANSITIONS.iter().all(|r| r.to != Role::EndUser));
    }

    #[test]
    fn test_manager_design_routes_to_architect() {
        assert_eq!(route(Role::Manager, Phase::Design, false), Some(Role::Architect));
    }

    #[test]
    fn test_terminal_pairs() {
        assert_eq!(route(Role::Deployer, Phase::Done, true), None);
        assert_eq!(route(Role::Analyst, Phase::Code, true), None);
        assert_eq!(route(Role::Manager, Phase::Init, true), None);
        assert_eq!(route(Role::Tester, Phase::Done, true), None);
    }

    #[test]
    fn test_tester_is_skipped_without_tdd() {
        assert_eq!(route(Role::Architect, Phase::Test, true), Some(Role::Tester));
        assert_eq!(route(Role::Architect, Phase::Test, false), Some(Role::Implementer));
        assert_eq!(route(Role::Implementer, Phase::Retest, false), Some(Role::Implementer));
        assert_eq!(route(Role::Manager, Phase::Test, false), Some(Role::Implementer));
    }
}
