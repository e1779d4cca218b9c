//! In-memory index of live sessions and the memberships behind them.
//!
//! The index answers "which sessions must die" when the identity provider
//! reports a membership change. It keeps two maps behind one lock:
//! - username → session ID → binding
//! - `"org/team"` → usernames holding a session bound to that team
//!
//! Whenever the lock is not held:
//! - no username maps to an empty session map
//! - no team maps to an empty user set
//! - a user is in a team's set exactly when at least one of their sessions
//!   is bound to that team
//! - org-only bindings never appear on the team side
//!
//! The index is process-lifetime state rebuilt from live logins. It never
//! talks to the session store; removal queries return the affected session
//! IDs for the caller to destroy.

use crate::binding::{TeamBinding, team_name};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use teamgate_core::SessionId;
use tracing::debug;

type SessionBindings = HashMap<SessionId, TeamBinding>;

#[derive(Debug, Default)]
struct Maps {
    user_sessions: HashMap<String, SessionBindings>,
    team_users: HashMap<String, HashSet<String>>,
}

impl Maps {
    fn insert(&mut self, username: &str, session_id: SessionId, binding: TeamBinding) {
        let key = binding.team_key();
        let sessions = self.user_sessions.entry(username.to_string()).or_default();
        let previous = sessions.insert(session_id, binding);

        if let Some(previous_key) = previous.and_then(|binding| binding.team_key()) {
            if key.as_ref() != Some(&previous_key) && !bound_to(sessions, &previous_key) {
                unlink(&mut self.team_users, &previous_key, username);
            }
        }
        if let Some(key) = key {
            self.team_users
                .entry(key)
                .or_default()
                .insert(username.to_string());
        }
    }

    /// Removes the user's sessions whose binding satisfies `matches`.
    fn remove_where(
        &mut self,
        username: &str,
        matches: impl Fn(&SessionId, &TeamBinding) -> bool,
    ) -> Vec<SessionId> {
        let Some(sessions) = self.user_sessions.get_mut(username) else {
            return Vec::new();
        };

        let mut removed: Vec<SessionId> = sessions
            .iter()
            .filter(|(id, binding)| matches(id, binding))
            .map(|(id, _)| id.clone())
            .collect();

        let mut touched = HashSet::new();
        for id in &removed {
            if let Some(key) = sessions.remove(id).and_then(|binding| binding.team_key()) {
                touched.insert(key);
            }
        }
        for key in touched {
            if !bound_to(sessions, &key) {
                unlink(&mut self.team_users, &key, username);
            }
        }
        if sessions.is_empty() {
            self.user_sessions.remove(username);
        }

        removed.sort();
        removed
    }
}

fn bound_to(sessions: &SessionBindings, key: &str) -> bool {
    sessions
        .values()
        .any(|binding| binding.team_key().as_deref() == Some(key))
}

fn unlink(team_users: &mut HashMap<String, HashSet<String>>, key: &str, username: &str) {
    if let Some(users) = team_users.get_mut(key) {
        users.remove(username);
        if users.is_empty() {
            team_users.remove(key);
        }
    }
}

/// Concurrency-safe bidirectional session index.
///
/// Every operation runs entirely under one exclusive lock and never blocks
/// on I/O while holding it.
#[derive(Debug, Default)]
pub struct SessionIndex {
    maps: Mutex<Maps>,
}

impl SessionIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn maps(&self) -> MutexGuard<'_, Maps> {
        // The maps are consistent after every statement that can panic, so a
        // poisoned lock still guards valid data.
        self.maps.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a freshly logged-in session.
    ///
    /// Re-inserting a known session ID replaces its binding.
    pub fn insert(&self, username: &str, session_id: SessionId, binding: TeamBinding) {
        debug!(username, session_id = %session_id, binding = %binding, "indexing session");
        self.maps().insert(username, session_id, binding);
    }

    /// Removes one of the user's own sessions.
    ///
    /// Returns true if the session was indexed.
    pub fn remove_by_user_and_session(&self, username: &str, session_id: &SessionId) -> bool {
        let removed = self.maps().remove_where(username, |id, _| id == session_id);
        !removed.is_empty()
    }

    /// Removes every session of the user.
    pub fn remove_all_for_user(&self, username: &str) -> Vec<SessionId> {
        let removed = self.maps().remove_where(username, |_, _| true);
        debug!(username, count = removed.len(), "removed all sessions of user");
        removed
    }

    /// Removes the user's sessions granted by membership of `org` alone.
    ///
    /// Team-bound sessions survive; team events cover those separately.
    pub fn remove_for_user_in_org(&self, username: &str, org: &str) -> Vec<SessionId> {
        let removed = self
            .maps()
            .remove_where(username, |_, binding| binding.is_org_only(org));
        debug!(username, org, count = removed.len(), "removed org-only sessions of user");
        removed
    }

    /// Removes the user's sessions bound to exactly `org`/`team`.
    pub fn remove_for_user_in_org_team(
        &self,
        username: &str,
        org: &str,
        team: &str,
    ) -> Vec<SessionId> {
        let removed = self
            .maps()
            .remove_where(username, |_, binding| binding.is_team(org, team));
        debug!(username, org, team, count = removed.len(), "removed team sessions of user");
        removed
    }

    /// Removes every session bound to `org`/`team`, across all users.
    ///
    /// Only the team's own members are visited.
    pub fn remove_for_org_team(&self, org: &str, team: &str) -> Vec<SessionId> {
        let key = team_name(org, team);
        let mut maps = self.maps();

        let members: Vec<String> = maps
            .team_users
            .get(&key)
            .map(|users| users.iter().cloned().collect())
            .unwrap_or_default();

        let mut removed = Vec::new();
        for username in &members {
            removed.extend(maps.remove_where(username, |_, binding| binding.is_team(org, team)));
        }
        maps.team_users.remove(&key);
        drop(maps);

        removed.sort();
        debug!(team = %key, users = members.len(), count = removed.len(), "removed team sessions");
        removed
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let maps = self.maps();
        maps.user_sessions.is_empty() && maps.team_users.is_empty()
    }

    /// Returns the number of indexed sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.maps().user_sessions.values().map(HashMap::len).sum()
    }

    /// Returns the user's indexed sessions, ordered by session ID.
    #[must_use]
    pub fn sessions_of(&self, username: &str) -> Vec<(SessionId, TeamBinding)> {
        let mut sessions: Vec<_> = self
            .maps()
            .user_sessions
            .get(username)
            .map(|sessions| {
                sessions
                    .iter()
                    .map(|(id, binding)| (id.clone(), binding.clone()))
                    .collect()
            })
            .unwrap_or_default();
        sessions.sort_by(|a, b| a.0.cmp(&b.0));
        sessions
    }

    /// Returns the users holding a session bound to `org`/`team`, sorted.
    #[must_use]
    pub fn team_members(&self, org: &str, team: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .maps()
            .team_users
            .get(&team_name(org, team))
            .map(|users| users.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }
}

#[cfg(test)]
impl SessionIndex {
    /// Panics if any structural invariant is violated.
    pub(crate) fn assert_consistent(&self) {
        let maps = self.maps();

        for (username, sessions) in &maps.user_sessions {
            assert!(!sessions.is_empty(), "empty session map for {username}");
            for (id, binding) in sessions {
                if let Some(key) = binding.team_key() {
                    let present = maps
                        .team_users
                        .get(&key)
                        .is_some_and(|users| users.contains(username));
                    assert!(present, "{username}/{id} bound to {key} but not in team set");
                }
            }
        }

        for (key, users) in &maps.team_users {
            assert!(!users.is_empty(), "empty user set for {key}");
            for username in users {
                let backed = maps
                    .user_sessions
                    .get(username)
                    .is_some_and(|sessions| bound_to(sessions, key));
                assert!(backed, "{username} in {key} without a bound session");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn id(s: &str) -> SessionId {
        SessionId::new(s)
    }

    #[test]
    fn new_index_is_empty() {
        let index = SessionIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.session_count(), 0);
    }

    #[test]
    fn insert_team_binding_links_both_sides() {
        let index = SessionIndex::new();
        index.insert("alice", id("sess1"), TeamBinding::team("acme", "infra"));

        assert_eq!(index.session_count(), 1);
        assert_eq!(index.team_members("acme", "infra"), vec!["alice"]);
        index.assert_consistent();
    }

    #[test]
    fn insert_org_only_binding_stays_off_team_side() {
        let index = SessionIndex::new();
        index.insert("bob", id("sess1"), TeamBinding::org_only("acme"));

        assert_eq!(index.session_count(), 1);
        assert!(index.team_members("acme", "infra").is_empty());
        index.assert_consistent();
    }

    #[test]
    fn remove_for_org_team_empties_index() {
        let index = SessionIndex::new();
        index.insert("alice", id("sess1"), TeamBinding::team("acme", "infra"));

        assert_eq!(index.remove_for_org_team("acme", "infra"), vec![id("sess1")]);
        assert!(index.is_empty());
    }

    #[test]
    fn remove_for_org_team_spares_other_bindings() {
        let index = SessionIndex::new();
        index.insert("alice", id("a1"), TeamBinding::team("acme", "infra"));
        index.insert("alice", id("a2"), TeamBinding::team("acme", "web"));
        index.insert("carol", id("c1"), TeamBinding::team("acme", "infra"));
        index.insert("dave", id("d1"), TeamBinding::org_only("acme"));

        let removed = index.remove_for_org_team("acme", "infra");
        assert_eq!(removed, vec![id("a1"), id("c1")]);

        assert_eq!(
            index.sessions_of("alice"),
            vec![(id("a2"), TeamBinding::team("acme", "web"))]
        );
        assert!(index.sessions_of("carol").is_empty());
        assert_eq!(index.sessions_of("dave").len(), 1);
        assert!(index.team_members("acme", "infra").is_empty());
        index.assert_consistent();
    }

    #[test]
    fn remove_for_user_in_org_only_drops_org_only_sessions() {
        let index = SessionIndex::new();
        index.insert("bob", id("org-sess"), TeamBinding::org_only("acme"));
        index.insert("bob", id("team-sess"), TeamBinding::team("acme", "infra"));

        assert_eq!(index.remove_for_user_in_org("bob", "acme"), vec![id("org-sess")]);
        assert_eq!(
            index.sessions_of("bob"),
            vec![(id("team-sess"), TeamBinding::team("acme", "infra"))]
        );
        assert_eq!(index.team_members("acme", "infra"), vec!["bob"]);
        index.assert_consistent();
    }

    #[test]
    fn remove_for_user_in_org_ignores_other_orgs() {
        let index = SessionIndex::new();
        index.insert("bob", id("s1"), TeamBinding::org_only("other"));

        assert!(index.remove_for_user_in_org("bob", "acme").is_empty());
        assert_eq!(index.session_count(), 1);
    }

    #[test]
    fn remove_for_user_in_org_team_is_exact() {
        let index = SessionIndex::new();
        index.insert("erin", id("e1"), TeamBinding::team("acme", "infra"));
        index.insert("erin", id("e2"), TeamBinding::team("acme", "web"));
        index.insert("erin", id("e3"), TeamBinding::org_only("acme"));
        index.insert("frank", id("f1"), TeamBinding::team("acme", "infra"));

        assert_eq!(
            index.remove_for_user_in_org_team("erin", "acme", "infra"),
            vec![id("e1")]
        );
        assert_eq!(index.sessions_of("erin").len(), 2);
        assert_eq!(index.team_members("acme", "infra"), vec!["frank"]);
        index.assert_consistent();
    }

    #[test]
    fn remove_all_for_user_prunes_team_sets() {
        let index = SessionIndex::new();
        index.insert("alice", id("a1"), TeamBinding::team("acme", "infra"));
        index.insert("alice", id("a2"), TeamBinding::org_only("acme"));
        index.insert("bob", id("b1"), TeamBinding::team("acme", "infra"));

        assert_eq!(index.remove_all_for_user("alice"), vec![id("a1"), id("a2")]);
        assert!(index.sessions_of("alice").is_empty());
        assert_eq!(index.team_members("acme", "infra"), vec!["bob"]);
        index.assert_consistent();
    }

    #[test]
    fn own_session_removal_keeps_team_link_for_sibling_session() {
        let index = SessionIndex::new();
        index.insert("alice", id("laptop"), TeamBinding::team("acme", "infra"));
        index.insert("alice", id("phone"), TeamBinding::team("acme", "infra"));

        assert!(index.remove_by_user_and_session("alice", &id("laptop")));
        assert_eq!(index.team_members("acme", "infra"), vec!["alice"]);
        index.assert_consistent();

        // Team deletion must still reach the remaining session.
        assert_eq!(index.remove_for_org_team("acme", "infra"), vec![id("phone")]);
        assert!(index.is_empty());
    }

    #[test]
    fn own_session_removal_of_unknown_session_is_noop() {
        let index = SessionIndex::new();
        index.insert("alice", id("a1"), TeamBinding::team("acme", "infra"));

        assert!(!index.remove_by_user_and_session("alice", &id("nope")));
        assert!(!index.remove_by_user_and_session("nobody", &id("a1")));
        assert_eq!(index.session_count(), 1);
    }

    #[test]
    fn reinsert_moves_session_to_new_team() {
        let index = SessionIndex::new();
        index.insert("alice", id("a1"), TeamBinding::team("acme", "infra"));
        index.insert("alice", id("a1"), TeamBinding::team("acme", "web"));

        assert_eq!(index.session_count(), 1);
        assert!(index.team_members("acme", "infra").is_empty());
        assert_eq!(index.team_members("acme", "web"), vec!["alice"]);
        index.assert_consistent();
    }

    #[test]
    fn removals_are_idempotent() {
        let index = SessionIndex::new();
        index.insert("alice", id("a1"), TeamBinding::team("acme", "infra"));
        index.insert("alice", id("a2"), TeamBinding::org_only("acme"));
        index.insert("bob", id("b1"), TeamBinding::team("acme", "web"));
        index.insert("carol", id("c1"), TeamBinding::org_only("bigco"));

        assert!(!index.remove_for_org_team("acme", "infra").is_empty());
        assert!(index.remove_for_org_team("acme", "infra").is_empty());

        assert!(!index.remove_for_user_in_org("alice", "acme").is_empty());
        assert!(index.remove_for_user_in_org("alice", "acme").is_empty());

        assert!(!index.remove_for_user_in_org_team("bob", "acme", "web").is_empty());
        assert!(index.remove_for_user_in_org_team("bob", "acme", "web").is_empty());

        assert!(!index.remove_all_for_user("carol").is_empty());
        assert!(index.remove_all_for_user("carol").is_empty());

        assert!(index.is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert {
            user: usize,
            session: u8,
            team: Option<usize>,
        },
        RemoveSession {
            user: usize,
            session: u8,
        },
        RemoveForUser {
            user: usize,
        },
        RemoveForOrg {
            user: usize,
        },
        RemoveForUserTeam {
            user: usize,
            team: usize,
        },
        RemoveForOrgTeam {
            team: usize,
        },
    }

    const USERS: [&str; 3] = ["alice", "bob", "carol"];
    const TEAMS: [&str; 2] = ["infra", "web"];

    fn op() -> impl Strategy<Value = Op> {
        let user = 0..USERS.len();
        let team = 0..TEAMS.len();
        let session = 0u8..12;
        prop_oneof![
            3 => (user.clone(), session.clone(), proptest::option::of(team.clone()))
                .prop_map(|(user, session, team)| Op::Insert { user, session, team }),
            1 => (user.clone(), session).prop_map(|(user, session)| Op::RemoveSession { user, session }),
            1 => user.clone().prop_map(|user| Op::RemoveForUser { user }),
            1 => user.clone().prop_map(|user| Op::RemoveForOrg { user }),
            1 => (user, team.clone()).prop_map(|(user, team)| Op::RemoveForUserTeam { user, team }),
            1 => team.prop_map(|team| Op::RemoveForOrgTeam { team }),
        ]
    }

    fn session_id(session: u8) -> SessionId {
        id(&format!("s{session}"))
    }

    fn apply(index: &SessionIndex, op: &Op) {
        match *op {
            Op::Insert { user, session, team } => {
                let binding = match team {
                    Some(team) => TeamBinding::team("acme", TEAMS[team]),
                    None => TeamBinding::org_only("acme"),
                };
                index.insert(USERS[user], session_id(session), binding);
            }
            Op::RemoveSession { user, session } => {
                index.remove_by_user_and_session(USERS[user], &session_id(session));
            }
            Op::RemoveForUser { user } => {
                index.remove_all_for_user(USERS[user]);
            }
            Op::RemoveForOrg { user } => {
                index.remove_for_user_in_org(USERS[user], "acme");
            }
            Op::RemoveForUserTeam { user, team } => {
                index.remove_for_user_in_org_team(USERS[user], "acme", TEAMS[team]);
            }
            Op::RemoveForOrgTeam { team } => {
                index.remove_for_org_team("acme", TEAMS[team]);
            }
        }
    }

    proptest! {
        #[test]
        fn invariants_hold_over_any_sequence(ops in prop::collection::vec(op(), 0..200)) {
            let index = SessionIndex::new();
            for op in &ops {
                apply(&index, op);
                index.assert_consistent();
            }
        }

        #[test]
        fn repeated_removal_returns_nothing(
            ops in prop::collection::vec(op(), 0..100),
            last in op(),
        ) {
            prop_assume!(!matches!(last, Op::Insert { .. }));
            let index = SessionIndex::new();
            for op in &ops {
                apply(&index, op);
            }
            apply(&index, &last);
            let before = index.session_count();
            apply(&index, &last);
            prop_assert_eq!(index.session_count(), before);
            index.assert_consistent();
        }
    }

    #[test]
    fn concurrent_logins_and_removals_stay_consistent() {
        let index = Arc::new(SessionIndex::new());

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let index = Arc::clone(&index);
                scope.spawn(move || {
                    for n in 0..200 {
                        let user = format!("user{}", n % 5);
                        let session = id(&format!("w{worker}-s{n}"));
                        index.insert(&user, session, TeamBinding::team("acme", "infra"));
                        if n % 3 == 0 {
                            index.remove_for_org_team("acme", "infra");
                        }
                        if n % 7 == 0 {
                            index.remove_all_for_user(&user);
                        }
                    }
                });
            }
        });

        index.assert_consistent();
        index.remove_for_org_team("acme", "infra");
        assert!(index.is_empty());
    }
}
