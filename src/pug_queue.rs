use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serenity::model::prelude::*;
use serenity::prelude::*;

pub struct PugQueueKey;

impl TypeMapKey for PugQueueKey {
    type Value = Arc<RwLock<PugQueue>>;
}

/// A player waiting in the queue. Identity is the Discord user id; the name
/// is only kept for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pugger {
    pub user_id: UserId,
    pub name: String,
}

impl Pugger {
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Appended to the queue, still short of capacity.
    Joined,
    /// Appended, and this join filled the queue.
    Filled,
    AlreadyQueued,
    QueueFull,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left,
    NotQueued,
}

pub struct ScrambledTeams {
    pub first: Vec<Pugger>,
    pub second: Vec<Pugger>,
}

/// The PUG queue for the bot's single configured channel.
///
/// Holds the ordered waiting list plus a snapshot of the roster taken the
/// moment the queue last filled up, which is what `scramble` re-rolls teams
/// from. Lives in the client data TypeMap for the whole process lifetime and
/// is never persisted.
pub struct PugQueue {
    queue: Vec<Pugger>,
    capacity: usize,
    last_full: Vec<Pugger>,
}

impl PugQueue {
    /// `capacity` is the configured total player count, validated to be
    /// positive and even before this is ever constructed.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Vec::with_capacity(capacity),
            capacity,
            last_full: Vec::new(),
        }
    }

    pub fn join(&mut self, pugger: Pugger) -> JoinOutcome {
        if self.queue.iter().any(|p| p.user_id == pugger.user_id) {
            return JoinOutcome::AlreadyQueued;
        }
        if self.queue.len() >= self.capacity {
            return JoinOutcome::QueueFull;
        }
        self.queue.push(pugger);
        if self.queue.len() == self.capacity {
            // The not-full -> full transition is the only point where the
            // scramble roster gets (re)captured.
            self.last_full = self.queue.clone();
            JoinOutcome::Filled
        } else {
            JoinOutcome::Joined
        }
    }

    pub fn leave(&mut self, user_id: UserId) -> LeaveOutcome {
        let num_before = self.queue.len();
        self.queue.retain(|p| p.user_id != user_id);
        if self.queue.len() != num_before {
            LeaveOutcome::Left
        } else {
            LeaveOutcome::NotQueued
        }
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn members(&self) -> &[Pugger] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.capacity
    }

    pub fn num_more_needed(&self) -> usize {
        self.capacity - self.queue.len()
    }

    pub fn last_full_roster(&self) -> &[Pugger] {
        &self.last_full
    }

    /// Suggest two fresh random teams from the last full roster. Draws a new
    /// permutation on every call, so repeated scrambles re-roll until the
    /// players are satisfied. Returns None if no PUG has filled up yet.
    pub fn scramble(&self, rng: &mut impl Rng) -> Option<ScrambledTeams> {
        if self.last_full.is_empty() {
            return None;
        }
        let mut pool = self.last_full.clone();
        pool.shuffle(rng);
        let second = pool.split_off(pool.len() / 2);
        Some(ScrambledTeams {
            first: pool,
            second,
        })
    }
}

/// Whether a user with the given role names may run admin-gated commands.
/// An empty admin role list means no restriction at all.
pub fn is_pug_admin(user_roles: &[String], admin_roles: &[String]) -> bool {
    admin_roles.is_empty() || user_roles.iter().any(|role| admin_roles.contains(role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pugger(id: u64) -> Pugger {
        Pugger::new(UserId::new(id), format!("player{id}"))
    }

    fn ids(puggers: &[Pugger]) -> Vec<UserId> {
        puggers.iter().map(|p| p.user_id).collect()
    }

    #[test]
    fn join_and_leave_stay_within_bounds() {
        let mut queue = PugQueue::new(4);
        for id in 1..=10 {
            queue.join(pugger(id));
            assert!(queue.len() <= queue.capacity());
        }
        for id in 1..=10 {
            queue.leave(UserId::new(id));
            assert!(queue.len() <= queue.capacity());
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn duplicate_join_is_rejected() {
        let mut queue = PugQueue::new(4);
        assert_eq!(queue.join(pugger(1)), JoinOutcome::Joined);
        assert_eq!(queue.join(pugger(1)), JoinOutcome::AlreadyQueued);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn join_when_full_does_not_mutate() {
        let mut queue = PugQueue::new(2);
        queue.join(pugger(1));
        queue.join(pugger(2));
        assert_eq!(queue.join(pugger(3)), JoinOutcome::QueueFull);
        assert_eq!(ids(queue.members()), vec![UserId::new(1), UserId::new(2)]);
    }

    #[test]
    fn leave_when_absent_is_noop() {
        let mut queue = PugQueue::new(4);
        assert_eq!(queue.leave(UserId::new(5)), LeaveOutcome::NotQueued);
        queue.join(pugger(1));
        assert_eq!(queue.leave(UserId::new(5)), LeaveOutcome::NotQueued);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn filling_transition_captures_roster_snapshot() {
        let mut queue = PugQueue::new(4);
        for id in 1..=3 {
            assert_eq!(queue.join(pugger(id)), JoinOutcome::Joined);
            assert!(queue.last_full_roster().is_empty());
        }
        assert_eq!(queue.join(pugger(4)), JoinOutcome::Filled);
        assert_eq!(queue.last_full_roster(), queue.members());
        assert_eq!(
            ids(queue.last_full_roster()),
            (1..=4).map(UserId::new).collect::<Vec<_>>()
        );
    }

    #[test]
    fn snapshot_survives_later_queue_changes() {
        let mut queue = PugQueue::new(2);
        queue.join(pugger(1));
        queue.join(pugger(2));
        queue.leave(UserId::new(1));
        queue.clear();
        assert_eq!(
            ids(queue.last_full_roster()),
            vec![UserId::new(1), UserId::new(2)]
        );
    }

    #[test]
    fn refilling_overwrites_snapshot() {
        let mut queue = PugQueue::new(2);
        queue.join(pugger(1));
        queue.join(pugger(2));
        queue.clear();
        queue.join(pugger(3));
        assert_eq!(queue.join(pugger(4)), JoinOutcome::Filled);
        assert_eq!(
            ids(queue.last_full_roster()),
            vec![UserId::new(3), UserId::new(4)]
        );
    }

    #[test]
    fn scramble_without_full_roster_is_none() {
        let mut queue = PugQueue::new(4);
        queue.join(pugger(1));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(queue.scramble(&mut rng).is_none());
    }

    #[test]
    fn scramble_partitions_roster_into_equal_teams() {
        let mut queue = PugQueue::new(8);
        for id in 1..=8 {
            queue.join(pugger(id));
        }
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let teams = queue.scramble(&mut rng).unwrap();
            assert_eq!(teams.first.len(), 4);
            assert_eq!(teams.second.len(), 4);
            let mut all = ids(&teams.first);
            all.extend(ids(&teams.second));
            all.sort();
            assert_eq!(all, (1..=8).map(UserId::new).collect::<Vec<_>>());
        }
    }

    #[test]
    fn scramble_is_deterministic_for_a_seeded_rng() {
        let mut queue = PugQueue::new(4);
        for id in 1..=4 {
            queue.join(pugger(id));
        }
        let teams_a = queue.scramble(&mut StdRng::seed_from_u64(7)).unwrap();
        let teams_b = queue.scramble(&mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(ids(&teams_a.first), ids(&teams_b.first));
        assert_eq!(ids(&teams_a.second), ids(&teams_b.second));
    }

    #[test]
    fn four_player_scenario() {
        let mut queue = PugQueue::new(4);
        assert_eq!(queue.join(pugger(1)), JoinOutcome::Joined);
        assert_eq!(queue.join(pugger(2)), JoinOutcome::Joined);
        assert_eq!(queue.join(pugger(3)), JoinOutcome::Joined);
        assert!(!queue.is_full());
        assert_eq!(queue.num_more_needed(), 1);
        assert_eq!(queue.join(pugger(4)), JoinOutcome::Filled);
        assert!(queue.is_full());

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..2 {
            let teams = queue.scramble(&mut rng).unwrap();
            assert_eq!(teams.first.len(), 2);
            assert_eq!(teams.second.len(), 2);
        }
    }

    #[test]
    fn admin_predicate_truth_table() {
        let admins = vec!["PUG Admin".to_string(), "Moderator".to_string()];
        let caller = vec!["Pugger".to_string(), "Moderator".to_string()];
        let pleb = vec!["Pugger".to_string()];
        assert!(is_pug_admin(&caller, &admins));
        assert!(!is_pug_admin(&pleb, &admins));
        assert!(!is_pug_admin(&[], &admins));
        // Empty admin set authorizes everyone, including roleless users.
        assert!(is_pug_admin(&pleb, &[]));
        assert!(is_pug_admin(&[], &[]));
    }
}
