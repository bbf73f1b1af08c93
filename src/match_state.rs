//! C9: per-room match state machine — kill tracking, win conditions, and
//! final-score aggregation.

use std::collections::{HashMap, HashSet};

use crate::message::FinalScore;
use crate::model::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    Pending,
    Running,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    KillTarget,
    TimeLimit,
    ServerError,
}

impl EndReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EndReason::KillTarget => "kill_target",
            EndReason::TimeLimit => "time_limit",
            EndReason::ServerError => "server_error",
        }
    }
}

/// Tracks kills, participants and end-of-match state for one room. Survives
/// for exactly one Match; the Room replaces it wholesale when a new Match
/// starts (no generation can see a stale Match's state).
pub struct Match {
    pub room_id: String,
    pub phase: MatchPhase,
    pub start_time: u64,
    pub end_time: Option<u64>,
    pub end_reason: Option<EndReason>,
    kill_target: u32,
    duration_ms: u64,
    player_kills: HashMap<String, u32>,
    participants: HashSet<String>,
}

impl Match {
    pub fn new(room_id: impl Into<String>, kill_target: u32, duration_ms: u64) -> Self {
        Self {
            room_id: room_id.into(),
            phase: MatchPhase::Pending,
            start_time: 0,
            end_time: None,
            end_reason: None,
            kill_target,
            duration_ms,
            player_kills: HashMap::new(),
            participants: HashSet::new(),
        }
    }

    pub fn start(&mut self, now: u64) {
        self.start_time = now;
        self.phase = MatchPhase::Running;
    }

    pub fn is_ended(&self) -> bool {
        self.phase == MatchPhase::Ended
    }

    /// Registers a player as having participated, even if they never score
    /// a kill. Called on join so `get_final_scores` never drops them.
    pub fn register_participant(&mut self, player_id: impl Into<String>) {
        self.participants.insert(player_id.into());
    }

    /// Returns the end reason if recording this kill reached the kill
    /// target, i.e. the caller must broadcast `match:ended` this tick.
    pub fn record_kill(&mut self, attacker_id: &str, victim_id: &str) -> Option<EndReason> {
        if self.is_ended() {
            return None;
        }
        self.participants.insert(attacker_id.to_string());
        self.participants.insert(victim_id.to_string());
        let kills = self.player_kills.entry(attacker_id.to_string()).or_insert(0);
        *kills += 1;
        if *kills >= self.kill_target {
            self.end(EndReason::KillTarget, 0);
            return Some(EndReason::KillTarget);
        }
        None
    }

    /// Tick hook (§4.9): ends the match on time limit. `now` must be the
    /// same clock driving `start`.
    pub fn check_time_limit(&mut self, now: u64) -> Option<EndReason> {
        if self.is_ended() || self.phase != MatchPhase::Running {
            return None;
        }
        if now.saturating_sub(self.start_time) >= self.duration_ms {
            self.end(EndReason::TimeLimit, now);
            return Some(EndReason::TimeLimit);
        }
        None
    }

    pub fn end(&mut self, reason: EndReason, now: u64) {
        if self.is_ended() {
            return;
        }
        self.phase = MatchPhase::Ended;
        self.end_time = Some(now);
        self.end_reason = Some(reason);
    }

    /// The participants with the maximum kill count; ties produce multiple
    /// winners. Players with no recorded kills count as zero.
    pub fn determine_winners(&self) -> Vec<String> {
        let max_kills = self
            .participants
            .iter()
            .map(|p| self.player_kills.get(p).copied().unwrap_or(0))
            .max()
            .unwrap_or(0);

        let mut winners: Vec<String> = self
            .participants
            .iter()
            .filter(|p| self.player_kills.get(*p).copied().unwrap_or(0) == max_kills)
            .cloned()
            .collect();
        winners.sort();
        winners
    }

    /// Critical contract (§4.9, §9 fix #1): iterates every `participants`
    /// entry, not just `player_kills` keys, so zero-kill players still
    /// appear. Reads `deaths`/`xp` from whichever PlayerState the world
    /// still has (a participant who already disconnected keeps their last
    /// known kill count but reports zero deaths/xp since that state left
    /// with them).
    pub fn get_final_scores(&self, world: &World) -> Vec<FinalScore> {
        let mut scores: Vec<FinalScore> = self
            .participants
            .iter()
            .map(|player_id| {
                let kills = self.player_kills.get(player_id).copied().unwrap_or(0);
                let (deaths, xp) = world
                    .get_player(player_id)
                    .map(|p| (p.stats.deaths(), p.stats.xp()))
                    .unwrap_or((0, 0));
                FinalScore {
                    player_id: player_id.clone(),
                    kills,
                    deaths,
                    xp,
                }
            })
            .collect();
        scores.sort_by(|a, b| a.player_id.cmp(&b.player_id));
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::player::PlayerState;
    use crate::model::vec2::Vec2;

    fn world_with(ids: &[&str]) -> World {
        let mut world = World::new(1000.0, 1000.0, vec![]);
        for id in ids {
            let mut p = PlayerState::new(*id, *id, Vec2::ZERO);
            p.stats.increment_deaths();
            p.stats.add_xp(10);
            world.add_player(p);
        }
        world
    }

    #[test]
    fn zero_kill_participant_appears_in_final_scores() {
        let mut m = Match::new("room1", 5, 420_000);
        m.start(0);
        m.register_participant("p1");
        m.register_participant("p2");
        m.register_participant("p3");
        m.record_kill("p1", "p2");
        m.record_kill("p1", "p2");
        m.record_kill("p1", "p2");
        m.end(EndReason::TimeLimit, 420_000);

        let world = world_with(&["p1", "p2", "p3"]);
        let scores = m.get_final_scores(&world);
        assert_eq!(scores.len(), 3);
        let p3 = scores.iter().find(|s| s.player_id == "p3").unwrap();
        assert_eq!(p3.kills, 0);
        let p1 = scores.iter().find(|s| s.player_id == "p1").unwrap();
        assert_eq!(p1.kills, 3);
    }

    #[test]
    fn kill_target_ends_match_immediately_and_freezes_state() {
        let mut m = Match::new("room1", 3, 420_000);
        m.start(0);
        m.register_participant("p1");
        m.register_participant("p2");
        assert!(m.record_kill("p1", "p2").is_none());
        assert!(m.record_kill("p1", "p2").is_none());
        let reason = m.record_kill("p1", "p2");
        assert_eq!(reason, Some(EndReason::KillTarget));
        assert!(m.is_ended());

        assert!(m.record_kill("p1", "p2").is_none());
        let world = world_with(&["p1", "p2"]);
        let scores_before = m.get_final_scores(&world);
        let scores_after = m.get_final_scores(&world);
        assert_eq!(
            scores_before.iter().map(|s| s.kills).collect::<Vec<_>>(),
            scores_after.iter().map(|s| s.kills).collect::<Vec<_>>()
        );
        assert_eq!(m.determine_winners(), vec!["p1".to_string()]);
    }

    #[test]
    fn tied_kills_produce_multiple_winners() {
        let mut m = Match::new("room1", 10, 420_000);
        m.start(0);
        m.register_participant("p1");
        m.register_participant("p2");
        m.record_kill("p1", "p2");
        m.record_kill("p2", "p1");
        assert_eq!(m.determine_winners(), vec!["p1".to_string(), "p2".to_string()]);
    }
}
