pub mod melee_engine;
pub mod projectile_engine;
pub mod weapon_crate_manager;

/// Outcome of a single damage application, shared by the projectile and
/// melee pipelines (§4.6 step, §4.7 step 4). `room` turns this into the
/// `player:damaged` / `player:death` / `player:kill_credit` broadcast
/// sequence and feeds kills into `Match::record_kill`.
#[derive(Debug, Clone)]
pub struct DamageOutcome {
    pub victim_id: String,
    pub attacker_id: String,
    pub damage: i32,
    pub victim_health_after: i32,
    pub killed: bool,
}
