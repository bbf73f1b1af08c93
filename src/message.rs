//! Wire contract (§6). Every message is `{ type, timestamp, data }`; `type`
//! is a closed vocabulary matched against `kind`/`data` below. Both
//! directions share these shapes — this is the one schema the spec says
//! both sides validate against.

use serde::{Deserialize, Serialize};

use crate::model::vec2::Vec2;
use crate::model::weapon::{ActionRejection, WeaponType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: u64,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(kind: impl Into<String>, timestamp: u64, data: T) -> Self {
        Self {
            kind: kind.into(),
            timestamp,
            data,
        }
    }
}

/// The closed set of client -> server message kinds (§6).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(rename = "input:state")]
    InputState(InputStateData),
    #[serde(rename = "player:shoot")]
    PlayerShoot(PlayerShootData),
    #[serde(rename = "player:reload")]
    PlayerReload,
    #[serde(rename = "weapon:pickup_attempt")]
    WeaponPickupAttempt(WeaponPickupAttemptData),
    #[serde(rename = "player:melee_attack")]
    PlayerMeleeAttack(PlayerMeleeAttackData),
    #[serde(rename = "player:dodge_roll")]
    PlayerDodgeRoll,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputStateData {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    #[serde(rename = "aimAngle")]
    pub aim_angle: f64,
    #[serde(rename = "isSprinting")]
    pub is_sprinting: bool,
    pub sequence: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerShootData {
    #[serde(rename = "aimAngle")]
    pub aim_angle: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeaponPickupAttemptData {
    #[serde(rename = "crateId")]
    pub crate_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerMeleeAttackData {
    #[serde(rename = "aimAngle")]
    pub aim_angle: f64,
}

/// Minimal broadcast view of one player, used by `player:move`,
/// `state:snapshot` and `state:delta`.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub id: String,
    pub name: String,
    pub position: Vec2,
    pub rotation: f64,
    pub health: i32,
    #[serde(rename = "isDead")]
    pub is_dead: bool,
    #[serde(rename = "isSprinting")]
    pub is_sprinting: bool,
    #[serde(rename = "isRolling")]
    pub is_rolling: bool,
    #[serde(rename = "weaponType")]
    pub weapon_type: WeaponType,
    #[serde(rename = "currentAmmo")]
    pub current_ammo: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileSnapshot {
    pub id: String,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    pub position: Vec2,
    #[serde(rename = "weaponType")]
    pub weapon_type: WeaponType,
}

/// The closed set of server -> client message kinds (§6). Each variant's
/// `kind()` is the wire `type` string.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    RoomJoined(RoomJoinedData),
    PlayerLeft(PlayerLeftData),
    PlayerMove(PlayerMoveData),
    StateSnapshot(StateSnapshotData),
    StateDelta(StateDeltaData),
    ProjectileSpawn(ProjectileSnapshot),
    ProjectileDestroy(ProjectileDestroyData),
    WeaponState(WeaponStateData),
    ShootFailed(ShootFailedData),
    PlayerDamaged(PlayerDamagedData),
    HitConfirmed(HitConfirmedData),
    PlayerDeath(PlayerDeathData),
    PlayerKillCredit(PlayerKillCreditData),
    PlayerRespawn(PlayerRespawnData),
    MatchTimer(MatchTimerData),
    MatchEnded(MatchEndedData),
    WeaponSpawned(WeaponSpawnedData),
    WeaponPickupConfirmed(WeaponPickupConfirmedData),
    WeaponRespawned(WeaponRespawnedData),
    MeleeHit(MeleeHitData),
    RollStart(RollStartData),
    RollEnd(RollEndData),
    RoomClosing,
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::RoomJoined(_) => "room:joined",
            ServerMessage::PlayerLeft(_) => "player:left",
            ServerMessage::PlayerMove(_) => "player:move",
            ServerMessage::StateSnapshot(_) => "state:snapshot",
            ServerMessage::StateDelta(_) => "state:delta",
            ServerMessage::ProjectileSpawn(_) => "projectile:spawn",
            ServerMessage::ProjectileDestroy(_) => "projectile:destroy",
            ServerMessage::WeaponState(_) => "weapon:state",
            ServerMessage::ShootFailed(_) => "shoot:failed",
            ServerMessage::PlayerDamaged(_) => "player:damaged",
            ServerMessage::HitConfirmed(_) => "hit:confirmed",
            ServerMessage::PlayerDeath(_) => "player:death",
            ServerMessage::PlayerKillCredit(_) => "player:kill_credit",
            ServerMessage::PlayerRespawn(_) => "player:respawn",
            ServerMessage::MatchTimer(_) => "match:timer",
            ServerMessage::MatchEnded(_) => "match:ended",
            ServerMessage::WeaponSpawned(_) => "weapon:spawned",
            ServerMessage::WeaponPickupConfirmed(_) => "weapon:pickup_confirmed",
            ServerMessage::WeaponRespawned(_) => "weapon:respawned",
            ServerMessage::MeleeHit(_) => "melee:hit",
            ServerMessage::RollStart(_) => "roll:start",
            ServerMessage::RollEnd(_) => "roll:end",
            ServerMessage::RoomClosing => "room:closing",
        }
    }

    /// Critical messages are always enqueued; droppable messages may be
    /// discarded (oldest-first) when a connection's outbound queue is full.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            ServerMessage::PlayerDeath(_)
                | ServerMessage::MatchEnded(_)
                | ServerMessage::WeaponPickupConfirmed(_)
                | ServerMessage::RoomJoined(_)
                | ServerMessage::RoomClosing
        )
    }

    /// Serializes to the `{type, timestamp, data}` envelope JSON bytes.
    pub fn to_envelope_json(&self, timestamp: u64) -> Vec<u8> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "type")]
            kind: &'a str,
            timestamp: u64,
            data: &'a ServerMessage,
        }
        serde_json::to_vec(&Wire {
            kind: self.kind(),
            timestamp,
            data: self,
        })
        .expect("server messages are always serializable")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomJoinedData {
    #[serde(rename = "playerId")]
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerLeftData {
    #[serde(rename = "playerId")]
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerMoveData {
    pub players: Vec<PlayerSnapshot>,
    #[serde(rename = "lastProcessedSequence")]
    pub last_processed_sequence: std::collections::HashMap<String, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshotData {
    pub players: Vec<PlayerSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateDeltaData {
    #[serde(rename = "changedPlayers")]
    pub changed_players: Vec<PlayerSnapshot>,
    #[serde(rename = "addedProjectiles")]
    pub added_projectiles: Vec<ProjectileSnapshot>,
    #[serde(rename = "removedProjectileIds")]
    pub removed_projectile_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileDestroyData {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeaponStateData {
    #[serde(rename = "playerId")]
    pub player_id: String,
    #[serde(rename = "weaponType")]
    pub weapon_type: WeaponType,
    #[serde(rename = "currentAmmo")]
    pub current_ammo: u32,
    #[serde(rename = "isReloading")]
    pub is_reloading: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShootFailedData {
    pub reason: ActionRejection,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerDamagedData {
    #[serde(rename = "playerId")]
    pub player_id: String,
    #[serde(rename = "attackerId")]
    pub attacker_id: String,
    pub damage: i32,
    pub health: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct HitConfirmedData {
    #[serde(rename = "targetId")]
    pub target_id: String,
    pub damage: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerDeathData {
    #[serde(rename = "playerId")]
    pub player_id: String,
    #[serde(rename = "attackerId")]
    pub attacker_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerKillCreditData {
    #[serde(rename = "attackerId")]
    pub attacker_id: String,
    #[serde(rename = "victimId")]
    pub victim_id: String,
    pub kills: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerRespawnData {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub position: Vec2,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchTimerData {
    #[serde(rename = "remainingSeconds")]
    pub remaining_seconds: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalScore {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub kills: u32,
    pub deaths: u32,
    pub xp: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchEndedData {
    pub winners: Vec<String>,
    #[serde(rename = "finalScores")]
    pub final_scores: Vec<FinalScore>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeaponSpawnedData {
    #[serde(rename = "crateId")]
    pub crate_id: String,
    pub position: Vec2,
    #[serde(rename = "weaponType")]
    pub weapon_type: WeaponType,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeaponPickupConfirmedData {
    #[serde(rename = "playerId")]
    pub player_id: String,
    #[serde(rename = "crateId")]
    pub crate_id: String,
    #[serde(rename = "weaponType")]
    pub weapon_type: WeaponType,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeaponRespawnedData {
    #[serde(rename = "crateId")]
    pub crate_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeleeHitData {
    #[serde(rename = "attackerId")]
    pub attacker_id: String,
    pub victims: Vec<String>,
    #[serde(rename = "knockbackApplied")]
    pub knockback_applied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RollStartData {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub direction: Vec2,
}

#[derive(Debug, Clone, Serialize)]
pub struct RollEndData {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_parses_input_state() {
        let json = r#"{"type":"input:state","timestamp":123,"data":{"up":true,"down":false,"left":false,"right":false,"aimAngle":0.5,"isSprinting":true,"sequence":7}}"#;
        let envelope: Envelope<ClientMessage> = serde_json::from_str(json).unwrap();
        match envelope.data {
            ClientMessage::InputState(data) => {
                assert!(data.up);
                assert_eq!(data.sequence, 7);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn server_message_kind_matches_envelope_type() {
        let msg = ServerMessage::RoomJoined(RoomJoinedData {
            player_id: "p1".into(),
        });
        let bytes = msg.to_envelope_json(1000);
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], "room:joined");
        assert_eq!(value["data"]["playerId"], "p1");
    }

    #[test]
    fn critical_messages_are_flagged() {
        assert!(
            ServerMessage::MatchEnded(MatchEndedData {
                winners: vec![],
                final_scores: vec![],
                reason: "time_limit".into(),
            })
            .is_critical()
        );
        assert!(
            !ServerMessage::PlayerMove(PlayerMoveData {
                players: vec![],
                last_processed_sequence: Default::default(),
            })
            .is_critical()
        );
    }
}
