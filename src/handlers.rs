//! C13: translates a parsed `ClientMessage` into the `Room` call it maps
//! to. Kept as a thin dispatch table on purpose — every actual rule lives
//! on `Room`, this just routes.

use crate::message::ClientMessage;
use crate::model::player::InputState;
use crate::room::Room;

pub fn dispatch(room: &Room, player_id: &str, message: ClientMessage) {
    match message {
        ClientMessage::InputState(data) => {
            room.handle_input(
                player_id,
                InputState {
                    up: data.up,
                    down: data.down,
                    left: data.left,
                    right: data.right,
                    aim_angle: data.aim_angle,
                    is_sprinting: data.is_sprinting,
                    sequence: data.sequence,
                },
            );
        }
        ClientMessage::PlayerShoot(data) => room.handle_shoot(player_id, data.aim_angle),
        ClientMessage::PlayerReload => room.handle_reload(player_id),
        ClientMessage::WeaponPickupAttempt(data) => room.handle_pickup_attempt(player_id, &data.crate_id),
        ClientMessage::PlayerMeleeAttack(data) => room.handle_melee(player_id, data.aim_angle),
        ClientMessage::PlayerDodgeRoll => room.handle_dodge_roll(player_id),
    }
}
