use std::collections::HashMap;

use crate::model::player::PlayerState;
use crate::model::projectile::Projectile;
use crate::model::vec2::Vec2;
use crate::model::wall::Wall;
use crate::model::weapon_crate::WeaponCrate;

/// In-memory container for one room's gameplay entities. All mutation goes
/// through `&mut World`, which the owning `Room` only ever hands out while
/// holding its room lock (see `room::RoomState`).
pub struct World {
    pub width: f64,
    pub height: f64,
    players: HashMap<String, PlayerState>,
    projectiles: HashMap<String, Projectile>,
    crates: HashMap<String, WeaponCrate>,
    walls: Vec<Wall>,
}

impl World {
    pub fn new(width: f64, height: f64, walls: Vec<Wall>) -> Self {
        Self {
            width,
            height,
            players: HashMap::new(),
            projectiles: HashMap::new(),
            crates: HashMap::new(),
            walls,
        }
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn add_player(&mut self, player: PlayerState) {
        self.players.insert(player.id.clone(), player);
    }

    pub fn remove_player(&mut self, id: &str) -> Option<PlayerState> {
        self.players.remove(id)
    }

    pub fn get_player(&self, id: &str) -> Option<&PlayerState> {
        self.players.get(id)
    }

    pub fn get_player_mut(&mut self, id: &str) -> Option<&mut PlayerState> {
        self.players.get_mut(id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut PlayerState> {
        self.players.values_mut()
    }

    pub fn living_players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values().filter(|p| !p.is_dead)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn clamp_to_arena(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }

    pub fn add_projectile(&mut self, projectile: Projectile) {
        self.projectiles.insert(projectile.id.clone(), projectile);
    }

    pub fn remove_projectile(&mut self, id: &str) -> Option<Projectile> {
        self.projectiles.remove(id)
    }

    pub fn get_all_projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    pub fn projectiles_mut(&mut self) -> impl Iterator<Item = &mut Projectile> {
        self.projectiles.values_mut()
    }

    pub fn projectile_ids(&self) -> Vec<String> {
        self.projectiles.keys().cloned().collect()
    }

    pub fn add_crate(&mut self, crate_: WeaponCrate) {
        self.crates.insert(crate_.id.clone(), crate_);
    }

    pub fn get_crate(&self, id: &str) -> Option<&WeaponCrate> {
        self.crates.get(id)
    }

    pub fn get_crate_mut(&mut self, id: &str) -> Option<&mut WeaponCrate> {
        self.crates.get_mut(id)
    }

    pub fn get_all_crates(&self) -> impl Iterator<Item = &WeaponCrate> {
        self.crates.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_to_arena_keeps_points_inside_bounds() {
        let world = World::new(1000.0, 800.0, vec![]);
        let clamped = world.clamp_to_arena(Vec2::new(-50.0, 900.0));
        assert_eq!(clamped, Vec2::new(0.0, 800.0));
    }

    #[test]
    fn living_players_excludes_dead() {
        let mut world = World::new(1000.0, 800.0, vec![]);
        let mut alive = PlayerState::new("alive", "a", Vec2::ZERO);
        let mut dead = PlayerState::new("dead", "b", Vec2::ZERO);
        dead.apply_damage(1000);
        alive.health = 100;
        world.add_player(alive);
        world.add_player(dead);
        assert_eq!(world.living_players().count(), 1);
    }
}
