//! Ambient configuration (§6 "Configuration"). Every option is read once at
//! startup from the process environment; unset values fall back to the
//! documented defaults. No CLI framework — this is the whole surface.

use std::env;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: String,
    pub tick_rate_hz: u32,
    pub broadcast_delta_hz: u32,
    pub broadcast_snapshot_hz: u32,
    pub match_duration_seconds: u64,
    pub kill_target: u32,
    pub room_capacity: usize,
    pub idle_timeout_ms: u64,
    pub respawn_delay_ms: u64,
    pub pickup_radius: f64,
    pub crate_respawn_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: "8080".to_string(),
            tick_rate_hz: 60,
            broadcast_delta_hz: 20,
            broadcast_snapshot_hz: 1,
            match_duration_seconds: 420,
            kill_target: 15,
            room_capacity: 8,
            idle_timeout_ms: 30_000,
            respawn_delay_ms: 3_000,
            pickup_radius: 50.0,
            crate_respawn_ms: 20_000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env::var("PORT").unwrap_or(defaults.port),
            tick_rate_hz: parse_or("TICK_RATE_HZ", defaults.tick_rate_hz),
            broadcast_delta_hz: parse_or("BROADCAST_DELTA_HZ", defaults.broadcast_delta_hz),
            broadcast_snapshot_hz: parse_or("BROADCAST_SNAPSHOT_HZ", defaults.broadcast_snapshot_hz),
            match_duration_seconds: parse_or("MATCH_DURATION_SECONDS", defaults.match_duration_seconds),
            kill_target: parse_or("KILL_TARGET", defaults.kill_target),
            room_capacity: parse_or("ROOM_CAPACITY", defaults.room_capacity),
            idle_timeout_ms: parse_or("IDLE_TIMEOUT_MS", defaults.idle_timeout_ms),
            respawn_delay_ms: parse_or("RESPAWN_DELAY_MS", defaults.respawn_delay_ms),
            pickup_radius: parse_or("PICKUP_RADIUS", defaults.pickup_radius),
            crate_respawn_ms: parse_or("CRATE_RESPAWN_MS", defaults.crate_respawn_ms),
        }
    }

    pub fn tick_interval_ms(&self) -> u64 {
        1000 / self.tick_rate_hz as u64
    }

    pub fn delta_interval_ms(&self) -> u64 {
        1000 / self.broadcast_delta_hz as u64
    }

    pub fn snapshot_interval_ms(&self) -> u64 {
        1000 / self.broadcast_snapshot_hz as u64
    }

    pub fn match_duration_ms(&self) -> u64 {
        self.match_duration_seconds * 1000
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, "8080");
        assert_eq!(cfg.tick_rate_hz, 60);
        assert_eq!(cfg.tick_interval_ms(), 16);
    }

    #[test]
    fn parse_or_falls_back_on_unset_or_invalid() {
        let value: u32 = parse_or("STICK_RUMBLE_NONEXISTENT_KEY", 42);
        assert_eq!(value, 42);
    }
}
