use std::sync::Arc;

use log::info;
use stick_rumble_server::clock::SystemClock;
use stick_rumble_server::config::ServerConfig;
use stick_rumble_server::hub;
use stick_rumble_server::room_manager::RoomManager;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = ServerConfig::from_env();
    let addr = format!("0.0.0.0:{}", config.port);
    let clock = Arc::new(SystemClock::new());
    let room_manager = RoomManager::new(config, clock);

    let app = hub::build_router(room_manager);

    info!("stick-rumble-server listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await.expect("failed to bind listen address");
    axum::serve(listener, app).await.expect("server loop exited unexpectedly");
}
