//! Local two-client demo: alice draws, bob watches, alice undoes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use inkroom::client::RoomClient;
use inkroom::config::SyncConfig;
use inkroom::error::ErrorCode;
use inkroom::input::PointerSample;
use inkroom::profile::{Tool, ToolSettings};
use inkroom::sync::MemoryStore;

const ROOM: &str = "demo";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, code = e.error_code(), "invalid configuration");
            std::process::exit(2);
        }
    };

    let store = Arc::new(MemoryStore::new());
    let mut alice = RoomClient::join(store.clone(), ROOM, "alice", &config);
    let mut bob = RoomClient::join(store.clone(), ROOM, "bob", &config);
    alice.engine_mut().set_viewport(800.0, 600.0);
    bob.engine_mut().set_viewport(800.0, 600.0);
    alice.engine_mut().set_tool_settings(ToolSettings::with_tool(Tool::Pen));

    // A short pen stroke, one sample every 16ms.
    let start = Instant::now();
    alice.pointer_down(&PointerSample::pen(100.0, 100.0, 0.4), start);
    for step in 1..=30u32 {
        tokio::time::sleep(Duration::from_millis(16)).await;
        let x = 100.0 + f64::from(step) * 4.0;
        let y = 100.0 + (f64::from(step) / 4.0).sin() * 20.0;
        alice.pointer_move(&PointerSample::pen(x, y, 0.3 + f64::from(step) / 60.0), Instant::now());
        alice.tick(Instant::now());
    }
    alice.pointer_up(Instant::now());
    alice.settled().await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    alice.sync_remote();
    bob.sync_remote();
    for (key, stroke) in bob.engine().collection.iter() {
        tracing::info!(key = %key, owner = %stroke.owner_id, points = stroke.point_count(), "bob sees stroke");
    }
    tracing::info!(visible = bob.engine().visible().len(), "bob visible strokes");

    match alice.undo() {
        Ok(undone) => tracing::info!(undone, "alice undo"),
        Err(e) => tracing::warn!(error = %e, code = e.error_code(), "alice undo failed"),
    }
    alice.settled().await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    bob.sync_remote();
    tracing::info!(strokes = bob.engine().collection.len(), "bob after undo");

    alice.leave().await;
    bob.leave().await;
}
