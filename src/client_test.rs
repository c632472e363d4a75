use serde_json::{Value, json};

use super::*;
use crate::stroke::StrokeKey;
use crate::sync::MemoryStore;

const ROOM: &str = "r1";
const LINES: &str = "rooms/r1/lines";

fn join(store: &Arc<MemoryStore>, user: &str) -> RoomClient {
    RoomClient::join(store.clone(), ROOM, user, &SyncConfig::default())
}

/// Apply deliveries until `pred` holds on the merged collection.
async fn wait_for(client: &mut RoomClient, pred: impl Fn(&StrokeCollection) -> bool) -> bool {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if pred(&client.engine().collection) {
                return true;
            }
            if client.next_remote().await.is_none() {
                return false;
            }
        }
    })
    .await
    .unwrap_or(false)
}

async fn room_keys(store: &MemoryStore) -> Vec<String> {
    match store.get(LINES).await.unwrap() {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Modifiers::default() }
}

fn draw_dot(client: &mut RoomClient, x: f64, y: f64) {
    let now = Instant::now();
    client.pointer_down(&PointerSample::mouse(x, y), now);
    client.pointer_up(now);
}

// =============================================================
// Publishing
// =============================================================

#[tokio::test]
async fn pointer_down_publishes_immediately() {
    let store = Arc::new(MemoryStore::new());
    let mut a = join(&store, "A");
    a.pointer_down(&PointerSample::mouse(100.0, 100.0), Instant::now());
    a.settled().await;

    let lines = store.get(LINES).await.unwrap();
    let record = lines.as_object().and_then(|m| m.values().next()).cloned().unwrap();
    assert_eq!(record["points"], json!([100.0, 100.0]));
    assert_eq!(record["ownerId"], "A");
    assert!(a.publisher().active_key().is_some());
}

#[tokio::test]
async fn tick_flushes_coalesced_growth() {
    let store = Arc::new(MemoryStore::new());
    let mut a = join(&store, "A");
    let start = Instant::now();
    a.pointer_down(&PointerSample::mouse(0.0, 0.0), start);
    a.pointer_move(&PointerSample::mouse(10.0, 0.0), start + Duration::from_millis(10));
    assert!(a.next_flush_in(start + Duration::from_millis(10)).is_some());
    assert!(a.tick(start + Duration::from_millis(150)));
    a.settled().await;

    let key = a.publisher().active_key().cloned().unwrap();
    let record = store.get(&format!("{LINES}/{key}")).await.unwrap();
    assert!(record["points"].as_array().map_or(0, Vec::len) >= 4);
}

#[tokio::test]
async fn peer_sees_stroke_before_pointer_up() {
    let store = Arc::new(MemoryStore::new());
    let mut a = join(&store, "A");
    let mut b = join(&store, "B");
    let start = Instant::now();

    a.pointer_down(&PointerSample::mouse(100.0, 100.0), start);
    a.pointer_move(&PointerSample::mouse(110.0, 100.0), start + Duration::from_millis(200));
    a.settled().await;

    let seen = wait_for(&mut b, |c| c.iter().any(|(_, s)| s.owner_id == "A" && s.points.len() >= 4)).await;
    assert!(seen);
    assert!(a.publisher().active_key().is_some());
}

#[tokio::test]
async fn stroke_visible_while_store_rejects_writes() {
    let store = Arc::new(MemoryStore::new());
    store.set_read_only(true);
    let mut a = join(&store, "A");
    a.engine_mut().set_viewport(800.0, 600.0);
    let start = Instant::now();

    a.pointer_down(&PointerSample::mouse(100.0, 100.0), start);
    a.pointer_move(&PointerSample::mouse(150.0, 100.0), start + Duration::from_millis(10));
    a.settled().await;

    assert!(room_keys(&store).await.is_empty());
    let visible = a.engine().visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].stroke.owner_id, "A");
    assert!(visible[0].stroke.points.len() >= 4);
}

#[tokio::test]
async fn drawn_stroke_renders_under_its_store_key() {
    let store = Arc::new(MemoryStore::new());
    let mut a = join(&store, "A");
    a.engine_mut().set_viewport(800.0, 600.0);
    let start = Instant::now();

    a.pointer_down(&PointerSample::mouse(100.0, 100.0), start);
    a.settled().await;
    let key = a.publisher().active_key().cloned().unwrap();
    assert!(wait_for(&mut a, |c| c.get(&key).is_some()).await);
    a.pointer_move(&PointerSample::mouse(150.0, 100.0), start + Duration::from_millis(10));

    let visible = a.engine().visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].key, &key);
    assert!(visible[0].stroke.points.len() >= 4);
}

// =============================================================
// Undo, redo, clear
// =============================================================

#[tokio::test]
async fn undo_shortcut_removes_only_own_stroke() {
    let store = Arc::new(MemoryStore::new());
    store
        .write(&format!("{LINES}/bob1"), Some(json!({"tool": "pen", "points": [1.0, 1.0], "ownerId": "B"})))
        .await
        .unwrap();
    let mut a = join(&store, "A");
    assert!(wait_for(&mut a, |c| c.len() == 1).await);

    draw_dot(&mut a, 50.0, 50.0);
    a.settled().await;
    assert!(wait_for(&mut a, |c| c.len() == 2).await);

    let actions = a.key_down("z", ctrl(), Instant::now());
    assert_eq!(actions, vec![Action::UndoRequested]);
    a.settled().await;
    assert_eq!(room_keys(&store).await, vec!["bob1".to_owned()]);

    assert!(a.redo().unwrap());
    a.settled().await;
    assert_eq!(room_keys(&store).await.len(), 2);
}

#[tokio::test]
async fn undo_without_own_stroke_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    store
        .write(&format!("{LINES}/bob1"), Some(json!({"tool": "pen", "points": [1.0, 1.0], "ownerId": "B"})))
        .await
        .unwrap();
    let mut a = join(&store, "A");
    assert!(wait_for(&mut a, |c| c.len() == 1).await);

    assert!(!a.undo().unwrap());
    assert!(a.key_down("z", ctrl(), Instant::now()).is_empty());
    a.settled().await;
    assert_eq!(room_keys(&store).await, vec!["bob1".to_owned()]);
}

#[tokio::test]
async fn clear_mine_keeps_peer_strokes() {
    let store = Arc::new(MemoryStore::new());
    let mut a = join(&store, "A");
    let mut b = join(&store, "B");
    draw_dot(&mut a, 0.0, 0.0);
    draw_dot(&mut b, 5.0, 5.0);
    a.settled().await;
    b.settled().await;
    assert!(wait_for(&mut a, |c| c.len() == 2).await);

    assert_eq!(a.clear_mine().unwrap(), 1);
    a.settled().await;
    let remaining = store.get(LINES).await.unwrap();
    let owners: Vec<&str> =
        remaining.as_object().map(|m| m.values().filter_map(|v| v["ownerId"].as_str()).collect()).unwrap_or_default();
    assert_eq!(owners, vec!["B"]);
}

#[tokio::test]
async fn clear_all_empties_room_for_everyone() {
    let store = Arc::new(MemoryStore::new());
    let mut a = join(&store, "A");
    let mut b = join(&store, "B");
    draw_dot(&mut a, 0.0, 0.0);
    a.settled().await;
    assert!(wait_for(&mut b, |c| c.len() == 1).await);

    b.clear_all().unwrap();
    b.settled().await;
    assert!(wait_for(&mut a, StrokeCollection::is_empty).await);
}

// =============================================================
// Remote state
// =============================================================

#[tokio::test]
async fn sync_remote_applies_pending_deliveries() {
    let store = Arc::new(MemoryStore::new());
    let mut a = join(&store, "A");
    store
        .write(&format!("{LINES}/k1"), Some(json!({"tool": "pen", "points": [1.0, 1.0], "ownerId": "B"})))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(a.sync_remote() >= 1);
    assert!(a.engine().stroke(&StrokeKey::from("k1")).is_some());
}

#[tokio::test]
async fn leave_drains_writes_and_stops() {
    let store = Arc::new(MemoryStore::new());
    let mut a = join(&store, "A");
    a.pointer_down(&PointerSample::mouse(1.0, 1.0), Instant::now());
    tokio::time::timeout(Duration::from_secs(1), a.leave()).await.unwrap();
    assert_eq!(room_keys(&store).await.len(), 1);
    assert_eq!(store.subscriber_count(), 0);
}
