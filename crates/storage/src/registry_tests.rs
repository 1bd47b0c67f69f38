// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;
use yare::parameterized;

fn table_names(path: &Path) -> Vec<String> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn default_registry_lists_three_stores_in_order() {
    let registry = StoreRegistry::with_default_stores("/data").unwrap();
    let ids: Vec<_> = registry.ids().collect();
    assert_eq!(ids, vec![BOT_STORE, ROOM_STORE, SCANNER_STORE]);
    assert_eq!(
        registry.path_of(ROOM_STORE).unwrap(),
        PathBuf::from("/data/frd_room.db")
    );
}

#[test]
fn unknown_store_is_an_error() {
    let registry = StoreRegistry::with_default_stores("/data").unwrap();
    assert!(matches!(
        registry.get("nope.db"),
        Err(StorageError::UnknownStore(id)) if id == "nope.db"
    ));
}

#[test]
fn duplicate_ids_are_rejected() {
    let def = StoreDef::new("a.db").table("t", "CREATE TABLE t (x);");
    let err = StoreRegistry::new("/data", vec![def.clone(), def]).unwrap_err();
    assert!(err.to_string().contains("duplicate store id a.db"));
}

#[parameterized(
    empty = { "" },
    hidden = { ".a.db" },
    nested = { "sub/a.db" },
    parent = { "../a.db" },
)]
fn path_like_ids_are_rejected(id: &str) {
    let def = StoreDef::new(id).table("t", "CREATE TABLE t (x);");
    assert!(matches!(
        StoreRegistry::new("/data", vec![def]),
        Err(StorageError::InvalidStore(_))
    ));
}

#[test]
fn store_without_tables_is_rejected() {
    assert!(StoreRegistry::new("/data", vec![StoreDef::new("a.db")]).is_err());
}

#[test]
fn init_all_creates_every_table() {
    let dir = TempDir::new().unwrap();
    let registry = StoreRegistry::with_default_stores(dir.path().join("data")).unwrap();

    registry.init_all().unwrap();

    assert_eq!(
        table_names(&registry.path_of(ROOM_STORE).unwrap()),
        vec!["room_bug_reports", "room_db"]
    );
    assert_eq!(
        table_names(&registry.path_of(SCANNER_STORE).unwrap()),
        vec!["encountered_rooms", "sessions"]
    );
    assert_eq!(
        table_names(&registry.path_of(BOT_STORE).unwrap()),
        vec!["server_profiles"]
    );
}

#[test]
fn init_is_idempotent_and_keeps_rows() {
    let dir = TempDir::new().unwrap();
    let registry = StoreRegistry::with_default_stores(dir.path()).unwrap();
    registry.init_store(BOT_STORE).unwrap();
    let conn = Connection::open(registry.path_of(BOT_STORE).unwrap()).unwrap();
    conn.execute("INSERT INTO server_profiles (server_id) VALUES (42)", [])
        .unwrap();
    drop(conn);

    registry.init_store(BOT_STORE).unwrap();

    let conn = Connection::open(registry.path_of(BOT_STORE).unwrap()).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM server_profiles", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn scanner_trigger_touches_session() {
    let dir = TempDir::new().unwrap();
    let registry = StoreRegistry::with_default_stores(dir.path()).unwrap();
    registry.init_store(SCANNER_STORE).unwrap();
    let conn = Connection::open(registry.path_of(SCANNER_STORE).unwrap()).unwrap();
    conn.execute(
        "INSERT INTO sessions (session_id, scanner_version, last_edited_at) VALUES ('s1', '1.0', 0)",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO encountered_rooms (session_event, session_id, room_name) VALUES ('enter', 's1', 'Lobby')",
        [],
    )
    .unwrap();

    let edited: i64 = conn
        .query_row(
            "SELECT last_edited_at FROM sessions WHERE session_id = 's1'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert!(edited > 0);
}
