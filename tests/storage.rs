// Integration tests for the storage engine's public API.
//
// These exercise the KV store, list store, and background expiry worker
// together through `Storage`, rather than the unit-level invariants
// already covered inside each module's own `#[cfg(test)]` block.

use std::time::Duration;

use avacado_storage::config::StorageConfig;
use avacado_storage::kv::SetOptions;
use avacado_storage::Storage;

fn fast_sweep_storage() -> Storage {
    Storage::new(StorageConfig {
        max_list_pack_size: 1024,
        expiry_sweep_interval: Duration::from_millis(10),
    })
}

#[test]
fn kv_and_list_operate_independently_through_the_facade() {
    let mut storage = fast_sweep_storage();

    storage.kv().set("greeting", b"hello", SetOptions::default()).unwrap();
    assert_eq!(storage.kv().get("greeting"), Some(b"hello".to_vec()));

    storage.lists().rpush("queue", &[b"a", b"b", b"c"]);
    assert_eq!(storage.lists().llen("queue"), 3);
    assert_eq!(storage.lists().lindex("queue", 0), Some(b"a".to_vec()));

    storage.close();
}

#[test]
fn background_sweep_reclaims_expired_keys_without_a_read() {
    let storage = fast_sweep_storage();
    storage
        .kv()
        .set(
            "ephemeral",
            b"v",
            SetOptions {
                px: Some(Duration::from_millis(5)),
                ..Default::default()
            },
        )
        .unwrap();

    std::thread::sleep(Duration::from_millis(120));

    assert_eq!(storage.kv().internal_count(), 0);
}

#[test]
fn conditional_set_end_to_end() {
    let storage = fast_sweep_storage();
    let kv = storage.kv();

    assert!(kv.set("k", b"v", SetOptions { nx: true, ..Default::default() }).is_ok());
    assert!(kv
        .set("k", b"w", SetOptions { nx: true, ..Default::default() })
        .is_err());
    assert_eq!(kv.get("k"), Some(b"v".to_vec()));

    let got = kv
        .set(
            "k",
            b"w",
            SetOptions {
                ifeq: Some(b"v"),
                get: true,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(got, Some(b"v".to_vec()));
    assert_eq!(kv.get("k"), Some(b"w".to_vec()));
}

#[test]
fn integer_arithmetic_end_to_end() {
    let storage = fast_sweep_storage();
    let kv = storage.kv();

    assert_eq!(kv.incr("counter").unwrap(), 1);
    assert_eq!(kv.incr("counter").unwrap(), 2);
    assert_eq!(kv.decr_by("counter", 5).unwrap(), -3);

    kv.set("counter", b"10", SetOptions { ex: Some(Duration::from_secs(1)), ..Default::default() })
        .unwrap();
    std::thread::sleep(Duration::from_millis(1100));
    // expiry resets the arithmetic base to zero rather than erroring
    assert_eq!(kv.incr("counter").unwrap(), 1);
}

#[test]
fn list_push_pop_end_to_end() {
    let storage = fast_sweep_storage();
    let lists = storage.lists();

    assert_eq!(lists.rpush("L", &[b"a", b"b", b"c"]), 3);
    assert_eq!(lists.llen("L"), 3);
    assert_eq!(lists.rpop("L", 1), Some(vec![b"c".to_vec()]));
    assert_eq!(lists.llen("L"), 2);
    assert_eq!(lists.rpop("L", 5), Some(vec![b"b".to_vec(), b"a".to_vec()]));
    assert_eq!(lists.llen("L"), 0);
    assert_eq!(lists.rpop("L", 1), Some(Vec::new()));

    lists.lpush("M", &[b"a", b"b", b"c"]);
    assert_eq!(lists.rpop("M", 1), Some(vec![b"a".to_vec()]));
    assert_eq!(lists.rpop("M", 1), Some(vec![b"b".to_vec()]));
    assert_eq!(lists.rpop("M", 1), Some(vec![b"c".to_vec()]));
}

#[test]
fn del_exists_count_duplicates_per_mention() {
    let storage = fast_sweep_storage();
    storage.kv().set("k", b"v", SetOptions::default()).unwrap();

    assert_eq!(storage.kv().exists(&["k", "k", "k"]), 3);
    assert_eq!(storage.kv().del(&["k", "k"]), 1);
    assert_eq!(storage.kv().exists(&["k"]), 0);
}

#[test]
fn server_info_literals_are_stable() {
    let storage = fast_sweep_storage();
    let info = storage.server_info();
    assert_eq!(info.server, "Avacado");
    assert_eq!(info.proto, 2);
    assert_eq!(info.mode, "standalone");
    assert_eq!(info.role, "master");
}
