//! Tenants never observe each other's pages or deletions.

use crate::IndexRegistry;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_pages_stay_in_their_tenant() {
    let tmp = TempDir::new().unwrap();
    let reg = IndexRegistry::open(tmp.path()).unwrap();
    assert!(reg.add_document("t1", "http://x", "X", "private words"));

    assert!(reg.search_word("t2", "private").unwrap().is_empty());
    assert!(!reg.available(Some("t2")));
    assert_eq!(reg.search_word("t1", "private").unwrap().len(), 1);
}

#[test]
fn test_same_url_in_two_tenants_is_two_pages() {
    let tmp = TempDir::new().unwrap();
    let reg = IndexRegistry::open(tmp.path()).unwrap();
    assert!(reg.add_document("t1", "http://x", "One", "shared"));
    assert!(reg.add_document("t2", "http://x", "Two", "shared"));

    assert_eq!(reg.search_word("t1", "shared").unwrap()[0].title, "One");
    assert_eq!(reg.search_word("t2", "shared").unwrap()[0].title, "Two");
}

#[test]
fn test_remove_leaves_other_tenants() {
    let tmp = TempDir::new().unwrap();
    let reg = IndexRegistry::open(tmp.path()).unwrap();
    reg.add_document("t1", "http://a", "A", "alpha");
    reg.add_document("t2", "http://b", "B", "beta");

    reg.remove(Some("t1")).unwrap();
    assert!(!reg.available(Some("t1")));
    assert!(reg.available(Some("t2")));
    assert_eq!(reg.search_word("t2", "beta").unwrap().len(), 1);
}

#[test]
fn test_remove_of_name_prefix_spares_longer_tenant() {
    let tmp = TempDir::new().unwrap();
    let reg = IndexRegistry::open(tmp.path()).unwrap();
    reg.add_document("al", "http://al", "Al", "short");
    reg.add_document("alice", "http://alice", "Alice", "long");

    reg.remove(Some("al")).unwrap();
    assert!(!reg.available(Some("al")));
    assert!(reg.available(Some("alice")));
    assert_eq!(reg.search_word("alice", "long").unwrap().len(), 1);
    assert!(tmp.path().join("_alice.json").is_file());
}

#[test]
fn test_readers_and_writers_on_separate_tenants() {
    let tmp = TempDir::new().unwrap();
    let reg = IndexRegistry::open(tmp.path()).unwrap();
    reg.add_document("reader", "http://seed", "Seed", "steady");

    let writer = {
        let reg = Arc::clone(&reg);
        std::thread::spawn(move || {
            for i in 0..10 {
                assert!(reg.add_document("writer", &format!("http://w/{i}"), "W", "busy"));
            }
        })
    };
    for _ in 0..10 {
        assert_eq!(reg.search_word("reader", "steady").unwrap().len(), 1);
    }
    writer.join().unwrap();
    assert_eq!(reg.doc_count("writer"), Some(10));
}
