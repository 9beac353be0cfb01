//! Registry behaviour across the full page lifecycle.

mod lifecycle {
    use crate::{IndexRegistry, PageHit};
    use tempfile::TempDir;

    #[test]
    fn test_fresh_url_is_found_by_body_term() {
        let tmp = TempDir::new().unwrap();
        let reg = IndexRegistry::open(tmp.path()).unwrap();

        let pages = [
            ("http://rust-lang.org", "Rust", "a language empowering everyone"),
            ("http://tokio.rs", "Tokio", "an asynchronous runtime for rust"),
            ("http://serde.rs", "Serde", "serialization framework"),
        ];
        for (url, title, body) in pages {
            assert!(reg.add_document("pages", url, title, body));
        }

        let hits = reg.search_word("pages", "asynchronous").unwrap();
        assert!(hits.contains(&PageHit {
            url: "http://tokio.rs".into(),
            title: "Tokio".into(),
        }));
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_every_match_is_returned() {
        let tmp = TempDir::new().unwrap();
        let reg = IndexRegistry::open(tmp.path()).unwrap();
        for i in 0..40 {
            let url = format!("http://site/{i}");
            let body = if i % 2 == 0 { "even page" } else { "odd page" };
            assert!(reg.add_document("pages", &url, "Page", body));
        }

        assert_eq!(reg.search_word("pages", "page").unwrap().len(), 40);
        assert_eq!(reg.search_word("pages", "even").unwrap().len(), 20);
    }

    #[test]
    fn test_hits_carry_only_url_and_title() {
        let tmp = TempDir::new().unwrap();
        let reg = IndexRegistry::open(tmp.path()).unwrap();
        reg.add_document("pages", "http://x", "X", "secret body text");

        let hits = reg.search_word("pages", "secret").unwrap();
        let json = serde_json::to_value(&hits[0]).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["url", "title"]);
    }

    #[test]
    fn test_idempotent_add() {
        let tmp = TempDir::new().unwrap();
        let reg = IndexRegistry::open(tmp.path()).unwrap();
        assert!(reg.add_document("pages", "http://x", "X", "quick fox"));
        assert!(reg.add_document("pages", "http://x", "X", "quick fox"));
        assert_eq!(reg.search_word("pages", "fox").unwrap().len(), 1);
        assert_eq!(reg.doc_count("pages"), Some(1));
    }

    #[test]
    fn test_create_scenario() {
        let tmp = TempDir::new().unwrap();
        let reg = IndexRegistry::open(tmp.path()).unwrap();
        assert!(reg.create("alice", false));
        assert!(!reg.create("alice", false));
        assert!(reg.create("alice", true));
    }

    #[test]
    fn test_multi_word_query_requires_all_terms() {
        let tmp = TempDir::new().unwrap();
        let reg = IndexRegistry::open(tmp.path()).unwrap();
        reg.add_document("pages", "http://a", "A", "quick brown fox");
        reg.add_document("pages", "http://b", "B", "quick red panda");

        let hits = reg.search_word("pages", "quick fox").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "http://a");
    }
}

mod persistence {
    use crate::IndexRegistry;
    use tempfile::TempDir;

    #[test]
    fn test_reopened_registry_sees_committed_pages() {
        let tmp = TempDir::new().unwrap();
        {
            let reg = IndexRegistry::open(tmp.path()).unwrap();
            assert!(reg.add_document("pages", "http://x", "X", "durable"));
        }

        let reg = IndexRegistry::open(tmp.path()).unwrap();
        assert!(reg.available(Some("pages")));
        assert_eq!(reg.search_word("pages", "durable").unwrap().len(), 1);
        assert!(!reg.create("pages", false));
    }

    #[test]
    fn test_half_created_index_is_not_available() {
        let tmp = TempDir::new().unwrap();
        let reg = IndexRegistry::open(tmp.path()).unwrap();
        reg.create("pages", false);
        std::fs::remove_file(tmp.path().join("_pages.json")).unwrap();

        assert!(!reg.available(Some("pages")));
        assert!(reg.search_word("pages", "anything").unwrap().is_empty());
        // The next create rebuilds it from scratch.
        assert!(reg.create("pages", false));
        assert!(reg.available(Some("pages")));
    }

    #[test]
    fn test_tenant_names_lists_created_tenants() {
        let tmp = TempDir::new().unwrap();
        let reg = IndexRegistry::open(tmp.path()).unwrap();
        reg.create("zeta", false);
        reg.add_document("alpha", "http://a", "A", "x");
        assert_eq!(reg.tenant_names(), vec!["alpha", "zeta"]);

        reg.remove(Some("zeta")).unwrap();
        assert_eq!(reg.tenant_names(), vec!["alpha"]);
    }
}
