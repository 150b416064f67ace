//! Contract tests for the persistent rule store and matcher.

use wordbank_core::{BankDocument, ClearTarget, RuleStore, Scope, Strategy};

fn open_temp() -> (tempfile::TempDir, RuleStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = RuleStore::open(dir.path().join("bank.json")).unwrap();
    (dir, store)
}

#[test]
fn test_registered_exact_rule_matches_its_trigger() {
    let (_dir, store) = open_temp();
    let cases = [
        (Scope::global(), "早上好", "早！"),
        (Scope::new("100"), "ping", "pong"),
        (Scope::new("100"), "ping", "pong again"),
        (Scope::new("200"), "multi\nline", "ok"),
    ];
    for (scope, trigger, reply) in &cases {
        store.set(scope, trigger, reply, Strategy::Exact).unwrap();
    }
    for (scope, trigger, reply) in &cases {
        let replies = store
            .match_message(scope, trigger, false, Some(Strategy::Exact))
            .unwrap();
        assert!(replies.contains(&reply.to_string()), "{trigger} -> {reply}");
    }
}

#[test]
fn test_conversation_layer_shadows_global() {
    let (_dir, store) = open_temp();
    let group = Scope::new("100");
    store.set(&Scope::global(), "hi", "global hi", Strategy::Exact).unwrap();
    store.set(&group, "hi", "group hi", Strategy::Exact).unwrap();

    assert_eq!(
        store.match_message(&group, "hi", false, None),
        Some(vec!["group hi".to_string()])
    );
    // other conversations still fall through to the global layer
    assert_eq!(
        store.match_message(&Scope::new("300"), "hi", false, None),
        Some(vec!["global hi".to_string()])
    );
}

#[test]
fn test_substring_matching() {
    let (_dir, store) = open_temp();
    let scope = Scope::new("1");
    store.set(&scope, "hello", "hi there", Strategy::Substring).unwrap();
    assert!(store
        .match_message(&scope, "hello world", false, None)
        .is_some());

    let (_dir, store) = open_temp();
    store.set(&scope, "xyz", "never", Strategy::Substring).unwrap();
    assert!(store
        .match_message(&scope, "hello world", false, None)
        .is_none());
}

#[test]
fn test_exact_takes_precedence_over_substring() {
    let (_dir, store) = open_temp();
    let scope = Scope::new("1");
    store.set(&scope, "hello", "fuzzy", Strategy::Substring).unwrap();
    store.set(&Scope::global(), "hello", "exact", Strategy::Exact).unwrap();

    let found = store.find(&scope, "hello", false, None).unwrap();
    assert_eq!(found.strategy, Strategy::Exact);
    assert_eq!(found.replies, vec!["exact".to_string()]);
}

#[test]
fn test_delete_nonexistent_leaves_document_unchanged() {
    let (dir, store) = open_temp();
    store.set(&Scope::new("5"), "keep", "me", Strategy::Regex).unwrap();
    let before = std::fs::read_to_string(dir.path().join("bank.json")).unwrap();

    let existed = store.delete(&Scope::new("5"), "missing", Strategy::Regex).unwrap();
    assert!(!existed);

    let after = std::fs::read_to_string(dir.path().join("bank.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_global_clear_keeps_conversation_rules() {
    let (_dir, store) = open_temp();
    let group = Scope::new("100");
    store.set(&Scope::global(), "a", "global", Strategy::Exact).unwrap();
    store.set(&Scope::global(), "b", "global", Strategy::Substring).unwrap();
    store.set(&group, "c", "group", Strategy::Exact).unwrap();

    store.clear(Scope::global()).unwrap();

    assert!(store.match_message(&group, "a", false, None).is_none());
    assert!(store.triggers(&Scope::global(), Strategy::Substring).is_empty());
    assert_eq!(
        store.match_message(&group, "c", false, None),
        Some(vec!["group".to_string()])
    );
}

#[test]
fn test_clear_all_resets_document() {
    let (_dir, store) = open_temp();
    store.set(&Scope::new("9"), "x", "y", Strategy::Exact).unwrap();
    store.clear(ClearTarget::All).unwrap();
    assert_eq!(store.snapshot(), BankDocument::empty());
}

#[test]
fn test_reload_reproduces_reply_list() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bank.json");
    let scope = Scope::new("42");

    let store = RuleStore::open(&path).unwrap();
    store.set(&scope, "roll", "one", Strategy::Exact).unwrap();
    store.set(&scope, "roll", "two", Strategy::Exact).unwrap();
    store.set(&scope, "roll", "one", Strategy::Exact).unwrap();
    let expected = store.replies(&scope, "roll", Strategy::Exact);
    store.close().unwrap();

    let reopened = RuleStore::open(&path).unwrap();
    assert_eq!(reopened.replies(&scope, "roll", Strategy::Exact), expected);
    assert_eq!(
        expected,
        Some(vec!["one".to_string(), "two".to_string(), "one".to_string()])
    );
}

#[test]
fn test_mention_only_trigger() {
    let (_dir, store) = open_temp();
    let scope = Scope::new("7");
    store.set(&scope, "/atme hi", "you called?", Strategy::Exact).unwrap();

    assert!(store.match_message(&scope, "hi", false, None).is_none());
    assert_eq!(
        store.match_message(&scope, "hi", true, None),
        Some(vec!["you called?".to_string()])
    );
}

#[test]
fn test_invalid_regex_does_not_block_others() {
    let (_dir, store) = open_temp();
    let scope = Scope::new("8");
    store.set(&scope, "([unclosed", "broken", Strategy::Regex).unwrap();
    store.set(&scope, r"^\d+$", "a number", Strategy::Regex).unwrap();

    assert_eq!(
        store.match_message(&scope, "12345", false, Some(Strategy::Regex)),
        Some(vec!["a number".to_string()])
    );
}

#[test]
fn test_loads_legacy_section_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bank.json");
    std::fs::write(
        &path,
        r#"{"congruence": {"0": {"hi": ["hello"]}}, "include": null, "regex": {"12": {"^a": ["b"]}}}"#,
    )
    .unwrap();

    let store = RuleStore::open(&path).unwrap();
    assert_eq!(
        store.match_message(&Scope::new("1"), "hi", false, None),
        Some(vec!["hello".to_string()])
    );
    assert_eq!(
        store.match_message(&Scope::new("12"), "abc", false, None),
        Some(vec!["b".to_string()])
    );
}

#[test]
fn test_malformed_document_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bank.json");
    std::fs::write(&path, "not json").unwrap();
    assert!(RuleStore::open(&path).is_err());
}

#[test]
fn test_concurrent_writers_are_serialized() {
    let (_dir, store) = open_temp();
    let store = std::sync::Arc::new(store);
    let scope = Scope::new("11");

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            let scope = scope.clone();
            std::thread::spawn(move || {
                store
                    .set(&scope, "race", &format!("r{i}"), Strategy::Exact)
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let on_disk = std::fs::read_to_string(store.path()).unwrap();
    let doc = BankDocument::from_json(&on_disk).unwrap();
    assert_eq!(doc.exact["11"]["race"].len(), 8);
}
