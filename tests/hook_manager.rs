use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::json;
use storeforge::economy::EntityKind;
use storeforge::hooks::{
    EnabledProviders, HookEvent, HookManager, HookParams, HooksDocument, SPONSORPAY,
};

fn offer_wall(actions: usize) -> HooksDocument {
    let actions: Vec<_> = (0..actions)
        .map(|i| json!({ "id": format!("offer_{}", i), "itemId": "currency_coins" }))
        .collect();
    serde_json::from_value(json!({ "providers": [ { "id": "sponsorpay", "actions": actions } ] }))
        .unwrap()
}

fn sorted(mut ids: Vec<String>) -> Vec<String> {
    ids.sort();
    ids
}

#[test]
fn test_disabled_provider_is_not_indexed() {
    let manager = HookManager::new(EnabledProviders::default(), offer_wall(2), false).unwrap();
    assert_eq!(manager.offer_hooks().count(), 0);
    assert_eq!(manager.provider(SPONSORPAY).unwrap().actions().len(), 2);

    let enabled = EnabledProviders::Map(HashMap::from([(SPONSORPAY.to_string(), true)]));
    let manager = HookManager::new(enabled, offer_wall(2), false).unwrap();
    assert_eq!(manager.offer_hook_ids(), vec!["offer_0", "offer_1"]);
}

#[test]
fn test_index_tracks_add_and_remove() {
    let enabled = EnabledProviders::List(vec![SPONSORPAY.to_string()]);
    let mut manager = HookManager::new(enabled, offer_wall(1), false).unwrap();

    let mut added = Vec::new();
    for i in 0..5 {
        let params = HookParams {
            item_id: Some("currency_coins".into()),
            name: Some(format!("Offer {}", i)),
            ..HookParams::default()
        };
        let action = manager.add_hook(SPONSORPAY, params).unwrap();
        assert!(action.id().starts_with("hook_"));
        added.push(action.id().to_string());
        manager.check_index().unwrap();
    }
    assert_eq!(manager.offer_hooks().count(), 6);

    for id in added.iter().step_by(2) {
        let removed = manager.remove_hook(id).unwrap();
        assert_eq!(removed.id(), id);
        manager.check_index().unwrap();
    }
    let expected: Vec<String> = manager
        .provider(SPONSORPAY)
        .unwrap()
        .actions()
        .ids();
    assert_eq!(sorted(manager.offer_hook_ids()), sorted(expected));
    assert!(manager.remove_hook(&added[0]).is_none());
    assert!(manager.hook_by_id(&added[0]).is_none());
}

#[test]
fn test_add_hook_on_disabled_provider_skips_index() {
    let mut manager = HookManager::default();
    let action = manager.add_hook(SPONSORPAY, HookParams::default()).unwrap();
    let id = action.id().to_string();
    assert!(manager.hook_by_id(&id).is_some());
    assert_eq!(manager.offer_hooks().count(), 0);
    manager.check_index().unwrap();
}

#[test]
fn test_remove_notifies_while_action_is_attached() {
    let mut manager = HookManager::new(EnabledProviders::default(), offer_wall(2), true).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    manager.subscribe(move |event| {
        if let HookEvent::Destroyed { action } = event {
            sink.borrow_mut()
                .push((action.id().to_string(), action.item_id().map(str::to_string)));
        }
    });

    manager.remove_hook("offer_1").unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![("offer_1".to_string(), Some("currency_coins".to_string()))]
    );
    assert_eq!(manager.offer_hook_ids(), vec!["offer_0"]);
}

#[test]
fn test_close_unregisters_children_before_parent() {
    let document: HooksDocument = serde_json::from_value(json!({
        "providers": [
            { "id": "sponsorpay", "actions": [ { "id": "a1" }, { "id": "a2" }, { "id": "a3" } ] },
            { "id": "empty", "actions": [] },
            { "id": "tapjoy", "actions": [ { "id": "t1" }, { "id": "t2" } ] }
        ]
    }))
    .unwrap();
    let mut manager = HookManager::new(EnabledProviders::default(), document, true).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    manager.subscribe(move |event| {
        if let HookEvent::Unregistered { kind, id } = event {
            sink.borrow_mut().push((*kind, id.to_string()));
        }
    });

    assert_eq!(manager.close(), 5);

    let order = seen.borrow();
    let expected = [
        (EntityKind::Action, "t2"),
        (EntityKind::Action, "t1"),
        (EntityKind::Provider, "tapjoy"),
        (EntityKind::Provider, "empty"),
        (EntityKind::Action, "a3"),
        (EntityKind::Action, "a2"),
        (EntityKind::Action, "a1"),
        (EntityKind::Provider, "sponsorpay"),
    ];
    assert_eq!(order.len(), expected.len());
    for ((kind, id), (want_kind, want_id)) in order.iter().zip(expected.iter()) {
        assert_eq!(kind, want_kind);
        assert_eq!(id, want_id);
    }
    assert!(manager.providers().is_empty());
    assert_eq!(manager.offer_hooks().count(), 0);
}

#[test]
fn test_document_round_trips() {
    let document: HooksDocument = serde_json::from_value(json!({
        "providers": [
            { "id": "sponsorpay", "actions": [
                { "id": "a1", "itemId": "currency_coins", "exchangeRate": 10.0, "icon": "a.png" }
            ]},
            { "id": "tapjoy", "title": "Tapjoy", "actions": [] }
        ]
    }))
    .unwrap();
    let manager = HookManager::new(EnabledProviders::default(), document.clone(), false).unwrap();
    assert_eq!(manager.to_document(), document);
}

#[test]
fn test_duplicate_action_ids_are_rejected() {
    let document: HooksDocument = serde_json::from_value(json!({
        "providers": [
            { "id": "sponsorpay", "actions": [ { "id": "a1" } ] },
            { "id": "tapjoy", "actions": [ { "id": "a1" } ] }
        ]
    }))
    .unwrap();
    assert!(HookManager::new(EnabledProviders::default(), document, false).is_err());
}
