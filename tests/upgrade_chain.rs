use storeforge::economy::{
    Economy, EntityKind, GoodType, ModelError, Purchasable, PurchaseType, UpgradeChain,
};

mod common;
use common::{add_good, weapons_shop};

fn links(economy: &Economy, good_id: &str) -> Vec<(String, String, String)> {
    economy
        .upgrade_chain(good_id)
        .unwrap()
        .upgrades()
        .iter()
        .map(|u| {
            (
                u.prev_item_id().to_string(),
                u.item_id.clone(),
                u.next_item_id().to_string(),
            )
        })
        .collect()
}

fn assert_linked(chain: &UpgradeChain) {
    chain.check_links().unwrap();
    let ids = chain.upgrade_ids();
    if let (Some(head), Some(tail)) = (chain.upgrades().first(), chain.upgrades().last()) {
        assert!(head.is_head());
        assert!(tail.is_tail());
        assert_eq!(head.item_id, ids[0]);
        assert_eq!(tail.item_id, ids[ids.len() - 1]);
    }
}

#[test]
fn test_add_three_then_remove_middle() {
    let mut economy = weapons_shop();
    add_good(&mut economy, "Weapons", "sword", GoodType::Upgradable);
    let ids: Vec<String> = (0..3)
        .map(|_| {
            economy
                .add_upgrade("sword", "currency_coins")
                .unwrap()
                .item_id
                .clone()
        })
        .collect();
    let (u0, u1, u2) = (&ids[0], &ids[1], &ids[2]);

    assert_eq!(
        links(&economy, "sword"),
        vec![
            ("".into(), u0.clone(), u1.clone()),
            (u0.clone(), u1.clone(), u2.clone()),
            (u1.clone(), u2.clone(), "".into()),
        ]
    );

    economy.upgrade_good("sword", u1).unwrap();
    let removed = economy.remove_upgrade(u1).unwrap();
    assert_eq!(&removed.item_id, u1);

    assert_eq!(
        links(&economy, "sword"),
        vec![
            ("".into(), u0.clone(), u2.clone()),
            (u0.clone(), u2.clone(), "".into()),
        ]
    );
    assert_eq!(economy.upgrade_chain("sword").unwrap().current_upgrade_id(), "");
    assert!(economy.upgrade(u1).is_none());
    economy.check_invariants().unwrap();
}

#[test]
fn test_next_upgrade_saturates_at_tail() {
    let mut economy = weapons_shop();
    add_good(&mut economy, "Weapons", "sword", GoodType::Upgradable);
    for _ in 0..3 {
        economy.add_upgrade("sword", "currency_coins").unwrap();
    }
    let ids = economy.upgrade_chain("sword").unwrap().upgrade_ids();

    let mut walked = Vec::new();
    for _ in 0..5 {
        let next = economy
            .upgrade_chain("sword")
            .unwrap()
            .next_upgrade()
            .unwrap()
            .item_id
            .clone();
        walked.push(next.clone());
        economy.upgrade_good("sword", &next).unwrap();
    }
    assert_eq!(
        walked,
        vec![
            ids[0].clone(),
            ids[1].clone(),
            ids[2].clone(),
            ids[2].clone(),
            ids[2].clone()
        ]
    );
    let chain = economy.upgrade_chain("sword").unwrap();
    assert!(chain.is_complete());
    assert_eq!(chain.level(), 3);
}

#[test]
fn test_upgradable_price_follows_next_upgrade() {
    let mut economy = weapons_shop();
    add_good(&mut economy, "Weapons", "sword", GoodType::Upgradable);
    economy.set_price(EntityKind::Good, "sword", 40.0).unwrap();
    assert_eq!(economy.good("sword").unwrap().price(), 40.0);

    let first = economy
        .add_upgrade("sword", "currency_coins")
        .unwrap()
        .item_id
        .clone();
    let second = economy
        .add_upgrade("sword", "currency_coins")
        .unwrap()
        .item_id
        .clone();
    economy.set_price(EntityKind::Upgrade, &first, 150.0).unwrap();
    economy.set_price(EntityKind::Upgrade, &second, 300.0).unwrap();

    assert_eq!(economy.good("sword").unwrap().price(), 150.0);
    economy.upgrade_good("sword", &first).unwrap();
    assert_eq!(economy.good("sword").unwrap().price(), 300.0);
    economy.reset_upgrades("sword").unwrap();
    assert_eq!(economy.good("sword").unwrap().price(), 150.0);
}

#[test]
fn test_switching_upgradable_keeps_next_upgrade_price() {
    let mut economy = weapons_shop();
    add_good(&mut economy, "Weapons", "sword", GoodType::Upgradable);
    economy.set_price(EntityKind::Good, "sword", 100.0).unwrap();
    let first = economy
        .add_upgrade("sword", "currency_coins")
        .unwrap()
        .item_id
        .clone();
    economy.set_price(EntityKind::Upgrade, &first, 150.0).unwrap();
    assert_eq!(economy.good("sword").unwrap().price(), 150.0);

    let market = economy
        .switch_purchase_type(EntityKind::Good, "sword", PurchaseType::Market, None)
        .unwrap();
    assert!(market.is_market_purchase());
    assert_eq!(market.price(), 150.0);
    assert_eq!(market.ios_id(), Some("sword"));

    let back = economy
        .switch_purchase_type(
            EntityKind::Good,
            "sword",
            PurchaseType::VirtualItem,
            Some("currency_coins"),
        )
        .unwrap();
    assert_eq!(back.price(), 150.0);
}

#[test]
fn test_upgrade_rejects_foreign_ids() {
    let mut economy = weapons_shop();
    add_good(&mut economy, "Weapons", "sword", GoodType::Upgradable);
    add_good(&mut economy, "Weapons", "bow", GoodType::Upgradable);
    let bow_upgrade = economy
        .add_upgrade("bow", "currency_coins")
        .unwrap()
        .item_id
        .clone();

    let err = economy.upgrade_good("sword", &bow_upgrade).unwrap_err();
    assert!(matches!(err, ModelError::NotFound { kind: EntityKind::Upgrade, .. }));

    add_good(&mut economy, "Weapons", "potion", GoodType::SingleUse);
    assert!(matches!(
        economy.add_upgrade("potion", "currency_coins"),
        Err(ModelError::PreconditionViolation(_))
    ));
}

#[test]
fn test_remove_last_upgrade_pops_the_tail() {
    let mut economy = weapons_shop();
    add_good(&mut economy, "Weapons", "sword", GoodType::Upgradable);
    assert!(economy.remove_last_upgrade("sword").is_none());
    for _ in 0..3 {
        economy.add_upgrade("sword", "currency_coins").unwrap();
    }
    let ids = economy.upgrade_chain("sword").unwrap().upgrade_ids();
    economy.upgrade_good("sword", &ids[0]).unwrap();

    let popped = economy.remove_last_upgrade("sword").unwrap();
    assert_eq!(popped.item_id, ids[2]);
    assert!(economy.upgrade(&ids[2]).is_none());
    assert_eq!(
        links(&economy, "sword"),
        vec![
            ("".into(), ids[0].clone(), ids[1].clone()),
            (ids[0].clone(), ids[1].clone(), "".into()),
        ]
    );
    assert_eq!(economy.upgrade_chain("sword").unwrap().current_upgrade_id(), "");
    economy.check_invariants().unwrap();
}

#[test]
fn test_reorder_relinks_and_resets_position() {
    let mut economy = weapons_shop();
    add_good(&mut economy, "Weapons", "sword", GoodType::Upgradable);
    for _ in 0..4 {
        economy.add_upgrade("sword", "currency_coins").unwrap();
    }
    let ids = economy.upgrade_chain("sword").unwrap().upgrade_ids();
    economy.upgrade_good("sword", &ids[1]).unwrap();

    assert!(economy.move_upgrade(&ids[3], 0).unwrap());
    let chain = economy.upgrade_chain("sword").unwrap();
    assert_eq!(
        chain.upgrade_ids(),
        vec![ids[3].clone(), ids[0].clone(), ids[1].clone(), ids[2].clone()]
    );
    assert_eq!(chain.current_upgrade_id(), "");
    assert_linked(chain);

    assert!(matches!(
        economy.move_upgrade(&ids[0], 4),
        Err(ModelError::OutOfRange { index: 4, len: 4 })
    ));
}

#[test]
fn test_chain_invariant_holds_for_long_chains() {
    let mut economy = weapons_shop();
    add_good(&mut economy, "Weapons", "sword", GoodType::Upgradable);
    assert_linked(economy.upgrade_chain("sword").unwrap());

    for n in 0..200 {
        economy.add_upgrade("sword", "currency_coins").unwrap();
        if n % 7 == 0 {
            let ids = economy.upgrade_chain("sword").unwrap().upgrade_ids();
            economy.move_upgrade(&ids[ids.len() - 1], n % ids.len()).unwrap();
        }
        if n % 11 == 0 {
            let ids = economy.upgrade_chain("sword").unwrap().upgrade_ids();
            economy.remove_upgrade(&ids[ids.len() / 2]).unwrap();
        }
        assert_linked(economy.upgrade_chain("sword").unwrap());
    }
    economy.check_invariants().unwrap();

    let ids = economy.upgrade_chain("sword").unwrap().upgrade_ids();
    for id in &ids {
        economy.remove_upgrade(id).unwrap();
    }
    let chain = economy.upgrade_chain("sword").unwrap();
    assert!(chain.is_empty());
    assert!(chain.next_upgrade().is_none());
    assert_eq!(economy.registry().len(EntityKind::Upgrade), 0);
}
