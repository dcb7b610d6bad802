//! Shared fixtures for the integration tests.

use storeforge::economy::{Economy, GoodType};

/// An economy with one currency (`currency_coins`) and one empty category (`Weapons`).
#[allow(dead_code)]
pub fn weapons_shop() -> Economy {
    let mut economy = Economy::new();
    economy.add_currency("currency_coins", "coins").unwrap();
    economy.add_category("Weapons").unwrap();
    economy
}

/// Add a fresh good of `good_type` to `category` and return its id.
#[allow(dead_code)]
pub fn add_good(economy: &mut Economy, category: &str, id: &str, good_type: GoodType) -> String {
    let good = economy.create_good(id, good_type);
    economy.add_good(category, good).unwrap().item_id.clone()
}

/// A store document in the shape the editor writes.
#[allow(dead_code)]
pub fn store_json() -> serde_json::Value {
    serde_json::json!({
        "categories": [
            {
                "name": "Weapons",
                "goods": [
                    {
                        "itemId": "sword",
                        "name": "Sword",
                        "type": "upgradable",
                        "category": "Weapons",
                        "purchasableItem": {
                            "purchaseType": "virtualItem",
                            "pvi_itemId": "currency_coins",
                            "pvi_amount": 100.0
                        },
                        "upgradeId": "sword_2",
                        "upgrades": [
                            {
                                "itemId": "sword_1",
                                "type": "goodUpgrade",
                                "prev_itemId": "",
                                "next_itemId": "sword_2",
                                "good_itemId": "sword",
                                "purchasableItem": {
                                    "purchaseType": "virtualItem",
                                    "pvi_itemId": "currency_coins",
                                    "pvi_amount": 150.0
                                }
                            },
                            {
                                "itemId": "sword_2",
                                "type": "goodUpgrade",
                                "prev_itemId": "sword_1",
                                "next_itemId": "sword_3",
                                "good_itemId": "sword",
                                "purchasableItem": {
                                    "purchaseType": "virtualItem",
                                    "pvi_itemId": "currency_coins",
                                    "pvi_amount": 300.0
                                }
                            },
                            {
                                "itemId": "sword_3",
                                "type": "goodUpgrade",
                                "prev_itemId": "sword_2",
                                "next_itemId": "",
                                "good_itemId": "sword",
                                "purchasableItem": {
                                    "purchaseType": "virtualItem",
                                    "pvi_itemId": "currency_coins",
                                    "pvi_amount": 600.0
                                }
                            }
                        ]
                    },
                    {
                        "itemId": "shield",
                        "name": "Shield",
                        "type": "equippable",
                        "category": "Weapons",
                        "balance": 1,
                        "equipped": true,
                        "equipping": "category",
                        "purchasableItem": {
                            "purchaseType": "market",
                            "marketItem": {
                                "price": 0.99,
                                "iosId": "com.example.shield",
                                "androidId": "com.example.shield",
                                "consumable": 1
                            }
                        }
                    },
                    {
                        "itemId": "potion_pack",
                        "name": "Potions x5",
                        "type": "goodPacks",
                        "category": "Weapons",
                        "good_itemId": "potion",
                        "good_amount": 5
                    }
                ]
            }
        ],
        "currencies": [
            {
                "itemId": "currency_coins",
                "name": "coins",
                "balance": 500,
                "packs": [
                    {
                        "itemId": "coins_1000",
                        "name": "1,000 coins",
                        "currency_itemId": "currency_coins",
                        "currency_amount": 1000,
                        "purchasableItem": {
                            "purchaseType": "market",
                            "marketItem": {
                                "price": 1.99,
                                "iosId": "com.example.coins1000",
                                "androidId": "com.example.coins1000",
                                "consumable": true
                            }
                        }
                    }
                ]
            }
        ],
        "hooks": {
            "providers": [
                {
                    "id": "sponsorpay",
                    "actions": [
                        { "id": "offer_a", "itemId": "currency_coins", "name": "Watch a video" },
                        { "id": "offer_b", "itemId": "currency_coins", "name": "Fill a survey" }
                    ]
                }
            ]
        },
        "hooksProviders": { "sponsorpay": true }
    })
}
