//! Starter content for a fresh store, inserted behind the `--seed` flag so
//! the site renders something before an editor signs in.

use serde_json::{json, Map, Value};

use crate::store::DocumentStore;

fn body(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Insert starter documents into every empty section collection.
pub async fn seed_if_empty(store: &DocumentStore) {
    if !store.any("hero").await {
        store
            .insert(
                "hero",
                body(json!({
                    "title": "Train With Purpose",
                    "subtitle": "Coaching, community and equipment for every level",
                    "backgroundImage": {
                        "url": "https://images.example.com/hero-default.jpg",
                        "alt": "Train With Purpose background image"
                    },
                    "buttons": [
                        { "text": "Start Today", "link": "#pricing", "style": "primary" },
                        { "text": "Meet The Team", "link": "#trainers", "style": "outline" }
                    ],
                    "stats": [
                        { "number": "500+", "label": "Members" },
                        { "number": "12", "label": "Coaches" }
                    ],
                    "isActive": true,
                    "order": 0
                })),
            )
            .await;
        tracing::info!("seeded hero section");
    }

    if !store.any("about").await {
        store
            .insert(
                "about",
                body(json!({
                    "title": "About The Studio",
                    "subtitle": "A place to get stronger",
                    "description": [
                        "We opened with one goal: make serious training approachable.",
                        "Every program is coached, measured and adjusted to you."
                    ],
                    "image": {
                        "url": "https://images.example.com/about-default.jpg",
                        "alt": "About us image"
                    },
                    "features": [
                        { "icon": "dumbbell", "title": "Full equipment", "description": "Free weights, racks and turf" },
                        { "icon": "users", "title": "Small groups", "description": "Capped class sizes" }
                    ],
                    "overlayContent": { "title": "Est. 2019", "subtitle": "Independent and coach-owned" },
                    "isActive": true
                })),
            )
            .await;
        tracing::info!("seeded about section");
    }

    if !store.any("training").await {
        for (order, (title, category, difficulty)) in [
            ("Foundations of Strength", "muscle-building", "beginner"),
            ("Metcon Circuit", "hiit-training", "intermediate"),
        ]
        .into_iter()
        .enumerate()
        {
            store
                .insert(
                    "training",
                    body(json!({
                        "title": title,
                        "description": "A coached program with weekly progressions.",
                        "image": {
                            "url": "https://images.example.com/training-default.jpg",
                            "alt": format!("{} training program", title)
                        },
                        "features": ["Coached sessions", "Progress tracking"],
                        "category": category,
                        "difficulty": difficulty,
                        "isActive": true,
                        "order": order
                    })),
                )
                .await;
        }
        tracing::info!("seeded training programs");
    }

    if !store.any("pricing").await {
        for (order, (name, price, popular)) in
            [("Basic", 29.0, false), ("Unlimited", 59.0, true)].into_iter().enumerate()
        {
            store
                .insert(
                    "pricing",
                    body(json!({
                        "name": name,
                        "price": price,
                        "period": "month",
                        "description": "Month-to-month, cancel anytime.",
                        "features": ["Open gym access", "Member app"],
                        "isPopular": popular,
                        "buttonText": "Join now",
                        "color": "#EAA620",
                        "trialDays": 7,
                        "isActive": true,
                        "order": order
                    })),
                )
                .await;
        }
        tracing::info!("seeded pricing plans");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ListQuery;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let store = DocumentStore::new();
        seed_if_empty(&store).await;
        let first = store.count("training").await;
        assert!(first > 0);

        seed_if_empty(&store).await;
        assert_eq!(store.count("training").await, first);
    }

    #[tokio::test]
    async fn seeded_pricing_has_one_popular_plan() {
        let store = DocumentStore::new();
        seed_if_empty(&store).await;
        let popular = store
            .find("pricing", &ListQuery::new().eq("isPopular", true))
            .await;
        assert_eq!(popular.len(), 1);
    }
}
