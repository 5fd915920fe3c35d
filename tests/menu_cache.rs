//! Integration tests for the menu pipeline: fetch, flatten, cache, read back.
//!
//! Each test creates its own in-memory SQLite database for isolation and a
//! wiremock server where the network is involved. Together they exercise the
//! path the app takes on every refresh, and the cache-only path it takes
//! when offline.

use std::time::Duration;

use mensa::api::mock::sample_menu;
use mensa::api::{ApiClient, CategoryPayload, ItemPayload, VariantPayload};
use mensa::menu::{categories_from_payload, categories_from_records, flatten_for_cache};
use mensa::storage::Database;
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

async fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

fn one_item_menu(category: &str, food_id: i64, name: &str, variant_id: i64) -> Vec<CategoryPayload> {
    vec![CategoryPayload {
        category: category.to_string(),
        items: vec![ItemPayload {
            food_id,
            name: name.to_string(),
            url: format!("/images/{}.png", food_id),
            variants: vec![VariantPayload {
                variant_name: "M".to_string(),
                variant_id,
                price: 500,
                calories: 500.0,
                protein: 25.0,
                fat: 20.0,
                carbohydrates: 50.0,
            }],
        }],
    }]
}

// ============================================================================
// Fetch → Cache → Read-back
// ============================================================================

#[tokio::test]
async fn test_fetched_menu_round_trips_through_cache() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/request_current_menu"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(serde_json::to_string(&sample_menu()).unwrap()),
        )
        .mount(&mock_server)
        .await;

    let db = test_db().await;
    let client = client_for(&mock_server).await;

    // The refresh path: fetch, map, flatten, cache
    let payload = client.fetch_menu().await.unwrap();
    let categories = categories_from_payload(&payload, client.base_url());
    db.replace_menu(&flatten_for_cache(&categories)).await.unwrap();

    // The offline path: read the cache, rebuild the tree
    let cached = db.all_foods().await.unwrap();
    let rebuilt = categories_from_records(&cached);

    assert_eq!(rebuilt.len(), categories.len());
    for (live, offline) in categories.iter().zip(rebuilt.iter()) {
        assert_eq!(live.name, offline.name);
        assert_eq!(live.items.len(), offline.items.len());
        for (live_item, offline_item) in live.items.iter().zip(offline.items.iter()) {
            assert_eq!(live_item.name, offline_item.name);
            assert_eq!(live_item.image_url, offline_item.image_url);
            let live_ids: Vec<i64> =
                live_item.variants.iter().map(|v| v.variant_id).collect();
            let offline_ids: Vec<i64> =
                offline_item.variants.iter().map(|v| v.variant_id).collect();
            assert_eq!(live_ids, offline_ids);
        }
    }
}

#[tokio::test]
async fn test_image_urls_join_against_server_base() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/request_current_menu"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(serde_json::to_string(&sample_menu()).unwrap()),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let payload = client.fetch_menu().await.unwrap();
    let categories = categories_from_payload(&payload, client.base_url());

    // sample_menu carries server-relative paths; the mapped tree must be
    // absolute against the mock server, ready for display and caching
    let image_url = &categories[0].items[0].image_url;
    assert!(
        image_url.starts_with(&mock_server.uri()),
        "expected {} to start with {}",
        image_url,
        mock_server.uri()
    );
    assert!(image_url.ends_with("/images/sample_burger.png"));
}

#[tokio::test]
async fn test_refetch_replaces_cached_menu_wholesale() {
    let mock_server = MockServer::start().await;

    // Day one's menu, served exactly once
    Mock::given(method("GET"))
        .and(path("/api/request_current_menu"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(
                serde_json::to_string(&one_item_menu("Burgers", 1, "Old Burger", 101)).unwrap(),
            ),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    // Day two's menu takes over afterwards
    Mock::given(method("GET"))
        .and(path("/api/request_current_menu"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(
                serde_json::to_string(&one_item_menu("Soups", 2, "New Soup", 201)).unwrap(),
            ),
        )
        .mount(&mock_server)
        .await;

    let db = test_db().await;
    let client = client_for(&mock_server).await;

    for _ in 0..2 {
        let payload = client.fetch_menu().await.unwrap();
        let categories = categories_from_payload(&payload, client.base_url());
        db.replace_menu(&flatten_for_cache(&categories)).await.unwrap();
    }

    // Only the second menu survives; nothing lingers from the first
    let cached = db.all_foods().await.unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].variant_id, 201);
    assert_eq!(&*cached[0].food_name, "New Soup");
    assert_eq!(&*cached[0].category, "Soups");
}

// ============================================================================
// Cache-only (offline) behavior
// ============================================================================

#[tokio::test]
async fn test_cache_read_back_needs_no_network() {
    let db = test_db().await;

    // Seed the cache as a previous online session would have
    let categories = categories_from_payload(&sample_menu(), "http://cafeteria.localdomain:8000");
    db.replace_menu(&flatten_for_cache(&categories)).await.unwrap();

    // No client, no server: the cached tree alone drives the menu tab
    let rebuilt = categories_from_records(&db.all_foods().await.unwrap());
    assert_eq!(rebuilt.len(), 2);
    assert_eq!(&*rebuilt[0].name, "Burgers");
    assert_eq!(&*rebuilt[1].name, "Drinks");
    assert_eq!(rebuilt[0].items[0].variants.len(), 3);
    assert_eq!(
        &*rebuilt[0].items[0].image_url,
        "http://cafeteria.localdomain:8000/images/sample_burger.png"
    );
}

#[tokio::test]
async fn test_empty_cache_reads_back_empty() {
    let db = test_db().await;
    let rebuilt = categories_from_records(&db.all_foods().await.unwrap());
    assert!(rebuilt.is_empty());
}

#[tokio::test]
async fn test_large_menu_survives_batched_insert() {
    let db = test_db().await;

    // 120 variants spans multiple insert batches
    let categories: Vec<CategoryPayload> = (0..12)
        .map(|c| CategoryPayload {
            category: format!("Category {}", c),
            items: (0..10)
                .map(|i| {
                    let food_id = c * 10 + i;
                    ItemPayload {
                        food_id,
                        name: format!("Food {}", food_id),
                        url: format!("/images/{}.png", food_id),
                        variants: vec![VariantPayload {
                            variant_name: "M".to_string(),
                            variant_id: 1000 + food_id,
                            price: 500,
                            calories: 500.0,
                            protein: 25.0,
                            fat: 20.0,
                            carbohydrates: 50.0,
                        }],
                    }
                })
                .collect(),
        })
        .collect();

    let tree = categories_from_payload(&categories, "http://example.com");
    db.replace_menu(&flatten_for_cache(&tree)).await.unwrap();

    let cached = db.all_foods().await.unwrap();
    assert_eq!(cached.len(), 120);
    // Presentation order is intact across the batch boundary
    let order: Vec<i64> = cached.iter().map(|f| f.order_index).collect();
    assert_eq!(order, (0..120).collect::<Vec<i64>>());

    let rebuilt = categories_from_records(&cached);
    assert_eq!(rebuilt.len(), 12);
    assert!(rebuilt.iter().all(|c| c.items.len() == 10));
}

// ============================================================================
// Menu Reset
// ============================================================================

#[tokio::test]
async fn test_reset_clears_cache_but_keeps_history() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/reset_current_menu/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let db = test_db().await;
    let client = client_for(&mock_server).await;

    let categories = categories_from_payload(&sample_menu(), client.base_url());
    db.replace_menu(&flatten_for_cache(&categories)).await.unwrap();
    db.insert_meal_entries(&[101], 1_700_000_000_000, "Lunch")
        .await
        .unwrap();

    // The reset path: tell the server, then drop the local cache
    client.reset_menu().await.unwrap();
    db.clear_menu().await.unwrap();

    assert!(db.all_foods().await.unwrap().is_empty());

    // History survives; the entry merely loses its food join
    let history = db.history_with_food().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].record.variant_id, 101);
    assert!(history[0].food.is_none());
}
