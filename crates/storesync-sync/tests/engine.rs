//! Database-backed tests for the reconciliation engine.

use rust_decimal::Decimal;
use sqlx::PgPool;
use storesync_core::ExternalProduct;
use storesync_db::{
    create_storefront, find_products_by_source_id, insert_variant, list_variants, upsert_product,
    upsert_shopify_item, NewProduct, NewVariant,
};
use storesync_sync::{apply_inventory_level_update, apply_product_update};

const STOREFRONT: &str = "lunera";

fn payload(json: serde_json::Value) -> ExternalProduct {
    serde_json::from_value(json).expect("payload should deserialize")
}

async fn seed_product(pool: &PgPool, source_id: &str) -> i64 {
    upsert_product(
        pool,
        STOREFRONT,
        &NewProduct {
            name: "Slip Dress".to_owned(),
            slug: format!("slip-dress-{source_id}"),
            category: Some("dresses".to_owned()),
            base_price: Decimal::new(1000, 2),
            images: vec!["http://img/old.png".to_owned()],
            source_shopify_id: Some(source_id.to_owned()),
            is_active: true,
        },
    )
    .await
    .expect("product insert")
}

async fn seed_variant(pool: &PgPool, product_id: i64, sku: &str, inventory_item: Option<&str>) -> i64 {
    insert_variant(
        pool,
        STOREFRONT,
        product_id,
        &NewVariant {
            size: Some("M".to_owned()),
            color: None,
            sku: Some(sku.to_owned()),
            stock: 0,
            price_override: Some(Decimal::new(500, 2)),
            shopify_inventory_item_id: inventory_item.map(ToOwned::to_owned),
            images: vec![],
        },
    )
    .await
    .expect("variant insert")
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_update_reconciles_price_stock_and_images(pool: PgPool) {
    let product_id = seed_product(&pool, "999").await;
    let variant_id = seed_variant(&pool, product_id, "X1", None).await;

    let product = payload(serde_json::json!({
        "id": 999,
        "title": "Slip Dress",
        "variants": [{
            "id": 1,
            "sku": "X1",
            "price": "42.50",
            "inventory_quantity": 5
        }],
        "images": [{"id": 10, "src": "http://img/1.png"}]
    }));

    let updated = apply_product_update(&pool, &product, STOREFRONT)
        .await
        .expect("sweep");
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].product_id, product_id);
    assert_eq!(updated[0].storefront, STOREFRONT);

    let rows = find_products_by_source_id(&pool, STOREFRONT, "999")
        .await
        .expect("lookup");
    assert_eq!(rows[0].base_price, Decimal::new(4250, 2));
    assert_eq!(rows[0].images, vec!["http://img/1.png"]);

    let variants = list_variants(&pool, STOREFRONT, product_id)
        .await
        .expect("variants");
    assert_eq!(variants[0].id, variant_id);
    assert_eq!(variants[0].stock, 5);
    // The variant price equals the derived base price, so no override is kept.
    assert_eq!(variants[0].price_override, None);
    assert_eq!(variants[0].images, vec!["http://img/1.png"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn variant_price_differing_from_base_becomes_an_override(pool: PgPool) {
    let product_id = seed_product(&pool, "999").await;
    seed_variant(&pool, product_id, "X1", None).await;
    let second_id = seed_variant(&pool, product_id, "X2", None).await;

    let product = payload(serde_json::json!({
        "id": 999,
        "title": "Slip Dress",
        "variants": [
            {"id": 1, "sku": "X1", "price": "42.50", "inventory_quantity": 5},
            {"id": 2, "sku": "X2", "price": "50.00", "inventory_quantity": 2}
        ]
    }));

    apply_product_update(&pool, &product, STOREFRONT).await.expect("sweep");

    let variants = list_variants(&pool, STOREFRONT, product_id).await.expect("variants");
    let second = variants.iter().find(|v| v.id == second_id).expect("second variant");
    assert_eq!(second.stock, 2);
    assert_eq!(second.price_override, Some(Decimal::new(5000, 2)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn reapplying_the_same_payload_is_idempotent(pool: PgPool) {
    let product_id = seed_product(&pool, "999").await;
    seed_variant(&pool, product_id, "X1", None).await;

    let product = payload(serde_json::json!({
        "id": 999,
        "title": "Slip Dress",
        "variants": [{"id": 1, "sku": "X1", "price": "42.50", "inventory_quantity": 5}],
        "images": [{"id": 10, "src": "http://img/1.png"}]
    }));

    let first = apply_product_update(&pool, &product, STOREFRONT).await.expect("sweep");
    let second = apply_product_update(&pool, &product, STOREFRONT).await.expect("sweep");
    assert_eq!(first, second);

    let rows = find_products_by_source_id(&pool, STOREFRONT, "999").await.expect("lookup");
    assert_eq!(rows[0].base_price, Decimal::new(4250, 2));

    let variants = list_variants(&pool, STOREFRONT, product_id).await.expect("variants");
    assert_eq!(variants[0].stock, 5);
    assert_eq!(variants[0].price_override, None);
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_variant_list_touches_only_product_fields(pool: PgPool) {
    let product_id = seed_product(&pool, "999").await;
    seed_variant(&pool, product_id, "X1", None).await;

    let product = payload(serde_json::json!({
        "id": 999,
        "title": "Slip Dress",
        "images": [{"id": 10, "src": "http://img/new.png"}]
    }));

    apply_product_update(&pool, &product, STOREFRONT).await.expect("sweep");

    let rows = find_products_by_source_id(&pool, STOREFRONT, "999").await.expect("lookup");
    // No variants in the payload means no price source; the stored value stays.
    assert_eq!(rows[0].base_price, Decimal::new(1000, 2));
    assert_eq!(rows[0].images, vec!["http://img/new.png"]);

    let variants = list_variants(&pool, STOREFRONT, product_id).await.expect("variants");
    assert_eq!(variants[0].stock, 0);
    assert_eq!(variants[0].price_override, Some(Decimal::new(500, 2)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn malformed_price_keeps_base_price_and_clears_override(pool: PgPool) {
    let product_id = seed_product(&pool, "999").await;
    seed_variant(&pool, product_id, "X1", None).await;

    let product = payload(serde_json::json!({
        "id": 999,
        "title": "Slip Dress",
        "variants": [{"id": 1, "sku": "X1", "price": "n/a", "inventory_quantity": 3}]
    }));

    apply_product_update(&pool, &product, STOREFRONT).await.expect("sweep");

    let rows = find_products_by_source_id(&pool, STOREFRONT, "999").await.expect("lookup");
    assert_eq!(rows[0].base_price, Decimal::new(1000, 2));
    // Payload carried no images; the stored list is preserved.
    assert_eq!(rows[0].images, vec!["http://img/old.png"]);

    let variants = list_variants(&pool, STOREFRONT, product_id).await.expect("variants");
    assert_eq!(variants[0].stock, 3);
    assert_eq!(variants[0].price_override, None);
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_update_sweeps_every_storefront_carrying_the_product(pool: PgPool) {
    let lunera_id = seed_product(&pool, "999").await;
    seed_variant(&pool, lunera_id, "X1", None).await;

    create_storefront(&pool, "aurora").await.expect("storefront");
    let aurora_id = upsert_product(
        &pool,
        "aurora",
        &NewProduct {
            name: "Slip Dress".to_owned(),
            slug: "slip-dress-999".to_owned(),
            category: Some("dresses".to_owned()),
            base_price: Decimal::new(1000, 2),
            images: vec![],
            source_shopify_id: Some("999".to_owned()),
            is_active: true,
        },
    )
    .await
    .expect("product insert");
    insert_variant(
        &pool,
        "aurora",
        aurora_id,
        &NewVariant {
            size: Some("M".to_owned()),
            color: None,
            sku: Some("X1".to_owned()),
            stock: 0,
            price_override: None,
            shopify_inventory_item_id: None,
            images: vec![],
        },
    )
    .await
    .expect("variant insert");

    let product = payload(serde_json::json!({
        "id": 999,
        "title": "Slip Dress",
        "variants": [{"id": 1, "sku": "X1", "price": "42.50", "inventory_quantity": 5}]
    }));

    let mut updated = apply_product_update(&pool, &product, STOREFRONT)
        .await
        .expect("sweep");
    updated.sort_by(|a, b| a.storefront.cmp(&b.storefront));
    assert_eq!(updated.len(), 2);
    assert_eq!(updated[0].storefront, "aurora");
    assert_eq!(updated[0].product_id, aurora_id);
    assert_eq!(updated[1].storefront, STOREFRONT);
    assert_eq!(updated[1].product_id, lunera_id);

    for (storefront, product_id) in [("aurora", aurora_id), (STOREFRONT, lunera_id)] {
        let rows = find_products_by_source_id(&pool, storefront, "999")
            .await
            .expect("lookup");
        assert_eq!(rows[0].base_price, Decimal::new(4250, 2));

        let variants = list_variants(&pool, storefront, product_id).await.expect("variants");
        assert_eq!(variants[0].stock, 5);
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_product_is_a_clean_no_op(pool: PgPool) {
    let product = payload(serde_json::json!({
        "id": 12345,
        "title": "Never Imported",
        "variants": [{"id": 1, "sku": "Z9", "inventory_quantity": 2}]
    }));

    let updated = apply_product_update(&pool, &product, STOREFRONT).await.expect("sweep");
    assert!(updated.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_update_records_saga_log_on_mirror_row(pool: PgPool) {
    let product = payload(serde_json::json!({
        "id": 999,
        "title": "Slip Dress",
        "variants": [{"id": 1, "sku": "X1", "price": "42.50", "inventory_quantity": 5}]
    }));
    upsert_shopify_item(&pool, &product).await.expect("mirror upsert");

    let product_id = seed_product(&pool, "999").await;
    seed_variant(&pool, product_id, "X1", None).await;

    apply_product_update(&pool, &product, STOREFRONT).await.expect("sweep");

    let processed: Vec<String> = sqlx::query_scalar(
        "SELECT processed_storefronts FROM shopify_items WHERE shopify_id = $1",
    )
    .bind("999")
    .fetch_one(&pool)
    .await
    .expect("mirror row");
    assert_eq!(processed, vec![STOREFRONT.to_owned()]);

    // The log never accumulates duplicates on a retry.
    apply_product_update(&pool, &product, STOREFRONT).await.expect("sweep");
    let processed: Vec<String> = sqlx::query_scalar(
        "SELECT processed_storefronts FROM shopify_items WHERE shopify_id = $1",
    )
    .bind("999")
    .fetch_one(&pool)
    .await
    .expect("mirror row");
    assert_eq!(processed, vec![STOREFRONT.to_owned()]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn inventory_level_update_writes_stock_via_mirror(pool: PgPool) {
    let product = payload(serde_json::json!({
        "id": 999,
        "title": "Slip Dress",
        "variants": [{"id": 1, "sku": "X1", "inventory_item_id": 555}]
    }));
    upsert_shopify_item(&pool, &product).await.expect("mirror upsert");

    let product_id = seed_product(&pool, "999").await;
    let variant_id = seed_variant(&pool, product_id, "X1", Some("555")).await;

    let updated = apply_inventory_level_update(&pool, 12, 555, STOREFRONT)
        .await
        .expect("inventory sweep");
    assert_eq!(updated, 1);

    let variants = list_variants(&pool, STOREFRONT, product_id).await.expect("variants");
    assert_eq!(variants[0].id, variant_id);
    assert_eq!(variants[0].stock, 12);
}

#[sqlx::test(migrations = "../../migrations")]
async fn inventory_level_update_without_mirror_row_updates_nothing(pool: PgPool) {
    let product_id = seed_product(&pool, "999").await;
    seed_variant(&pool, product_id, "X1", Some("555")).await;

    let updated = apply_inventory_level_update(&pool, 12, 555, STOREFRONT)
        .await
        .expect("inventory sweep");
    assert_eq!(updated, 0);

    let variants = list_variants(&pool, STOREFRONT, product_id).await.expect("variants");
    assert_eq!(variants[0].stock, 0);
}
