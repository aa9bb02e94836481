use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use catalog_core::config::CatalogConfig;
use catalog_core::{Catalog, Error, IndexManager, Product, ProductSearch, SearchBackend, SharedBackend};
use catalog_text::TantivyBackend;

const INDEX: &str = "productindex";

fn product(name: &str, description: &str, manufacturer: &str) -> Product {
    Product::builder(name).description(description).manufacturer(manufacturer).build().unwrap()
}

fn setup(backend: SharedBackend) -> (IndexManager, ProductSearch) {
    (IndexManager::new(backend.clone(), INDEX, 100), ProductSearch::new(backend, INDEX, 5))
}

async fn indexed(products: &[Product]) -> (IndexManager, ProductSearch) {
    let (manager, search) = setup(Arc::new(TantivyBackend::in_memory()));
    manager.reset().await.expect("reset");
    let outcomes = manager.bulk_upsert(products).await.expect("bulk");
    assert!(outcomes.iter().all(|o| o.is_indexed()));
    (manager, search)
}

#[tokio::test]
async fn full_cycle_reset_index_search_reset() {
    let d1 = product("Blue Shirt", "cotton shirt with buttons", "Acme");
    let d2 = product("Hornby Express", "electric model train set", "Hornby");
    let (manager, search) = setup(Arc::new(TantivyBackend::in_memory()));

    manager.reset().await.unwrap();
    let outcomes = manager.bulk_upsert(&[d1.clone(), d2.clone()]).await.unwrap();
    let d1_id = outcomes[0].id().unwrap().to_string();

    let results = search.search(d1.name()).await.unwrap();
    assert!(results.iter().any(|p| p.id() == Some(d1_id.as_str())));
    assert!(results.iter().all(|p| p.name() != d2.name()), "unrelated product must not match");

    manager.reset().await.unwrap();
    assert!(search.search(d1.name()).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_tolerates_one_edit_typos() {
    let (_m, search) = indexed(&[product("Blue Shirt", "cotton", "Acme")]).await;

    let exact = search.search("shirt").await.unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].name(), "Blue Shirt");

    let typo = search.search("shrit").await.unwrap();
    assert_eq!(typo.len(), 1, "transposition counts as one edit");
    assert_eq!(typo[0].name(), "Blue Shirt");
}

#[tokio::test]
async fn search_matches_description_and_ranks_name_hits_first() {
    let (_m, search) = indexed(&[
        product("Wool Scarf", "warm scarf, goes well with a shirt", "Knit Co"),
        product("Blue Shirt", "cotton shirt", "Acme"),
    ])
    .await;

    let results = search.search("shirt").await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].name(), "Blue Shirt");
}

#[tokio::test]
async fn short_terms_are_not_fuzzy() {
    let (_m, search) = indexed(&[product("TV Stand", "oak", "Acme")]).await;
    assert_eq!(search.search("tv").await.unwrap().len(), 1);
    assert!(search.search("tx").await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_search_returns_empty() {
    let (_m, search) = indexed(&[product("Blue Shirt", "cotton", "Acme")]).await;
    assert!(search.search("").await.unwrap().is_empty());
    assert!(search.search("   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn suggest_matches_name_prefix() {
    let (_m, search) = indexed(&[
        product("Hornby Express", "model train", "Hornby"),
        product("Horn Speaker", "loud", "Acme"),
        product("Blue Shirt", "hornby themed print", "Acme"),
    ])
    .await;

    let names = search.suggest("Horn").await.unwrap();
    assert!(names.contains(&"Hornby Express".to_string()));
    assert!(names.contains(&"Horn Speaker".to_string()));
    assert!(!names.contains(&"Blue Shirt".to_string()), "description is not a suggestion source");

    let lower = search.suggest("hornby e").await.unwrap();
    assert_eq!(lower, vec!["Hornby Express".to_string()], "prefix is case-insensitive and spans words");
}

#[tokio::test]
async fn suggest_treats_input_literally() {
    let (_m, search) = indexed(&[product("C++ Primer", "book", "Pub"), product("Cable", "usb", "Acme")]).await;
    assert_eq!(search.suggest("c++").await.unwrap(), vec!["C++ Primer".to_string()]);
    assert!(search.suggest("c.*").await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_suggest_returns_first_five() {
    let products: Vec<Product> = (0..8).map(|i| product(&format!("Item {i}"), "thing", "Acme")).collect();
    let (_m, search) = indexed(&products).await;

    let names = search.suggest("").await.unwrap();
    assert_eq!(names.len(), 5);
    assert!(names.iter().all(|n| n.starts_with("Item ")));
}

#[tokio::test]
async fn manufacturer_and_category_filter_is_exact_conjunction() {
    let toys = Product::builder("Yo-yo").manufacturer("Acme").category("Toys").build().unwrap();
    let games = Product::builder("Chess").manufacturer("Acme").category("Games").build().unwrap();
    let other = Product::builder("Kite").manufacturer("Skyline").category("Toys").build().unwrap();
    let (_m, search) = indexed(&[toys, games, other]).await;

    let results = search.filter_by_manufacturer_and_category("Acme", "Toys").await.unwrap();
    let names: Vec<&str> = results.iter().map(Product::name).collect();
    assert_eq!(names, vec!["Yo-yo"]);

    assert!(search.filter_by_manufacturer_and_category("acme", "Toys").await.unwrap().is_empty(), "exact match is case-sensitive");
    assert_eq!(search.find_by_manufacturer("Acme").await.unwrap().len(), 2);
}

#[tokio::test]
async fn price_range_excludes_both_bounds() {
    let priced = |name: &str, price: f64| Product::builder(name).price(price).build().unwrap();
    let (_m, search) = indexed(&[
        priced("At Lower", 10.0),
        priced("Middle", 50.0),
        priced("At Upper", 100.0),
        priced("Cheap", 5.0),
        Product::builder("Unpriced").build().unwrap(),
    ])
    .await;

    let results = search.filter_by_price_range(10.0, 100.0).await.unwrap();
    let names: Vec<&str> = results.iter().map(Product::name).collect();
    assert_eq!(names, vec!["Middle"]);
    assert_eq!(results[0].price(), Some(50.0));

    let cheap = search.filter_by_price_range(f64::NEG_INFINITY, 10.0).await.unwrap();
    assert_eq!(cheap.iter().map(Product::name).collect::<Vec<_>>(), vec!["Cheap"]);
}

#[tokio::test]
async fn find_by_name_is_not_fuzzy() {
    let (_m, search) = indexed(&[product("Blue Shirt", "cotton", "Acme")]).await;
    assert_eq!(search.find_by_name("shirt").await.unwrap().len(), 1);
    assert!(search.find_by_name("shrit").await.unwrap().is_empty());
}

#[tokio::test]
async fn find_by_name_containing_matches_substrings_literally() {
    let (_m, search) = indexed(&[
        product("Hornby Express", "model train", "Hornby"),
        product("Express Courier Bag", "canvas", "Acme"),
        product("Blue Shirt", "express delivery", "Acme"),
        product("Size 50% Off Tag", "label", "Acme"),
    ])
    .await;

    let mut names: Vec<String> = search
        .find_by_name_containing("EXPRESS")
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Express Courier Bag".to_string(), "Hornby Express".to_string()]);

    assert_eq!(search.find_by_name_containing("by ex").await.unwrap().len(), 1);
    assert_eq!(search.find_by_name_containing("50%").await.unwrap().len(), 1);
    assert!(search.find_by_name_containing("e.*s").await.unwrap().is_empty());
    assert!(search.find_by_name_containing(" ").await.unwrap().is_empty());
}

#[tokio::test]
async fn upsert_replaces_document_with_same_id() {
    let (manager, search) = indexed(&[]).await;

    let first = Product::builder("Blue Shirt").id("p1").description("cotton").build().unwrap();
    assert_eq!(manager.upsert(&first).await.unwrap(), "p1");
    let replacement = Product::builder("Blue Shirt").id("p1").description("linen").build().unwrap();
    manager.upsert(&replacement).await.unwrap();

    let results = search.search("shirt").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].description(), "linen");
}

#[tokio::test]
async fn engine_assigns_ids_when_missing() {
    let (manager, search) = indexed(&[]).await;
    let id = manager.upsert(&product("Blue Shirt", "cotton", "Acme")).await.unwrap();
    assert!(!id.is_empty());
    let results = search.search("blue").await.unwrap();
    assert_eq!(results[0].id(), Some(id.as_str()));
}

#[tokio::test]
async fn bulk_reports_failures_per_item() {
    let backend = Arc::new(TantivyBackend::in_memory());
    backend.create_index(INDEX).await.unwrap();
    // Deserialization bypasses the builder, which rejects blank names.
    let blank: Product = serde_json::from_str(r#"{"name":"  "}"#).unwrap();

    let outcomes = backend.bulk_index(INDEX, &[product("Blue Shirt", "cotton", "Acme"), blank]).await.unwrap();
    assert!(outcomes[0].is_indexed());
    assert!(!outcomes[1].is_indexed());
}

#[tokio::test]
async fn search_on_missing_index_is_not_found() {
    let (_manager, search) = setup(Arc::new(TantivyBackend::in_memory()));
    assert!(matches!(search.search("shirt").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn creating_existing_index_fails() {
    let backend = TantivyBackend::in_memory();
    backend.create_index(INDEX).await.unwrap();
    assert!(matches!(backend.create_index(INDEX).await, Err(Error::Operation(_))));
    backend.delete_index(INDEX).await.unwrap();
    backend.delete_index(INDEX).await.unwrap();
}

#[tokio::test]
async fn on_disk_index_is_reopened_by_a_new_backend() {
    let tmp = TempDir::new().unwrap();
    {
        let (manager, _) = setup(Arc::new(TantivyBackend::in_dir(tmp.path().to_path_buf())));
        manager.reset().await.unwrap();
        manager.bulk_upsert(&[product("Hornby Express", "model train", "Hornby")]).await.unwrap();
    }
    assert!(tmp.path().join(INDEX).join("meta.json").exists());

    let (manager, search) = setup(Arc::new(TantivyBackend::in_dir(tmp.path().to_path_buf())));
    assert_eq!(search.suggest("horn").await.unwrap(), vec!["Hornby Express".to_string()]);

    manager.delete().await.unwrap();
    assert!(!tmp.path().join(INDEX).exists());
}

#[tokio::test]
async fn catalog_initializes_from_dataset_and_tears_down() {
    let tmp = TempDir::new().unwrap();
    let dataset = tmp.path().join("products.csv");
    fs::write(
        &dataset,
        "name,description,manufacturer\nBlue Shirt,cotton shirt,Acme\nHornby Express,model train,Hornby\nmalformed\n",
    )
    .unwrap();
    let mut config = CatalogConfig::default();
    config.dataset.path = dataset.to_string_lossy().to_string();
    let backend: SharedBackend = Arc::new(TantivyBackend::in_memory());

    let catalog = Catalog::initialize(backend.clone(), &config).await.unwrap();
    assert_eq!(catalog.report().indexed, 2);
    assert_eq!(catalog.report().skipped_rows, 1);
    assert_eq!(catalog.search().suggest("Horn").await.unwrap(), vec!["Hornby Express".to_string()]);
    assert_eq!(catalog.search().search("shrit").await.unwrap().len(), 1);

    catalog.shutdown().await.unwrap();
    let after = ProductSearch::new(backend, INDEX, 5);
    assert!(matches!(after.search("shirt").await, Err(Error::NotFound(_))));
}
