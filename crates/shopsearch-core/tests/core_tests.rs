use std::fs;
use std::sync::Arc;

use figment::providers::{Format, Toml};
use figment::Figment;
use tempfile::TempDir;

use shopsearch_core::catalog::Catalog;
use shopsearch_core::config::{resolve_with_base, Config, EmbedBackend, Settings};
use shopsearch_core::types::{rank_positions, CatalogItem, SourceKind};
use shopsearch_core::Error;

fn item(id: &str, title: &str) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("{title} description"),
        price: 1.0,
        image_url: String::new(),
    }
}

#[test]
fn seed_catalog_documents_are_aligned_with_items() {
    let catalog = Catalog::seed();
    assert_eq!(catalog.len(), 5);
    let docs = catalog.documents();
    assert_eq!(docs.len(), catalog.len());
    for (pos, doc) in docs.iter().enumerate() {
        let item = catalog.get(pos).expect("item");
        assert_eq!(doc, &format!("{}\n{}", item.title, item.description));
    }
    assert_eq!(catalog.find("p4").expect("p4").title, "Dancing Image Mug");
    assert!(catalog.find("p9").is_none());
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = Catalog::from_items(vec![item("a", "One"), item("a", "Two")]).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)), "got {err:?}");
}

#[test]
fn empty_catalog_is_allowed() {
    let catalog = Catalog::from_items(vec![]).expect("empty catalog");
    assert!(catalog.is_empty());
    assert!(catalog.documents().is_empty());
}

#[test]
fn catalog_loads_from_json_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("catalog.json");
    let items = vec![item("x1", "Camping Lantern"), item("x2", "Trail Shoes")];
    fs::write(&path, serde_json::to_string(&items).unwrap()).unwrap();

    let catalog = Catalog::from_json_file(&path).expect("load");
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.get(1).unwrap().id, "x2");
}

#[test]
fn missing_and_malformed_catalog_files_are_distinct_errors() {
    let tmp = TempDir::new().unwrap();
    let missing = Catalog::from_json_file(&tmp.path().join("nope.json")).unwrap_err();
    assert!(matches!(missing, Error::NotFound(_)));

    let bad = tmp.path().join("bad.json");
    fs::write(&bad, "{ not json").unwrap();
    let malformed = Catalog::from_json_file(&bad).unwrap_err();
    assert!(matches!(malformed, Error::InvalidConfig(_)));
}

#[test]
fn rank_positions_orders_by_score_then_position() {
    let catalog = Catalog::seed();
    let hits = rank_positions(vec![(3, 0.5), (0, 0.9), (1, 0.5), (4, 0.1)], 3, SourceKind::Sparse, |p| catalog.get(p));
    let ids: Vec<&str> = hits.iter().map(|h| h.id()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p4"]);
    assert_eq!(hits.iter().map(|h| h.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(hits.iter().all(|h| h.source == SourceKind::Sparse));
    assert!(Arc::ptr_eq(&hits[0].item, &catalog.get(0).unwrap()));
}

#[test]
fn settings_defaults_match_service_defaults() {
    let settings = Config::from_figment(Figment::new(), ".").settings().expect("defaults");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.search.default_rows, 10);
    assert!((settings.search.default_alpha - 0.5).abs() < f32::EPSILON);
    assert!(settings.sparse.enabled && settings.dense.enabled);
    assert_eq!(settings.dense.backend, EmbedBackend::Candle);
}

#[test]
fn toml_overrides_nested_keys() {
    let toml = r#"
        [search]
        max_rows = 25
        strict_params = true

        [dense]
        backend = "hashing"
        hashing_dim = 64
    "#;
    let config = Config::from_figment(Figment::new().merge(Toml::string(toml)), "/srv/shop");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.search.max_rows, 25);
    assert!(settings.search.strict_params);
    assert_eq!(settings.search.default_rows, 10, "untouched keys keep defaults");
    assert_eq!(settings.dense.backend, EmbedBackend::Hashing);
    assert_eq!(config.get::<usize>("dense.hashing_dim").unwrap(), 64);
    assert_eq!(config.resolve_path("catalog.json"), std::path::PathBuf::from("/srv/shop/catalog.json"));
}

#[test]
fn invalid_settings_are_rejected() {
    let toml = "[search]\ndefault_rows = 500\nmax_rows = 100\n";
    let config = Config::from_figment(Figment::new().merge(Toml::string(toml)), ".");
    assert!(config.settings().is_err());
}

#[test]
fn load_from_reads_explicit_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("shop.toml");
    fs::write(&path, "[server]\nport = 9123\n[catalog]\npath = \"items.json\"\n").unwrap();

    let config = Config::load_from(&path).expect("config");
    let settings = config.settings().unwrap();
    assert_eq!(settings.server.port, 9123);
    assert_eq!(config.resolve_path(&settings.catalog.path), tmp.path().join("items.json"));

    assert!(Config::load_from(&tmp.path().join("missing.toml")).is_err());
}

#[test]
fn absolute_paths_are_not_rebased() {
    let base = std::path::Path::new("/base");
    assert_eq!(resolve_with_base(base, "/abs/file"), std::path::PathBuf::from("/abs/file"));
    assert_eq!(resolve_with_base(base, "rel/file"), std::path::PathBuf::from("/base/rel/file"));
}
