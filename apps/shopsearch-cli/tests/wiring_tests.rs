use std::fs;

use shopsearch_hybrid::{SearchMode, SearchRequest};

#[test]
fn config_file_drives_the_service() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("catalog.json"),
        r#"[
            {"id": "a1", "title": "Cast Iron Skillet", "description": "Pre-seasoned skillet for searing.", "price": 29.0, "image_url": "https://example.com/a1.jpg"},
            {"id": "a2", "title": "Chef Knife", "description": "Eight inch stainless chef knife.", "price": 45.5, "image_url": "https://example.com/a2.jpg"}
        ]"#,
    )
    .expect("write catalog");
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[catalog]\npath = \"catalog.json\"\n\n[dense]\nbackend = \"hashing\"\nhashing_dim = 64\n\n[search]\ndefault_rows = 1\n",
    )
    .expect("write config");

    let config = shopsearch_cli::load_config(Some(&config_path)).expect("config");
    let service = shopsearch_cli::build_service(&config).expect("service");
    assert_eq!(service.catalog().len(), 2);

    let response = service.search(&SearchRequest::new("skillet")).expect("search");
    assert_eq!(response.mode, SearchMode::Fused);
    assert_eq!(response.count, 1);
    assert_eq!(response.results[0].id(), "a1");
    assert_eq!(service.stats().dense_dim, Some(64));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = shopsearch_cli::load_config(Some(&dir.path().join("nope.toml"))).err().expect("must fail");
    assert!(err.to_string().contains("nope.toml"), "{err}");
}

#[test]
fn missing_catalog_file_fails_the_build() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[catalog]\npath = \"missing.json\"\n").expect("write config");
    let config = shopsearch_cli::load_config(Some(&config_path)).expect("config");
    assert!(shopsearch_cli::build_service(&config).is_err());
}
