use std::path::PathBuf;

use shopsearch_core::config::{DenseSettings, EmbedBackend};
use shopsearch_core::traits::Embedder;
use shopsearch_embed::{load_embedder, EmbedderOptions, HashEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(384);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim is 384");
    assert_eq!(embedder.dim(), 384);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn hash_embedder_places_shared_tokens_closer() {
    let embedder = HashEmbedder::new(256);
    let mug = embedder.embed_text("Dancing Image Mug");
    let query = embedder.embed_text("dancing mug");
    let speaker = embedder.embed_text("Portable Bluetooth Speaker");
    assert!(cosine(&mug, &query) > cosine(&speaker, &query));
}

#[test]
fn hash_embedder_blank_text_is_zero_vector() {
    let v = HashEmbedder::new(16).embed_text("  ,, ");
    assert!(v.iter().all(|x| *x == 0.0));
}

#[test]
fn hashing_backend_loads_without_model_files() {
    let settings = DenseSettings { backend: EmbedBackend::Hashing, hashing_dim: 64, ..DenseSettings::default() };
    let options = EmbedderOptions::from_settings(&settings, PathBuf::from("/nonexistent"));
    let embedder = load_embedder(&options).expect("hashing backend");
    assert_eq!(embedder.dim(), 64);
    assert!(embedder.id().starts_with("hashing:"));
}

#[test]
fn candle_backend_without_model_dir_is_an_error() {
    if std::env::var("APP_USE_FAKE_EMBEDDINGS").is_ok() || std::env::var("APP_MODEL_DIR").is_ok() {
        eprintln!("skipping: embedding env overrides are set");
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let settings = DenseSettings { model_name: "no-such-model-for-tests".into(), ..DenseSettings::default() };
    let options = EmbedderOptions::from_settings(&settings, tmp.path().join("missing"));
    assert!(load_embedder(&options).is_err());
}
