use std::collections::HashMap;

use candle_core::Device;
use shopsearch_embed::tokenize::{tokenize_batch, PAD_ID};
use tokenizers::models::wordlevel::WordLevel;
use tokenizers::models::ModelWrapper;
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::pre_tokenizers::PreTokenizerWrapper;
use tokenizers::Tokenizer;

fn word_tokenizer() -> Tokenizer {
    let vocab: HashMap<String, u32> = [("[PAD]", 0), ("[UNK]", 1), ("red", 2), ("green", 3), ("blue", 4), ("mug", 5)]
        .into_iter()
        .map(|(w, id)| (w.to_string(), id))
        .collect();
    let model = WordLevel::builder().vocab(vocab).unk_token("[UNK]".to_string()).build().expect("wordlevel");
    let mut tokenizer = Tokenizer::new(ModelWrapper::from(model));
    tokenizer.with_pre_tokenizer(PreTokenizerWrapper::from(Whitespace::default()));
    tokenizer
}

fn texts(items: &[&str]) -> Vec<String> { items.iter().map(|s| s.to_string()).collect() }

#[test]
fn pads_to_the_longest_row() {
    let tokenizer = word_tokenizer();
    let (ids, mask) = tokenize_batch(&tokenizer, &texts(&["red green blue", "mug", "blue red"]), 16, &Device::Cpu).expect("tokenize");
    assert_eq!(ids.dims(), [3, 3]);
    assert_eq!(mask.dims(), [3, 3]);
    let ids: Vec<Vec<u32>> = ids.to_vec2().expect("ids");
    let mask: Vec<Vec<u32>> = mask.to_vec2().expect("mask");
    assert_eq!(ids, vec![vec![2, 3, 4], vec![5, PAD_ID, PAD_ID], vec![4, 2, PAD_ID]]);
    assert_eq!(mask, vec![vec![1, 1, 1], vec![1, 0, 0], vec![1, 1, 0]]);
}

#[test]
fn truncates_to_max_len() {
    let tokenizer = word_tokenizer();
    let (ids, mask) = tokenize_batch(&tokenizer, &texts(&["red green blue mug red", "green"]), 2, &Device::Cpu).expect("tokenize");
    assert_eq!(ids.dims(), [2, 2]);
    let ids: Vec<Vec<u32>> = ids.to_vec2().expect("ids");
    let mask: Vec<Vec<u32>> = mask.to_vec2().expect("mask");
    assert_eq!(ids, vec![vec![2, 3], vec![3, PAD_ID]]);
    assert_eq!(mask, vec![vec![1, 1], vec![1, 0]]);
}

#[test]
fn unknown_words_map_to_unk() {
    let tokenizer = word_tokenizer();
    let (ids, _) = tokenize_batch(&tokenizer, &texts(&["teapot mug"]), 8, &Device::Cpu).expect("tokenize");
    let ids: Vec<Vec<u32>> = ids.to_vec2().expect("ids");
    assert_eq!(ids, vec![vec![1, 5]]);
}

#[test]
fn blank_rows_and_empty_batches_keep_a_valid_shape() {
    let tokenizer = word_tokenizer();
    let (ids, mask) = tokenize_batch(&tokenizer, &texts(&["", "   "]), 8, &Device::Cpu).expect("tokenize");
    assert_eq!(ids.dims(), [2, 1]);
    let ids: Vec<Vec<u32>> = ids.to_vec2().expect("ids");
    let mask: Vec<Vec<u32>> = mask.to_vec2().expect("mask");
    assert_eq!(ids, vec![vec![PAD_ID], vec![PAD_ID]]);
    assert_eq!(mask, vec![vec![0], vec![0]]);

    let (ids, mask) = tokenize_batch(&tokenizer, &[], 8, &Device::Cpu).expect("tokenize");
    assert_eq!(ids.dims(), [0, 1]);
    assert_eq!(mask.dims(), [0, 1]);
}
