use candle_core::{DType, Device, Tensor};
use shopsearch_embed::masked_mean_l2;

#[test]
fn masked_mean_l2_ignores_padding_tokens() {
    let dev = Device::Cpu;
    // Batch of two, three tokens each, hidden dim 4.
    let h = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0,   // row 0, token 0
                                 5.0, 6.0, 7.0, 8.0,       // row 0, token 1 (padding)
                                 9.0, 9.0, 9.0, 9.0,       // row 0, token 2 (padding)
                                 1.0, 0.0, 0.0, 0.0,       // row 1, token 0
                                 0.0, 1.0, 0.0, 0.0,       // row 1, token 1
                                 7.0, 7.0, 7.0, 7.0],      // row 1, token 2 (padding)
                               (2, 3, 4), &dev).unwrap();
    let mask = Tensor::from_slice(&[1u32, 0, 0, 1, 1, 0], (2, 3), &dev).unwrap();
    let out = masked_mean_l2(&h, &mask).unwrap();
    assert_eq!(out.dims(), &[2, 4]);
    let v: Vec<Vec<f32>> = out.to_vec2().unwrap();

    let norm0: f32 = (1.0f32 + 4.0 + 9.0 + 16.0).sqrt();
    for (a, b) in v[0].iter().zip([1.0 / norm0, 2.0 / norm0, 3.0 / norm0, 4.0 / norm0]) {
        assert!((a - b).abs() < 1e-5, "a={} b={}", a, b);
    }
    // Mean of the two unmasked tokens is [0.5, 0.5, 0, 0].
    let s = 0.5f32.sqrt();
    for (a, b) in v[1].iter().zip([s, s, 0.0, 0.0]) {
        assert!((a - b).abs() < 1e-5, "a={} b={}", a, b);
    }
}

#[test]
fn masked_mean_l2_rejects_mismatched_mask() {
    let dev = Device::Cpu;
    let h = Tensor::zeros((1, 3, 4), DType::F32, &dev).unwrap();
    let mask = Tensor::ones((1, 2), DType::U32, &dev).unwrap();
    assert!(masked_mean_l2(&h, &mask).is_err());
}
