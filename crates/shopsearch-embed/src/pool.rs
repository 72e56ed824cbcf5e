use anyhow::{Result, ensure};
use candle_core::{DType, Tensor};

/// Sentence-transformers pooling: average the token states the attention mask
/// keeps, then L2-normalize. `hidden` is `[B, T, H]`, `attention_mask` `[B, T]`;
/// the result is `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, seq_len, hidden_dim) = hidden.dims3()?;
    ensure!(attention_mask.dims() == [batch, seq_len], "mask shape {:?} does not match hidden {:?}", attention_mask.dims(), hidden.dims());

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?;
    let mean = summed.broadcast_div(&counts)?;

    let eps_val = match hidden.dtype() { DType::F16 | DType::BF16 => 1e-6f64, _ => 1e-12f64 };
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.affine(1.0, eps_val)?;
    let pooled = mean.broadcast_div(&norm)?;
    ensure!(pooled.dims() == [batch, hidden_dim], "unexpected pooled shape {:?}", pooled.dims());
    Ok(pooled)
}
