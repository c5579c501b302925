use anyhow::Result;
use candle_core::Tensor;

/// Mean of the unmasked token states of each row, L2-normalised.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]`; returns `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _tokens, hidden_dim) = hidden.dims3()?;
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = (mask.sum(1)? + 1e-9)?;
    let mean = summed.broadcast_div(&counts)?;
    let norms = (mean.sqr()?.sum_keepdim(1)?.sqrt()? + 1e-12)?;
    let pooled = mean.broadcast_div(&norms)?;
    debug_assert_eq!(pooled.dims(), &[batch, hidden_dim]);
    Ok(pooled)
}
