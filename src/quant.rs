// C5: Quantization. Scales the standard luma/chroma tables by a quality
// factor, then divides (or multiplies back) each DCT coefficient.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::array2d::Array2D;
use crate::block::BlockGrid;
use crate::consts::{BASE_CHROMA_QUANT_TABLE, BASE_LUMA_QUANT_TABLE};
use crate::error::{CodecError, Result};
use crate::util::clamp;

/// Which base table a channel should be quantized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
  Luma,
  Chroma,
}

/// A pair of scaled 8x8 quantization tables (row-major, not zig-zag order)
/// for a given quality factor.
pub struct QuantTables {
  luma: [u16; 64],
  chroma: [u16; 64],
}

impl QuantTables {
  fn table_for(&self, kind: ChannelKind) -> &[u16; 64] {
    match kind {
      ChannelKind::Luma => &self.luma,
      ChannelKind::Chroma => &self.chroma,
    }
  }
}

fn scale_table(base: &[u16; 64], quality: i32) -> [u16; 64] {
  let scale = if quality < 50 { 5000 / quality } else { 200 - 2 * quality };
  let mut out = [0u16; 64];
  for (i, &base_value) in base.iter().enumerate() {
    let scaled = (base_value as i32 * scale + 50) / 100;
    out[i] = clamp(scaled, 1, 255) as u16;
  }
  out
}

fn quant_cache() -> &'static Mutex<HashMap<u8, Arc<QuantTables>>> {
  static CACHE: OnceLock<Mutex<HashMap<u8, Arc<QuantTables>>>> = OnceLock::new();
  CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Look up (or lazily build) the scaled luma/chroma tables for `quality`.
/// The cache is process-wide, write-once-per-key, and safe to read
/// concurrently once populated.
pub fn quant_tables(quality: u8) -> Result<Arc<QuantTables>> {
  if !(1..=100).contains(&quality) {
    return Err(CodecError::OutOfRange(format!("quality {} is outside [1,100]", quality)));
  }

  let mut cache = quant_cache().lock().unwrap();
  if let Some(tables) = cache.get(&quality) {
    return Ok(tables.clone());
  }

  let tables = Arc::new(QuantTables {
    luma: scale_table(&BASE_LUMA_QUANT_TABLE, quality as i32),
    chroma: scale_table(&BASE_CHROMA_QUANT_TABLE, quality as i32),
  });
  cache.insert(quality, tables.clone());
  log::trace!("built quantization tables for quality={}", quality);
  Ok(tables)
}

/// Quantize a single DCT-domain block: Q[u,v] = round(D[u,v] / T[u,v]).
pub fn quantize_block(block: &Array2D<f32>, tables: &QuantTables, kind: ChannelKind) -> Array2D<i32> {
  let table = tables.table_for(kind);
  let mut out = Array2D::<i32>::zeroed(8, 8);
  out.fill_with(|i, j| {
    let t = table[i * 8 + j] as f32;
    (block[i][j] / t).round() as i32
  });
  out
}

/// Dequantize a single block: D_hat[u,v] = Q[u,v] * T[u,v].
pub fn dequantize_block(block: &Array2D<i32>, tables: &QuantTables, kind: ChannelKind) -> Array2D<f32> {
  let table = tables.table_for(kind);
  let mut out = Array2D::<f32>::zeroed(8, 8);
  out.fill_with(|i, j| (block[i][j] as f32) * (table[i * 8 + j] as f32));
  out
}

/// Quantize every block in a grid against the given channel kind.
pub fn quantize(blocks: &BlockGrid<f32>, tables: &QuantTables, kind: ChannelKind) -> BlockGrid<i32> {
  blocks.map_blocks(|b| Ok(quantize_block(b, tables, kind))).unwrap()
}

/// Dequantize every block in a grid against the given channel kind.
pub fn dequantize(blocks: &BlockGrid<i32>, tables: &QuantTables, kind: ChannelKind) -> BlockGrid<f32> {
  blocks.map_blocks(|b| Ok(dequantize_block(b, tables, kind))).unwrap()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn quality_100_is_near_unit_scale() {
    let tables = quant_tables(100).unwrap();
    // At q=100, scale = 200 - 200 = 0, so every entry clamps to 1.
    assert!(tables.luma.iter().all(|&v| v == 1));
    assert!(tables.chroma.iter().all(|&v| v == 1));
  }

  #[test]
  fn out_of_range_quality_is_rejected() {
    assert!(matches!(quant_tables(0), Err(CodecError::OutOfRange(_))));
    assert!(matches!(quant_tables(101), Err(CodecError::OutOfRange(_))));
  }

  #[test]
  fn quantize_then_dequantize_is_identity_at_q100() {
    let tables = quant_tables(100).unwrap();
    let mut block = Array2D::<f32>::zeroed(8, 8);
    block.fill_with(|i, j| (i * 8 + j) as f32 - 30.0);

    let q = quantize_block(&block, &tables, ChannelKind::Luma);
    let dq = dequantize_block(&q, &tables, ChannelKind::Luma);

    for i in 0..8 {
      for j in 0..8 {
        assert!((dq[i][j] - block[i][j]).abs() < 1.0);
      }
    }
  }

  #[test]
  fn cache_returns_same_tables_for_repeated_quality() {
    let a = quant_tables(42).unwrap();
    let b = quant_tables(42).unwrap();
    assert_eq!(a.luma, b.luma);
    assert_eq!(a.chroma, b.chroma);
  }
}
