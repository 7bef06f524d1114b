// C4: 2-D DCT and IDCT. Orthonormal 8-point type-II DCT, applied separably
// as two 8x8 matrix products (never as nested cosine loops).

use std::sync::OnceLock;

use crate::array2d::Array2D;
use crate::block::BlockGrid;
use crate::error::{CodecError, Result};
use crate::util::clamp;

const BLOCK_SIZE: usize = 8;

// M[k][i] = alpha(k) * cos(pi*(2i+1)*k/16)
fn dct_matrix() -> &'static [[f32; 8]; 8] {
  static MATRIX: OnceLock<[[f32; 8]; 8]> = OnceLock::new();
  MATRIX.get_or_init(|| {
    let mut m = [[0f32; 8]; 8];
    for k in 0..8 {
      let alpha = if k == 0 { (1.0f32 / 8.0).sqrt() } else { (2.0f32 / 8.0).sqrt() };
      for i in 0..8 {
        let angle = std::f32::consts::PI * (2 * i + 1) as f32 * k as f32 / 16.0;
        m[k][i] = alpha * angle.cos();
      }
    }
    m
  })
}

fn check_8x8(rows: usize, cols: usize) -> Result<()> {
  if rows != BLOCK_SIZE || cols != BLOCK_SIZE {
    return Err(CodecError::InvalidShape(format!("expected an {0}x{0} block, got {1}x{2}", BLOCK_SIZE, rows, cols)));
  }
  Ok(())
}

// dst = a * b, both 8x8, row-major f32
fn matmul8(a: &[[f32; 8]; 8], b: &[[f32; 8]; 8]) -> [[f32; 8]; 8] {
  let mut out = [[0f32; 8]; 8];
  for i in 0..8 {
    for j in 0..8 {
      let mut sum = 0f32;
      for k in 0..8 {
        sum += a[i][k] * b[k][j];
      }
      out[i][j] = sum;
    }
  }
  out
}

fn transpose8(m: &[[f32; 8]; 8]) -> [[f32; 8]; 8] {
  let mut out = [[0f32; 8]; 8];
  for i in 0..8 {
    for j in 0..8 {
      out[j][i] = m[i][j];
    }
  }
  out
}

/// Forward DCT of a single 8x8 pixel block: B = M (b - 128) M^T.
pub fn dct_block(block: &Array2D<u8>) -> Result<Array2D<f32>> {
  check_8x8(block.rows(), block.cols())?;

  let m = dct_matrix();
  let mt = transpose8(m);

  let mut shifted = [[0f32; 8]; 8];
  for i in 0..8 {
    for j in 0..8 {
      shifted[i][j] = block[i][j] as f32 - 128.0;
    }
  }

  let tmp = matmul8(m, &shifted);
  let result = matmul8(&tmp, &mt);

  let mut out = Array2D::<f32>::zeroed(8, 8);
  out.fill_with(|i, j| result[i][j]);
  Ok(out)
}

/// Inverse DCT of a single 8x8 coefficient block: b = M^T B M + 128.
/// Output stays in float domain, clamped to [0, 255] but not rounded to
/// u8 -- that conversion happens only at image egress (C3's merge step).
pub fn idct_block(coeffs: &Array2D<f32>) -> Result<Array2D<f32>> {
  check_8x8(coeffs.rows(), coeffs.cols())?;

  let m = dct_matrix();
  let mt = transpose8(m);

  let mut b = [[0f32; 8]; 8];
  for i in 0..8 {
    for j in 0..8 {
      b[i][j] = coeffs[i][j];
    }
  }

  let tmp = matmul8(&mt, &b);
  let result = matmul8(&tmp, m);

  let mut out = Array2D::<f32>::zeroed(8, 8);
  out.fill_with(|i, j| clamp(result[i][j] + 128.0, 0.0, 255.0));
  Ok(out)
}

/// Apply the forward DCT to every block in a grid.
pub fn dct_all(blocks: &BlockGrid<u8>) -> Result<BlockGrid<f32>> {
  blocks.map_blocks(dct_block)
}

/// Apply the inverse DCT to every block in a grid.
pub fn idct_all(blocks: &BlockGrid<f32>) -> Result<BlockGrid<f32>> {
  blocks.map_blocks(idct_block)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_non_8x8_blocks() {
    let block = Array2D::<u8>::zeroed(4, 4);
    assert!(matches!(dct_block(&block), Err(CodecError::InvalidShape(_))));
  }

  #[test]
  fn flat_block_has_zero_ac_and_near_zero_dc() {
    let block = Array2D::<u8>::from_row_major(8, 8, vec![128u8; 64]);
    let dct = dct_block(&block).unwrap();
    assert!(dct[0][0].abs() < 1e-3);
    for i in 0..8 {
      for j in 0..8 {
        if (i, j) != (0, 0) {
          assert!(dct[i][j].abs() < 1e-3, "unexpected AC energy at {},{}: {}", i, j, dct[i][j]);
        }
      }
    }
  }

  #[test]
  fn dct_then_idct_recovers_input() {
    let mut block = Array2D::<u8>::zeroed(8, 8);
    block.fill_with(|i, j| ((i * 37 + j * 11) % 256) as u8);

    let dct = dct_block(&block).unwrap();
    let back = idct_block(&dct).unwrap();

    for i in 0..8 {
      for j in 0..8 {
        let diff = (back[i][j] - block[i][j] as f32).abs();
        assert!(diff < 1e-3, "mismatch at {},{}: {} vs {}", i, j, back[i][j], block[i][j]);
      }
    }
  }
}
