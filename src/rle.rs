// C6: Zig-zag scan + differential-DC / run-length AC coding.

use crate::array2d::Array2D;
use crate::consts::ZIGZAG_ORDER;
use crate::error::{CodecError, Result};

/// One block's entropy-ready payload: DC relative to the previous block in
/// this channel, and a dense-to-EOB run/value list for the AC coefficients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RleBlock {
  pub dc_diff: i32,
  /// (run, value) pairs; run in [0,15]. (15, 0) is ZRL, (0, 0) is EOB.
  pub ac: Vec<(u8, i32)>,
}

/// Apply the canonical zig-zag permutation to an 8x8 block.
pub fn zigzag(block: &Array2D<i32>) -> [i32; 64] {
  let mut out = [0i32; 64];
  for (k, &src_idx) in ZIGZAG_ORDER.iter().enumerate() {
    out[k] = block[src_idx / 8][src_idx % 8];
  }
  out
}

/// Invert the zig-zag permutation, recovering an 8x8 block from its 64-entry
/// scan vector.
pub fn inverse_zigzag(v: &[i32; 64]) -> Array2D<i32> {
  let mut data = vec![0i32; 64];
  for (k, &dst_idx) in ZIGZAG_ORDER.iter().enumerate() {
    data[dst_idx] = v[k];
  }
  Array2D::from_row_major(8, 8, data)
}

/// Encode one quantized block, given (and updating) the previous DC value
/// seen in this channel.
pub fn rle_encode_block(block: &Array2D<i32>, prev_dc: &mut i32) -> Result<RleBlock> {
  if block.rows() != 8 || block.cols() != 8 {
    return Err(CodecError::InvalidShape(format!("expected an 8x8 block, got {}x{}", block.rows(), block.cols())));
  }

  let v = zigzag(block);
  let dc_diff = v[0] - *prev_dc;
  *prev_dc = v[0];

  let mut ac = Vec::new();
  let mut zero_run = 0u32;
  for (idx, &value) in v.iter().enumerate().skip(1) {
    if value == 0 {
      zero_run += 1;
      continue;
    }
    while zero_run >= 16 {
      ac.push((15u8, 0i32));
      zero_run -= 16;
    }
    ac.push((zero_run as u8, value));
    zero_run = 0;
    let _ = idx;
  }
  if zero_run > 0 {
    ac.push((0u8, 0i32));
  }

  Ok(RleBlock { dc_diff, ac })
}

/// Decode one RLE block back into its quantized 8x8 form, given (and
/// updating) the previous DC value seen in this channel.
pub fn rle_decode_block(rle: &RleBlock, prev_dc: &mut i32) -> Result<Array2D<i32>> {
  let dc = *prev_dc + rle.dc_diff;
  *prev_dc = dc;

  let mut v = [0i32; 64];
  v[0] = dc;

  let mut pos = 1usize;
  for &(run, value) in &rle.ac {
    if (run, value) == (0, 0) {
      // EOB: remaining positions stay zero.
      break;
    }
    pos += run as usize;
    if pos >= 64 {
      return Err(CodecError::Overflow { count: pos });
    }
    v[pos] = value;
    pos += 1;
  }
  if pos > 64 {
    return Err(CodecError::Overflow { count: pos });
  }

  Ok(inverse_zigzag(&v))
}
