// C3: Padding & blocking. Pads a channel to a multiple of 8 in each
// dimension, and partitions it into an 8x8 block grid (and back).

use bytemuck::Zeroable;

use crate::array2d::Array2D;
use crate::error::{CodecError, Result};

const BLOCK_SIZE: usize = 8;

/// An h_b x w_b grid of 8x8 blocks, row-major by block position.
#[derive(Clone)]
pub struct BlockGrid<T> {
  h_blocks: usize,
  w_blocks: usize,
  blocks: Vec<Array2D<T>>,
}

impl<T> BlockGrid<T> {
  pub fn h_blocks(&self) -> usize {
    self.h_blocks
  }

  pub fn w_blocks(&self) -> usize {
    self.w_blocks
  }

  pub fn get(&self, block_row: usize, block_col: usize) -> &Array2D<T> {
    &self.blocks[block_row * self.w_blocks + block_col]
  }

  pub fn get_mut(&mut self, block_row: usize, block_col: usize) -> &mut Array2D<T> {
    &mut self.blocks[block_row * self.w_blocks + block_col]
  }

  pub fn blocks(&self) -> &[Array2D<T>] {
    &self.blocks
  }

  pub fn into_blocks(self) -> Vec<Array2D<T>> {
    self.blocks
  }
}

impl<T: Zeroable> BlockGrid<T> {
  pub fn from_blocks(h_blocks: usize, w_blocks: usize, blocks: Vec<Array2D<T>>) -> Self {
    assert!(h_blocks * w_blocks == blocks.len());
    Self { h_blocks, w_blocks, blocks }
  }

  /// Apply `f` to each block in raster order, producing a new grid of the
  /// same shape but possibly a different element type.
  pub fn map_blocks<U: Zeroable, F: FnMut(&Array2D<T>) -> Result<Array2D<U>>>(&self, mut f: F) -> Result<BlockGrid<U>> {
    let mut out = Vec::with_capacity(self.blocks.len());
    for block in &self.blocks {
      out.push(f(block)?);
    }
    Ok(BlockGrid { h_blocks: self.h_blocks, w_blocks: self.w_blocks, blocks: out })
  }
}

/// Extend `channel` by replicating its last row/column until both
/// dimensions are a multiple of 8.
pub fn pad_to_mul8(channel: &Array2D<u8>) -> Array2D<u8> {
  let (h, w) = (channel.rows(), channel.cols());
  let padded_h = h.next_multiple_of(BLOCK_SIZE).max(BLOCK_SIZE);
  let padded_w = w.next_multiple_of(BLOCK_SIZE).max(BLOCK_SIZE);

  let mut out = Array2D::<u8>::zeroed(padded_h, padded_w);
  out.fill_with(|i, j| {
    let src_i = i.min(h - 1);
    let src_j = j.min(w - 1);
    channel[src_i][src_j]
  });
  out
}

/// Partition a channel whose dimensions are already multiples of 8 into an
/// 8x8 block grid.
pub fn split_into_blocks(channel: &Array2D<u8>) -> Result<BlockGrid<u8>> {
  let (h, w) = (channel.rows(), channel.cols());
  if h % BLOCK_SIZE != 0 || w % BLOCK_SIZE != 0 {
    return Err(CodecError::InvalidShape(format!(
      "channel dimensions {}x{} are not multiples of {}", h, w, BLOCK_SIZE
    )));
  }
  let (h_blocks, w_blocks) = (h / BLOCK_SIZE, w / BLOCK_SIZE);
  let mut blocks = Vec::with_capacity(h_blocks * w_blocks);
  for bi in 0..h_blocks {
    for bj in 0..w_blocks {
      let mut block = Array2D::<u8>::zeroed(BLOCK_SIZE, BLOCK_SIZE);
      block.fill_with(|i, j| channel[bi * BLOCK_SIZE + i][bj * BLOCK_SIZE + j]);
      blocks.push(block);
    }
  }
  Ok(BlockGrid { h_blocks, w_blocks, blocks })
}

/// Concatenate an 8x8 block grid back into a single channel and crop it to
/// `(original_h, original_w)`.
pub fn merge_blocks(blocks: &BlockGrid<f32>, original_h: usize, original_w: usize) -> Result<Array2D<u8>> {
  let padded_h = blocks.h_blocks() * BLOCK_SIZE;
  let padded_w = blocks.w_blocks() * BLOCK_SIZE;
  if original_h > padded_h || original_w > padded_w {
    return Err(CodecError::InvalidShape(format!(
      "cannot crop {}x{} padded channel down to {}x{}", padded_h, padded_w, original_h, original_w
    )));
  }

  let mut out = Array2D::<u8>::zeroed(original_h, original_w);
  out.fill_with(|i, j| {
    let (bi, bj) = (i / BLOCK_SIZE, j / BLOCK_SIZE);
    let (ii, jj) = (i % BLOCK_SIZE, j % BLOCK_SIZE);
    let value = blocks.get(bi, bj)[ii][jj];
    crate::util::clamp(value.round() as i32, 0, 255) as u8
  });
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pad_rounds_up_to_multiple_of_8() {
    let channel = Array2D::<u8>::zeroed(13, 17);
    let padded = pad_to_mul8(&channel);
    assert_eq!((padded.rows(), padded.cols()), (16, 24));
  }

  #[test]
  fn pad_one_pixel_image() {
    let channel = Array2D::from_row_major(1, 1, vec![42u8]);
    let padded = pad_to_mul8(&channel);
    assert_eq!((padded.rows(), padded.cols()), (8, 8));
    assert_eq!(padded[7][7], 42);
  }

  #[test]
  fn split_rejects_non_multiple_of_8() {
    let channel = Array2D::<u8>::zeroed(9, 8);
    assert!(matches!(split_into_blocks(&channel), Err(CodecError::InvalidShape(_))));
  }

  #[test]
  fn pad_split_merge_recovers_original() {
    let mut channel = Array2D::<u8>::zeroed(13, 17);
    channel.fill_with(|i, j| ((i * 17 + j) % 256) as u8);

    let padded = pad_to_mul8(&channel);
    let blocks = split_into_blocks(&padded).unwrap();
    let as_f32 = blocks.map_blocks(|b| {
      let mut out = Array2D::<f32>::zeroed(8, 8);
      out.fill_with(|i, j| b[i][j] as f32);
      Ok(out)
    }).unwrap();
    let merged = merge_blocks(&as_f32, 13, 17).unwrap();

    for i in 0..13 {
      for j in 0..17 {
        assert_eq!(merged[i][j], channel[i][j]);
      }
    }
  }
}
