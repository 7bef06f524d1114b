// C8: Pipeline orchestrator. Drives C1->C7 on encode and C7->C1 on decode.

use crate::array2d::Array2D;
use crate::block::{self, BlockGrid};
use crate::color;
use crate::enums::SubsamplingMode;
use crate::error::{CodecError, Result};
use crate::frame::Image;
use crate::huffman::{self, HuffmanTable};
use crate::quant::{self, ChannelKind, QuantTables};
use crate::rle::{self, RleBlock};
use crate::subsample::{self, SubsampledPlanes};
use crate::txfm;

/// Validated configuration bundle accepted by [`encode`]. Constructed via
/// [`EncodeOptions::new`], which re-checks its invariants on every setter
/// so a caller can never observe a half-valid value.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
  quality: u8,
  subsampling: SubsamplingMode,
}

impl EncodeOptions {
  pub fn new(quality: u8, subsampling: SubsamplingMode) -> Result<Self> {
    if !(1..=100).contains(&quality) {
      return Err(CodecError::OutOfRange(format!("quality {} is outside [1,100]", quality)));
    }
    Ok(Self { quality, subsampling })
  }

  pub fn with_quality(self, quality: u8) -> Result<Self> {
    Self::new(quality, self.subsampling)
  }

  pub fn with_subsampling(self, subsampling: SubsamplingMode) -> Result<Self> {
    Self::new(self.quality, subsampling)
  }

  pub fn quality(&self) -> u8 {
    self.quality
  }

  pub fn subsampling(&self) -> SubsamplingMode {
    self.subsampling
  }
}

/// The compressed representation produced by [`encode`] and consumed by
/// [`decode`]. The byte layout a collaborator chooses to persist this as is
/// up to them; the logical fields below must all survive the round trip,
/// and `total_bits` in particular since the tail byte is zero-padded.
pub struct Artifact {
  pub bytes: Vec<u8>,
  pub dc_table: HuffmanTable,
  pub ac_table: HuffmanTable,
  /// Post-pad (rows, cols) of each channel, in Y, Cb, Cr order.
  pub padded_shape: Vec<(usize, usize)>,
  pub total_bits: usize,
  pub original_shape: (usize, usize, usize),
  pub quality: u8,
  pub subsampling_mode: SubsamplingMode,
}

/// Narration-only state; encode/decode never branch on it, it exists so the
/// orchestrator's log lines read like a lifecycle rather than a function call.
enum PipelineState {
  Ready,
  Encoding,
  Encoded,
  Decoding,
  Decoded,
}

fn blocks_to_rle(blocks: &BlockGrid<i32>) -> Vec<RleBlock> {
  let mut prev_dc = 0;
  blocks
    .blocks()
    .iter()
    .map(|b| rle::rle_encode_block(b, &mut prev_dc).expect("quantized blocks are always 8x8"))
    .collect()
}

fn rle_to_blocks(rle_blocks: &[RleBlock], h_blocks: usize, w_blocks: usize) -> Result<BlockGrid<i32>> {
  let mut prev_dc = 0;
  let mut blocks = Vec::with_capacity(rle_blocks.len());
  for rle_block in rle_blocks {
    blocks.push(rle::rle_decode_block(rle_block, &mut prev_dc)?);
  }
  Ok(BlockGrid::from_blocks(h_blocks, w_blocks, blocks))
}

fn channel_to_quantized_blocks(channel: &Array2D<u8>, tables: &QuantTables, kind: ChannelKind) -> Result<(BlockGrid<i32>, (usize, usize))> {
  let padded = block::pad_to_mul8(channel);
  let padded_shape = (padded.rows(), padded.cols());
  let pixel_blocks = block::split_into_blocks(&padded)?;
  let dct_blocks = txfm::dct_all(&pixel_blocks)?;
  let quantized = quant::quantize(&dct_blocks, tables, kind);
  Ok((quantized, padded_shape))
}

fn quantized_blocks_to_channel(blocks: &BlockGrid<i32>, tables: &QuantTables, kind: ChannelKind, original_h: usize, original_w: usize) -> Result<Array2D<u8>> {
  let dequantized = quant::dequantize(blocks, tables, kind);
  let reconstructed = txfm::idct_all(&dequantized)?;
  block::merge_blocks(&reconstructed, original_h, original_w)
}

/// The pre-pad (rows, cols) of the Cb/Cr planes once `mode` has decimated
/// a `height` x `width` luma plane. Mirrors the exact arithmetic
/// `subsample::subsample` uses, so decode can recover the same shape
/// without re-deriving it from the padded block grid.
fn chroma_pre_pad_shape(height: usize, width: usize, mode: SubsamplingMode) -> (usize, usize) {
  match mode {
    SubsamplingMode::Yuv444 => (height, width),
    SubsamplingMode::Yuv422 => (height, (width + 1) / 2),
    SubsamplingMode::Yuv420 => (height / 2, width / 2),
  }
}

/// Compress `image` into a bitstream-backed [`Artifact`] per `options`.
pub fn encode(image: &Image, options: &EncodeOptions) -> Result<Artifact> {
  let _state = PipelineState::Ready;
  let _state = PipelineState::Encoding;

  let (height, width, channels) = (image.height(), image.width(), image.channels());
  log::debug!(
    "encode: image {}x{}x{}, quality={}, subsampling={}",
    height, width, channels, options.quality(), options.subsampling().as_str()
  );

  let tables = quant::quant_tables(options.quality())?;

  // Build per-channel quantized block grids and collect their RLE streams
  // in Y, Cb, Cr order (or Y only for grayscale).
  let mut all_rle: Vec<RleBlock> = Vec::new();
  let mut padded_shape: Vec<(usize, usize)> = Vec::new();

  if image.is_grayscale() {
    let (blocks, shape) = channel_to_quantized_blocks(image.plane(0), &tables, ChannelKind::Luma)?;
    all_rle.extend(blocks_to_rle(&blocks));
    padded_shape.push(shape);
  } else {
    let (r, g, b) = (image.plane(0), image.plane(1), image.plane(2));
    let (y, cb, cr) = color::rgb_to_ycbcr(r, g, b)?;
    let subsampled = subsample::subsample(y, cb, cr, options.subsampling())?;

    let (y_blocks, y_shape) = channel_to_quantized_blocks(&subsampled.y, &tables, ChannelKind::Luma)?;
    let (cb_blocks, cb_shape) = channel_to_quantized_blocks(&subsampled.cb, &tables, ChannelKind::Chroma)?;
    let (cr_blocks, cr_shape) = channel_to_quantized_blocks(&subsampled.cr, &tables, ChannelKind::Chroma)?;

    all_rle.extend(blocks_to_rle(&y_blocks));
    all_rle.extend(blocks_to_rle(&cb_blocks));
    all_rle.extend(blocks_to_rle(&cr_blocks));
    padded_shape.push(y_shape);
    padded_shape.push(cb_shape);
    padded_shape.push(cr_shape);
  }

  let dc_table = huffman::build_dc_table(&all_rle)?;
  let ac_table = huffman::build_ac_table(&all_rle)?;
  let (bytes, total_bits) = huffman::encode_blocks(&dc_table, &ac_table, &all_rle)?;

  let _state = PipelineState::Encoded;
  log::debug!("encode: produced {} bytes ({} bits)", bytes.len(), total_bits);

  Ok(Artifact {
    bytes,
    dc_table,
    ac_table,
    padded_shape,
    total_bits,
    original_shape: (height, width, channels),
    quality: options.quality(),
    subsampling_mode: options.subsampling(),
  })
}

/// Reconstruct an approximate [`Image`] from a compressed [`Artifact`].
pub fn decode(artifact: &Artifact) -> Result<Image> {
  let _state = PipelineState::Encoded;
  let _state = PipelineState::Decoding;

  let (height, width, channels) = artifact.original_shape;
  log::debug!(
    "decode: artifact {} bits, quality={}, subsampling={}",
    artifact.total_bits, artifact.quality, artifact.subsampling_mode.as_str()
  );

  if channels != 1 && channels != 3 {
    return Err(CodecError::InvalidShape(format!("unsupported channel count {}", channels)));
  }

  let expected_channel_shapes = if channels == 1 { 1 } else { 3 };
  if artifact.padded_shape.len() != expected_channel_shapes {
    return Err(CodecError::InconsistentArtifact(format!(
      "expected {} padded-shape entries for {} channels, got {}",
      expected_channel_shapes, channels, artifact.padded_shape.len()
    )));
  }

  let tables = quant::quant_tables(artifact.quality)?;

  let block_counts: Vec<usize> = artifact.padded_shape.iter().map(|&(h, w)| (h / 8) * (w / 8)).collect();
  let total_blocks: usize = block_counts.iter().sum();

  let rle_blocks = huffman::decode_blocks(&artifact.dc_table, &artifact.ac_table, &artifact.bytes, artifact.total_bits, total_blocks)?;
  if rle_blocks.len() != total_blocks {
    return Err(CodecError::InconsistentArtifact(format!(
      "decoded {} blocks but padded_shape implies {}", rle_blocks.len(), total_blocks
    )));
  }

  let image = if channels == 1 {
    let (padded_h, padded_w) = artifact.padded_shape[0];
    let grid = rle_to_blocks(&rle_blocks, padded_h / 8, padded_w / 8)?;
    let y = quantized_blocks_to_channel(&grid, &tables, ChannelKind::Luma, height, width)?;
    Image::from_planes(height, width, vec![y])?
  } else {
    let mut offset = 0usize;
    let mut per_channel = Vec::with_capacity(3);
    for (idx, &count) in block_counts.iter().enumerate() {
      let (padded_h, padded_w) = artifact.padded_shape[idx];
      per_channel.push(rle_to_blocks(&rle_blocks[offset..offset + count], padded_h / 8, padded_w / 8)?);
      offset += count;
    }

    let (chroma_h, chroma_w) = chroma_pre_pad_shape(height, width, artifact.subsampling_mode);

    let y_plane = quantized_blocks_to_channel(&per_channel[0], &tables, ChannelKind::Luma, height, width)?;
    let cb_plane = quantized_blocks_to_channel(&per_channel[1], &tables, ChannelKind::Chroma, chroma_h, chroma_w)?;
    let cr_plane = quantized_blocks_to_channel(&per_channel[2], &tables, ChannelKind::Chroma, chroma_h, chroma_w)?;

    let subsampled = SubsampledPlanes { y: y_plane, cb: cb_plane, cr: cr_plane };
    let (y, cb, cr) = subsample::upsample(&subsampled, artifact.subsampling_mode, height, width)?;
    let (r, g, b) = color::ycbcr_to_rgb(&y, &cb, &cr)?;
    Image::from_planes(height, width, vec![r, g, b])?
  };

  let _state = PipelineState::Decoded;
  log::debug!("decode: reconstructed {}x{}x{}", height, width, channels);
  Ok(image)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn options_reject_out_of_range_quality() {
    assert!(matches!(EncodeOptions::new(0, SubsamplingMode::Yuv444), Err(CodecError::OutOfRange(_))));
    assert!(matches!(EncodeOptions::new(101, SubsamplingMode::Yuv444), Err(CodecError::OutOfRange(_))));
  }

  #[test]
  fn grayscale_flat_block_round_trips() {
    let data = vec![128u8; 64];
    let image = Image::from_grayscale(8, 8, &data).unwrap();
    let options = EncodeOptions::new(50, SubsamplingMode::Yuv444).unwrap();
    let artifact = encode(&image, &options).unwrap();
    let decoded = decode(&artifact).unwrap();
    assert_eq!(decoded.to_hwc_bytes(), data);
  }

  #[test]
  fn non_multiple_of_8_dimensions_pad_to_16x24() {
    let data = vec![0u8; 13 * 17];
    let image = Image::from_grayscale(13, 17, &data).unwrap();
    let options = EncodeOptions::new(80, SubsamplingMode::Yuv444).unwrap();
    let artifact = encode(&image, &options).unwrap();
    assert_eq!(artifact.padded_shape[0], (16, 24));
    let decoded = decode(&artifact).unwrap();
    assert_eq!((decoded.height(), decoded.width()), (13, 17));
  }

  #[test]
  fn color_round_trip_preserves_gross_color() {
    let mut data = vec![0u8; 16 * 16 * 3];
    for px in data.chunks_exact_mut(3) {
      px[0] = 255;
      px[1] = 0;
      px[2] = 0;
    }
    let image = Image::from_hwc(16, 16, &data).unwrap();
    let options = EncodeOptions::new(50, SubsamplingMode::Yuv422).unwrap();
    let artifact = encode(&image, &options).unwrap();
    let decoded = decode(&artifact).unwrap();
    let out = decoded.to_hwc_bytes();

    let count = (out.len() / 3) as i64;
    let mut sum = (0i64, 0i64, 0i64);
    for px in out.chunks_exact(3) {
      sum.0 += px[0] as i64;
      sum.1 += px[1] as i64;
      sum.2 += px[2] as i64;
    }
    assert!(sum.0 / count >= 230);
    assert!(sum.1 / count <= 30);
    assert!(sum.2 / count <= 30);
  }
}
