// C1: RGB <-> YCbCr color transform (BT.601, full range).

use crate::array2d::Array2D;
use crate::error::{CodecError, Result};
use crate::util::clamp;

fn check_same_shape(a: &Array2D<u8>, b: &Array2D<u8>, c: &Array2D<u8>) -> Result<()> {
  if a.rows() != b.rows() || a.rows() != c.rows() || a.cols() != b.cols() || a.cols() != c.cols() {
    return Err(CodecError::InvalidShape(format!(
      "color planes have mismatched shapes: {}x{}, {}x{}, {}x{}",
      a.rows(), a.cols(), b.rows(), b.cols(), c.rows(), c.cols()
    )));
  }
  Ok(())
}

/// Forward BT.601 conversion: (R, G, B) -> (Y, Cb, Cr), each plane H x W.
pub fn rgb_to_ycbcr(r: &Array2D<u8>, g: &Array2D<u8>, b: &Array2D<u8>) -> Result<(Array2D<u8>, Array2D<u8>, Array2D<u8>)> {
  check_same_shape(r, g, b)?;
  let (h, w) = (r.rows(), r.cols());

  let mut y = Array2D::<u8>::zeroed(h, w);
  let mut cb = Array2D::<u8>::zeroed(h, w);
  let mut cr = Array2D::<u8>::zeroed(h, w);

  y.fill_with(|i, j| {
    let (rf, gf, bf) = (r[i][j] as f32, g[i][j] as f32, b[i][j] as f32);
    clamp((0.299 * rf + 0.587 * gf + 0.114 * bf).round() as i32, 0, 255) as u8
  });
  cb.fill_with(|i, j| {
    let (rf, gf, bf) = (r[i][j] as f32, g[i][j] as f32, b[i][j] as f32);
    clamp((-0.1687 * rf - 0.3313 * gf + 0.5 * bf + 128.0).round() as i32, 0, 255) as u8
  });
  cr.fill_with(|i, j| {
    let (rf, gf, bf) = (r[i][j] as f32, g[i][j] as f32, b[i][j] as f32);
    clamp((0.5 * rf - 0.4187 * gf - 0.0813 * bf + 128.0).round() as i32, 0, 255) as u8
  });

  Ok((y, cb, cr))
}

/// Inverse BT.601 conversion: (Y, Cb, Cr) -> (R, G, B), each plane H x W.
/// Output is clamped and rounded to 8-bit unsigned samples.
pub fn ycbcr_to_rgb(y: &Array2D<u8>, cb: &Array2D<u8>, cr: &Array2D<u8>) -> Result<(Array2D<u8>, Array2D<u8>, Array2D<u8>)> {
  check_same_shape(y, cb, cr)?;
  let (h, w) = (y.rows(), y.cols());

  let mut r = Array2D::<u8>::zeroed(h, w);
  let mut g = Array2D::<u8>::zeroed(h, w);
  let mut b = Array2D::<u8>::zeroed(h, w);

  r.fill_with(|i, j| {
    let (yf, crf) = (y[i][j] as f32, cr[i][j] as f32 - 128.0);
    clamp((yf + 1.402 * crf).round() as i32, 0, 255) as u8
  });
  g.fill_with(|i, j| {
    let (yf, cbf, crf) = (y[i][j] as f32, cb[i][j] as f32 - 128.0, cr[i][j] as f32 - 128.0);
    clamp((yf - 0.344136 * cbf - 0.714136 * crf).round() as i32, 0, 255) as u8
  });
  b.fill_with(|i, j| {
    let (yf, cbf) = (y[i][j] as f32, cb[i][j] as f32 - 128.0);
    clamp((yf + 1.772 * cbf).round() as i32, 0, 255) as u8
  });

  Ok((r, g, b))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mismatched_shapes_are_rejected() {
    let r = Array2D::<u8>::zeroed(2, 2);
    let g = Array2D::<u8>::zeroed(2, 3);
    let b = Array2D::<u8>::zeroed(2, 2);
    assert!(matches!(rgb_to_ycbcr(&r, &g, &b), Err(CodecError::InvalidShape(_))));
  }

  #[test]
  fn gray_rgb_maps_to_neutral_chroma() {
    let r = Array2D::from_row_major(1, 1, vec![128u8]);
    let g = Array2D::from_row_major(1, 1, vec![128u8]);
    let b = Array2D::from_row_major(1, 1, vec![128u8]);
    let (y, cb, cr) = rgb_to_ycbcr(&r, &g, &b).unwrap();
    assert_eq!(y[0][0], 128);
    assert_eq!(cb[0][0], 128);
    assert_eq!(cr[0][0], 128);
  }

  #[test]
  fn pure_red_round_trips_approximately() {
    let r = Array2D::from_row_major(1, 1, vec![255u8]);
    let g = Array2D::from_row_major(1, 1, vec![0u8]);
    let b = Array2D::from_row_major(1, 1, vec![0u8]);
    let (y, cb, cr) = rgb_to_ycbcr(&r, &g, &b).unwrap();
    let (r2, g2, b2) = ycbcr_to_rgb(&y, &cb, &cr).unwrap();
    assert!((r2[0][0] as i32 - 255).abs() <= 2);
    assert!((g2[0][0] as i32 - 0).abs() <= 2);
    assert!((b2[0][0] as i32 - 0).abs() <= 2);
  }
}
