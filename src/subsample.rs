// C2: Chroma subsampling. Operates on YCbCr planes after C1, before C3.

use crate::array2d::Array2D;
use crate::enums::SubsamplingMode;
use crate::error::{CodecError, Result};

/// The three post-subsampling planes. `cb`/`cr` may be smaller than `y`
/// depending on `mode`.
pub struct SubsampledPlanes {
  pub y: Array2D<u8>,
  pub cb: Array2D<u8>,
  pub cr: Array2D<u8>,
}

/// Decimate Cb/Cr according to `mode`. Y is passed through unchanged.
pub fn subsample(y: Array2D<u8>, cb: Array2D<u8>, cr: Array2D<u8>, mode: SubsamplingMode) -> Result<SubsampledPlanes> {
  match mode {
    SubsamplingMode::Yuv444 => Ok(SubsampledPlanes { y, cb, cr }),
    SubsamplingMode::Yuv422 => Ok(SubsampledPlanes {
      y,
      cb: decimate_horizontal(&cb),
      cr: decimate_horizontal(&cr),
    }),
    SubsamplingMode::Yuv420 => {
      if cb.rows() % 2 != 0 || cb.cols() % 2 != 0 {
        return Err(CodecError::InvalidShape(format!(
          "4:2:0 subsampling requires even chroma dimensions, got {}x{}",
          cb.rows(), cb.cols()
        )));
      }
      Ok(SubsampledPlanes {
        y,
        cb: decimate_2x2(&cb),
        cr: decimate_2x2(&cr),
      })
    }
  }
}

/// Reconstruct full-resolution Cb/Cr by nearest-neighbor replication,
/// cropped to `(target_h, target_w)`.
pub fn upsample(planes: &SubsampledPlanes, mode: SubsamplingMode, target_h: usize, target_w: usize) -> Result<(Array2D<u8>, Array2D<u8>, Array2D<u8>)> {
  let (cb, cr) = match mode {
    SubsamplingMode::Yuv444 => (
      replicate(&planes.cb, 1, 1, target_h, target_w),
      replicate(&planes.cr, 1, 1, target_h, target_w),
    ),
    SubsamplingMode::Yuv422 => (
      replicate(&planes.cb, 1, 2, target_h, target_w),
      replicate(&planes.cr, 1, 2, target_h, target_w),
    ),
    SubsamplingMode::Yuv420 => (
      replicate(&planes.cb, 2, 2, target_h, target_w),
      replicate(&planes.cr, 2, 2, target_h, target_w),
    ),
  };
  if planes.y.rows() != target_h || planes.y.cols() != target_w {
    return Err(CodecError::InvalidShape(format!(
      "luma plane shape {}x{} does not match requested target {}x{}",
      planes.y.rows(), planes.y.cols(), target_h, target_w
    )));
  }
  Ok((planes.y.clone(), cb, cr))
}

fn decimate_horizontal(plane: &Array2D<u8>) -> Array2D<u8> {
  let (h, w) = (plane.rows(), plane.cols());
  let out_w = (w + 1) / 2;
  let mut out = Array2D::<u8>::zeroed(h, out_w);
  out.fill_with(|i, j| {
    let left = plane[i][2 * j] as u32;
    let right_col = 2 * j + 1;
    let right = if right_col < w { plane[i][right_col] as u32 } else { left };
    ((left + right + 1) / 2) as u8
  });
  out
}

fn decimate_2x2(plane: &Array2D<u8>) -> Array2D<u8> {
  let (h, w) = (plane.rows(), plane.cols());
  let (out_h, out_w) = (h / 2, w / 2);
  let mut out = Array2D::<u8>::zeroed(out_h, out_w);
  out.fill_with(|i, j| {
    let sum = plane[2 * i][2 * j] as u32
      + plane[2 * i][2 * j + 1] as u32
      + plane[2 * i + 1][2 * j] as u32
      + plane[2 * i + 1][2 * j + 1] as u32;
    ((sum + 2) / 4) as u8
  });
  out
}

// Nearest-neighbor replicate `plane` by `(row_factor, col_factor)` and crop
// the result to `(target_h, target_w)`.
fn replicate(plane: &Array2D<u8>, row_factor: usize, col_factor: usize, target_h: usize, target_w: usize) -> Array2D<u8> {
  let mut out = Array2D::<u8>::zeroed(target_h, target_w);
  out.fill_with(|i, j| {
    let src_i = (i / row_factor).min(plane.rows() - 1);
    let src_j = (j / col_factor).min(plane.cols() - 1);
    plane[src_i][src_j]
  });
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ramp(h: usize, w: usize) -> Array2D<u8> {
    let mut out = Array2D::<u8>::zeroed(h, w);
    out.fill_with(|i, j| ((i * w + j) % 256) as u8);
    out
  }

  #[test]
  fn yuv444_is_identity() {
    let (cb, cr) = (ramp(4, 4), ramp(4, 4));
    let planes = subsample(ramp(4, 4), cb.clone(), cr.clone(), SubsamplingMode::Yuv444).unwrap();
    assert_eq!(planes.cb.rows(), 4);
    assert_eq!(planes.cb.cols(), 4);
  }

  #[test]
  fn yuv420_halves_both_axes() {
    let planes = subsample(ramp(4, 4), ramp(4, 4), ramp(4, 4), SubsamplingMode::Yuv420).unwrap();
    assert_eq!((planes.cb.rows(), planes.cb.cols()), (2, 2));
  }

  #[test]
  fn yuv420_rejects_odd_dimensions() {
    let result = subsample(ramp(3, 4), ramp(3, 4), ramp(3, 4), SubsamplingMode::Yuv420);
    assert!(matches!(result, Err(CodecError::InvalidShape(_))));
  }

  #[test]
  fn upsample_crops_to_target() {
    let planes = subsample(ramp(4, 4), ramp(4, 4), ramp(4, 4), SubsamplingMode::Yuv420).unwrap();
    let (_, cb, cr) = upsample(&planes, SubsamplingMode::Yuv420, 4, 4).unwrap();
    assert_eq!((cb.rows(), cb.cols()), (4, 4));
    assert_eq!((cr.rows(), cr.cols()), (4, 4));
  }
}
