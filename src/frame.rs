// Caller-facing pixel buffer: a grayscale or 3-channel image, read-only to
// the rest of the pipeline. Internally this is just a small bag of planes,
// generalizing the fixed Y/Cb/Cr triple the codec eventually produces.

use crate::array2d::Array2D;
use crate::error::{CodecError, Result};

/// A rectangular H x W pixel grid with 1 (grayscale) or 3 (color) channels.
/// Samples are integers in [0, 255].
pub struct Image {
  height: usize,
  width: usize,
  planes: Vec<Array2D<u8>>,
}

impl Image {
  /// Build a single-channel (grayscale) image from row-major H*W samples.
  pub fn from_grayscale(height: usize, width: usize, data: &[u8]) -> Result<Self> {
    if data.len() != height.saturating_mul(width) {
      return Err(CodecError::InvalidShape(format!(
        "grayscale image expected {} samples ({}x{}), got {}",
        height * width, height, width, data.len()
      )));
    }
    let plane = Array2D::from_row_major(height, width, data.to_vec());
    Ok(Self { height, width, planes: vec![plane] })
  }

  /// Build a 3-channel image from channel-last (H, W, 3) samples.
  pub fn from_hwc(height: usize, width: usize, data: &[u8]) -> Result<Self> {
    if data.len() != height.saturating_mul(width).saturating_mul(3) {
      return Err(CodecError::InvalidShape(format!(
        "HWC image expected {} samples ({}x{}x3), got {}",
        height * width * 3, height, width, data.len()
      )));
    }
    let mut planes = vec![vec![0u8; height * width]; 3];
    for (pixel_idx, chunk) in data.chunks_exact(3).enumerate() {
      for c in 0..3 {
        planes[c][pixel_idx] = chunk[c];
      }
    }
    let planes = planes
      .into_iter()
      .map(|p| Array2D::from_row_major(height, width, p))
      .collect();
    Ok(Self { height, width, planes })
  }

  /// Build a 3-channel image from channel-first (3, H, W) samples.
  pub fn from_chw(height: usize, width: usize, data: &[u8]) -> Result<Self> {
    let plane_len = height.saturating_mul(width);
    if data.len() != plane_len.saturating_mul(3) {
      return Err(CodecError::InvalidShape(format!(
        "CHW image expected {} samples (3x{}x{}), got {}",
        plane_len * 3, height, width, data.len()
      )));
    }
    let planes = (0..3)
      .map(|c| Array2D::from_row_major(height, width, data[c * plane_len..(c + 1) * plane_len].to_vec()))
      .collect();
    Ok(Self { height, width, planes })
  }

  /// Build directly from already-separated planes (used internally by the
  /// orchestrator when assembling a decoded image).
  pub fn from_planes(height: usize, width: usize, planes: Vec<Array2D<u8>>) -> Result<Self> {
    if planes.is_empty() || planes.len() > 3 || planes.len() == 2 {
      return Err(CodecError::InvalidShape(format!(
        "image must have 1 or 3 planes, got {}", planes.len()
      )));
    }
    for plane in &planes {
      if plane.rows() != height || plane.cols() != width {
        return Err(CodecError::InvalidShape(format!(
          "plane shape {}x{} does not match image shape {}x{}",
          plane.rows(), plane.cols(), height, width
        )));
      }
    }
    Ok(Self { height, width, planes })
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn channels(&self) -> usize {
    self.planes.len()
  }

  pub fn is_grayscale(&self) -> bool {
    self.planes.len() == 1
  }

  pub fn plane(&self, idx: usize) -> &Array2D<u8> {
    &self.planes[idx]
  }

  pub fn planes(&self) -> &[Array2D<u8>] {
    &self.planes
  }

  pub fn into_planes(self) -> Vec<Array2D<u8>> {
    self.planes
  }

  /// Flatten back to channel-last bytes, the layout image I/O collaborators
  /// are expected to consume.
  pub fn to_hwc_bytes(&self) -> Vec<u8> {
    if self.planes.len() == 1 {
      return self.planes[0].as_slice().to_vec();
    }
    let mut out = vec![0u8; self.height * self.width * self.planes.len()];
    for (c, plane) in self.planes.iter().enumerate() {
      for (pixel_idx, &sample) in plane.as_slice().iter().enumerate() {
        out[pixel_idx * self.planes.len() + c] = sample;
      }
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn grayscale_roundtrips_through_hwc_bytes() {
    let data: Vec<u8> = (0..16u8).collect();
    let img = Image::from_grayscale(4, 4, &data).unwrap();
    assert_eq!(img.channels(), 1);
    assert_eq!(img.to_hwc_bytes(), data);
  }

  #[test]
  fn hwc_constructor_rejects_wrong_length() {
    let data = vec![0u8; 10];
    assert!(Image::from_hwc(2, 2, &data).is_err());
  }

  #[test]
  fn hwc_separates_planes_correctly() {
    // 1x2 image, pixel 0 = (1,2,3), pixel 1 = (4,5,6)
    let data = vec![1, 2, 3, 4, 5, 6];
    let img = Image::from_hwc(1, 2, &data).unwrap();
    assert_eq!(img.plane(0).as_slice(), &[1, 4]);
    assert_eq!(img.plane(1).as_slice(), &[2, 5]);
    assert_eq!(img.plane(2).as_slice(), &[3, 6]);
    assert_eq!(img.to_hwc_bytes(), data);
  }
}
