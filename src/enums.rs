// Small standalone enums shared across pipeline stages.

use crate::error::CodecError;

/// Chroma subsampling mode selected on encode. Grayscale images ignore this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsamplingMode {
  /// No decimation; Cb/Cr share the luma plane's resolution.
  Yuv444,
  /// Cb/Cr decimated by 2 horizontally only.
  Yuv422,
  /// Cb/Cr decimated by 2 in both axes.
  Yuv420,
}

impl SubsamplingMode {
  pub fn parse(mode: &str) -> Result<Self, CodecError> {
    match mode {
      "4:4:4" => Ok(SubsamplingMode::Yuv444),
      "4:2:2" => Ok(SubsamplingMode::Yuv422),
      "4:2:0" => Ok(SubsamplingMode::Yuv420),
      other => Err(CodecError::InvalidMode(other.to_string())),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      SubsamplingMode::Yuv444 => "4:4:4",
      SubsamplingMode::Yuv422 => "4:2:2",
      SubsamplingMode::Yuv420 => "4:2:0",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_round_trips_through_as_str() {
    for mode in [SubsamplingMode::Yuv444, SubsamplingMode::Yuv422, SubsamplingMode::Yuv420] {
      assert_eq!(SubsamplingMode::parse(mode.as_str()).unwrap(), mode);
    }
  }

  #[test]
  fn unknown_mode_is_rejected() {
    assert!(matches!(SubsamplingMode::parse("4:1:1"), Err(CodecError::InvalidMode(_))));
  }
}
