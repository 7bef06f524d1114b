//! Error taxonomy for the codec core.
//!
//! Every fallible operation in the pipeline (C1-C8) returns this single
//! `CodecError` enum. There is no retry logic anywhere in this crate --
//! failures are deterministic given the same input.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors produced by the encode/decode pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
  /// Tensor rank or dimensions do not match the operation's contract.
  #[error("invalid shape: {0}")]
  InvalidShape(String),

  /// A sample, quality factor, or float value fell outside its valid range.
  #[error("value out of range: {0}")]
  OutOfRange(String),

  /// An unrecognized subsampling mode string was supplied.
  #[error("invalid subsampling mode: {0:?}")]
  InvalidMode(String),

  /// The Huffman decoder could not match a bit prefix within the table's
  /// maximum code length.
  #[error("unknown Huffman code at bit offset {bit_offset}")]
  UnknownCode {
    /// Offset (in bits) into the stream where decoding stalled.
    bit_offset: usize,
  },

  /// The bitstream ended before a DC or AC symbol could be fully parsed.
  #[error("bitstream truncated at bit offset {bit_offset}")]
  Truncated {
    /// Offset (in bits) into the stream where the stream ran out.
    bit_offset: usize,
  },

  /// The AC decoder produced more than 63 coefficients for a single block.
  #[error("AC coefficient overflow: block produced {count} positions (max 63)")]
  Overflow {
    /// Number of AC positions the decoder attempted to fill.
    count: usize,
  },

  /// The artifact's recorded shape, bit count, and tables are mutually
  /// inconsistent (e.g. the implied block count doesn't match the stream).
  #[error("inconsistent compressed artifact: {0}")]
  InconsistentArtifact(String),
}
