//! A baseline JPEG-style lossy image codec: color transform, chroma
//! subsampling, block DCT, quantization, and Huffman entropy coding, plus
//! their exact inverses.
//!
//! The public surface is deliberately small: build an [`Image`], pick an
//! [`EncodeOptions`], call [`encode`], and hand the resulting [`Artifact`]
//! to [`decode`] to get an approximation of the original image back.

pub mod array2d;
pub mod block;
pub mod color;
pub mod consts;
pub mod enums;
pub mod error;
pub mod frame;
pub mod huffman;
pub mod pipeline;
pub mod quant;
pub mod rle;
pub mod subsample;
pub mod txfm;
pub mod util;

pub use enums::SubsamplingMode;
pub use error::{CodecError, Result};
pub use frame::Image;
pub use pipeline::{decode, encode, Artifact, EncodeOptions};
