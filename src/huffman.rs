// C7: Huffman coding. Builds one DC and one AC table per image from the
// actual symbol frequencies (not the fixed JPEG annex tables), then packs
// the RLE symbol stream into an MSB-first bitstream.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::error::{CodecError, Result};
use crate::rle::RleBlock;
use crate::util::size_category;

const EOB: u8 = 0x00;
const ZRL: u8 = 0xF0;

#[derive(Debug, Clone, Copy)]
struct Code {
  bits: u32,
  len: u8,
}

struct TreeNode {
  freq: u64,
  symbol: Option<u8>,
  left: Option<usize>,
  right: Option<usize>,
}

/// A per-image canonical-order Huffman table: encode map plus a decode tree.
pub struct HuffmanTable {
  codes: HashMap<u8, Code>,
  arena: Vec<TreeNode>,
  root: usize,
}

impl HuffmanTable {
  /// Build a table from symbol frequencies. Ties are broken by first
  /// insertion order so the resulting tree is deterministic.
  fn build(freqs: &HashMap<u8, u64>) -> Result<Self> {
    if freqs.is_empty() {
      return Err(CodecError::InconsistentArtifact("cannot build a Huffman table with no symbols".to_string()));
    }

    let mut arena = Vec::new();
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;

    let mut symbols: Vec<(&u8, &u64)> = freqs.iter().collect();
    symbols.sort_by_key(|(symbol, _)| **symbol);
    for (&symbol, &freq) in symbols {
      let idx = arena.len();
      arena.push(TreeNode { freq, symbol: Some(symbol), left: None, right: None });
      heap.push(Reverse((freq, seq, idx)));
      seq += 1;
    }

    if arena.len() == 1 {
      let root = 0;
      let mut codes = HashMap::new();
      codes.insert(arena[0].symbol.unwrap(), Code { bits: 0, len: 1 });
      log::trace!("built Huffman table: 1 symbol, max code length 1");
      return Ok(Self { codes, arena, root });
    }

    while heap.len() > 1 {
      let Reverse((freq_a, _, a)) = heap.pop().unwrap();
      let Reverse((freq_b, _, b)) = heap.pop().unwrap();
      let idx = arena.len();
      arena.push(TreeNode { freq: freq_a + freq_b, symbol: None, left: Some(a), right: Some(b) });
      heap.push(Reverse((freq_a + freq_b, seq, idx)));
      seq += 1;
    }

    let Reverse((_, _, root)) = heap.pop().unwrap();
    let mut codes = HashMap::new();
    assign_codes(&arena, root, 0, 0, &mut codes);

    let max_len = codes.values().map(|c| c.len).max().unwrap_or(0);
    log::trace!("built Huffman table: {} symbols, max code length {}", codes.len(), max_len);
    if max_len > 32 {
      log::warn!("Huffman code length {} exceeds the 32-bit packing cap", max_len);
    }
    Ok(Self { codes, arena, root })
  }

  fn code_for(&self, symbol: u8) -> Result<Code> {
    self.codes.get(&symbol).copied().ok_or_else(|| CodecError::InconsistentArtifact(format!("no Huffman code for symbol {:#04x}", symbol)))
  }

  /// Walk the decode tree from the root, returning the matched symbol.
  /// A degenerate single-leaf table has its symbol sitting at the root;
  /// `build` still assigns it the 1-bit code "0" (mirroring a real leaf
  /// one level down), so that bit must be consumed here too or every
  /// symbol after it desyncs by one bit.
  fn decode_symbol(&self, reader: &mut BitReader) -> Result<u8> {
    if let Some(symbol) = self.arena[self.root].symbol {
      reader.read_bit()?;
      return Ok(symbol);
    }
    let mut node = self.root;
    loop {
      let bit = reader.read_bit()?;
      node = if bit == 0 {
        self.arena[node].left.expect("internal Huffman node missing left child")
      } else {
        self.arena[node].right.expect("internal Huffman node missing right child")
      };
      if let Some(symbol) = self.arena[node].symbol {
        return Ok(symbol);
      }
    }
  }
}

fn assign_codes(arena: &[TreeNode], node: usize, bits: u32, len: u8, out: &mut HashMap<u8, Code>) {
  if let Some(symbol) = arena[node].symbol {
    out.insert(symbol, Code { bits, len: len.max(1) });
    return;
  }
  if let Some(left) = arena[node].left {
    assign_codes(arena, left, bits << 1, len + 1, out);
  }
  if let Some(right) = arena[node].right {
    assign_codes(arena, right, (bits << 1) | 1, len + 1, out);
  }
}

fn dc_symbol(diff: i32) -> u8 {
  size_category(diff)
}

fn ac_symbol(run: u8, value: i32) -> u8 {
  if (run, value) == (0, 0) {
    EOB
  } else if (run, value) == (15, 0) {
    ZRL
  } else {
    (run << 4) | size_category(value)
  }
}

fn encode_amplitude(value: i32, size: u8) -> u32 {
  if size == 0 {
    return 0;
  }
  if value >= 0 {
    value as u32
  } else {
    (value + ((1i32 << size) - 1)) as u32
  }
}

fn decode_amplitude(bits: u32, size: u8) -> i32 {
  if size == 0 {
    return 0;
  }
  let half = 1u32 << (size - 1);
  if bits < half {
    bits as i32 - ((1i32 << size) - 1)
  } else {
    bits as i32
  }
}

/// Build the DC table from the differential-DC category of every block.
pub fn build_dc_table(blocks: &[RleBlock]) -> Result<HuffmanTable> {
  let mut freqs = HashMap::new();
  for block in blocks {
    *freqs.entry(dc_symbol(block.dc_diff)).or_insert(0u64) += 1;
  }
  HuffmanTable::build(&freqs)
}

/// Build the AC table from every (run, size) symbol across all blocks,
/// including EOB and ZRL markers. EOB and ZRL are seeded with a frequency
/// floor of 1 so both are always codable even if a given image never emits
/// one of them.
pub fn build_ac_table(blocks: &[RleBlock]) -> Result<HuffmanTable> {
  let mut freqs = HashMap::new();
  freqs.insert(EOB, 1u64);
  freqs.insert(ZRL, 1u64);
  for block in blocks {
    for &(run, value) in &block.ac {
      *freqs.entry(ac_symbol(run, value)).or_insert(0u64) += 1;
    }
  }
  HuffmanTable::build(&freqs)
}

struct BitWriter {
  bytes: Vec<u8>,
  cur: u8,
  filled: u8,
  total_bits: usize,
}

impl BitWriter {
  fn new() -> Self {
    Self { bytes: Vec::new(), cur: 0, filled: 0, total_bits: 0 }
  }

  fn write_bits(&mut self, bits: u32, len: u8) {
    for i in (0..len).rev() {
      let bit = ((bits >> i) & 1) as u8;
      self.cur = (self.cur << 1) | bit;
      self.filled += 1;
      self.total_bits += 1;
      if self.filled == 8 {
        self.bytes.push(self.cur);
        self.cur = 0;
        self.filled = 0;
      }
    }
  }

  fn finish(mut self) -> (Vec<u8>, usize) {
    if self.filled > 0 {
      self.cur <<= 8 - self.filled;
      self.bytes.push(self.cur);
    }
    (self.bytes, self.total_bits)
  }
}

struct BitReader<'a> {
  bytes: &'a [u8],
  total_bits: usize,
  offset: usize,
}

impl<'a> BitReader<'a> {
  fn new(bytes: &'a [u8], total_bits: usize) -> Self {
    Self { bytes, total_bits, offset: 0 }
  }

  fn read_bit(&mut self) -> Result<u8> {
    if self.offset >= self.total_bits {
      return Err(CodecError::Truncated { bit_offset: self.offset });
    }
    let byte = self.bytes[self.offset / 8];
    let bit = (byte >> (7 - self.offset % 8)) & 1;
    self.offset += 1;
    Ok(bit)
  }

  fn read_bits(&mut self, len: u8) -> Result<u32> {
    let mut value = 0u32;
    for _ in 0..len {
      value = (value << 1) | self.read_bit()? as u32;
    }
    Ok(value)
  }
}

/// Encode an ordered sequence of RLE blocks into a packed bitstream.
/// Returns the byte buffer and the exact number of meaningful bits (the
/// last byte may be zero-padded).
pub fn encode_blocks(dc_table: &HuffmanTable, ac_table: &HuffmanTable, blocks: &[RleBlock]) -> Result<(Vec<u8>, usize)> {
  let mut writer = BitWriter::new();

  for block in blocks {
    let dc_cat = dc_symbol(block.dc_diff);
    let dc_code = dc_table.code_for(dc_cat)?;
    writer.write_bits(dc_code.bits, dc_code.len);
    if dc_cat > 0 {
      writer.write_bits(encode_amplitude(block.dc_diff, dc_cat), dc_cat);
    }

    for &(run, value) in &block.ac {
      let symbol = ac_symbol(run, value);
      let code = ac_table.code_for(symbol)?;
      writer.write_bits(code.bits, code.len);
      if symbol != EOB && symbol != ZRL {
        let size = symbol & 0x0F;
        writer.write_bits(encode_amplitude(value, size), size);
      }
    }
  }

  Ok(writer.finish())
}

/// Decode exactly `num_blocks` RLE blocks from a packed bitstream.
pub fn decode_blocks(dc_table: &HuffmanTable, ac_table: &HuffmanTable, bytes: &[u8], total_bits: usize, num_blocks: usize) -> Result<Vec<RleBlock>> {
  let mut reader = BitReader::new(bytes, total_bits);
  let mut out = Vec::with_capacity(num_blocks);

  for _ in 0..num_blocks {
    let dc_cat = dc_table.decode_symbol(&mut reader)?;
    let dc_diff = if dc_cat == 0 { 0 } else { decode_amplitude(reader.read_bits(dc_cat)?, dc_cat) };

    let mut ac = Vec::new();
    let mut pos = 1usize;
    loop {
      let symbol = ac_table.decode_symbol(&mut reader)?;
      if symbol == EOB {
        ac.push((0, 0));
        break;
      }
      if symbol == ZRL {
        ac.push((15, 0));
        pos += 16;
      } else {
        let run = symbol >> 4;
        let size = symbol & 0x0F;
        let value = decode_amplitude(reader.read_bits(size)?, size);
        ac.push((run, value));
        pos += run as usize + 1;
      }
      if pos >= 64 {
        break;
      }
    }

    out.push(RleBlock { dc_diff, ac });
  }

  Ok(out)
}
