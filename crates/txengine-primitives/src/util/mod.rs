//! Wire-format helpers: the compact variable-length integer and a
//! cursor reader / append writer for little-endian protocol data.

use crate::PrimitivesError;

// ---------------------------------------------------------------------------
// VarInt
// ---------------------------------------------------------------------------

/// Marker byte for a 3-byte varint (u16 payload).
pub const VARINT_MARKER_U16: u8 = 0xfd;
/// Marker byte for a 5-byte varint (u32 payload).
pub const VARINT_MARKER_U32: u8 = 0xfe;
/// Marker byte for a 9-byte varint (u64 payload).
pub const VARINT_MARKER_U64: u8 = 0xff;

/// The protocol's compact variable-length unsigned integer.
///
/// Prefixes counts and variable-length fields (input/output counts, script
/// lengths, the scriptCode length inside a sighash preimage).
///
/// | value range            | encoding                |
/// |------------------------|-------------------------|
/// | `0 ..= 0xfc`           | 1 byte                  |
/// | `0xfd ..= 0xffff`      | `0xfd` + u16 LE         |
/// | `0x1_0000 ..= u32::MAX`| `0xfe` + u32 LE         |
/// | larger                 | `0xff` + u64 LE         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Decode a varint from the start of `data`.
    ///
    /// Returns the value and the number of bytes consumed, or
    /// `UnexpectedEof` if `data` ends inside the encoding.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), PrimitivesError> {
        let mut reader = WireReader::new(data);
        let value = reader.read_varint()?;
        Ok((value, reader.position()))
    }

    /// Size of the encoding in bytes: 1, 3, 5 or 9.
    pub fn length(&self) -> usize {
        Self::encoded_len_for_marker(self.marker())
    }

    /// Total encoded size implied by a first byte.
    pub fn encoded_len_for_marker(first: u8) -> usize {
        match first {
            VARINT_MARKER_U64 => 9,
            VARINT_MARKER_U32 => 5,
            VARINT_MARKER_U16 => 3,
            _ => 1,
        }
    }

    fn marker(&self) -> u8 {
        match self.0 {
            v if v < VARINT_MARKER_U16 as u64 => v as u8,
            v if v <= u16::MAX as u64 => VARINT_MARKER_U16,
            v if v <= u32::MAX as u64 => VARINT_MARKER_U32,
            _ => VARINT_MARKER_U64,
        }
    }

    /// Encode into a new buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.length());
        self.append_to(&mut buf);
        buf
    }

    /// Append the encoding to `buf`.
    pub fn append_to(&self, buf: &mut Vec<u8>) {
        let marker = self.marker();
        buf.push(marker);
        match marker {
            VARINT_MARKER_U16 => buf.extend_from_slice(&(self.0 as u16).to_le_bytes()),
            VARINT_MARKER_U32 => buf.extend_from_slice(&(self.0 as u32).to_le_bytes()),
            VARINT_MARKER_U64 => buf.extend_from_slice(&self.0.to_le_bytes()),
            _ => {}
        }
    }

    /// The integer value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VarInt {
    fn from(v: u64) -> Self {
        VarInt(v)
    }
}

impl From<usize> for VarInt {
    fn from(v: usize) -> Self {
        VarInt(v as u64)
    }
}

// ---------------------------------------------------------------------------
// WireReader
// ---------------------------------------------------------------------------

/// A cursor over a byte slice reading little-endian protocol fields.
///
/// Every read is bounds checked and fails with
/// [`PrimitivesError::UnexpectedEof`] instead of panicking.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        WireReader { data, pos: 0 }
    }

    /// Read `n` bytes and advance.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], PrimitivesError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(PrimitivesError::UnexpectedEof)?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read a fixed-size array and advance.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PrimitivesError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a little-endian u16.
    pub fn read_u16_le(&mut self) -> Result<u16, PrimitivesError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u32.
    pub fn read_u32_le(&mut self) -> Result<u32, PrimitivesError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u64.
    pub fn read_u64_le(&mut self) -> Result<u64, PrimitivesError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a varint of any width.
    pub fn read_varint(&mut self) -> Result<VarInt, PrimitivesError> {
        let value = match self.read_u8()? {
            VARINT_MARKER_U64 => self.read_u64_le()?,
            VARINT_MARKER_U32 => self.read_u32_le()? as u64,
            VARINT_MARKER_U16 => self.read_u16_le()? as u64,
            b => b as u64,
        };
        Ok(VarInt(value))
    }

    /// Read a varint length prefix followed by that many bytes.
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], PrimitivesError> {
        let len = self.read_varint()?.value();
        let len = usize::try_from(len).map_err(|_| PrimitivesError::VarIntTooLarge)?;
        self.read_bytes(len)
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

// ---------------------------------------------------------------------------
// WireWriter
// ---------------------------------------------------------------------------

/// An append-only buffer writing little-endian protocol fields.
#[derive(Debug, Clone, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        WireWriter { buf: Vec::new() }
    }

    /// Create an empty writer with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        WireWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append one byte.
    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    /// Append a little-endian u16.
    pub fn write_u16_le(&mut self, val: u16) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a little-endian u32.
    pub fn write_u32_le(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a little-endian u64.
    pub fn write_u64_le(&mut self, val: u64) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a varint.
    pub fn write_varint(&mut self, varint: VarInt) {
        varint.append_to(&mut self.buf);
    }

    /// Append a varint length prefix followed by `bytes`.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(VarInt::from(bytes.len()));
        self.write_bytes(bytes);
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer, returning the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
