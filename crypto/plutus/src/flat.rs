//! Bit-level reader and writer for the flat encoding of UPLC programs.

use crate::error::ParamError;

/// Reads big-endian bits out of a byte slice.
pub struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current offset in bits.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len() * 8
    }

    pub fn bit(&mut self) -> Result<bool, ParamError> {
        let byte = self.bytes.get(self.pos / 8).ok_or(ParamError::Truncated(self.pos))?;
        let bit = (byte >> (7 - self.pos % 8)) & 1 == 1;
        self.pos += 1;
        Ok(bit)
    }

    pub fn bits(&mut self, count: u32) -> Result<u64, ParamError> {
        debug_assert!(count <= 64);
        let mut value = 0u64;
        for _ in 0..count {
            value = (value << 1) | self.bit()? as u64;
        }
        Ok(value)
    }

    pub fn skip(&mut self, count: usize) -> Result<(), ParamError> {
        if self.pos + count > self.bytes.len() * 8 {
            return Err(ParamError::Truncated(self.bytes.len() * 8));
        }
        self.pos += count;
        Ok(())
    }

    /// Variable length natural: 7-bit groups, least significant first, high bit set while more follow.
    pub fn natural(&mut self) -> Result<u64, ParamError> {
        let start = self.pos;
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let group = self.bits(8)?;
            if shift >= 64 || (shift > 57 && (group & 0x7f) >> (64 - shift) != 0) {
                return Err(ParamError::Overflow(start));
            }
            value |= (group & 0x7f) << shift;
            shift += 7;
            if group & 0x80 == 0 {
                return Ok(value);
            }
        }
    }

    /// Skips a natural of any size, e.g. an arbitrary precision integer constant.
    pub fn skip_natural(&mut self) -> Result<(), ParamError> {
        while self.bits(8)? & 0x80 != 0 {}
        Ok(())
    }

    pub fn filler(&mut self) -> Result<(), ParamError> {
        while !self.bit()? {}
        Ok(())
    }

    pub fn skip_bytestring(&mut self) -> Result<(), ParamError> {
        self.filler()?;
        loop {
            let len = self.bits(8)? as usize;
            if len == 0 {
                return Ok(());
            }
            self.skip(len * 8)?;
        }
    }
}

/// Accumulates big-endian bits into bytes.
#[derive(Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit(&mut self, bit: bool) {
        if self.used == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> self.used;
            }
        }
        self.used = (self.used + 1) % 8;
    }

    pub fn bits(&mut self, value: u64, count: u32) {
        for i in (0..count).rev() {
            self.bit((value >> i) & 1 == 1);
        }
    }

    pub fn natural(&mut self, mut value: u64) {
        loop {
            let group = value & 0x7f;
            value >>= 7;
            self.bit(value != 0);
            self.bits(group, 7);
            if value == 0 {
                return;
            }
        }
    }

    /// Zero bits up to the last bit of the current byte, which is set.
    pub fn filler(&mut self) {
        while self.used != 7 {
            self.bit(false);
        }
        self.bit(true);
    }

    pub fn bytestring(&mut self, bytes: &[u8]) {
        self.filler();
        for chunk in bytes.chunks(255) {
            self.bytes.push(chunk.len() as u8);
            self.bytes.extend_from_slice(chunk);
        }
        self.bytes.push(0);
    }

    /// Copies the bit range `[start, end)` of `source` verbatim.
    pub fn copy_bits(&mut self, source: &[u8], start: usize, end: usize) {
        for pos in start..end {
            self.bit((source[pos / 8] >> (7 - pos % 8)) & 1 == 1);
        }
    }

    pub fn bit_len(&self) -> usize {
        match self.used {
            0 => self.bytes.len() * 8,
            used => (self.bytes.len() - 1) * 8 + used as usize,
        }
    }

    /// Returns the written bytes. Callers pad with [`BitWriter::filler`] first.
    pub fn finish(self) -> Vec<u8> {
        debug_assert_eq!(self.used, 0);
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naturals() {
        for value in [0u64, 1, 127, 128, 300, 1 << 32, u64::MAX] {
            let mut writer = BitWriter::new();
            writer.bit(true);
            writer.natural(value);
            writer.filler();
            let bytes = writer.finish();
            let mut reader = BitReader::new(&bytes);
            assert!(reader.bit().unwrap());
            assert_eq!(reader.natural().unwrap(), value);
            reader.filler().unwrap();
            assert!(reader.is_exhausted());
        }
        // 10 groups carrying more than 64 bits
        let mut reader = BitReader::new(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f]);
        assert_eq!(reader.natural(), Err(ParamError::Overflow(0)));
        let mut reader = BitReader::new(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f]);
        reader.skip_natural().unwrap();
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_filler_alignment() {
        let mut writer = BitWriter::new();
        writer.filler();
        assert_eq!(writer.finish(), vec![0x01]);

        let mut writer = BitWriter::new();
        writer.bits(0b0011, 4);
        assert_eq!(writer.bit_len(), 4);
        writer.filler();
        assert_eq!(writer.finish(), vec![0b0011_0001]);
    }

    #[test]
    fn test_bytestrings() {
        let payload: Vec<u8> = (0..=255u8).chain(0..10).collect();
        let mut writer = BitWriter::new();
        writer.bits(0b101, 3);
        writer.bytestring(&payload);
        let bytes = writer.finish();
        assert_eq!(bytes.len(), 1 + 1 + 255 + 1 + 11 + 1);
        assert_eq!(bytes[1], 255);

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.bits(3).unwrap(), 0b101);
        reader.skip_bytestring().unwrap();
        assert!(reader.is_exhausted());

        let mut reader = BitReader::new(&bytes[..100]);
        reader.bits(3).unwrap();
        assert!(matches!(reader.skip_bytestring(), Err(ParamError::Truncated(_))));
    }

    #[test]
    fn test_copy_bits() {
        let source = [0b1010_1100u8, 0b0101_0000];
        let mut writer = BitWriter::new();
        writer.copy_bits(&source, 2, 12);
        assert_eq!(writer.bit_len(), 10);
        writer.bits(0b000001, 6);
        assert_eq!(writer.finish(), vec![0b1011_0001, 0b0100_0001]);
    }
}
