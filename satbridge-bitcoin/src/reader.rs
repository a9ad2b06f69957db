//! Bounds-checked byte reader over a raw transaction.

use crate::error::{Result, TxParseError};

/// Cursor over an immutable byte slice. Every read is bounds-checked.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Wrap a byte slice.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset from the start.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// Read a single byte.
    pub fn read_u8(&mut self, what: &'static str) -> Result<u8> {
        let v = *self
            .buf
            .get(self.pos)
            .ok_or(TxParseError::UnexpectedEof(what))?;
        self.pos += 1;
        Ok(v)
    }

    /// Read a little-endian u16.
    pub fn read_u16_le(&mut self, what: &'static str) -> Result<u16> {
        let bytes = self.read_bytes(2, what)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian u32.
    pub fn read_u32_le(&mut self, what: &'static str) -> Result<u32> {
        let bytes = self.read_bytes(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a little-endian u64.
    pub fn read_u64_le(&mut self, what: &'static str) -> Result<u64> {
        let bytes = self.read_bytes(8, what)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(arr))
    }

    /// Read exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize, what: &'static str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or(TxParseError::UnexpectedEof(what))?;
        if end > self.buf.len() {
            return Err(TxParseError::UnexpectedEof(what));
        }
        let v = &self.buf[self.pos..end];
        self.pos = end;
        Ok(v)
    }

    /// Read a CompactSize varint, rejecting non-minimal encodings.
    pub fn read_compact_size(&mut self, what: &'static str) -> Result<u64> {
        let tag = self.read_u8(what)?;
        let (v, minimal) = match tag {
            0x00..=0xfc => (tag as u64, true),
            0xfd => {
                let v = self.read_u16_le(what)? as u64;
                (v, v >= 0xfd)
            }
            0xfe => {
                let v = self.read_u32_le(what)? as u64;
                (v, v > 0xffff)
            }
            0xff => {
                let v = self.read_u64_le(what)?;
                (v, v > 0xffff_ffff)
            }
        };
        if !minimal {
            return Err(TxParseError::NonMinimalVarint);
        }
        Ok(v)
    }

    /// Read a CompactSize element count and reject counts that cannot fit in
    /// the remaining bytes at `min_element_size` each. Prevents allocation
    /// bombs from forged counts.
    pub fn read_count(
        &mut self,
        what: &'static str,
        min_element_size: usize,
    ) -> Result<usize> {
        let count = self.read_compact_size(what)?;
        let remaining = self.remaining() as u64;
        if count.checked_mul(min_element_size as u64).map_or(true, |need| need > remaining) {
            return Err(TxParseError::ImplausibleCount {
                what,
                count,
                remaining: self.remaining(),
            });
        }
        Ok(count as usize)
    }
}

/// Append a CompactSize varint in minimal encoding.
pub fn write_compact_size(n: u64, out: &mut Vec<u8>) {
    match n {
        0x00..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_read_primitives() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let mut r = Reader::new(&data);
        assert_eq!(r.read_u8("a").unwrap(), 0x01);
        assert_eq!(r.read_u32_le("b").unwrap(), 0x05040302);
        assert_eq!(r.remaining(), 0);
        assert!(matches!(
            r.read_u8("c"),
            Err(TxParseError::UnexpectedEof("c"))
        ));
    }

    #[test]
    fn test_compact_size_minimal() {
        let mut r = Reader::new(&[0xfc]);
        assert_eq!(r.read_compact_size("n").unwrap(), 0xfc);

        let mut r = Reader::new(&[0xfd, 0xfd, 0x00]);
        assert_eq!(r.read_compact_size("n").unwrap(), 0xfd);

        // 0xfc encoded with the 3-byte form is non-minimal.
        let mut r = Reader::new(&[0xfd, 0xfc, 0x00]);
        assert!(matches!(
            r.read_compact_size("n"),
            Err(TxParseError::NonMinimalVarint)
        ));
    }

    #[test]
    fn test_count_guard() {
        // Claims 1000 inputs with 2 bytes left.
        let mut r = Reader::new(&[0xfd, 0xe8, 0x03, 0xaa, 0xbb]);
        assert!(matches!(
            r.read_count("inputs", 41),
            Err(TxParseError::ImplausibleCount { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_compact_size_roundtrip(n in proptest::num::u64::ANY) {
            let mut buf = Vec::new();
            write_compact_size(n, &mut buf);
            let mut r = Reader::new(&buf);
            prop_assert_eq!(r.read_compact_size("n").unwrap(), n);
            prop_assert_eq!(r.remaining(), 0);
        }

        #[test]
        fn prop_reader_never_panics(data in proptest::collection::vec(proptest::num::u8::ANY, 0..64)) {
            let mut r = Reader::new(&data);
            let _ = r.read_compact_size("fuzz");
            let _ = r.read_u64_le("fuzz");
        }
    }
}
