use crate::{CodecError, Result};

/// Bounds-checked cursor over an input buffer.
///
/// Every read either returns the requested bytes or fails with
/// [`CodecError::UnexpectedEof`]; the cursor only advances on success.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, pos: offset }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(CodecError::UnexpectedEof {
                offset: self.pos,
                needed: len,
                remaining,
            });
        }
        if len == 0 {
            return Ok(&[]);
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(u8::from_le_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }
}

/// Cursor writing into a pre-sized slice.
#[derive(Debug)]
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub fn new(buf: &'a mut [u8], offset: usize) -> Self {
        Self { buf, pos: offset }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn put_slice(&mut self, bytes: &[u8]) -> Result<()> {
        let remaining = self.buf.len().saturating_sub(self.pos);
        if bytes.len() > remaining {
            return Err(CodecError::WriteOverflow {
                offset: self.pos,
                needed: bytes.len(),
                remaining,
            });
        }
        if bytes.is_empty() {
            return Ok(());
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.put_slice(&[value])
    }

    pub fn put_u16(&mut self, value: u16) -> Result<()> {
        self.put_slice(&value.to_le_bytes())
    }

    pub fn put_u32(&mut self, value: u32) -> Result<()> {
        self.put_slice(&value.to_le_bytes())
    }

    pub fn put_u64(&mut self, value: u64) -> Result<()> {
        self.put_slice(&value.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_does_not_advance_on_failure() {
        let buf = [1u8, 2, 3];
        let mut reader = Reader::new(&buf, 1);
        assert_eq!(
            reader.read_u32(),
            Err(CodecError::UnexpectedEof {
                offset: 1,
                needed: 4,
                remaining: 2
            })
        );
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.read_u16().unwrap(), 0x0302);
        assert!(reader.is_empty());
    }

    #[test]
    fn reader_past_end_offset() {
        let buf = [0u8; 2];
        let mut reader = Reader::new(&buf, 10);
        assert_eq!(reader.remaining(), 0);
        assert!(reader.read_u8().is_err());
        assert_eq!(reader.take(0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn writer_refuses_overflow() {
        let mut buf = [0u8; 5];
        let mut writer = Writer::new(&mut buf, 2);
        writer.put_u16(0xbeef).unwrap();
        assert!(matches!(
            writer.put_u16(1),
            Err(CodecError::WriteOverflow { offset: 4, needed: 2, remaining: 1 })
        ));
        writer.put_u8(7).unwrap();
        assert_eq!(buf, [0, 0, 0xef, 0xbe, 7]);
    }
}
