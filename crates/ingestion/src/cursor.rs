//! Bounds-checked little-endian reads over a byte slice

use bytes::Buf;

use crate::error::{DecodeError, Result};

pub(crate) struct ByteCursor<'a> {
    buf: &'a [u8],
    section: &'static str,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8], section: &'static str) -> Self {
        Self { buf, section }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(DecodeError::Truncated {
                section: self.section,
                needed,
                available: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    pub fn u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.buf.get_i16_le())
    }

    pub fn u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64_le())
    }

    pub fn f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.buf.get_f32_le())
    }

    pub fn i16x3(&mut self) -> Result<[i16; 3]> {
        self.ensure(6)?;
        Ok([
            self.buf.get_i16_le(),
            self.buf.get_i16_le(),
            self.buf.get_i16_le(),
        ])
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.ensure(len)?;
        self.buf.advance(len);
        Ok(())
    }
}
