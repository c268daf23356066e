//! Helper traits to extend [`Buf`] and [`BufMut`] with the two-digit decimal
//! fields of the tag header and with codec methods.
use {
    super::Codec,
    crate::Result,
    bytes::{Buf, BufMut},
};

pub trait BufDecimal {
    /// Reads two ASCII decimal digits. Returns `None` on EOF or a non-digit,
    /// in which case the amount consumed is unspecified.
    fn get_decimal2(&mut self) -> Option<u8>;
}

pub trait BufMutDecimal {
    /// Writes `value` as two zero-padded ASCII decimal digits.
    fn put_decimal2(&mut self, value: u8);
}

pub trait BufCodec<C, T>
where
    C: Codec<T>,
{
    fn get_codec(&mut self, codec: &C, parent: C::Parent) -> Result<T>;
}

pub trait BufMutCodec<C, T>
where
    C: Codec<T>,
{
    fn put_codec(&mut self, codec: &C, value: &T);
}

impl<B: Buf> BufDecimal for B {
    fn get_decimal2(&mut self) -> Option<u8> {
        if self.remaining() < 2 {
            return None;
        }
        let hi = self.get_u8();
        let lo = self.get_u8();
        if hi.is_ascii_digit() && lo.is_ascii_digit() {
            Some((hi - b'0') * 10 + (lo - b'0'))
        } else {
            None
        }
    }
}

impl<B: BufMut> BufMutDecimal for B {
    fn put_decimal2(&mut self, value: u8) {
        debug_assert!(value < 100);
        self.put_u8(b'0' + value / 10);
        self.put_u8(b'0' + value % 10);
    }
}

impl<B, C, T> BufCodec<C, T> for B
where
    B: Buf,
    C: Codec<T>,
{
    fn get_codec(&mut self, codec: &C, parent: C::Parent) -> Result<T> {
        codec.decode(self, parent)
    }
}

impl<B, C, T> BufMutCodec<C, T> for B
where
    B: BufMut,
    C: Codec<T>,
{
    fn put_codec(&mut self, codec: &C, value: &T) {
        codec.encode(self, value);
    }
}
