use core::fmt;

/// `Debug`-formats its contents as a hexadecimal byte dump.
///
/// Used to log raw packet payloads without dragging a decimal `&[u8]` debug
/// representation into the output.
#[derive(Copy, Clone)]
pub struct HexSlice<T>(pub T)
where
    T: AsRef<[u8]>;

impl<T: AsRef<[u8]>> fmt::Debug for HexSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, byte) in self.0.as_ref().iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        f.write_str("]")
    }
}

/// `Debug`-formats its contents in hexadecimal.
#[derive(Copy, Clone)]
pub struct Hex<T>(pub T)
where
    T: fmt::LowerHex;

impl<T: fmt::LowerHex> fmt::Debug for Hex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_formatting() {
        assert_eq!(format!("{:?}", HexSlice(&[][..])), "[]");
        assert_eq!(format!("{:?}", HexSlice(&[0x80, 0x90, 0x3c][..])), "[80 90 3c]");
        assert_eq!(format!("{:?}", Hex(0xf8u8)), "0xf8");
    }
}
