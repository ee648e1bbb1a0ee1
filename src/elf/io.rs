//! Endian-aware primitive reads over one mapped window.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("window is too small: need {need} bytes, have {have}")]
    TooSmall { need: usize, have: usize },

    #[error("not an ELF file (bad magic)")]
    BadMagic,

    #[error("bad ELF version: {0}")]
    BadVersion(u8),

    #[error("unknown ELF class: {0}")]
    UnknownClass(u8),

    #[error("unknown data encoding: {0}")]
    UnknownEncoding(u8),

    #[error("read of {size} bytes at offset {offset} is out of bounds")]
    OutOfBounds { offset: usize, size: usize },

    #[error("unterminated string at offset {0}")]
    UnterminatedString(usize),

    #[error("bad section index: {0}")]
    BadSectionIndex(usize),
}

/// Reads within one window. Offsets are relative to the window, not the file.
pub struct Reader<'a> {
    pub little_endian: bool,
    pub sixty_four_bit: bool,
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8], little_endian: bool, sixty_four_bit: bool) -> Reader<'a> {
        Reader {
            bytes,
            little_endian,
            sixty_four_bit,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn read_byte(&self, offset: usize) -> Result<u8, ParseError> {
        self.bytes
            .get(offset)
            .copied()
            .ok_or(ParseError::OutOfBounds { offset, size: 1 })
    }

    pub fn read_half(&self, offset: usize) -> Result<u16, ParseError> {
        let b = self.get(offset, 2)?;
        let b = [b[0], b[1]];
        Ok(if self.little_endian {
            u16::from_le_bytes(b)
        } else {
            u16::from_be_bytes(b)
        })
    }

    pub fn read_word(&self, offset: usize) -> Result<u32, ParseError> {
        let b = self.get(offset, 4)?;
        let b = [b[0], b[1], b[2], b[3]];
        Ok(if self.little_endian {
            u32::from_le_bytes(b)
        } else {
            u32::from_be_bytes(b)
        })
    }

    pub fn read_xword(&self, offset: usize) -> Result<u64, ParseError> {
        let b = self.get(offset, 8)?;
        let b = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
        Ok(if self.little_endian {
            u64::from_le_bytes(b)
        } else {
            u64::from_be_bytes(b)
        })
    }

    /// Read a word or xword depending on the ELF class but, for sanity,
    /// always return 64 bits. Addresses, offsets, and sizes are all this wide.
    pub fn read_addr(&self, offset: usize) -> Result<u64, ParseError> {
        if self.sixty_four_bit {
            self.read_xword(offset)
        } else {
            Ok(self.read_word(offset)? as u64)
        }
    }

    fn get(&self, offset: usize, size: usize) -> Result<&'a [u8], ParseError> {
        let end = offset
            .checked_add(size)
            .ok_or(ParseError::OutOfBounds { offset, size })?;
        self.bytes
            .get(offset..end)
            .ok_or(ParseError::OutOfBounds { offset, size })
    }
}

/// Cursor over a reader for records whose fields are laid out sequentially.
pub struct Stream<'a, 'b> {
    pub reader: &'b Reader<'a>,
    pub offset: usize,
}

impl<'a, 'b> Stream<'a, 'b> {
    pub fn new(reader: &'b Reader<'a>, offset: usize) -> Self {
        Stream { reader, offset }
    }

    pub fn read_byte(&mut self) -> Result<u8, ParseError> {
        let byte = self.reader.read_byte(self.offset)?;
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_half(&mut self) -> Result<u16, ParseError> {
        let half = self.reader.read_half(self.offset)?;
        self.offset += 2;
        Ok(half)
    }

    pub fn read_word(&mut self) -> Result<u32, ParseError> {
        let word = self.reader.read_word(self.offset)?;
        self.offset += 4;
        Ok(word)
    }

    pub fn read_xword(&mut self) -> Result<u64, ParseError> {
        let xword = self.reader.read_xword(self.offset)?;
        self.offset += 8;
        Ok(xword)
    }

    pub fn read_addr(&mut self) -> Result<u64, ParseError> {
        let addr = self.reader.read_addr(self.offset)?;
        self.offset += if self.reader.sixty_four_bit { 8 } else { 4 };
        Ok(addr)
    }
}

/// Read the NUL-terminated entry at `index` in a string table window. The
/// index may point into the middle of a longer entry. The result is an owned
/// copy of the bytes exactly as stored; symbol names are not guaranteed to be
/// UTF-8 and must reach the output unmodified.
pub fn read_table_bytes(strings: &[u8], index: usize) -> Result<Vec<u8>, ParseError> {
    let rest = strings.get(index..).ok_or(ParseError::OutOfBounds {
        offset: index,
        size: 1,
    })?;
    match rest.iter().position(|b| *b == 0) {
        Some(end) => Ok(rest[..end].to_vec()),
        None => Err(ParseError::UnterminatedString(index)),
    }
}

/// `read_table_bytes` for section names, which are only compared against
/// known ASCII names; invalid UTF-8 is replaced rather than rejected.
pub fn read_table_string(strings: &[u8], index: usize) -> Result<String, ParseError> {
    Ok(String::from_utf8_lossy(&read_table_bytes(strings, index)?).into_owned())
}
