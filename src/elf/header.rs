//! The ELF ident and header. The ident is parsed first from its own 16-byte
//! window because the size of the full header depends on the class it names.
use super::{ParseError, Reader, Stream};

pub const IDENT_LEN: usize = 16;

const HEADER_LEN_32: usize = 52;
const HEADER_LEN_64: usize = 64;

/// Word size of the file, which also picks the 8- vs 16-digit value column.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ElfClass {
    ThirtyTwo,
    SixtyFour,
}

/// The identification bytes at the start of every ELF file.
#[derive(Clone, Copy, Debug)]
pub struct Ident {
    pub class: ElfClass,
    pub little_endian: bool,
    pub osabi: u8,
    pub abi_version: u8,
}

impl Ident {
    pub fn parse(bytes: &[u8]) -> Result<Ident, ParseError> {
        if bytes.len() < IDENT_LEN {
            return Err(ParseError::TooSmall {
                need: IDENT_LEN,
                have: bytes.len(),
            });
        }
        if bytes[0..4] != [0x7f, b'E', b'L', b'F'] {
            return Err(ParseError::BadMagic);
        }
        let class = match bytes[4] {
            1 => ElfClass::ThirtyTwo,
            2 => ElfClass::SixtyFour,
            other => return Err(ParseError::UnknownClass(other)),
        };
        let little_endian = match bytes[5] {
            1 => true,
            2 => false,
            other => return Err(ParseError::UnknownEncoding(other)),
        };
        if bytes[6] != 1 {
            return Err(ParseError::BadVersion(bytes[6]));
        }
        Ok(Ident {
            class,
            little_endian,
            osabi: bytes[7],
            abi_version: bytes[8],
        })
    }

    /// Size of the full header, 52 or 64 bytes by class.
    pub fn header_size(&self) -> usize {
        match self.class {
            ElfClass::ThirtyTwo => HEADER_LEN_32,
            ElfClass::SixtyFour => HEADER_LEN_64,
        }
    }

    pub fn sixty_four_bit(&self) -> bool {
        self.class == ElfClass::SixtyFour
    }
}

/// The header fields a symbol dump needs; the rest are read and dropped.
#[derive(Debug)]
pub struct ElfHeader {
    pub ident: Ident,
    pub etype: u16,
    pub entry: u64,
    pub section_offset: u64,
    pub section_entry_size: u16,
    pub num_section_entries: u16,
    pub string_table_index: u16,
}

impl ElfHeader {
    /// Parse the full header from a window of at least `ident.header_size()`
    /// bytes starting at the beginning of the file.
    pub fn parse(ident: Ident, bytes: &[u8]) -> Result<ElfHeader, ParseError> {
        let need = ident.header_size();
        if bytes.len() < need {
            return Err(ParseError::TooSmall {
                need,
                have: bytes.len(),
            });
        }
        let reader = Reader::new(bytes, ident.little_endian, ident.sixty_four_bit());
        let mut s = Stream::new(&reader, IDENT_LEN);
        let etype = s.read_half()?;
        let _machine = s.read_half()?;
        let _version = s.read_word()?;
        let entry = s.read_addr()?;
        let _ph_offset = s.read_addr()?;
        let section_offset = s.read_addr()?;
        let _flags = s.read_word()?;
        let _header_size = s.read_half()?;
        let _ph_entry_size = s.read_half()?;
        let _num_ph_entries = s.read_half()?;
        let section_entry_size = s.read_half()?;
        let num_section_entries = s.read_half()?;
        let string_table_index = s.read_half()?;
        Ok(ElfHeader {
            ident,
            etype,
            entry,
            section_offset,
            section_entry_size,
            num_section_entries,
            string_table_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident64() -> [u8; 16] {
        [0x7f, b'E', b'L', b'F', 2, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    }

    #[test]
    fn parses_a_sane_ident() {
        let ident = Ident::parse(&ident64()).unwrap();
        assert_eq!(ident.class, ElfClass::SixtyFour);
        assert!(ident.little_endian);
        assert_eq!(ident.header_size(), 64);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = ident64();
        bytes[1] = b'Z';
        assert!(matches!(Ident::parse(&bytes), Err(ParseError::BadMagic)));
    }

    #[test]
    fn rejects_unknown_class_and_encoding() {
        let mut bytes = ident64();
        bytes[4] = 9;
        assert!(matches!(
            Ident::parse(&bytes),
            Err(ParseError::UnknownClass(9))
        ));

        let mut bytes = ident64();
        bytes[5] = 0;
        assert!(matches!(
            Ident::parse(&bytes),
            Err(ParseError::UnknownEncoding(0))
        ));
    }

    #[test]
    fn rejects_truncated_ident() {
        assert!(matches!(
            Ident::parse(&ident64()[..10]),
            Err(ParseError::TooSmall { need: 16, have: 10 })
        ));
    }

    #[test]
    fn parses_header_fields() {
        let mut bytes = Vec::from(ident64());
        bytes.extend_from_slice(&2u16.to_le_bytes()); // e_type
        bytes.extend_from_slice(&0x3eu16.to_le_bytes()); // e_machine
        bytes.extend_from_slice(&1u32.to_le_bytes()); // e_version
        bytes.extend_from_slice(&0x40_1000u64.to_le_bytes()); // e_entry
        bytes.extend_from_slice(&0u64.to_le_bytes()); // e_phoff
        bytes.extend_from_slice(&0x2000u64.to_le_bytes()); // e_shoff
        bytes.extend_from_slice(&0u32.to_le_bytes()); // e_flags
        bytes.extend_from_slice(&64u16.to_le_bytes()); // e_ehsize
        bytes.extend_from_slice(&0u16.to_le_bytes()); // e_phentsize
        bytes.extend_from_slice(&0u16.to_le_bytes()); // e_phnum
        bytes.extend_from_slice(&64u16.to_le_bytes()); // e_shentsize
        bytes.extend_from_slice(&7u16.to_le_bytes()); // e_shnum
        bytes.extend_from_slice(&6u16.to_le_bytes()); // e_shstrndx

        let ident = Ident::parse(&bytes).unwrap();
        let header = ElfHeader::parse(ident, &bytes).unwrap();
        assert_eq!(header.etype, 2);
        assert_eq!(header.entry, 0x40_1000);
        assert_eq!(header.section_offset, 0x2000);
        assert_eq!(header.section_entry_size, 64);
        assert_eq!(header.num_section_entries, 7);
        assert_eq!(header.string_table_index, 6);
    }
}
