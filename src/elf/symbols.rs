//! Symbol table records. See https://refspecs.linuxbase.org/elf/gabi4+/ch4.symtab.html
use super::{ParseError, Reader, Stream};
use tracing::warn;

/// Linkage visibility and behavior.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Binding {
    /// Not visible outside the object file containing its definition.
    Local,

    /// Visible to all object files.
    Global,

    /// Like Global but lower precedence; can be preempted by a Global.
    Weak,

    /// GNU extension: global with a uniqueness guarantee across shared objects.
    GnuUnique,

    /// OS or CPU reserved values we don't interpret.
    Reserved,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolType {
    NoType,

    /// A data object: variable, array, etc.
    Object,

    /// Function or other executable code.
    Func,

    /// Another section. Used for relocation.
    Section,

    /// Source file associated with the symbol table.
    File,

    /// Uninitialized common block. Used by the linker.
    Common,

    /// Thread local storage data. The value is an offset to the data.
    Tls,

    /// GNU extension: the symbol's value names a resolver function.
    GnuIndirect,

    /// OS or CPU reserved values we don't interpret.
    Reserved,
}

impl Binding {
    pub fn from_info(info: u8) -> Binding {
        match info >> 4 {
            0 => Binding::Local,
            1 => Binding::Global,
            2 => Binding::Weak,
            10 => Binding::GnuUnique,
            other => {
                warn!("unknown symbol binding: {other}");
                Binding::Reserved
            }
        }
    }
}

impl SymbolType {
    pub fn from_info(info: u8) -> SymbolType {
        match info & 0xf {
            0 => SymbolType::NoType,
            1 => SymbolType::Object,
            2 => SymbolType::Func,
            3 => SymbolType::Section,
            4 => SymbolType::File,
            5 => SymbolType::Common,
            6 => SymbolType::Tls,
            10 => SymbolType::GnuIndirect,
            other => {
                warn!("unknown symbol type: {other}");
                SymbolType::Reserved
            }
        }
    }
}

/// One raw symbol record; `name_index` still points into the symbol string
/// table named by the symtab section's `link`.
#[derive(Debug)]
pub struct SymbolRecord {
    pub name_index: u32,
    pub value: u64,
    pub size: u64,
    pub binding: Binding,
    pub stype: SymbolType,
    pub shndx: u16,
}

impl SymbolRecord {
    pub fn entry_size(sixty_four_bit: bool) -> usize {
        if sixty_four_bit { 24 } else { 16 }
    }

    /// Field order differs between the two classes so both are spelled out.
    pub fn parse(reader: &Reader, offset: usize) -> Result<SymbolRecord, ParseError> {
        let mut s = Stream::new(reader, offset);
        if reader.sixty_four_bit {
            let name_index = s.read_word()?;
            let info = s.read_byte()?;
            let _other = s.read_byte()?;
            let shndx = s.read_half()?;
            let value = s.read_addr()?;
            let size = s.read_xword()?;
            Ok(SymbolRecord {
                name_index,
                value,
                size,
                binding: Binding::from_info(info),
                stype: SymbolType::from_info(info),
                shndx,
            })
        } else {
            let name_index = s.read_word()?;
            let value = s.read_addr()?;
            let size = s.read_word()? as u64;
            let info = s.read_byte()?;
            let _other = s.read_byte()?;
            let shndx = s.read_half()?;
            Ok(SymbolRecord {
                name_index,
                value,
                size,
                binding: Binding::from_info(info),
                stype: SymbolType::from_info(info),
                shndx,
            })
        }
    }

    /// Parse every whole record in a window over the symbol table.
    pub fn parse_table(reader: &Reader) -> Result<Vec<SymbolRecord>, ParseError> {
        let entry = SymbolRecord::entry_size(reader.sixty_four_bit);
        let mut records = Vec::with_capacity(reader.len() / entry);
        let mut offset = 0;
        while offset + entry <= reader.len() {
            records.push(SymbolRecord::parse(reader, offset)?);
            offset += entry;
        }
        Ok(records)
    }
}
