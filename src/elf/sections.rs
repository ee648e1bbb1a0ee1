//! Section headers and the resolved section-name table.
use super::{ParseError, Reader, Stream, read_table_string};

/// Symbol table.
pub const SHT_SYMTAB: u32 = 2;
/// String table.
pub const SHT_STRTAB: u32 = 3;

/// One raw section header. `name_index` points into `.shstrtab` until the
/// table is resolved into a `SectionTable`.
#[derive(Debug)]
pub struct SectionHeader {
    pub name_index: u32,
    pub stype: u32,
    pub offset: u64,
    pub size: u64,
    pub link: u32,
    pub entry_size: u64,
}

impl SectionHeader {
    /// Both classes share the field order; only the widths differ.
    fn parse(s: &mut Stream) -> Result<SectionHeader, ParseError> {
        let name_index = s.read_word()?;
        let stype = s.read_word()?;
        let _flags = s.read_addr()?;
        let _vaddr = s.read_addr()?;
        let offset = s.read_addr()?;
        let size = s.read_addr()?;
        let link = s.read_word()?;
        let _info = s.read_word()?;
        let _align = s.read_addr()?;
        let entry_size = s.read_addr()?;
        Ok(SectionHeader {
            name_index,
            stype,
            offset,
            size,
            link,
            entry_size,
        })
    }

    /// Parse the whole section header table from one window over it.
    pub fn parse_table(
        reader: &Reader,
        entry_size: u16,
        count: u16,
    ) -> Result<Vec<SectionHeader>, ParseError> {
        let mut table = Vec::with_capacity(count as usize);
        let mut offset = 0usize;
        for _ in 0..count {
            let mut s = Stream::new(reader, offset);
            table.push(SectionHeader::parse(&mut s)?);
            offset += entry_size as usize;
        }
        Ok(table)
    }
}

/// A section row with its name resolved. Rows own their names so the table
/// outlives the windows it was built from.
#[derive(Debug)]
pub struct Section {
    pub name: String,
    pub stype: u32,
    pub offset: u64,
    pub size: u64,
    pub link: u32,
    pub entry_size: u64,
}

/// All section rows of one binary, indexable by section index.
#[derive(Debug)]
pub struct SectionTable {
    pub rows: Vec<Section>,
}

impl SectionTable {
    /// Resolve each header's name index against a window over the section
    /// name string table.
    pub fn resolve(
        headers: Vec<SectionHeader>,
        strings: &[u8],
    ) -> Result<SectionTable, ParseError> {
        let mut rows = Vec::with_capacity(headers.len());
        for h in headers {
            let name = read_table_string(strings, h.name_index as usize)?;
            rows.push(Section {
                name,
                stype: h.stype,
                offset: h.offset,
                size: h.size,
                link: h.link,
                entry_size: h.entry_size,
            });
        }
        Ok(SectionTable { rows })
    }

    pub fn get(&self, index: usize) -> Option<&Section> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first `SHT_SYMTAB` section, if the binary carries one.
    pub fn find_symbol_table(&self) -> Option<&Section> {
        self.rows.iter().find(|row| row.stype == SHT_SYMTAB)
    }
}
