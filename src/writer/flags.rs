//! Symbol classification: binding, type, and section collapse into a single
//! display letter, lowercase for local symbols.
use crate::elf::{Binding, SectionTable, SymbolType};
use std::io;
use thiserror::Error;

/// Reserved section indices. Anything else indexes the section header table.
pub const SHN_UNDEF: u16 = 0;
pub const SHN_ABS: u16 = 0xfff1;
pub const SHN_COMMON: u16 = 0xfff2;

// Section names are matched by exact equality. Earlier variants of this tool
// matched prefixes, which misclassified sections like ".data.rel.ro".
const DATA_SECTIONS: [&str; 2] = [".data", ".data1"];
const RODATA_SECTIONS: [&str; 2] = [".rodata", ".rodata1"];
const CODE_SECTIONS: [&str; 1] = [".text"];
const BSS_SECTIONS: [&str; 1] = [".bss"];
const DEBUG_SECTIONS: [&str; 2] = [".debug", ".line"];

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("no section table is loaded")]
    NoTable,

    #[error("symbol references section {0} but the table has {1} rows")]
    BadSectionIndex(u16, usize),

    #[error("wrote {written} of {expected} bytes")]
    Partial { expected: usize, written: usize },

    #[error("write failed: {0}")]
    Write(#[source] io::Error),
}

/// Classification state for one binary: the resolved section-name table and
/// the debug-sections toggle. Loaded before the formatting pass and unloaded
/// after it, so nothing stale survives into the next file of a batch.
#[derive(Default)]
pub struct WriterContext<'a> {
    sections: Option<&'a SectionTable>,
    debug_sections: bool,
}

impl<'a> WriterContext<'a> {
    pub fn new() -> WriterContext<'a> {
        WriterContext {
            sections: None,
            debug_sections: false,
        }
    }

    pub fn load_sections(&mut self, table: &'a SectionTable) {
        self.sections = Some(table);
    }

    pub fn unload_sections(&mut self) {
        self.sections = None;
    }

    /// When enabled, symbols in debug-only sections classify as `N` instead
    /// of `?`. Off by default.
    pub fn set_debug_sections(&mut self, enabled: bool) {
        self.debug_sections = enabled;
    }

    /// The display flag for one symbol, first match wins:
    /// weak and GNU-unique bindings, then the GNU-indirect type, then the
    /// reserved section indices, then the section the symbol lives in.
    /// Only the last step needs the section table.
    pub fn flag(
        &self,
        binding: Binding,
        shndx: u16,
        stype: SymbolType,
    ) -> Result<char, WriterError> {
        if binding == Binding::Weak {
            let undefined = shndx == SHN_UNDEF;
            return Ok(match (stype == SymbolType::Object, undefined) {
                (true, false) => 'V',
                (true, true) => 'v',
                (false, false) => 'W',
                (false, true) => 'w',
            });
        }
        if binding == Binding::GnuUnique {
            return Ok('u');
        }
        if stype == SymbolType::GnuIndirect {
            return Ok('i');
        }
        match shndx {
            SHN_ABS => return Ok('A'),
            SHN_COMMON => return Ok('C'),
            SHN_UNDEF => return Ok('U'),
            _ => (),
        }

        let table = self.sections.ok_or(WriterError::NoTable)?;
        let row = table
            .get(shndx as usize)
            .ok_or(WriterError::BadSectionIndex(shndx, table.len()))?;
        let local = binding == Binding::Local;
        let pick = |upper: char, lower: char| if local { lower } else { upper };

        let name = row.name.as_str();
        if DATA_SECTIONS.contains(&name) {
            Ok(pick('D', 'd'))
        } else if RODATA_SECTIONS.contains(&name) {
            Ok(pick('R', 'r'))
        } else if CODE_SECTIONS.contains(&name) {
            Ok(pick('T', 't'))
        } else if BSS_SECTIONS.contains(&name) {
            Ok(pick('B', 'b'))
        } else if self.debug_sections && DEBUG_SECTIONS.contains(&name) {
            Ok('N')
        } else {
            Ok('?')
        }
    }
}
