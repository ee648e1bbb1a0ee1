//! Drives one target end to end: window the structural regions of the file,
//! decode them, build and order the symbol lines, and print them.
use crate::elf::{
    ElfClass, ElfHeader, Ident, IDENT_LEN, ParseError, Reader, SectionHeader, SectionTable,
    SymbolRecord, read_table_bytes,
};
use crate::elf::Binding;
use crate::list::{ListError, OrderedList};
use crate::window::{SourceWindow, WindowError};
use crate::writer::{BitWidth, SHN_UNDEF, SymbolLine, WriterContext, WriterError};
use std::cmp::Ordering;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Presentation options, one per CLI flag.
#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    /// -a: classify symbols in debug-only sections
    pub debug_sections: bool,
    /// -g: external (non-local) symbols only
    pub extern_only: bool,
    /// -u: undefined symbols only
    pub undefined_only: bool,
    /// -p: keep symbol-table order
    pub no_sort: bool,
    /// -r: reverse the presentation order
    pub reverse: bool,
}

#[derive(Debug, Error)]
pub enum DumpError {
    #[error(transparent)]
    File(#[from] WindowError),

    #[error(transparent)]
    Format(#[from] ParseError),

    #[error(transparent)]
    Writer(#[from] WriterError),

    #[error(transparent)]
    List(#[from] ListError),
}

impl DumpError {
    /// Allocation failure aborts the whole batch; everything else skips to
    /// the next target.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DumpError::List(ListError::Allocation))
    }

    /// True when the target opened fine but isn't a well-formed ELF. Window
    /// errors count too once the file is open: a structural region past the
    /// end of the file, or of zero length, means the layout is bogus.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            DumpError::Format(_)
                | DumpError::Writer(WriterError::NoTable | WriterError::BadSectionIndex(..))
                | DumpError::File(WindowError::OffsetPastEnd { .. } | WindowError::ZeroLength)
        )
    }
}

/// Print the symbols of one ELF file to `out`. Files without a symbol table
/// produce no output and no error.
pub fn dump_file(path: &Path, opts: Options, out: &mut impl Write) -> Result<(), DumpError> {
    let mut source = SourceWindow::new();
    source.open(path)?;

    let view = source.acquire(0, IDENT_LEN)?;
    let ident = Ident::parse(view)?;
    let little_endian = ident.little_endian;
    let sixty_four_bit = ident.sixty_four_bit();
    let width = match ident.class {
        ElfClass::ThirtyTwo => BitWidth::ThirtyTwo,
        ElfClass::SixtyFour => BitWidth::SixtyFour,
    };

    let view = source.acquire(0, ident.header_size())?;
    let header = ElfHeader::parse(ident, view)?;

    let table_size = header.num_section_entries as usize * header.section_entry_size as usize;
    if table_size == 0 {
        return Ok(());
    }
    let view = source.acquire(header.section_offset, table_size)?;
    let reader = Reader::new(view, little_endian, sixty_four_bit);
    let headers =
        SectionHeader::parse_table(&reader, header.section_entry_size, header.num_section_entries)?;

    let names = headers
        .get(header.string_table_index as usize)
        .ok_or(ParseError::BadSectionIndex(header.string_table_index as usize))?;
    if names.size == 0 {
        return Err(ParseError::BadSectionIndex(header.string_table_index as usize).into());
    }
    let (names_offset, names_size) = (names.offset, names.size);
    let view = source.acquire(names_offset, names_size as usize)?;
    let sections = SectionTable::resolve(headers, view)?;

    let Some(symtab) = sections.find_symbol_table() else {
        return Ok(());
    };
    if symtab.size == 0 {
        return Ok(());
    }
    let strings = sections
        .get(symtab.link as usize)
        .ok_or(ParseError::BadSectionIndex(symtab.link as usize))?;
    let (symtab_offset, symtab_size) = (symtab.offset, symtab.size);
    let (strings_offset, strings_size) = (strings.offset, strings.size);

    let view = source.acquire(symtab_offset, symtab_size as usize)?;
    let reader = Reader::new(view, little_endian, sixty_four_bit);
    let records = SymbolRecord::parse_table(&reader)?;
    if strings_size == 0 {
        return Ok(()); // every symbol is nameless
    }

    let view = source.acquire(strings_offset, strings_size as usize)?;
    let mut list = OrderedList::new();
    // push_front reverses, so feeding the records back to front leaves the
    // list in discovery order. With -p -r the forward feed is the reversal.
    let forward = opts.no_sort && opts.reverse;
    let picked = records.iter().filter(|&rec| selected(rec, opts));
    let ordered: Vec<&SymbolRecord> = if forward {
        picked.collect()
    } else {
        let mut v: Vec<&SymbolRecord> = picked.collect();
        v.reverse();
        v
    };
    for rec in ordered {
        let name = read_table_bytes(view, rec.name_index as usize)?;
        if name.is_empty() {
            continue; // the null entry and section symbols
        }
        list.push_front(SymbolLine {
            binding: rec.binding,
            stype: rec.stype,
            shndx: rec.shndx,
            name,
            value: rec.value,
        })?;
    }
    source.close()?;

    if !opts.no_sort {
        if opts.reverse {
            list.sort(|a, b| compare_names(b, a))?;
        } else {
            list.sort(compare_names)?;
        }
    }

    let mut ctx = WriterContext::new();
    ctx.set_debug_sections(opts.debug_sections);
    ctx.load_sections(&sections);
    let result = print_all(&mut list, &ctx, width, out);
    ctx.unload_sections();
    result
}

fn print_all(
    list: &mut OrderedList<SymbolLine>,
    ctx: &WriterContext,
    width: BitWidth,
    out: &mut impl Write,
) -> Result<(), DumpError> {
    loop {
        match list.pop_front() {
            Ok(line) => {
                if let Err(err) = line.print(ctx, width, out) {
                    // a failed line stops the dump; drop whatever is left
                    list.delete_all(None);
                    return Err(err.into());
                }
            }
            Err(ListError::Empty) => return Ok(()),
            Err(err) => return Err(err.into()),
        }
    }
}

/// Symbol selection per -g and -u.
fn selected(rec: &SymbolRecord, opts: Options) -> bool {
    if opts.undefined_only && rec.shndx != SHN_UNDEF {
        return false;
    }
    if opts.extern_only && rec.binding == Binding::Local {
        return false;
    }
    true
}

/// Names compare byte-wise; a strict prefix sorts before the longer name.
/// Ties keep discovery order because the sort is stable.
fn compare_names(a: &SymbolLine, b: &SymbolLine) -> Ordering {
    a.name.cmp(&b.name)
}

/// Builders for small synthetic ELF files, shared with the batch tests.
/// Section contents come first, the section header table last, so offsets
/// are just running positions.
#[cfg(test)]
pub(crate) mod testutil {
    use crate::elf::SHT_SYMTAB;
    use std::io::Write as _;

    pub(crate) fn sym64(name_index: u32, info: u8, shndx: u16, value: u64) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&name_index.to_le_bytes());
        b.push(info);
        b.push(0);
        b.extend_from_slice(&shndx.to_le_bytes());
        b.extend_from_slice(&value.to_le_bytes());
        b.extend_from_slice(&0u64.to_le_bytes());
        b
    }

    pub(crate) fn shdr64(name_index: u32, stype: u32, offset: u64, size: u64, link: u32, entsize: u64) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&name_index.to_le_bytes());
        b.extend_from_slice(&stype.to_le_bytes());
        b.extend_from_slice(&0u64.to_le_bytes());
        b.extend_from_slice(&0u64.to_le_bytes());
        b.extend_from_slice(&offset.to_le_bytes());
        b.extend_from_slice(&size.to_le_bytes());
        b.extend_from_slice(&link.to_le_bytes());
        b.extend_from_slice(&0u32.to_le_bytes());
        b.extend_from_slice(&0u64.to_le_bytes());
        b.extend_from_slice(&entsize.to_le_bytes());
        b
    }

    pub(crate) fn header64(shoff: u64, shnum: u16, shstrndx: u16) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
        b.extend_from_slice(&[0u8; 8]);
        b.extend_from_slice(&2u16.to_le_bytes()); // e_type EXEC
        b.extend_from_slice(&0x3eu16.to_le_bytes()); // e_machine x86-64
        b.extend_from_slice(&1u32.to_le_bytes());
        b.extend_from_slice(&0x40_1000u64.to_le_bytes()); // e_entry
        b.extend_from_slice(&0u64.to_le_bytes()); // e_phoff
        b.extend_from_slice(&shoff.to_le_bytes());
        b.extend_from_slice(&0u32.to_le_bytes());
        b.extend_from_slice(&64u16.to_le_bytes());
        b.extend_from_slice(&0u16.to_le_bytes());
        b.extend_from_slice(&0u16.to_le_bytes());
        b.extend_from_slice(&64u16.to_le_bytes());
        b.extend_from_slice(&shnum.to_le_bytes());
        b.extend_from_slice(&shstrndx.to_le_bytes());
        assert_eq!(b.len(), 64);
        b
    }

    /// Sections: null, .text, .data, .bss, .symtab, .strtab, .shstrtab.
    /// Symbols: main (global func, .text), g_counter (global object, .data),
    /// stack_top (local object, .bss), req (global, undefined).
    pub(crate) fn build_elf64() -> Vec<u8> {
        let shstrtab = b"\0.text\0.data\0.bss\0.symtab\0.strtab\0.shstrtab\0";
        let strtab = b"\0main\0g_counter\0stack_top\0req\0";

        let mut body: Vec<u8> = Vec::new(); // everything after the 64-byte header
        let base = 64u64;

        let text_off = base + body.len() as u64;
        body.extend_from_slice(&[0x90; 16]);
        let data_off = base + body.len() as u64;
        body.extend_from_slice(&[0u8; 8]);

        let symtab_off = base + body.len() as u64;
        body.extend(sym64(0, 0, 0, 0));
        body.extend(sym64(1, 0x12, 1, 0x40_1000)); // main: GLOBAL FUNC
        body.extend(sym64(6, 0x11, 2, 0x40_4000)); // g_counter: GLOBAL OBJECT
        body.extend(sym64(16, 0x01, 3, 0x40_4100)); // stack_top: LOCAL OBJECT
        body.extend(sym64(26, 0x10, 0, 0)); // req: GLOBAL NOTYPE undefined
        let symtab_size = base + body.len() as u64 - symtab_off;

        let strtab_off = base + body.len() as u64;
        body.extend_from_slice(strtab);
        let shstrtab_off = base + body.len() as u64;
        body.extend_from_slice(shstrtab);

        let shoff = base + body.len() as u64;
        body.extend(shdr64(0, 0, 0, 0, 0, 0));
        body.extend(shdr64(1, 1, text_off, 16, 0, 0)); // .text
        body.extend(shdr64(7, 1, data_off, 8, 0, 0)); // .data
        body.extend(shdr64(13, 8, 0, 0x100, 0, 0)); // .bss (NOBITS)
        body.extend(shdr64(18, SHT_SYMTAB, symtab_off, symtab_size, 5, 24)); // .symtab
        body.extend(shdr64(26, 3, strtab_off, strtab.len() as u64, 0, 0)); // .strtab
        body.extend(shdr64(34, 3, shstrtab_off, shstrtab.len() as u64, 0, 0)); // .shstrtab

        let mut file = header64(shoff, 7, 6);
        file.extend(body);
        file
    }

    pub(crate) fn write_target(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;
    use crate::elf::SHT_SYMTAB;

    fn run(bytes: &[u8], opts: Options) -> String {
        let target = write_target(bytes);
        let mut out = Vec::new();
        dump_file(target.path(), opts, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn sorted_dump() {
        let output = run(&build_elf64(), Options::default());
        assert_eq!(
            output,
            "0000000000404000 D g_counter\n\
             0000000000401000 T main\n\
             \u{20}                U req\n\
             0000000000404100 b stack_top\n"
        );
    }

    #[test]
    fn unsorted_dump_keeps_table_order() {
        let opts = Options {
            no_sort: true,
            ..Options::default()
        };
        let output = run(&build_elf64(), opts);
        let names: Vec<&str> = output
            .lines()
            .map(|l| l.rsplit(' ').next().unwrap())
            .collect();
        assert_eq!(names, vec!["main", "g_counter", "stack_top", "req"]);
    }

    #[test]
    fn reverse_sorted_dump() {
        let opts = Options {
            reverse: true,
            ..Options::default()
        };
        let output = run(&build_elf64(), opts);
        let names: Vec<&str> = output
            .lines()
            .map(|l| l.rsplit(' ').next().unwrap())
            .collect();
        assert_eq!(names, vec!["stack_top", "req", "main", "g_counter"]);
    }

    #[test]
    fn unsorted_reverse_flips_table_order() {
        let opts = Options {
            no_sort: true,
            reverse: true,
            ..Options::default()
        };
        let output = run(&build_elf64(), opts);
        let names: Vec<&str> = output
            .lines()
            .map(|l| l.rsplit(' ').next().unwrap())
            .collect();
        assert_eq!(names, vec!["req", "stack_top", "g_counter", "main"]);
    }

    #[test]
    fn undefined_only() {
        let opts = Options {
            undefined_only: true,
            ..Options::default()
        };
        let output = run(&build_elf64(), opts);
        assert_eq!(output, "                 U req\n");
    }

    #[test]
    fn extern_only_drops_locals() {
        let opts = Options {
            extern_only: true,
            ..Options::default()
        };
        let output = run(&build_elf64(), opts);
        assert!(!output.contains("stack_top"));
        assert!(output.contains("g_counter"));
    }

    #[test]
    fn thirty_two_bit_values_are_eight_digits() {
        // minimal 32-bit file: null, .text, .symtab, .strtab, .shstrtab
        fn shdr32(name_index: u32, stype: u32, offset: u32, size: u32, link: u32, entsize: u32) -> Vec<u8> {
            let mut b = Vec::new();
            for word in [name_index, stype, 0, 0, offset, size, link, 0, 0, entsize] {
                b.extend_from_slice(&word.to_le_bytes());
            }
            b
        }

        let shstrtab = b"\0.text\0.symtab\0.strtab\0.shstrtab\0";
        let strtab = b"\0main\0";
        let mut symtab = vec![0u8; 16]; // null entry
        symtab.extend_from_slice(&1u32.to_le_bytes());
        symtab.extend_from_slice(&0x0804_8000u32.to_le_bytes());
        symtab.extend_from_slice(&0u32.to_le_bytes());
        symtab.push(0x12); // GLOBAL FUNC
        symtab.push(0);
        symtab.extend_from_slice(&1u16.to_le_bytes());

        let mut body: Vec<u8> = Vec::new();
        let base = 52u32;
        let symtab_off = base + body.len() as u32;
        body.extend_from_slice(&symtab);
        let strtab_off = base + body.len() as u32;
        body.extend_from_slice(strtab);
        let shstrtab_off = base + body.len() as u32;
        body.extend_from_slice(shstrtab);
        let shoff = base + body.len() as u32;
        body.extend(shdr32(0, 0, 0, 0, 0, 0));
        body.extend(shdr32(1, 1, 0, 0, 0, 0)); // .text (contents elsewhere)
        body.extend(shdr32(7, SHT_SYMTAB, symtab_off, symtab.len() as u32, 3, 16));
        body.extend(shdr32(15, 3, strtab_off, strtab.len() as u32, 0, 0));
        body.extend(shdr32(23, 3, shstrtab_off, shstrtab.len() as u32, 0, 0));

        let mut file = Vec::new();
        file.extend_from_slice(&[0x7f, b'E', b'L', b'F', 1, 1, 1, 0]);
        file.extend_from_slice(&[0u8; 8]);
        file.extend_from_slice(&2u16.to_le_bytes());
        file.extend_from_slice(&3u16.to_le_bytes()); // e_machine x86
        file.extend_from_slice(&1u32.to_le_bytes());
        file.extend_from_slice(&0x0804_8000u32.to_le_bytes());
        file.extend_from_slice(&0u32.to_le_bytes());
        file.extend_from_slice(&shoff.to_le_bytes());
        file.extend_from_slice(&0u32.to_le_bytes());
        file.extend_from_slice(&52u16.to_le_bytes());
        file.extend_from_slice(&0u16.to_le_bytes());
        file.extend_from_slice(&0u16.to_le_bytes());
        file.extend_from_slice(&40u16.to_le_bytes());
        file.extend_from_slice(&5u16.to_le_bytes());
        file.extend_from_slice(&4u16.to_le_bytes());
        assert_eq!(file.len(), 52);
        file.extend(body);

        let output = run(&file, Options::default());
        assert_eq!(output, "08048000 T main\n");
    }

    #[test]
    fn not_an_elf_file_is_a_format_error() {
        let target = write_target(b"definitely not an ELF");
        let mut out = Vec::new();
        let err = dump_file(target.path(), Options::default(), &mut out).unwrap_err();
        assert!(matches!(err, DumpError::Format(ParseError::BadMagic)));
        assert!(out.is_empty());
    }

    #[test]
    fn truncated_file_is_a_format_error() {
        let target = write_target(&[0x7f, b'E', b'L']);
        let mut out = Vec::new();
        let err = dump_file(target.path(), Options::default(), &mut out).unwrap_err();
        assert!(matches!(err, DumpError::Format(ParseError::TooSmall { .. })));
    }

    #[test]
    fn section_table_past_the_end_is_a_format_outcome() {
        let mut bytes = build_elf64();
        // aim e_shoff far past the end of the file
        bytes[40..48].copy_from_slice(&(1u64 << 40).to_le_bytes());
        let target = write_target(&bytes);
        let mut out = Vec::new();
        let err = dump_file(target.path(), Options::default(), &mut out).unwrap_err();
        assert!(matches!(
            err,
            DumpError::File(WindowError::OffsetPastEnd { .. })
        ));
        assert!(err.is_format());
        assert!(!err.is_fatal());
        assert!(!DumpError::File(WindowError::NotFound).is_format());
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let mut out = Vec::new();
        let err = dump_file(
            Path::new("/nonexistent/missing.o"),
            Options::default(),
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, DumpError::File(WindowError::NotFound)));
    }
}
