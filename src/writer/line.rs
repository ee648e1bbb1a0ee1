//! One output line per symbol: `<value> <flag> <name>\n`.
use super::{BitWidth, SHN_UNDEF, WriterContext, WriterError, format_value};
use crate::elf::{Binding, SymbolType};
use std::io::Write;

/// A symbol ready for display. The name is an owned copy so the line stays
/// valid after the decoder windows are released. It is raw bytes, not a
/// `String`: names need not be UTF-8 and are never rewritten.
#[derive(Debug)]
pub struct SymbolLine {
    pub binding: Binding,
    pub stype: SymbolType,
    pub shndx: u16,
    pub name: Vec<u8>,
    pub value: u64,
}

impl SymbolLine {
    /// Emit value, space, flag, space, name, newline. Every write is checked;
    /// a short or failed write stops the remaining fields and is surfaced,
    /// never retried. The name bytes go out untruncated and unescaped.
    pub fn print(
        &self,
        ctx: &WriterContext,
        width: BitWidth,
        out: &mut impl Write,
    ) -> Result<(), WriterError> {
        let undefined = self.shndx == SHN_UNDEF;
        let value = format_value(self.value, undefined, width);
        let flag = ctx.flag(self.binding, self.shndx, self.stype)?;

        write_field(out, value.as_bytes())?;
        write_field(out, b" ")?;
        write_field(out, &[flag as u8])?; // flags are all ASCII
        write_field(out, b" ")?;
        write_field(out, &self.name)?;
        write_field(out, b"\n")
    }
}

/// A short write (fewer bytes than requested) is `Partial`; an error result
/// is `Write`. The two are distinct failures and neither is retried.
fn write_field(out: &mut impl Write, bytes: &[u8]) -> Result<(), WriterError> {
    let written = out.write(bytes).map_err(WriterError::Write)?;
    if written < bytes.len() {
        return Err(WriterError::Partial {
            expected: bytes.len(),
            written,
        });
    }
    Ok(())
}
