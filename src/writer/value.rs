//! Value column formatting.

/// Whether values render as 8 or 16 hex digits (ELF class 32 vs 64).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BitWidth {
    ThirtyTwo,
    SixtyFour,
}

/// Lowercase hex, zero-padded to the full column width. Undefined symbols get
/// the same width of spaces so the flag column still lines up.
pub fn format_value(value: u64, undefined: bool, width: BitWidth) -> String {
    match (width, undefined) {
        (BitWidth::ThirtyTwo, false) => format!("{value:08x}"),
        (BitWidth::SixtyFour, false) => format!("{value:016x}"),
        (BitWidth::ThirtyTwo, true) => " ".repeat(8),
        (BitWidth::SixtyFour, true) => " ".repeat(16),
    }
}
