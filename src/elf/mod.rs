//! Just enough ELF decoding for a symbol listing: the ident and header, the
//! section header table with resolved names, and the symbol table. Every
//! region is handed in as a window mapped by `SourceWindow`; nothing in here
//! touches the file itself. All resolved names are owned copies so they stay
//! valid after their window is remapped.
//! Quick ELF reference: https://en.wikipedia.org/wiki/Executable_and_Linkable_Format
pub mod header;
pub mod io;
pub mod sections;
pub mod symbols;

pub use header::*;
pub use io::*;
pub use sections::*;
pub use symbols::*;
