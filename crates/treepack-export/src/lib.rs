//! Atomic artifact writers for treepack.
//!
//! Everything here shares one persistence discipline: artifacts are fully
//! encoded in memory, then committed through [`write_atomic`], so a
//! destination path never holds a partially written file.

mod archive;
mod atomic;
mod context;
mod pdf;

pub use archive::{ArchiveError, pack, pack_atomic};
pub use atomic::{WriteError, write_atomic};
pub use context::{assemble, tree_text};
pub use pdf::{PdfOptions, PdfRenderer, RenderError};
