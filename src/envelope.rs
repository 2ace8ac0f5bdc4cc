//! Turn the bytes of a save file into its JSON document.
//!
//! Saves come in two shapes:
//!
//! - Plain: the JSON document is written directly (optionally behind a
//!   UTF-8 byte order mark)
//! - Compressed: the document is cut into one or more chunks, each a 16 byte
//!   header followed by a deflate family block
//!
//! ```text
//! chunk
//! ├── magic            u32 le (0xFEEDA1E5)
//! ├── compressed_len   u32 le
//! ├── decompressed_len u32 le
//! ├── reserved         u32 le
//! └── block            [u8; compressed_len]
//! ```
//!
//! Inflating every chunk in order and concatenating the output yields the
//! document. The game pads its write buffer with NUL bytes, which are
//! stripped from the end of the text.
//!
//! Failures are split in two groups (see [`ErrorCategory`](crate::ErrorCategory)):
//! bytes that don't follow the layout above are a format error, while a
//! chunk whose block doesn't inflate to the declared size is corrupt data.
//! The latter is what a reader observes when the game is still writing the
//! file, so callers may want to read the file again after a short delay.

mod errors;
mod file;
mod header;

pub use errors::*;
pub use file::*;
pub use header::*;
