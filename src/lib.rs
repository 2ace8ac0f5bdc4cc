/*!

Recover star systems, planets, and player bases from the compressed,
key-obfuscated save files of a space exploration game.

Waypoint is the decoding core of a discovery sync pipeline: it turns the raw
bytes on disk into typed entities with stable field names and tells callers
what changed since the last sync.

## Features

- ✔ Tolerant: Records the game reshapes or this crate doesn't know about are
  skipped and reported, never fatal
- ✔ Classified errors: A save caught mid-write is distinguishable from a file
  that will never decode
- ✔ Versioned: Key mapping tables and record locations are data, not code
- ✔ Pure: No I/O, no global state, no retries. Callers own every policy

## Quick Start

A save goes through four stages. Each is usable on its own.

```rust
use waypoint::{discovery, keys::KeyMapping, SaveDecoder};

// Obfuscated key to canonical name, as published per game release
let mapping: KeyMapping = [
    ("fDu", "DiscoveryManagerData"),
    ("ETO", "DiscoveryData-v1"),
    ("OsQ", "Store"),
    ("?fB", "Record"),
    ("Dtp", "DiscoveryType"),
    ("NKm", "Name"),
    ("Sek", "GlyphCode"),
]
.into_iter()
.collect();

// Some saves are stored as plain text, others in zlib chunks
let raw = br#"{"fDu": {"ETO": {"OsQ": {"?fB": [
    {"Dtp": "SolarSystem", "NKm": "Hyperion", "Sek": "0123ABCDEF01"}
]}}}}"#;

let decoded = SaveDecoder::new(&mapping).decode(raw)?;
assert!(decoded.mapping_incomplete().is_none());

let extraction = discovery::extract(decoded.document());
let hyperion = &extraction.systems[0];
assert_eq!(hyperion.name.as_deref(), Some("Hyperion"));

// Nothing was known before, so the system is new
let change = discovery::compare(None, hyperion);
assert!(change.is_new && change.is_significant);
# Ok::<(), waypoint::Error>(())
```

## Errors

Decoding errors carry an [`ErrorCategory`]. A `Format` error is permanent:
the bytes are not a save this crate understands. `CorruptData` usually means
the game was still writing the file, and reading it again later is worth a
try. Extraction and comparison can't fail; they report what they dropped in
[`discovery::ExtractDiagnostics`].

## Logging

The crate logs through [`tracing`](https://docs.rs/tracing). Per pass
summaries go to `debug`, per chunk and per record detail to `trace`, and
unresolved or colliding keys to `warn`.

*/

pub mod discovery;
pub mod envelope;
mod errors;
pub mod keys;
mod save;
mod util;
mod value;

pub use self::errors::*;
pub use self::save::SaveDecoder;
pub use self::value::{Number, Object, Value};

#[doc(inline)]
pub use self::discovery::extract;
#[doc(inline)]
pub use self::envelope::decompress;
#[doc(inline)]
pub use self::keys::deobfuscate;
