use crate::envelope::{decompress_with, DecodeOptions};
use crate::keys::{deobfuscate_with, Deobfuscated, KeyResolver, MapOptions};
use crate::{Error, Value};

/// Turns a raw save into a renamed document.
///
/// Runs the three stages a save goes through before anything can be read
/// out of it: the container is unpacked, the text is parsed, and the keys
/// are renamed with the resolver. A decoder holds no state between calls
/// and can be shared across threads when the resolver can.
///
/// ```
/// use std::collections::HashMap;
/// use waypoint::SaveDecoder;
///
/// let mapping: HashMap<&str, &str> = [("F2P", "Version"), ("<h0", "PlayerStateData")]
///     .into_iter()
///     .collect();
///
/// let raw = br#"{"F2P": 4720, "<h0": {"Units": 12}}"#;
/// let decoded = SaveDecoder::new(&mapping).decode(raw).unwrap();
///
/// let doc = decoded.document();
/// assert_eq!(doc.get("Version").and_then(|x| x.as_u64()), Some(4720));
/// assert!(decoded.unresolved().contains("Units"));
/// ```
#[derive(Debug)]
pub struct SaveDecoder<'a, R: ?Sized> {
    resolver: &'a R,
    decode: DecodeOptions,
    map: MapOptions,
}

impl<'a, R> SaveDecoder<'a, R>
where
    R: KeyResolver + ?Sized,
{
    /// Creates a decoder with default options
    pub fn new(resolver: &'a R) -> Self {
        SaveDecoder {
            resolver,
            decode: DecodeOptions::default(),
            map: MapOptions::default(),
        }
    }

    /// Sets how the container is unpacked
    pub fn with_decode_options(mut self, options: DecodeOptions) -> Self {
        self.decode = options;
        self
    }

    /// Sets how keys are renamed
    pub fn with_map_options(mut self, options: MapOptions) -> Self {
        self.map = options;
        self
    }

    /// Decodes a raw save
    pub fn decode(&self, raw: &[u8]) -> Result<Deobfuscated, Error> {
        let text = decompress_with(raw, &self.decode)?;
        let doc: Value = text.parse()?;
        tracing::debug!(bytes = text.len(), nodes = doc.node_count(), "parsed save document");

        let result = deobfuscate_with(doc, self.resolver, &self.map);
        if let Some(incomplete) = result.mapping_incomplete() {
            tracing::warn!("{}", incomplete);
        }

        Ok(result)
    }
}

impl<R: ?Sized> Clone for SaveDecoder<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: ?Sized> Copy for SaveDecoder<'_, R> {}
