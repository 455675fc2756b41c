//! Output filename derivation.
//!
//! Every compressed file is named after its input: the final extension is
//! stripped and `-compressed.<ext>` is appended, where `<ext>` is the output
//! codec's canonical extension.
//!
//! - `holiday.jpeg` → `holiday-compressed.jpg` (JPEG)
//! - `scan.final.png` → `scan.final-compressed.webp` (WebP)
//! - `README` → `README-compressed.png` (PNG)

use crate::imaging::Codec;
use std::collections::HashSet;

/// Fixed suffix between the input stem and the output extension.
pub const OUTPUT_SUFFIX: &str = "-compressed";

/// Strip the last `.ext` from a filename.
///
/// Only a dot followed by at least one character counts, so `photo.` keeps
/// its trailing dot. A leading-dot name like `.hidden` is all extension.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() => &name[..pos],
        _ => name,
    }
}

/// Output filename for `original` encoded with `codec`.
pub fn output_name(original: &str, codec: Codec) -> String {
    format!(
        "{}{}.{}",
        strip_extension(original),
        OUTPUT_SUFFIX,
        codec.extension()
    )
}

/// Hands out output names, numbering repeats within one batch.
///
/// `a.png` and `a.jpg` both map to `a-compressed.jpg`; the second one gets
/// `a-compressed-2.jpg`. Comparison ignores ASCII case so the names stay
/// distinct on case-insensitive filesystems.
#[derive(Debug, Default)]
pub struct OutputNames {
    taken: HashSet<String>,
}

impl OutputNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, original: &str, codec: Codec) -> String {
        let first = output_name(original, codec);
        if self.taken.insert(first.to_ascii_lowercase()) {
            return first;
        }
        let stem = format!("{}{}", strip_extension(original), OUTPUT_SUFFIX);
        let mut n = 2;
        loop {
            let candidate = format!("{stem}-{n}.{}", codec.extension());
            if self.taken.insert(candidate.to_ascii_lowercase()) {
                return candidate;
            }
            n += 1;
        }
    }
}
