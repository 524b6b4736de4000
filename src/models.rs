use std::path::PathBuf;

/// Placement and crop metadata for a single glyph.
///
/// A glyph does not know its own character code: the code is the glyph's
/// position in the font's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Glyph {
    /// Pen displacement `(dx, dy)` after the glyph has been placed.
    pub advance: (i16, i16),
    /// Box `(x0, y0, x1, y1)` relative to the pen where the bitmap is pasted.
    pub dest_box: (i16, i16, i16, i16),
    /// Box `(x0, y0, x1, y1)` cropped from the atlas to obtain the bitmap.
    pub src_box: (i16, i16, i16, i16),
}

impl Glyph {
    pub fn new(
        advance: (i16, i16),
        dest_box: (i16, i16, i16, i16),
        src_box: (i16, i16, i16, i16),
    ) -> Self {
        Self {
            advance,
            dest_box,
            src_box,
        }
    }

    /// Width of the source box in atlas pixels (negative for inverted boxes).
    pub fn src_width(&self) -> i32 {
        self.src_box.2 as i32 - self.src_box.0 as i32
    }

    /// Height of the source box in atlas pixels (negative for inverted boxes).
    pub fn src_height(&self) -> i32 {
        self.src_box.3 as i32 - self.src_box.1 as i32
    }
}

/// A PIL bitmap font: one atlas image, a line height and the glyph table.
///
/// Fields are public; replacing them is the only way to modify a font.
#[derive(Debug, Clone, PartialEq)]
pub struct PilFont<A> {
    pub atlas: A,
    pub ysize: u32,
    /// Glyphs in character code order, index == code.
    pub glyphs: Vec<Glyph>,
}

/// Color layout of an atlas image as reported by its backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AtlasMode {
    Luma,
    LumaAlpha,
    Rgb,
    Rgba,
    Other(String),
}

impl std::fmt::Display for AtlasMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtlasMode::Luma => write!(f, "L"),
            AtlasMode::LumaAlpha => write!(f, "LA"),
            AtlasMode::Rgb => write!(f, "RGB"),
            AtlasMode::Rgba => write!(f, "RGBA"),
            AtlasMode::Other(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug)]
pub enum FontError {
    Io(std::io::Error),
    /// A fixed literal of the metrics header did not match.
    /// `offset` is where the literal was expected to start.
    HeaderMismatch {
        offset: u64,
        expected: Vec<u8>,
        found: Vec<u8>,
    },
    /// The ysize field is not a decimal integer.
    MalformedInteger {
        offset: u64,
        text: String,
    },
    /// The record stream ended inside a glyph record.
    TruncatedRecord {
        index: usize,
        offset: u64,
        len: usize,
    },
    ImageOpen {
        path: PathBuf,
        message: String,
    },
    ImageSave {
        path: PathBuf,
        message: String,
    },
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
}

impl FontError {
    /// Offset of the first byte that differs from the expected literal.
    ///
    /// Only meaningful for `HeaderMismatch`; a short read counts as differing
    /// at the first missing byte.
    pub fn mismatch_position(&self) -> Option<u64> {
        match self {
            FontError::HeaderMismatch {
                offset,
                expected,
                found,
            } => {
                let index = expected
                    .iter()
                    .zip(found.iter())
                    .position(|(e, f)| e != f)
                    .unwrap_or(found.len().min(expected.len()));
                Some(offset + index as u64)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for FontError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontError::Io(err) => write!(f, "IO error: {err}"),
            FontError::HeaderMismatch {
                offset,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Incorrect header at {offset:#x}: expected {:?}, got {:?}",
                    String::from_utf8_lossy(expected),
                    String::from_utf8_lossy(found)
                )
            }
            FontError::MalformedInteger { offset, text } => {
                write!(f, "Malformed ysize at {offset:#x}: {text:?} is not a decimal integer")
            }
            FontError::TruncatedRecord { index, offset, len } => {
                write!(
                    f,
                    "Truncated glyph record {index} at {offset:#x}: {len} of 20 bytes"
                )
            }
            FontError::ImageOpen { path, message } => {
                write!(f, "Failed to open atlas {}: {message}", path.display())
            }
            FontError::ImageSave { path, message } => {
                write!(f, "Failed to save atlas {}: {message}", path.display())
            }
            FontError::IndexOutOfRange { index, len } => {
                write!(f, "Glyph index {index} out of range (table has {len} glyphs)")
            }
        }
    }
}

impl std::error::Error for FontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FontError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FontError {
    fn from(err: std::io::Error) -> Self {
        FontError::Io(err)
    }
}
