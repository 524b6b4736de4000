//! # pilfont: PIL bitmap font reader and writer
//!
//! A PIL bitmap font is a pair of files:
//!
//! - a `.pil` **metrics file** holding a short text header and one fixed-size
//!   binary record per character code, telling where to crop each glyph from
//!   the atlas and where to paste it relative to the pen
//! - a **glyph atlas** image (usually `.pbm` or `.png`) with all glyph bitmaps
//!   packed side by side
//!
//! This crate is a codec: it reads and writes the metrics table losslessly and
//! hands the atlas to an [`AtlasBackend`]. It does not render text.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # #[cfg(feature = "image-backend")]
//! # {
//! use pilfont::{PilFont, SaveOptions};
//! use std::path::Path;
//!
//! let font = PilFont::load("10x20.pil", "10x20.pbm")?;
//! println!("line height {}, {} glyphs", font.ysize, font.glyphs.len());
//!
//! let a = font.glyph(b'A' as usize)?;
//! println!("'A' advances by {:?}", a.advance);
//!
//! font.save("copy.pil", Some(Path::new("copy.png")), &SaveOptions::new())?;
//! # }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `image-backend` (default): [`ImageBackend`], an atlas backend built on the
//!   `image` crate, plus [`PilFont::load`] and [`PilFont::save`]. Without it,
//!   supply your own backend to [`PilFont::load_with`] and [`PilFont::save_with`].
//!
//! ## Error Handling
//!
//! Every operation returns `Result<T, FontError>`. Nothing is retried and no
//! partially decoded table is ever returned.

pub mod atlas;
pub mod metrics;
mod models;
pub mod record;
mod utils;

#[cfg(feature = "image-backend")]
pub use crate::atlas::ImageBackend;
pub use crate::atlas::{AtlasBackend, AtlasImage, SaveOptions};
pub use crate::metrics::{decode_metrics, read_metrics, to_pil_bytes, write_metrics};
pub use crate::models::*;
pub use crate::record::RECORD_SIZE;
pub use crate::utils::{glyphs_outside_atlas, ink_extent};

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::ops::Index;
use std::path::Path;

use log::{debug, info};

impl<A> PilFont<A> {
    pub fn new(atlas: A, ysize: u32, glyphs: Vec<Glyph>) -> Self {
        Self {
            atlas,
            ysize,
            glyphs,
        }
    }

    /// Looks up the glyph for a character code.
    pub fn glyph(&self, code: usize) -> Result<&Glyph, FontError> {
        self.glyphs.get(code).ok_or(FontError::IndexOutOfRange {
            index: code,
            len: self.glyphs.len(),
        })
    }

    /// Iterates `(code, glyph)` in table order.
    pub fn glyphs_with_codes(&self) -> impl Iterator<Item = (usize, &Glyph)> {
        self.glyphs.iter().enumerate()
    }

    /// The Latin-1 character for `code`, if the table has a glyph for it
    /// and the code fits in a byte.
    pub fn character(&self, code: usize) -> Option<char> {
        if code >= self.glyphs.len() {
            return None;
        }
        u8::try_from(code).ok().map(char::from)
    }

    /// Serializes the metrics table (not the atlas).
    pub fn to_pil_bytes(&self) -> Vec<u8> {
        metrics::to_pil_bytes(self.ysize, &self.glyphs)
    }
}

/// `font[code]`; panics past the end of the table like slice indexing.
/// Use [`PilFont::glyph`] for a checked lookup.
impl<A> Index<usize> for PilFont<A> {
    type Output = Glyph;

    fn index(&self, code: usize) -> &Glyph {
        &self.glyphs[code]
    }
}

impl<A: AtlasImage> PilFont<A> {
    /// Loads a font from its metrics file and atlas image.
    ///
    /// The atlas is copied out of the backend's image before returning, and
    /// the metrics file is closed on every path out of this function.
    pub fn load_with<B, P, Q>(
        backend: &B,
        metrics_path: P,
        image_path: Q,
    ) -> Result<Self, FontError>
    where
        B: AtlasBackend<Image = A>,
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let metrics_path = metrics_path.as_ref();
        let image_path = image_path.as_ref();
        debug!(
            "Loading PIL font {} with atlas {}",
            metrics_path.display(),
            image_path.display()
        );

        let source = backend.open(image_path)?;
        let (ysize, glyphs) = {
            let file = File::open(metrics_path)?;
            metrics::read_metrics(BufReader::new(file))?
        };
        let atlas = backend.copy(&source);
        drop(source);

        let (width, height) = atlas.dimensions();
        info!(
            "Loaded PIL font {}: ysize {ysize}, {} glyphs, atlas {width}x{height} {}",
            metrics_path.display(),
            glyphs.len(),
            atlas.mode()
        );
        Ok(Self::new(atlas, ysize, glyphs))
    }

    /// Writes the metrics file, and the atlas too when `image_path` is given.
    ///
    /// The atlas is written first. Neither write is transactional: a failure
    /// part way through leaves a truncated file behind.
    pub fn save_with<B, P>(
        &self,
        backend: &B,
        metrics_path: P,
        image_path: Option<&Path>,
        options: &SaveOptions,
    ) -> Result<(), FontError>
    where
        B: AtlasBackend<Image = A>,
        P: AsRef<Path>,
    {
        let metrics_path = metrics_path.as_ref();
        if let Some(image_path) = image_path {
            debug!("Saving atlas to {}", image_path.display());
            backend.save(&self.atlas, image_path, options)?;
        }

        let file = File::create(metrics_path)?;
        metrics::write_metrics(self.ysize, &self.glyphs, BufWriter::new(file))?;
        info!(
            "Saved PIL font {}: {} glyphs",
            metrics_path.display(),
            self.glyphs.len()
        );
        Ok(())
    }
}

#[cfg(feature = "image-backend")]
impl PilFont<image::DynamicImage> {
    /// [`PilFont::load_with`] using the `image` crate.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        metrics_path: P,
        image_path: Q,
    ) -> Result<Self, FontError> {
        Self::load_with(&ImageBackend, metrics_path, image_path)
    }

    /// [`PilFont::save_with`] using the `image` crate.
    pub fn save<P: AsRef<Path>>(
        &self,
        metrics_path: P,
        image_path: Option<&Path>,
        options: &SaveOptions,
    ) -> Result<(), FontError> {
        self.save_with(&ImageBackend, metrics_path, image_path, options)
    }
}
