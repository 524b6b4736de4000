//! The glyph atlas and the backend that reads and writes it.
//!
//! The metrics codec never touches pixels. Everything it needs from the atlas
//! goes through [`AtlasBackend`], so a font can be loaded against any image
//! library, or against a stub that only knows sizes.

use std::collections::BTreeMap;
use std::path::Path;

use crate::{AtlasMode, FontError};

/// An in-memory atlas image.
pub trait AtlasImage {
    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);
    fn mode(&self) -> AtlasMode;
}

pub trait AtlasBackend {
    type Image: AtlasImage;

    /// Reads the image at `path`. Fails with [`FontError::ImageOpen`].
    fn open(&self, path: &Path) -> Result<Self::Image, FontError>;

    /// Returns a duplicate that does not depend on the source file.
    fn copy(&self, image: &Self::Image) -> Self::Image;

    /// Writes `image` to `path`. `options` are interpreted by the backend only.
    fn save(
        &self,
        image: &Self::Image,
        path: &Path,
        options: &SaveOptions,
    ) -> Result<(), FontError>;
}

/// Backend specific options for saving an atlas.
///
/// Keys and values are opaque strings; the font codec passes them through
/// without looking at them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    values: BTreeMap<String, String>,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(feature = "image-backend")]
pub use self::image_backend::ImageBackend;

#[cfg(feature = "image-backend")]
mod image_backend {
    use std::fs::File;
    use std::io::BufWriter;
    use std::path::Path;

    use image::codecs::png::{CompressionType, FilterType, PngEncoder};
    use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
    use log::debug;

    use super::{AtlasBackend, AtlasImage, SaveOptions};
    use crate::{AtlasMode, FontError};

    const KNOWN_OPTIONS: [&str; 2] = ["format", "compression"];

    /// Atlas backend built on the `image` crate.
    ///
    /// Recognized save options:
    /// - `format`: file extension of the output format (`png`, `bmp`, `pbm`, ...),
    ///   overriding the one implied by the path
    /// - `compression`: `fast`, `default` or `best`; PNG only
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ImageBackend;

    impl AtlasImage for DynamicImage {
        fn dimensions(&self) -> (u32, u32) {
            GenericImageView::dimensions(self)
        }

        fn mode(&self) -> AtlasMode {
            match self.color() {
                ColorType::L8 | ColorType::L16 => AtlasMode::Luma,
                ColorType::La8 | ColorType::La16 => AtlasMode::LumaAlpha,
                ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => AtlasMode::Rgb,
                ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => AtlasMode::Rgba,
                other => AtlasMode::Other(format!("{other:?}")),
            }
        }
    }

    fn save_error(path: &Path, message: impl ToString) -> FontError {
        FontError::ImageSave {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    fn output_format(path: &Path, options: &SaveOptions) -> Result<ImageFormat, FontError> {
        match options.get("format") {
            Some(ext) => ImageFormat::from_extension(ext)
                .ok_or_else(|| save_error(path, format!("unknown image format {ext:?}"))),
            None => ImageFormat::from_path(path).map_err(|e| save_error(path, e)),
        }
    }

    fn png_compression(path: &Path, options: &SaveOptions) -> Result<CompressionType, FontError> {
        match options.get("compression") {
            None | Some("default") => Ok(CompressionType::Default),
            Some("fast") => Ok(CompressionType::Fast),
            Some("best") => Ok(CompressionType::Best),
            Some(other) => Err(save_error(path, format!("unknown PNG compression {other:?}"))),
        }
    }

    impl AtlasBackend for ImageBackend {
        type Image = DynamicImage;

        fn open(&self, path: &Path) -> Result<DynamicImage, FontError> {
            let image = image::open(path).map_err(|e| FontError::ImageOpen {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            debug!(
                "Opened atlas {}: {}x{} {}",
                path.display(),
                image.width(),
                image.height(),
                AtlasImage::mode(&image)
            );
            Ok(image)
        }

        fn copy(&self, image: &DynamicImage) -> DynamicImage {
            image.clone()
        }

        fn save(
            &self,
            image: &DynamicImage,
            path: &Path,
            options: &SaveOptions,
        ) -> Result<(), FontError> {
            for (key, value) in options.iter() {
                if !KNOWN_OPTIONS.contains(&key) {
                    debug!("Ignoring atlas save option {key}={value}");
                }
            }

            let format = output_format(path, options)?;
            if format == ImageFormat::Png {
                let compression = png_compression(path, options)?;
                let writer = BufWriter::new(File::create(path)?);
                let encoder =
                    PngEncoder::new_with_quality(writer, compression, FilterType::Adaptive);
                image.write_with_encoder(encoder).map_err(|e| save_error(path, e))?;
            } else {
                if options.get("compression").is_some() {
                    debug!("Compression option has no effect for {format:?}");
                }
                image.save_with_format(path, format).map_err(|e| save_error(path, e))?;
            }
            debug!("Saved atlas {} as {format:?}", path.display());
            Ok(())
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_options_bag() {
        let mut options = SaveOptions::new().with("format", "png");
        assert!(!options.is_empty());
        options.set("compression", "best");
        options.set("format", "bmp");
        assert_eq!(options.get("format"), Some("bmp"));
        assert_eq!(options.get("missing"), None);
        let keys: Vec<&str> = options.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["compression", "format"]);
    }
}
