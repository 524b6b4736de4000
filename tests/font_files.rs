use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use pilfont::{
    AtlasBackend, AtlasImage, AtlasMode, FontError, Glyph, PilFont, SaveOptions, decode_metrics,
    glyphs_outside_atlas, to_pil_bytes,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Atlas that only knows its size and mode.
#[derive(Debug, Clone, PartialEq)]
struct StubAtlas {
    width: u32,
    height: u32,
    mode: AtlasMode,
}

impl AtlasImage for StubAtlas {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn mode(&self) -> AtlasMode {
        self.mode.clone()
    }
}

/// Stores atlases as a `WIDTHxHEIGHT` text line.
#[derive(Default)]
struct StubBackend {
    copies: RefCell<usize>,
    saved: RefCell<Vec<(PathBuf, SaveOptions)>>,
}

impl AtlasBackend for StubBackend {
    type Image = StubAtlas;

    fn open(&self, path: &Path) -> Result<StubAtlas, FontError> {
        let open_error = |message: String| FontError::ImageOpen {
            path: path.to_path_buf(),
            message,
        };
        let text = fs::read_to_string(path).map_err(|e| open_error(e.to_string()))?;
        let (width, height) = text
            .trim()
            .split_once('x')
            .ok_or_else(|| open_error(format!("bad stub atlas {text:?}")))?;
        Ok(StubAtlas {
            width: width.parse().map_err(|_| open_error(text.clone()))?,
            height: height.parse().map_err(|_| open_error(text.clone()))?,
            mode: AtlasMode::Luma,
        })
    }

    fn copy(&self, image: &StubAtlas) -> StubAtlas {
        *self.copies.borrow_mut() += 1;
        image.clone()
    }

    fn save(&self, image: &StubAtlas, path: &Path, options: &SaveOptions) -> Result<(), FontError> {
        fs::write(path, format!("{}x{}\n", image.width, image.height))?;
        self.saved.borrow_mut().push((path.to_path_buf(), options.clone()));
        Ok(())
    }
}

fn sample_glyphs() -> Vec<Glyph> {
    vec![
        Glyph::new((6, 0), (0, -16, 6, 0), (0, 0, 6, 16)),
        Glyph::new((6, 0), (0, -16, 6, 0), (6, 0, 12, 16)),
    ]
}

fn write_sample(dir: &Path) -> (PathBuf, PathBuf) {
    let metrics = dir.join("sample.pil");
    let atlas = dir.join("sample.pbm");
    fs::write(&metrics, to_pil_bytes(20, &sample_glyphs())).unwrap();
    fs::write(&atlas, "12x16\n").unwrap();
    (metrics, atlas)
}

#[test]
fn load_reads_table_and_copies_atlas() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let (metrics, atlas) = write_sample(dir.path());
    let backend = StubBackend::default();

    let font = PilFont::load_with(&backend, &metrics, &atlas).unwrap();
    assert_eq!(font.ysize, 20);
    assert_eq!(font.glyphs, sample_glyphs());
    assert_eq!(font.atlas.dimensions(), (12, 16));
    assert_eq!(*backend.copies.borrow(), 1);
    assert_eq!(font.glyph(1).unwrap().src_box, (6, 0, 12, 16));
    assert!(glyphs_outside_atlas(&font).is_empty());
}

#[test]
fn save_then_load_round_trips() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let (metrics, atlas) = write_sample(dir.path());
    let backend = StubBackend::default();
    let mut font = PilFont::load_with(&backend, &metrics, &atlas).unwrap();
    font.ysize = 123;
    font.glyphs.push(Glyph::new((-1, 2), (i16::MIN, -3, 4, i16::MAX), (5, 6, 7, 8)));

    let out_metrics = dir.path().join("out.pil");
    let out_atlas = dir.path().join("out.pbm");
    let options = SaveOptions::new().with("compression", "best");
    font.save_with(&backend, &out_metrics, Some(&out_atlas), &options).unwrap();

    let saved = backend.saved.borrow();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, out_atlas);
    assert_eq!(saved[0].1.get("compression"), Some("best"));
    drop(saved);

    let reloaded = PilFont::load_with(&backend, &out_metrics, &out_atlas).unwrap();
    assert_eq!(reloaded.ysize, 123);
    assert_eq!(reloaded.glyphs, font.glyphs);
    assert_eq!(reloaded.atlas, font.atlas);
}

#[test]
fn save_without_image_path_writes_only_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let backend = StubBackend::default();
    let font = PilFont::new(
        StubAtlas {
            width: 12,
            height: 16,
            mode: AtlasMode::Luma,
        },
        20,
        sample_glyphs(),
    );
    let out = dir.path().join("only.pil");
    font.save_with(&backend, &out, None, &SaveOptions::new()).unwrap();

    assert!(backend.saved.borrow().is_empty());
    let bytes = fs::read(&out).unwrap();
    let mut expected = b"PILfont\n;;;;;;20;\nDATA\n".to_vec();
    for value in [6i16, 0, 0, -16, 6, 0, 0, 0, 6, 16, 6, 0, 0, -16, 6, 0, 6, 0, 12, 16] {
        expected.extend_from_slice(&value.to_be_bytes());
    }
    assert_eq!(bytes, expected);
    assert_eq!(decode_metrics(&bytes).unwrap(), (20, sample_glyphs()));
}

#[test]
fn missing_atlas_is_an_image_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let (metrics, _) = write_sample(dir.path());
    let missing = dir.path().join("nope.pbm");
    let err = PilFont::load_with(&StubBackend::default(), &metrics, &missing).unwrap_err();
    assert!(matches!(err, FontError::ImageOpen { .. }), "{err}");
}

#[test]
fn missing_metrics_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let (_, atlas) = write_sample(dir.path());
    let missing = dir.path().join("nope.pil");
    let err = PilFont::load_with(&StubBackend::default(), &missing, &atlas).unwrap_err();
    assert!(matches!(err, FontError::Io(_)), "{err}");
}

#[test]
fn corrupt_metrics_fail_the_whole_load() {
    let dir = tempfile::tempdir().unwrap();
    let (metrics, atlas) = write_sample(dir.path());
    let mut bytes = fs::read(&metrics).unwrap();
    bytes.extend_from_slice(&[0x00, 0x07, 0x00]);
    fs::write(&metrics, &bytes).unwrap();

    let err = PilFont::load_with(&StubBackend::default(), &metrics, &atlas).unwrap_err();
    match err {
        FontError::TruncatedRecord { index, len, .. } => {
            assert_eq!(index, 2);
            assert_eq!(len, 3);
        }
        other => panic!("unexpected error {other}"),
    }

    bytes[3] = b'F';
    fs::write(&metrics, &bytes).unwrap();
    let err = PilFont::load_with(&StubBackend::default(), &metrics, &atlas).unwrap_err();
    assert_eq!(err.mismatch_position(), Some(3));
}

#[cfg(feature = "image-backend")]
mod image_backend {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    fn write_png_atlas(path: &Path) {
        let mut atlas = GrayImage::new(12, 16);
        for (x, _, pixel) in atlas.enumerate_pixels_mut() {
            *pixel = Luma([if x % 2 == 0 { 255 } else { 0 }]);
        }
        atlas.save(path).unwrap();
    }

    #[test]
    fn load_and_save_png_atlas() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let metrics = dir.path().join("font.pil");
        let atlas = dir.path().join("font.png");
        fs::write(&metrics, to_pil_bytes(16, &sample_glyphs())).unwrap();
        write_png_atlas(&atlas);

        let font = PilFont::load(&metrics, &atlas).unwrap();
        assert_eq!(AtlasImage::dimensions(&font.atlas), (12, 16));
        assert_eq!(AtlasImage::mode(&font.atlas), AtlasMode::Luma);

        let out_metrics = dir.path().join("copy.pil");
        let out_atlas = dir.path().join("copy.png");
        let options = SaveOptions::new()
            .with("compression", "fast")
            .with("unknown", "ignored");
        font.save(&out_metrics, Some(&out_atlas), &options).unwrap();

        let copy = PilFont::load(&out_metrics, &out_atlas).unwrap();
        assert_eq!(copy.glyphs, font.glyphs);
        assert_eq!(copy.ysize, 16);
        assert_eq!(copy.atlas.to_luma8(), font.atlas.to_luma8());
    }

    #[test]
    fn format_option_overrides_extension() {
        let dir = tempfile::tempdir().unwrap();
        let font = PilFont::new(
            DynamicImage::ImageLuma8(GrayImage::new(4, 4)),
            4,
            Vec::new(),
        );
        let out_atlas = dir.path().join("atlas.img");
        font.save(
            dir.path().join("atlas.pil"),
            Some(&out_atlas),
            &SaveOptions::new().with("format", "bmp"),
        )
        .unwrap();
        let reader = image::ImageReader::open(&out_atlas)
            .unwrap()
            .with_guessed_format()
            .unwrap();
        assert_eq!(reader.format(), Some(image::ImageFormat::Bmp));
    }

    #[test]
    fn unreadable_atlas_is_an_image_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = dir.path().join("font.pil");
        let atlas = dir.path().join("font.png");
        fs::write(&metrics, to_pil_bytes(16, &sample_glyphs())).unwrap();
        fs::write(&atlas, b"not a png").unwrap();
        let err = PilFont::load(&metrics, &atlas).unwrap_err();
        assert!(matches!(err, FontError::ImageOpen { .. }), "{err}");
    }
}
