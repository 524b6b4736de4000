use crate::atlas::AtlasImage;
use crate::models::*;

/// Codes of glyphs whose source box is inverted or reaches outside the atlas.
pub fn glyphs_outside_atlas<A: AtlasImage>(font: &PilFont<A>) -> Vec<usize> {
    let (width, height) = font.atlas.dimensions();
    let (width, height) = (width as i64, height as i64);
    font.glyphs
        .iter()
        .enumerate()
        .filter(|(_, glyph)| {
            let (x0, y0, x1, y1) = glyph.src_box;
            let inverted = glyph.src_width() < 0 || glyph.src_height() < 0;
            inverted || x0 < 0 || y0 < 0 || (x1 as i64) > width || (y1 as i64) > height
        })
        .map(|(code, _)| code)
        .collect()
}

/// Union of the destination boxes of all glyphs that paste any pixels.
///
/// Returns `None` when no glyph has a non-empty destination box.
pub fn ink_extent(glyphs: &[Glyph]) -> Option<(i16, i16, i16, i16)> {
    glyphs
        .iter()
        .map(|glyph| glyph.dest_box)
        .filter(|&(x0, y0, x1, y1)| x1 > x0 && y1 > y0)
        .reduce(|acc, b| (acc.0.min(b.0), acc.1.min(b.1), acc.2.max(b.2), acc.3.max(b.3)))
}
