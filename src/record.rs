//! Fixed-size glyph records of the metrics file.
//!
//! A record is ten big-endian `i16` values, always in this order:
//! `dx, dy, dest x0, dest y0, dest x1, dest y1, src x0, src y0, src x1, src y1`.

use crate::Glyph;

/// Size of one encoded glyph record in bytes.
pub const RECORD_SIZE: usize = 20;

/// Number of `i16` fields in a record.
pub const FIELD_COUNT: usize = RECORD_SIZE / 2;

impl Glyph {
    /// Flattens the glyph into record field order.
    pub fn to_fields(&self) -> [i16; FIELD_COUNT] {
        let (dx, dy) = self.advance;
        let (dx0, dy0, dx1, dy1) = self.dest_box;
        let (sx0, sy0, sx1, sy1) = self.src_box;
        [dx, dy, dx0, dy0, dx1, dy1, sx0, sy0, sx1, sy1]
    }

    /// Inverse of [`Glyph::to_fields`].
    pub fn from_fields(fields: [i16; FIELD_COUNT]) -> Self {
        let [dx, dy, dx0, dy0, dx1, dy1, sx0, sy0, sx1, sy1] = fields;
        Glyph {
            advance: (dx, dy),
            dest_box: (dx0, dy0, dx1, dy1),
            src_box: (sx0, sy0, sx1, sy1),
        }
    }
}

pub fn decode_record(bytes: &[u8; RECORD_SIZE]) -> Glyph {
    let mut fields = [0i16; FIELD_COUNT];
    for (field, pair) in fields.iter_mut().zip(bytes.chunks_exact(2)) {
        *field = i16::from_be_bytes([pair[0], pair[1]]);
    }
    Glyph::from_fields(fields)
}

pub fn encode_record(glyph: &Glyph) -> [u8; RECORD_SIZE] {
    let mut bytes = [0u8; RECORD_SIZE];
    for (pair, field) in bytes.chunks_exact_mut(2).zip(glyph.to_fields()) {
        pair.copy_from_slice(&field.to_be_bytes());
    }
    bytes
}
