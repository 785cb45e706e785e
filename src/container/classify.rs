//! Per-chunk payload decoding, dispatched on [`ChunkRole`].
//!
//! Decoding never fails: a field is `None` when the payload ends before it, and every later
//! field is `None` too. Defaults are applied by the extractors, not here.

use byteorder::{BigEndian, ReadBytesExt};

use crate::container::scanner::Chunk;
use crate::container::signature::ChunkRole;
use crate::foundation::core::Rgb8;

/// Keyframe interpolation mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Linear blend toward the next keyframe.
    #[default]
    Linear,
    /// Hold the value until the next keyframe.
    Hold,
    /// Bezier easing.
    Bezier,
}

impl Interpolation {
    /// Decode a wire code. Unknown codes read as linear.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Hold,
            2 => Self::Bezier,
            0 => Self::Linear,
            other => {
                tracing::debug!(code = other, "unknown interpolation code; using linear");
                Self::Linear
            }
        }
    }

    /// Wire code.
    pub fn code(self) -> u8 {
        match self {
            Self::Linear => 0,
            Self::Hold => 1,
            Self::Bezier => 2,
        }
    }
}

/// Composition header fields in wire order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositionRecord {
    /// Source identifier.
    pub id: Option<u32>,
    /// Canvas width.
    pub width: Option<u16>,
    /// Canvas height.
    pub height: Option<u16>,
    /// Frames per second.
    pub fps: Option<f32>,
    /// Duration in seconds.
    pub duration: Option<f32>,
    /// Background color.
    pub background: Option<Rgb8>,
    /// Display name.
    pub name: Option<String>,
}

/// Layer header fields in wire order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerRecord {
    /// Source identifier.
    pub id: Option<u32>,
    /// Raw 4-byte type token, NUL/space trimmed.
    pub type_token: Option<String>,
    /// Start time in seconds.
    pub start: Option<f32>,
    /// Duration in seconds.
    pub duration: Option<f32>,
    /// Opacity, 0 to 100.
    pub opacity: Option<f32>,
    /// Position x in pixels.
    pub position_x: Option<f32>,
    /// Position y in pixels.
    pub position_y: Option<f32>,
    /// Scale x in percent.
    pub scale_x: Option<f32>,
    /// Scale y in percent.
    pub scale_y: Option<f32>,
    /// Rotation in degrees.
    pub rotation: Option<f32>,
    /// Display name.
    pub name: Option<String>,
}

/// Keyframe fields in wire order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyframeRecord {
    /// Time in seconds.
    pub time: Option<f32>,
    /// Interpolation mode.
    pub interpolation: Option<Interpolation>,
    /// Value components (at most four).
    pub value: Vec<f32>,
}

/// Decoded chunk payload, one variant per role.
#[derive(Clone, Debug, PartialEq)]
pub enum ChunkRecord {
    /// A root tag nested inside the root.
    NestedRoot,
    /// Composition header.
    Composition(CompositionRecord),
    /// Layer header.
    Layer(LayerRecord),
    /// Text document.
    Text(String),
    /// Shape fill.
    Shape {
        /// Fill color, if present.
        fill: Option<Rgb8>,
    },
    /// Footage source path.
    Footage(String),
    /// Effect match name.
    Effect(String),
    /// Expression source.
    Expression(String),
    /// Animated property name.
    Animation(String),
    /// Keyframe.
    Keyframe(KeyframeRecord),
}

/// A decoded record plus the offset of the chunk it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedChunk {
    /// Offset of the chunk header.
    pub offset: usize,
    /// Role of the chunk.
    pub role: ChunkRole,
    /// Decoded payload.
    pub record: ChunkRecord,
}

/// Decode `chunk`'s payload according to its role.
pub fn classify(chunk: &Chunk<'_>) -> ClassifiedChunk {
    let record = match chunk.role {
        ChunkRole::Root => ChunkRecord::NestedRoot,
        ChunkRole::Composition => ChunkRecord::Composition(decode_composition(chunk.payload)),
        ChunkRole::Layer => ChunkRecord::Layer(decode_layer(chunk.payload)),
        ChunkRole::Text => ChunkRecord::Text(decode_text(chunk.payload)),
        ChunkRole::Shape => {
            let mut r = FieldReader::new(chunk.payload);
            ChunkRecord::Shape { fill: r.rgb() }
        }
        ChunkRole::Footage => ChunkRecord::Footage(decode_text(chunk.payload)),
        ChunkRole::Effect => ChunkRecord::Effect(decode_text(chunk.payload)),
        ChunkRole::Expression => ChunkRecord::Expression(decode_text(chunk.payload)),
        ChunkRole::Animation => ChunkRecord::Animation(decode_text(chunk.payload)),
        ChunkRole::Keyframe => ChunkRecord::Keyframe(decode_keyframe(chunk.payload)),
    };
    ClassifiedChunk {
        offset: chunk.offset,
        role: chunk.role,
        record,
    }
}

fn decode_composition(payload: &[u8]) -> CompositionRecord {
    let mut r = FieldReader::new(payload);
    CompositionRecord {
        id: r.u32(),
        width: r.u16(),
        height: r.u16(),
        fps: r.f32(),
        duration: r.f32(),
        background: r.rgb(),
        name: r.rest_text(),
    }
}

fn decode_layer(payload: &[u8]) -> LayerRecord {
    let mut r = FieldReader::new(payload);
    LayerRecord {
        id: r.u32(),
        type_token: r.token(),
        start: r.f32(),
        duration: r.f32(),
        opacity: r.f32(),
        position_x: r.f32(),
        position_y: r.f32(),
        scale_x: r.f32(),
        scale_y: r.f32(),
        rotation: r.f32(),
        name: r.rest_text(),
    }
}

fn decode_keyframe(payload: &[u8]) -> KeyframeRecord {
    let mut r = FieldReader::new(payload);
    let time = r.f32();
    let interpolation = r.u8().map(Interpolation::from_code);
    let mut value = Vec::new();
    while value.len() < 4 {
        match r.f32() {
            Some(v) => value.push(v),
            None => break,
        }
    }
    KeyframeRecord {
        time,
        interpolation,
        value,
    }
}

/// Lossy UTF-8 with trailing NULs removed.
pub fn decode_text(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload)
        .trim_end_matches('\0')
        .to_string()
}

/// Sequential big-endian reader that stops at the first short field.
struct FieldReader<'a> {
    rest: &'a [u8],
    complete: bool,
}

impl<'a> FieldReader<'a> {
    fn new(payload: &'a [u8]) -> Self {
        Self {
            rest: payload,
            complete: true,
        }
    }

    fn read<T>(&mut self, f: impl FnOnce(&mut &'a [u8]) -> std::io::Result<T>) -> Option<T> {
        if !self.complete {
            return None;
        }
        match f(&mut self.rest) {
            Ok(v) => Some(v),
            Err(_) => {
                self.complete = false;
                None
            }
        }
    }

    fn u8(&mut self) -> Option<u8> {
        self.read(|r| r.read_u8())
    }

    fn u16(&mut self) -> Option<u16> {
        self.read(|r| r.read_u16::<BigEndian>())
    }

    fn u32(&mut self) -> Option<u32> {
        self.read(|r| r.read_u32::<BigEndian>())
    }

    fn f32(&mut self) -> Option<f32> {
        self.read(|r| r.read_f32::<BigEndian>())
    }

    fn rgb(&mut self) -> Option<Rgb8> {
        let r = self.u8()?;
        let g = self.u8()?;
        let b = self.u8()?;
        Some(Rgb8::new(r, g, b))
    }

    fn token(&mut self) -> Option<String> {
        let raw = self.read(|r| r.read_u32::<BigEndian>())?;
        let bytes = raw.to_be_bytes();
        Some(
            String::from_utf8_lossy(&bytes)
                .trim_end_matches(['\0', ' '])
                .to_string(),
        )
    }

    fn rest_text(&mut self) -> Option<String> {
        if !self.complete || self.rest.is_empty() {
            return None;
        }
        let text = decode_text(self.rest);
        self.rest = &[];
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/container/classify.rs"]
mod tests;
