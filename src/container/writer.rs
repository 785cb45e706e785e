//! Container encoder for the layout read by [`crate::ChunkScanner`].
//!
//! Used to produce fixtures and synthetic projects. Record fields are written in wire order up to
//! the first `None`; later fields are omitted so readers fall back to their defaults.

use std::io;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::container::classify::{CompositionRecord, Interpolation, KeyframeRecord, LayerRecord};
use crate::container::signature::{ChunkRole, FourCc, SignatureRegistry};
use crate::foundation::core::Rgb8;
use crate::foundation::error::{AeplanError, AeplanResult};

/// Form type written by default.
pub const DEFAULT_FORM_TYPE: FourCc = FourCc::new(b"Egg!");

/// Builder for a complete container byte buffer.
#[derive(Clone, Debug)]
pub struct ContainerWriter {
    registry: SignatureRegistry,
    form_type: FourCc,
    body: Vec<u8>,
}

impl Default for ContainerWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerWriter {
    /// Writer using the built-in signature table.
    pub fn new() -> Self {
        Self::with_registry(SignatureRegistry::default())
    }

    /// Writer using `registry` to pick each role's tag.
    pub fn with_registry(registry: SignatureRegistry) -> Self {
        Self {
            registry,
            form_type: DEFAULT_FORM_TYPE,
            body: Vec::new(),
        }
    }

    /// Override the root form type.
    pub fn form_type(mut self, form: FourCc) -> Self {
        self.form_type = form;
        self
    }

    /// Append a chunk with an arbitrary tag.
    pub fn raw(mut self, tag: FourCc, payload: &[u8]) -> Self {
        push_chunk(&mut self.body, tag, payload);
        self
    }

    /// Append a chunk for `role` using the registry's tag.
    pub fn chunk(self, role: ChunkRole, payload: &[u8]) -> AeplanResult<Self> {
        let tag = self.registry.tag_for(role).ok_or_else(|| {
            AeplanError::validation(format!("no tag registered for role {role:?}"))
        })?;
        Ok(self.raw(tag, payload))
    }

    /// Append a composition header.
    pub fn composition(self, rec: &CompositionRecord) -> AeplanResult<Self> {
        self.chunk(ChunkRole::Composition, &encode_composition(rec))
    }

    /// Append a layer header.
    pub fn layer(self, rec: &LayerRecord) -> AeplanResult<Self> {
        self.chunk(ChunkRole::Layer, &encode_layer(rec))
    }

    /// Append a text document for the current layer.
    pub fn text(self, text: &str) -> AeplanResult<Self> {
        self.chunk(ChunkRole::Text, text.as_bytes())
    }

    /// Append a shape fill for the current layer.
    pub fn shape(self, fill: Rgb8) -> AeplanResult<Self> {
        self.chunk(ChunkRole::Shape, &[fill.r, fill.g, fill.b])
    }

    /// Append a footage reference.
    pub fn footage(self, path: &str) -> AeplanResult<Self> {
        self.chunk(ChunkRole::Footage, path.as_bytes())
    }

    /// Append an effect for the current layer.
    pub fn effect(self, name: &str) -> AeplanResult<Self> {
        self.chunk(ChunkRole::Effect, name.as_bytes())
    }

    /// Append an expression for the current property.
    pub fn expression(self, source: &str) -> AeplanResult<Self> {
        self.chunk(ChunkRole::Expression, source.as_bytes())
    }

    /// Start an animated property group on the current layer.
    pub fn animation(self, property: &str) -> AeplanResult<Self> {
        self.chunk(ChunkRole::Animation, property.as_bytes())
    }

    /// Append a keyframe to the current property.
    pub fn keyframe(
        self,
        time: f32,
        interpolation: Interpolation,
        value: &[f32],
    ) -> AeplanResult<Self> {
        let rec = KeyframeRecord {
            time: Some(time),
            interpolation: Some(interpolation),
            value: value.to_vec(),
        };
        self.chunk(ChunkRole::Keyframe, &encode_keyframe(&rec))
    }

    /// Finish the root chunk and return the container bytes.
    pub fn finish(self) -> AeplanResult<Vec<u8>> {
        let root = self
            .registry
            .root_tags()
            .next()
            .ok_or_else(|| AeplanError::validation("no root tag registered"))?;
        let mut payload = Vec::with_capacity(4 + self.body.len());
        payload.extend_from_slice(&self.form_type.bytes());
        payload.extend_from_slice(&self.body);
        let mut out = Vec::with_capacity(8 + payload.len());
        push_chunk(&mut out, root, &payload);
        Ok(out)
    }
}

fn push_chunk(out: &mut Vec<u8>, tag: FourCc, payload: &[u8]) {
    let mut header = [0u8; 8];
    header[..4].copy_from_slice(&tag.bytes());
    BigEndian::write_u32(&mut header[4..], payload.len() as u32);
    out.extend_from_slice(&header);
    out.extend_from_slice(payload);
}

/// Writes fields in order until the first absent one.
struct FieldWriter {
    out: Vec<u8>,
    open: bool,
}

impl FieldWriter {
    fn new() -> Self {
        Self {
            out: Vec::new(),
            open: true,
        }
    }

    fn field(&mut self, bytes: Option<&[u8]>) -> &mut Self {
        match (self.open, bytes) {
            (true, Some(b)) => self.out.extend_from_slice(b),
            _ => self.open = false,
        }
        self
    }

    fn put<T>(
        &mut self,
        v: Option<T>,
        write: impl FnOnce(&mut Vec<u8>, T) -> io::Result<()>,
    ) -> &mut Self {
        match v {
            Some(v) if self.open => {
                if write(&mut self.out, v).is_err() {
                    self.open = false;
                }
            }
            _ => self.open = false,
        }
        self
    }

    fn u16(&mut self, v: Option<u16>) -> &mut Self {
        self.put(v, |out, v| out.write_u16::<BigEndian>(v))
    }

    fn u32(&mut self, v: Option<u32>) -> &mut Self {
        self.put(v, |out, v| out.write_u32::<BigEndian>(v))
    }

    fn f32(&mut self, v: Option<f32>) -> &mut Self {
        self.put(v, |out, v| out.write_f32::<BigEndian>(v))
    }

    fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out)
    }
}

fn encode_composition(rec: &CompositionRecord) -> Vec<u8> {
    let mut w = FieldWriter::new();
    let bg = rec.background.map(|c| [c.r, c.g, c.b]);
    w.u32(rec.id)
        .u16(rec.width)
        .u16(rec.height)
        .f32(rec.fps)
        .f32(rec.duration)
        .field(bg.as_ref().map(|b| &b[..]))
        .field(rec.name.as_deref().map(str::as_bytes));
    w.finish()
}

fn encode_layer(rec: &LayerRecord) -> Vec<u8> {
    let mut w = FieldWriter::new();
    let token = rec.type_token.as_deref().map(|t| {
        let mut b = [b' '; 4];
        for (dst, src) in b.iter_mut().zip(t.bytes()) {
            *dst = src;
        }
        b
    });
    w.u32(rec.id)
        .field(token.as_ref().map(|b| &b[..]))
        .f32(rec.start)
        .f32(rec.duration)
        .f32(rec.opacity)
        .f32(rec.position_x)
        .f32(rec.position_y)
        .f32(rec.scale_x)
        .f32(rec.scale_y)
        .f32(rec.rotation)
        .field(rec.name.as_deref().map(str::as_bytes));
    w.finish()
}

fn encode_keyframe(rec: &KeyframeRecord) -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.f32(rec.time)
        .field(rec.interpolation.map(|i| [i.code()]).as_ref().map(|b| &b[..]));
    for v in rec.value.iter().take(4) {
        w.f32(Some(*v));
    }
    w.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/container/writer.rs"]
mod tests;
