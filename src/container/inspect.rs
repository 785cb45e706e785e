use crate::container::scanner::ChunkScanner;
use crate::container::signature::{ChunkRole, FourCc};
use crate::foundation::error::AeplanResult;

/// Chunk listing of one container.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    /// Root tag.
    pub root_tag: FourCc,
    /// Offset of the root header.
    pub root_offset: usize,
    /// Root form type.
    pub form_type: FourCc,
    /// Registered children in stream order.
    pub chunks: Vec<ChunkEntry>,
    /// Bytes counted against the analysis ceiling.
    pub inspected_bytes: u64,
}

/// One registered chunk.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ChunkEntry {
    /// Header offset.
    pub offset: usize,
    /// Tag.
    pub tag: FourCc,
    /// Role.
    pub role: ChunkRole,
    /// Payload length.
    pub length: u32,
}

impl Inspection {
    /// Walk every child of `scanner`'s root.
    pub fn collect(scanner: &ChunkScanner<'_>) -> AeplanResult<Self> {
        let mut iter = scanner.chunks();
        let mut chunks = Vec::new();
        for chunk in iter.by_ref() {
            let chunk = chunk?;
            chunks.push(ChunkEntry {
                offset: chunk.offset,
                tag: chunk.tag,
                role: chunk.role,
                length: chunk.length,
            });
        }
        Ok(Self {
            root_tag: scanner.root_tag(),
            root_offset: scanner.root_offset(),
            form_type: scanner.form_type(),
            chunks,
            inspected_bytes: iter.inspected_bytes(),
        })
    }

    /// One line per chunk: offset, tag, role, length.
    pub fn to_table(&self) -> String {
        let mut out = format!(
            "{} @ {} form {} ({} chunks, {} bytes inspected)\n",
            self.root_tag,
            self.root_offset,
            self.form_type,
            self.chunks.len(),
            self.inspected_bytes
        );
        for c in &self.chunks {
            out.push_str(&format!(
                "{:>10}  {}  {:<12} {}\n",
                c.offset,
                c.tag,
                format!("{:?}", c.role).to_lowercase(),
                c.length
            ));
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/container/inspect.rs"]
mod tests;
