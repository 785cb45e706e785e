//! Merge-field substitution.
//!
//! Recognized reference forms, tried in this order at every position:
//!
//! | form | example | whitespace around the name |
//! |------|---------|----------------------------|
//! | double brace | `{{ title }}` | allowed |
//! | dollar brace | `${title}` | allowed |
//! | percent | `%title%` | no |
//! | single brace | `{title}` | no |
//! | bracket | `[title]` | no |
//!
//! Names match `[A-Za-z_][A-Za-z0-9_.-]*`. Text is scanned once, left to right; substituted
//! values are never scanned again.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use crate::foundation::config::ResolverMode;
use crate::foundation::diagnostics::{Diagnostics, Warning};
use crate::foundation::error::{AeplanError, AeplanResult};
use crate::template::model::Template;

/// Variable name to value. Lookup is exact and case-sensitive.
pub type MergeFieldMap = BTreeMap<String, String>;

/// Reference form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// `{{name}}`
    DoubleBrace,
    /// `${name}`
    DollarBrace,
    /// `%name%`
    Percent,
    /// `{name}`
    Brace,
    /// `[name]`
    Bracket,
}

impl Syntax {
    /// Forms in precedence order.
    pub const PRECEDENCE: [Self; 5] = [
        Self::DoubleBrace,
        Self::DollarBrace,
        Self::Percent,
        Self::Brace,
        Self::Bracket,
    ];

    fn delimiters(self) -> (&'static [u8], &'static [u8], bool) {
        match self {
            Self::DoubleBrace => (b"{{", b"}}", true),
            Self::DollarBrace => (b"${", b"}", true),
            Self::Percent => (b"%", b"%", false),
            Self::Brace => (b"{", b"}", false),
            Self::Bracket => (b"[", b"]", false),
        }
    }
}

/// One reference found in a string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldRef<'s> {
    /// Form the reference was written in.
    pub syntax: Syntax,
    /// Variable name.
    pub name: &'s str,
    /// Byte range of the whole reference, delimiters included.
    pub span: Range<usize>,
}

/// Every reference in `s`, left to right, non-overlapping.
pub fn find_references(s: &str) -> Vec<FieldRef<'_>> {
    let bytes = s.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match match_at(s, i) {
            Some(r) => {
                i = r.span.end;
                out.push(r);
            }
            None => i += 1,
        }
    }
    out
}

fn match_at(s: &str, at: usize) -> Option<FieldRef<'_>> {
    Syntax::PRECEDENCE.into_iter().find_map(|syntax| {
        let (open, close, spaced) = syntax.delimiters();
        let bytes = s.as_bytes();
        if !bytes[at..].starts_with(open) {
            return None;
        }
        let mut i = at + open.len();
        if spaced {
            i = skip_ws(bytes, i);
        }
        let name_start = i;
        i = scan_name(bytes, i)?;
        let name_end = i;
        if spaced {
            i = skip_ws(bytes, i);
        }
        if !bytes[i..].starts_with(close) {
            return None;
        }
        Some(FieldRef {
            syntax,
            name: &s[name_start..name_end],
            span: at..i + close.len(),
        })
    })
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

fn scan_name(bytes: &[u8], mut i: usize) -> Option<usize> {
    let first = *bytes.get(i)?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    i += 1;
    while bytes
        .get(i)
        .is_some_and(|&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
    {
        i += 1;
    }
    Some(i)
}

/// Sorted, deduplicated variable names referenced by text-bearing clip fields.
pub fn collect_variables(template: &Template) -> Vec<String> {
    let names: BTreeSet<&str> = template
        .clips()
        .filter_map(|c| c.content.text_field())
        .flat_map(|s| find_references(s).into_iter().map(|r| r.name))
        .collect();
    names.into_iter().map(str::to_string).collect()
}

/// Substitutes references from one value map.
#[derive(Clone, Copy, Debug)]
pub struct MergeFieldResolver<'m> {
    values: &'m MergeFieldMap,
    mode: ResolverMode,
}

impl<'m> MergeFieldResolver<'m> {
    /// Resolver over `values`.
    pub fn new(values: &'m MergeFieldMap, mode: ResolverMode) -> Self {
        Self { values, mode }
    }

    /// Substitute every reference in `input`.
    ///
    /// Unknown names stay verbatim with a warning in lenient mode and fail in strict mode.
    /// `clip` names the owner in reports.
    pub fn resolve_str(
        &self,
        input: &str,
        clip: &str,
        diag: &mut Diagnostics,
    ) -> AeplanResult<String> {
        let refs = find_references(input);
        if refs.is_empty() {
            return Ok(input.to_string());
        }

        let mut out = String::with_capacity(input.len());
        let mut cursor = 0;
        for r in refs {
            out.push_str(&input[cursor..r.span.start]);
            match self.values.get(r.name) {
                Some(value) => out.push_str(value),
                None => {
                    if self.mode == ResolverMode::Strict {
                        return Err(AeplanError::MergeFieldUnresolved {
                            name: r.name.to_string(),
                            clip: clip.to_string(),
                        });
                    }
                    diag.warn(Warning::MergeFieldUnresolved {
                        name: r.name.to_string(),
                        clip: clip.to_string(),
                    });
                    out.push_str(&input[r.span.clone()]);
                }
            }
            cursor = r.span.end;
        }
        out.push_str(&input[cursor..]);
        Ok(out)
    }

    /// Resolve every text-bearing clip field of `template` in place.
    pub fn resolve_template(
        &self,
        template: &mut Template,
        diag: &mut Diagnostics,
    ) -> AeplanResult<()> {
        for track in &mut template.timeline.tracks {
            for clip in &mut track.clips {
                let id = clip.id.as_str();
                if let Some(field) = clip.content.text_field_mut() {
                    *field = self.resolve_str(field, id, diag)?;
                }
            }
        }
        Ok(())
    }
}

/// Template defaults overlaid by `runtime`.
pub fn effective_values(template: &Template, runtime: &MergeFieldMap) -> MergeFieldMap {
    let mut values = template.merge_fields.clone();
    values.extend(runtime.iter().map(|(k, v)| (k.clone(), v.clone())));
    values
}

/// Resolve a copy of `template` against its own defaults overlaid by `runtime`.
///
/// The returned template's `mergeFields` holds the effective map.
#[tracing::instrument(level = "debug", skip_all, fields(runtime = runtime.len(), mode = ?mode))]
pub fn resolve_template(
    template: &Template,
    runtime: &MergeFieldMap,
    mode: ResolverMode,
    diag: &mut Diagnostics,
) -> AeplanResult<Template> {
    let values = effective_values(template, runtime);
    let mut resolved = template.clone();
    MergeFieldResolver::new(&values, mode).resolve_template(&mut resolved, diag)?;
    resolved.merge_fields = values;
    Ok(resolved)
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/merge.rs"]
mod tests;
