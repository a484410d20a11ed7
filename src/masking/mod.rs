//! Entity masking for answer text.
//!
//! The backend annotates answers with sensitive spans it already redacted
//! upstream; a small set of entity types (NRIC by default) is the client's
//! responsibility instead. Rendering wraps each span in a marker so the
//! display layer can style the two cases differently. The transform is pure:
//! same text and annotations always produce the same output.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::api::Entity;

/// Entity type the front end masks itself rather than trusting the backend.
pub const ENTITY_TYPE_NRIC: &str = "NRIC";

/// Marker for spans the backend already redacted.
const BACKEND_MARK_OPEN: &str = "<mark class=\"entity\">";
/// Marker for spans the client is responsible for redacting.
const CLIENT_MARK_OPEN: &str = "<mark class=\"entity entity-client\">";
const MARK_CLOSE: &str = "</mark>";

/// Which entity types the front end masks itself.
#[derive(Debug, Clone)]
pub struct MaskingPolicy {
    client_types: HashSet<String>,
}

impl MaskingPolicy {
    pub fn new<I, S>(client_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client_types: client_types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_client_masked(&self, entity_type: &str) -> bool {
        self.client_types.contains(entity_type)
    }
}

impl Default for MaskingPolicy {
    fn default() -> Self {
        Self::new([ENTITY_TYPE_NRIC])
    }
}

/// Escape markup characters so a wrapped value can never alter the
/// surrounding structure.
pub fn escape_markup(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn wrap(value: &str, client_masked: bool) -> String {
    let open = if client_masked {
        CLIENT_MARK_OPEN
    } else {
        BACKEND_MARK_OPEN
    };
    format!("{open}{}{MARK_CLOSE}", escape_markup(value))
}

/// Render `text` with each annotated span wrapped in its masking marker.
///
/// Annotations are processed in ascending span-start order. A span that
/// starts before the previous accepted span ends is skipped, as is any span
/// that is empty, out of bounds, or not aligned to char boundaries: a bad
/// annotation must never panic or corrupt the surrounding text. Text outside
/// accepted spans passes through unchanged.
pub fn mask_entities(text: &str, entities: &[Entity], policy: &MaskingPolicy) -> String {
    if entities.is_empty() {
        return text.to_string();
    }

    let mut ordered: Vec<&Entity> = entities.iter().collect();
    ordered.sort_by_key(|entity| entity.span[0]);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for entity in ordered {
        let [start, end] = entity.span;
        if start < cursor || end <= start || end > text.len() {
            continue;
        }
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            continue;
        }
        out.push_str(&text[cursor..start]);
        out.push_str(&wrap(
            &text[start..end],
            policy.is_client_masked(&entity.entity_type),
        ));
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn nric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b[STFGM]\d{7}[A-Z]\b").expect("NRIC pattern should compile")
    })
}

/// Scan answer text for client-side entity types the backend does not
/// annotate. Spans are byte offsets into `text`.
pub fn detect_client_entities(text: &str) -> Vec<Entity> {
    nric_pattern()
        .find_iter(text)
        .map(|m| Entity {
            entity_type: ENTITY_TYPE_NRIC.to_string(),
            original_value: m.as_str().to_string(),
            span: [m.start(), m.end()],
        })
        .collect()
}

/// Combine backend annotations with client-side detections, dropping any
/// detection that overlaps a backend span, and return the result ordered by
/// span start.
pub fn merge_entities(backend: &[Entity], detected: Vec<Entity>) -> Vec<Entity> {
    let mut merged: Vec<Entity> = backend.to_vec();
    for candidate in detected {
        let overlaps = backend
            .iter()
            .any(|entity| candidate.span[0] < entity.span[1] && entity.span[0] < candidate.span[1]);
        if !overlaps {
            merged.push(candidate);
        }
    }
    merged.sort_by_key(|entity| entity.span[0]);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(entity_type: &str, value: &str, start: usize, end: usize) -> Entity {
        Entity {
            entity_type: entity_type.to_string(),
            original_value: value.to_string(),
            span: [start, end],
        }
    }

    #[test]
    fn client_and_backend_types_get_distinct_markers() {
        let text = "Contact a@b.sg about S1234567D today";
        let entities = vec![
            entity("EMAIL", "a@b.sg", 8, 14),
            entity("NRIC", "S1234567D", 21, 30),
        ];
        let rendered = mask_entities(text, &entities, &MaskingPolicy::default());
        assert_eq!(
            rendered,
            "Contact <mark class=\"entity\">a@b.sg</mark> about \
             <mark class=\"entity entity-client\">S1234567D</mark> today"
        );
    }

    #[test]
    fn wrapped_values_are_markup_escaped() {
        let text = "x <img> y";
        let entities = vec![entity("EMAIL", "<img>", 2, 7)];
        let rendered = mask_entities(text, &entities, &MaskingPolicy::default());
        assert_eq!(rendered, "x <mark class=\"entity\">&lt;img&gt;</mark> y");
    }

    #[test]
    fn overlapping_spans_keep_only_the_first() {
        let text = "abcdefghij";
        let entities = vec![
            entity("EMAIL", "abcd", 0, 4),
            entity("EMAIL", "cdef", 2, 6),
            entity("EMAIL", "efgh", 4, 8),
        ];
        let rendered = mask_entities(text, &entities, &MaskingPolicy::default());
        // The middle span starts inside the first and is dropped; the third
        // begins exactly where the first ends and is kept.
        assert_eq!(
            rendered,
            "<mark class=\"entity\">abcd</mark><mark class=\"entity\">efgh</mark>ij"
        );
    }

    #[test]
    fn annotations_are_sorted_before_processing() {
        let text = "one two three";
        let entities = vec![
            entity("EMAIL", "three", 8, 13),
            entity("EMAIL", "one", 0, 3),
        ];
        let rendered = mask_entities(text, &entities, &MaskingPolicy::default());
        assert_eq!(
            rendered,
            "<mark class=\"entity\">one</mark> two <mark class=\"entity\">three</mark>"
        );
    }

    #[test]
    fn invalid_spans_are_skipped_without_panicking() {
        let text = "héllo"; // 'é' occupies bytes 1..3
        let entities = vec![
            entity("EMAIL", "", 3, 3),    // empty
            entity("EMAIL", "x", 4, 99),  // out of bounds
            entity("EMAIL", "x", 2, 4),   // not a char boundary
            entity("EMAIL", "lo", 4, 6),  // valid
        ];
        let rendered = mask_entities(text, &entities, &MaskingPolicy::default());
        assert_eq!(rendered, "hél<mark class=\"entity\">lo</mark>");
    }

    #[test]
    fn masking_without_entities_is_the_identity() {
        let escaped = "answer with &lt;pre-escaped&gt; markup &amp; symbols";
        assert_eq!(
            mask_entities(escaped, &[], &MaskingPolicy::default()),
            escaped
        );
    }

    #[test]
    fn masking_is_deterministic() {
        let text = "ID S7654321B on file";
        let entities = detect_client_entities(text);
        let policy = MaskingPolicy::default();
        let first = mask_entities(text, &entities, &policy);
        let second = mask_entities(text, &entities, &policy);
        assert_eq!(first, second);
    }

    #[test]
    fn nric_detection_reports_byte_offsets() {
        let text = "Citizen S1234567D and T7654321Z registered";
        let detected = detect_client_entities(text);
        assert_eq!(detected.len(), 2);
        assert_eq!(detected[0].original_value, "S1234567D");
        assert_eq!(detected[0].span, [8, 17]);
        assert_eq!(&text[detected[1].span[0]..detected[1].span[1]], "T7654321Z");
    }

    #[test]
    fn nric_detection_ignores_near_misses() {
        assert!(detect_client_entities("S123456D too short").is_empty());
        assert!(detect_client_entities("X1234567D wrong prefix").is_empty());
        assert!(detect_client_entities("S1234567DX embedded").is_empty());
    }

    #[test]
    fn merge_drops_detections_overlapping_backend_spans() {
        let backend = vec![entity("NRIC_MASKED", "S1234567D", 5, 14)];
        let detected = vec![
            entity("NRIC", "S1234567D", 5, 14),
            entity("NRIC", "T7654321Z", 20, 29),
        ];
        let merged = merge_entities(&backend, detected);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].entity_type, "NRIC_MASKED");
        assert_eq!(merged[1].span, [20, 29]);
    }

    #[test]
    fn escape_markup_covers_structure_characters() {
        assert_eq!(
            escape_markup(r#"<a href="x">&amp;</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;amp;&lt;/a&gt;"
        );
    }
}
