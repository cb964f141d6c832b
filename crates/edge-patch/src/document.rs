//! Markup/payload tokenizer.

use serde_json::Value;

use crate::error::{PatchError, PatchResult};
use crate::escape::script_literal_inner;
use crate::flight::FlightText;

const PUSH_PREFIX: &str = "self.__next_f.push([1,\"";
const CHUNK_CLOSE: &str = "\"])</script>";

/// Locate the next `<script ...>self.__next_f.push([1,"` at or after `from`.
/// Returns the tag start and the offset of the literal body.
fn find_chunk_open(html: &str, from: usize) -> Option<(usize, usize)> {
    let mut cursor = from;
    while let Some(rel) = html[cursor..].find(PUSH_PREFIX) {
        let marker = cursor + rel;
        let before = html[from..marker].trim_end();
        if let Some(head) = before.strip_suffix('>') {
            if let Some(tag) = head.rfind("<script") {
                if !head[tag..].contains('>') {
                    return Some((from + tag, marker + PUSH_PREFIX.len()));
                }
            }
        }
        cursor = marker + 1;
    }
    None
}

/// One inline payload chunk: `<open>"<literal>"])</script>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadChunk {
    open: String,
    literal: String,
}

impl PayloadChunk {
    /// Escaped string literal body, as found in the document.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Replace the escaped literal body.
    pub fn set_literal(&mut self, literal: String) {
        self.literal = literal;
    }

    /// Decode the literal into payload text.
    pub fn decode(&self, index: usize) -> PatchResult<String> {
        let quoted = format!("\"{}\"", self.literal);
        match serde_json::from_str::<Value>(&quoted) {
            Ok(Value::String(text)) => Ok(text),
            Ok(_) => Err(PatchError::MalformedPayload {
                index,
                reason: "literal is not a string".to_string(),
            }),
            Err(e) => Err(PatchError::MalformedPayload {
                index,
                reason: e.to_string(),
            }),
        }
    }

    /// Re-encode payload text into this chunk.
    pub fn encode(&mut self, text: &str) {
        self.literal = script_literal_inner(text);
    }

    fn render_into(&self, out: &mut String) {
        out.push_str(&self.open);
        out.push_str(&self.literal);
        out.push_str(CHUNK_CLOSE);
    }
}

/// A region of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    /// Ordinary markup, including non-payload scripts.
    Markup(String),
    /// An inline payload chunk.
    Payload(PayloadChunk),
}

/// A document split into markup and payload regions. Rendering an
/// unmodified document reproduces the input exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    regions: Vec<Region>,
}

impl Document {
    /// Split a document into regions.
    pub fn parse(html: &str) -> PatchResult<Self> {
        let mut regions = Vec::new();
        let mut pos = 0;

        while let Some((open_start, body_start)) = find_chunk_open(html, pos) {
            if open_start > pos {
                regions.push(Region::Markup(html[pos..open_start].to_string()));
            }

            let index = regions.len();
            let body_end = scan_literal(html, body_start).ok_or_else(|| {
                PatchError::MalformedPayload {
                    index,
                    reason: "unterminated string literal".to_string(),
                }
            })?;
            if !html[body_end..].starts_with(CHUNK_CLOSE) {
                return Err(PatchError::MalformedPayload {
                    index,
                    reason: "unexpected chunk terminator".to_string(),
                });
            }

            regions.push(Region::Payload(PayloadChunk {
                open: html[open_start..body_start].to_string(),
                literal: html[body_start..body_end].to_string(),
            }));
            pos = body_end + CHUNK_CLOSE.len();
        }

        if pos < html.len() {
            regions.push(Region::Markup(html[pos..].to_string()));
        }
        Ok(Self { regions })
    }

    /// Regions in document order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Mutable regions in document order.
    pub fn regions_mut(&mut self) -> &mut [Region] {
        &mut self.regions
    }

    /// Whether the document carries an inline payload.
    pub fn has_payload(&self) -> bool {
        self.regions.iter().any(|r| matches!(r, Region::Payload(_)))
    }

    /// Decoded payload text of every chunk, concatenated.
    pub fn payload_text(&self) -> PatchResult<String> {
        let mut text = String::new();
        for (index, region) in self.regions.iter().enumerate() {
            if let Region::Payload(chunk) = region {
                text.push_str(&chunk.decode(index)?);
            }
        }
        Ok(text)
    }

    /// Apply `edit` to every complete JSON payload row, including rows split
    /// across chunks. Chunks keep their positions: an edited row is moved
    /// whole into the chunk where it starts. Only chunks whose text changed
    /// are re-encoded. Returns the number of changed rows.
    pub fn edit_payload_rows<F>(&mut self, edit: F) -> PatchResult<usize>
    where
        F: FnMut(&str, &mut Value) -> bool,
    {
        let mut chunks = Vec::new();
        for (index, region) in self.regions.iter().enumerate() {
            if let Region::Payload(chunk) = region {
                chunks.push((index, chunk.decode(index)?));
            }
        }

        let stream: String = chunks.iter().map(|(_, text)| text.as_str()).collect();
        let mut flight = FlightText::parse(&stream);
        let changed = flight.edit(edit);
        if changed == 0 {
            return Ok(0);
        }

        let cuts: Vec<usize> = chunks
            .iter()
            .scan(0, |end, (_, text)| {
                *end += text.len();
                Some(*end)
            })
            .collect();
        let (edited, ends) = flight.to_text_split(&cuts);

        let mut start = 0;
        for ((index, old), end) in chunks.iter().zip(ends) {
            let piece = edited.get(start..end).ok_or_else(|| PatchError::MalformedPayload {
                index: *index,
                reason: "edited row crosses a character boundary".to_string(),
            })?;
            if piece != old {
                if let Region::Payload(chunk) = &mut self.regions[*index] {
                    chunk.encode(piece);
                }
            }
            start = end;
        }
        Ok(changed)
    }

    /// Serialize the document.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for region in &self.regions {
            match region {
                Region::Markup(markup) => out.push_str(markup),
                Region::Payload(chunk) => chunk.render_into(&mut out),
            }
        }
        out
    }
}

/// End offset of a string literal body starting at `start`: the index of the
/// first unescaped `"`.
fn scan_literal(html: &str, start: usize) -> Option<usize> {
    let bytes = html.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> String {
        concat!(
            "<html><head><title>A</title></head><body><main>x</main>",
            r#"<script>self.__next_f.push([1,"0:{\"params\":{\"id\":\"7\"}}\n"])</script>"#,
            r#"<script>self.__next_f.push([1,"1:[\"\u003cb\u003e\"]\n"])</script>"#,
            "</body></html>"
        )
        .to_string()
    }

    #[test]
    fn test_parse_render_is_identity() {
        let html = page();
        let doc = Document::parse(&html).unwrap();
        assert_eq!(doc.regions().len(), 4);
        assert!(doc.has_payload());
        assert_eq!(doc.render(), html);
    }

    #[test]
    fn test_payload_text_decodes_chunks() {
        let doc = Document::parse(&page()).unwrap();
        assert_eq!(
            doc.payload_text().unwrap(),
            "0:{\"params\":{\"id\":\"7\"}}\n1:[\"<b>\"]\n"
        );
    }

    #[test]
    fn test_edit_reencodes_only_changed_chunk() {
        let html = page();
        let mut doc = Document::parse(&html).unwrap();
        let changed = doc
            .edit_payload_rows(|_, value| {
                if value.get("params").is_some() {
                    value["params"]["id"] = json!("42");
                    true
                } else {
                    false
                }
            })
            .unwrap();
        assert_eq!(changed, 1);
        let out = doc.render();
        assert!(out.contains(r#"push([1,"0:{\"params\":{\"id\":\"42\"}}\n"])"#));
        assert!(out.contains(r#"push([1,"1:[\"\u003cb\u003e\"]\n"])"#));
    }

    fn split_page() -> String {
        concat!(
            "<html><head><title>Widget 9</title></head><body><main>x</main>",
            r#"<script>self.__next_f.push([1,"0:{\"c\":[\"\",\"product\",\"9\"]}\n1:[\"$\",\"$L2\",null,{\"par"])</script>"#,
            r#"<script>self.__next_f.push([1,"ams\":{\"id\":\"9\"}}]\n2:[[\"$\",\"title\",\"0\",{\"chil"])</script>"#,
            r#"<script>self.__next_f.push([1,"dren\":\"Widget 9\"}]]\n"])</script>"#,
            "</body></html>"
        )
        .to_string()
    }

    #[test]
    fn test_edit_reaches_rows_split_across_chunks() {
        let mut doc = Document::parse(&split_page()).unwrap();
        let before = doc.payload_text().unwrap();
        assert!(before.contains(r#"{"params":{"id":"9"}}"#));

        let changed = doc
            .edit_payload_rows(|id, value| match id {
                "1" => {
                    value[3]["params"]["id"] = json!("42");
                    true
                }
                "2" => {
                    value[0][3]["children"] = json!("Widget 42");
                    true
                }
                _ => false,
            })
            .unwrap();
        assert_eq!(changed, 2);

        let reparsed = Document::parse(&doc.render()).unwrap();
        let payloads = reparsed
            .regions()
            .iter()
            .filter(|r| matches!(r, Region::Payload(_)))
            .count();
        assert_eq!(payloads, 3);

        let after = reparsed.payload_text().unwrap();
        assert_eq!(
            after,
            concat!(
                "0:{\"c\":[\"\",\"product\",\"9\"]}\n",
                "1:[\"$\",\"$L2\",null,{\"params\":{\"id\":\"42\"}}]\n",
                "2:[[\"$\",\"title\",\"0\",{\"children\":\"Widget 42\"}]]\n"
            )
        );
        assert!(!after.contains(r#""id":"9""#));
    }

    #[test]
    fn test_unedited_split_rows_keep_their_chunks() {
        let html = split_page();
        let mut doc = Document::parse(&html).unwrap();
        let changed = doc
            .edit_payload_rows(|id, value| {
                if id == "0" {
                    value["c"][2] = json!("42");
                    true
                } else {
                    false
                }
            })
            .unwrap();
        assert_eq!(changed, 1);
        let out = doc.render();
        assert!(out.contains(r#"push([1,"ams\":{\"id\":\"9\"}}]\n2:[[\"$\",\"title\",\"0\",{\"chil"])"#));
        assert!(out.contains(r#"push([1,"dren\":\"Widget 9\"}]]\n"])"#));
    }

    #[test]
    fn test_document_without_payload() {
        let doc = Document::parse("<html><body>plain</body></html>").unwrap();
        assert!(!doc.has_payload());
        assert_eq!(doc.payload_text().unwrap(), "");
    }

    #[test]
    fn test_unterminated_literal_is_malformed() {
        let err = Document::parse(r#"<script>self.__next_f.push([1,"abc"#).unwrap_err();
        assert!(matches!(err, PatchError::MalformedPayload { index: 0, .. }));
    }
}
