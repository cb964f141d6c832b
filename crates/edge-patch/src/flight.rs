//! Payload row codec.
//!
//! A row stream is a sequence of
//!
//! ```text
//! <hex id>:<json>\n          JSON row
//! <hex id>:T<hex len>,<text> text row, `len` bytes, no terminator
//! <hex id>:I[...]\n          any other tagged row (kept opaque)
//! ```
//!
//! Inline documents split one stream across several chunks at arbitrary
//! byte offsets, so rows are parsed from the whole stream and
//! [`FlightText::to_text_split`] maps the chunk boundaries onto the edited
//! text. Only complete JSON rows are editable. Everything else is preserved
//! byte for byte.

use serde_json::Value;

/// One row of a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// A complete JSON row.
    Json {
        id: String,
        value: Value,
        raw: String,
        dirty: bool,
    },
    /// Bytes kept verbatim.
    Raw(String),
}

impl Row {
    fn source_len(&self) -> usize {
        match self {
            Row::Json { raw, .. } | Row::Raw(raw) => raw.len(),
        }
    }

    /// Append the row to `out`. Returns whether it was re-serialized.
    fn write_into(&self, out: &mut String) -> bool {
        match self {
            Row::Json {
                id,
                value,
                dirty: true,
                ..
            } => {
                out.push_str(id);
                out.push(':');
                out.push_str(&value.to_string());
                out.push('\n');
                true
            }
            Row::Json { raw, .. } | Row::Raw(raw) => {
                out.push_str(raw);
                false
            }
        }
    }
}

/// A parsed row stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightText {
    rows: Vec<Row>,
}

impl FlightText {
    /// Parse a stream. An incomplete trailing row is kept raw.
    pub fn parse(text: &str) -> Self {
        let mut rows = Vec::new();
        let mut pos = 0;

        while pos < text.len() {
            let rest = &text[pos..];
            let Some(colon) = rest.find(':') else {
                rows.push(Row::Raw(rest.to_string()));
                break;
            };
            let id = &rest[..colon];
            let body = &rest[colon + 1..];

            if id.is_empty() || !id.chars().all(|c| c.is_ascii_hexdigit()) {
                // not at a row start; keep the rest of the line as-is
                let end = rest.find('\n').map_or(rest.len(), |nl| nl + 1);
                rows.push(Row::Raw(rest[..end].to_string()));
                pos += end;
                continue;
            }

            if let Some(text_row) = body.strip_prefix('T') {
                if let Some((len_hex, _)) = text_row.split_once(',') {
                    if let Ok(len) = usize::from_str_radix(len_hex, 16) {
                        let header = colon + 1 + 1 + len_hex.len() + 1;
                        let end = (header + len).min(rest.len());
                        if rest.is_char_boundary(end) {
                            rows.push(Row::Raw(rest[..end].to_string()));
                            pos += end;
                            continue;
                        }
                    }
                }
            }

            match rest.find('\n') {
                Some(nl) => {
                    let line = &rest[..=nl];
                    let json = &rest[colon + 1..nl];
                    match serde_json::from_str::<Value>(json) {
                        Ok(value) => rows.push(Row::Json {
                            id: id.to_string(),
                            value,
                            raw: line.to_string(),
                            dirty: false,
                        }),
                        Err(_) => rows.push(Row::Raw(line.to_string())),
                    }
                    pos += nl + 1;
                }
                None => {
                    rows.push(Row::Raw(rest.to_string()));
                    break;
                }
            }
        }

        Self { rows }
    }

    /// All rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Apply `edit` to every JSON row. `edit` returns whether it changed the
    /// value. Returns the number of changed rows.
    pub fn edit<F>(&mut self, mut edit: F) -> usize
    where
        F: FnMut(&str, &mut Value) -> bool,
    {
        let mut changed = 0;
        for row in &mut self.rows {
            if let Row::Json {
                id, value, dirty, ..
            } = row
            {
                if edit(id, value) {
                    *dirty = true;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Serialize back to text. Unedited rows keep their original bytes.
    pub fn to_text(&self) -> String {
        self.to_text_split(&[]).0
    }

    /// Serialize, mapping each source offset in `cuts` (ascending) to the
    /// matching offset in the output. A cut inside an edited row moves to
    /// the end of that row, so the whole row lands before the cut.
    pub fn to_text_split(&self, cuts: &[usize]) -> (String, Vec<usize>) {
        let mut out = String::new();
        let mut mapped = Vec::with_capacity(cuts.len());
        let mut cuts = cuts.iter().copied().peekable();
        let mut source = 0;

        for row in &self.rows {
            let out_start = out.len();
            let source_end = source + row.source_len();
            let rewritten = row.write_into(&mut out);
            while let Some(cut) = cuts.next_if(|&cut| cut <= source_end) {
                let cut = cut.max(source);
                mapped.push(if rewritten && cut > source {
                    out.len()
                } else {
                    out_start + (cut - source)
                });
            }
            source = source_end;
        }
        mapped.extend(cuts.map(|_| out.len()));
        (out, mapped)
    }
}
