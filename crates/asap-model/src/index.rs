use serde::{Deserialize, Serialize};

/// Where an `IndexField`'s value is resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexFieldSource {
    Acord103,
    Acord121,
    DeltaQc,
    Lims,
    Derived,
}

/// Whether an index is built once per case or once per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexType {
    Case,
    Document,
}

/// A single field in an index schema, and (during a build) its resolved
/// value. `reference` is a dotted XML path for ACORD sources or
/// `table.column` for LIMS; `DERIVED` fields carry no reference and are
/// filled entirely by the carrier hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexField {
    pub name: String,
    pub source: IndexFieldSource,
    pub reference: Option<String>,
    pub required: bool,
    pub max_length: Option<usize>,
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl IndexField {
    pub fn reset(&mut self) {
        self.value = None;
    }

    /// Splits a LIMS `table.column` reference. Panics-free: returns `None`
    /// for references that aren't in that shape (ACORD dotted paths).
    pub fn lims_table_column(&self) -> Option<(&str, &str)> {
        self.reference.as_deref().and_then(|r| r.split_once('.'))
    }
}

/// The ordered field list a contact indexes cases against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    pub fields: Vec<IndexField>,
    pub delim: String,
    pub subdelim: String,
    #[serde(rename = "type")]
    pub index_type: IndexType,
}

impl Index {
    pub fn reset_all(&mut self) {
        for f in &mut self.fields {
            f.reset();
        }
    }

    /// Renders the configured escape sequences `<LF> <CR> <T> <SP>` that a
    /// contact may embed in `delim`/`subdelim` instead of literal whitespace.
    pub fn resolve_escapes(raw: &str) -> String {
        raw.replace("<LF>", "\n")
            .replace("<CR>", "\r")
            .replace("<T>", "\t")
            .replace("<SP>", " ")
    }

    /// Serializes the current field values as `field<subdelim>value<delim>...`.
    /// Returns an error listing every required-but-empty field before doing
    /// any I/O, per the write-fails-before-io invariant.
    pub fn write_line(&self) -> Result<String, Vec<String>> {
        let missing: Vec<String> = self
            .fields
            .iter()
            .filter(|f| f.required && f.value.as_deref().unwrap_or("").is_empty())
            .map(|f| f.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }
        let delim = Self::resolve_escapes(&self.delim);
        let subdelim = Self::resolve_escapes(&self.subdelim);
        let rendered: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{}{}{}", f.name, subdelim, f.value.clone().unwrap_or_default()))
            .collect();
        Ok(rendered.join(&delim))
    }

    /// Parses a previously-written index line back into name/value pairs,
    /// for the read(write(x)) == x round-trip law. Values must not contain
    /// the configured delimiters (no escaping is implemented, matching the
    /// source format).
    pub fn parse_line(&self, line: &str) -> Vec<(String, String)> {
        let delim = Self::resolve_escapes(&self.delim);
        let subdelim = Self::resolve_escapes(&self.subdelim);
        line.split(delim.as_str())
            .filter(|s| !s.is_empty())
            .filter_map(|entry| entry.split_once(subdelim.as_str()))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
