//! The OCS status envelope.

use std::fmt;

use crate::ocs::payload::Payload;

/// Status code for a successful call.
pub const CODE_OK: u32 = 100;
/// A mandatory field was empty.
pub const CODE_MISSING_FIELD: u32 = 101;
/// Login/password pair was rejected.
pub const CODE_INVALID_LOGIN: u32 = 102;
/// Forbidden, or the addressed resource does not exist.
pub const CODE_FORBIDDEN: u32 = 300;
/// A collaborator failed or timed out.
pub const CODE_SERVER_ERROR: u32 = 996;
/// No route matched the request.
pub const CODE_NO_ROUTE: u32 = 999;

/// Outcome carried in `meta/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Failed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Failed => "failed",
        }
    }
}

/// Layout rule for the XML `data` element.
///
/// JSON ignores the dimension and always embeds the payload as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dimension {
    /// `-1`: no `data` element.
    Absent,
    /// `0`: the payload is a scalar written as the text of `data`.
    Scalar,
    /// `1`: one element per top-level key.
    Flat,
    /// `2`: one `tag` element per entry, nested mappings inlined.
    Entries,
    /// `3`: like `Entries`, nested mappings wrapped in an element named
    /// after the entry's key.
    Grouped,
    /// Arbitrary depth; positional and numeric keys use `fallback` as name.
    Dynamic { fallback: String },
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Absent => f.write_str("-1"),
            Dimension::Scalar => f.write_str("0"),
            Dimension::Flat => f.write_str("1"),
            Dimension::Entries => f.write_str("2"),
            Dimension::Grouped => f.write_str("3"),
            Dimension::Dynamic { .. } => f.write_str("dynamic"),
        }
    }
}

/// Status, metadata and data of one OCS response.
///
/// Built by a handler and rendered exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: Status,
    pub status_code: u32,
    pub message: String,
    pub data: Payload,
    pub tag: String,
    pub tag_attribute: String,
    pub dimension: Dimension,
    pub items_count: Option<u64>,
    pub items_per_page: Option<u64>,
}

impl Envelope {
    fn new(status: Status, status_code: u32, message: impl Into<String>) -> Self {
        Self {
            status,
            status_code,
            message: message.into(),
            data: Payload::empty(),
            tag: String::new(),
            tag_attribute: String::new(),
            dimension: Dimension::Absent,
            items_count: None,
            items_per_page: None,
        }
    }

    /// `ok`/100 with no data.
    pub fn ok() -> Self {
        Self::new(Status::Ok, CODE_OK, "")
    }

    /// `failed` with the given code and message, no data.
    pub fn failed(status_code: u32, message: impl Into<String>) -> Self {
        Self::new(Status::Failed, status_code, message)
    }

    /// Attach data and the dimension it is laid out with.
    pub fn with_data(mut self, data: Payload, dimension: Dimension) -> Self {
        self.data = data;
        self.dimension = dimension;
        self
    }

    /// Name (and optional `details` attribute) of entry elements.
    pub fn with_tag(mut self, tag: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.tag = tag.into();
        self.tag_attribute = attribute.into();
        self
    }

    /// Paging counts.
    pub fn with_items(mut self, count: u64, per_page: u64) -> Self {
        self.items_count = Some(count);
        self.items_per_page = Some(per_page);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let env = Envelope::ok()
            .with_data(Payload::map([("a", "1")]), Dimension::Flat)
            .with_tag("config", "")
            .with_items(1, 0);

        assert!(env.is_ok());
        assert_eq!(env.status_code, CODE_OK);
        assert_eq!(env.tag, "config");
        assert_eq!(env.items_count, Some(1));
        assert_eq!(env.dimension.to_string(), "1");
    }

    #[test]
    fn test_failed_has_no_data() {
        let env = Envelope::failed(CODE_FORBIDDEN, "nope");
        assert_eq!(env.status.as_str(), "failed");
        assert_eq!(env.dimension, Dimension::Absent);
        assert!(env.data.is_empty());
        assert_eq!(env.items_count, None);
    }
}
