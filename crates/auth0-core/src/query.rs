//! Query parameter helpers.
//!
//! [`QueryParams`] collects key/value pairs from optional values, and
//! [`FieldSelection`] models the `fields` / `include_fields` filter that the
//! Management API accepts on read endpoints.

use std::fmt::Display;

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<T>(&mut self, key: &'static str, value: Option<T>)
    where
        T: ToString,
    {
        if let Some(value) = value {
            self.pairs.push((key, value.to_string()));
        }
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: &'static str, value: T)
    where
        T: Display,
    {
        self.pairs.push((key, value.to_string()));
    }

    /// Borrow the collected key/value pairs.
    #[must_use]
    pub fn as_pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        self.pairs
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Include/exclude filter over top-level response attributes.
///
/// With no fields, full objects are returned. `include_fields` decides whether
/// the named fields are the only ones returned or the ones removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    fields: Vec<String>,
    include_fields: bool,
}

impl FieldSelection {
    /// Selection that returns full objects.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            fields: Vec::new(),
            include_fields: true,
        }
    }

    /// Return only the named fields.
    #[must_use]
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: collect_fields(fields),
            include_fields: true,
        }
    }

    /// Return everything except the named fields.
    #[must_use]
    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: collect_fields(fields),
            include_fields: false,
        }
    }

    /// Build a selection from a comma separated list, e.g. `"name,scopes"`.
    #[must_use]
    pub fn from_list(fields: &str, include_fields: bool) -> Self {
        Self {
            fields: collect_fields(fields.split(',')),
            include_fields,
        }
    }

    /// Named fields.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Whether the named fields are included (`true`) or excluded (`false`).
    #[must_use]
    pub const fn include_fields(&self) -> bool {
        self.include_fields
    }

    /// Returns true when the selection names no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encode as query pairs. `include_fields` is always sent; `fields` only
    /// when at least one field is named.
    #[must_use]
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push_opt(
            "fields",
            (!self.fields.is_empty()).then(|| self.fields.join(",")),
        );
        params.push("include_fields", self.include_fields);
        params
    }
}

impl Default for FieldSelection {
    fn default() -> Self {
        Self::all()
    }
}

fn collect_fields<I, S>(fields: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fields
        .into_iter()
        .map(Into::into)
        .map(|field| field.trim().to_string())
        .filter(|field| !field.is_empty())
        .collect()
}
