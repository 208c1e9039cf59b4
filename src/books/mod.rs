//! The book catalogue: record type, in-memory store, and its HTTP surface.

pub mod api;
mod store;

pub use store::{BookStore, SharedStore, StoreError};

use std::fmt;

use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

/// A catalogue entry. `id` is assigned by the client and unique in a store.
///
/// Decoding is lenient about content and strict about shape:
///
/// - only a JSON object is a book; arrays and scalars are rejected;
/// - keys match field names case-insensitively (`"ID"` sets `id`);
/// - unknown keys are ignored;
/// - a missing or `null` field decodes as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: String,
    pub author: String,
    pub name: String,
}

impl Book {
    pub fn new(id: impl Into<String>, author: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), author: author.into(), name: name.into() }
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        if key.eq_ignore_ascii_case("id") {
            Some(&mut self.id)
        } else if key.eq_ignore_ascii_case("author") {
            Some(&mut self.author)
        } else if key.eq_ignore_ascii_case("name") {
            Some(&mut self.name)
        } else {
            None
        }
    }
}

impl<'de> Deserialize<'de> for Book {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(BookVisitor)
    }
}

struct BookVisitor;

impl<'de> Visitor<'de> for BookVisitor {
    type Value = Book;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a book object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Book, A::Error> {
        let mut book = Book::default();
        while let Some(key) = map.next_key::<String>()? {
            match book.field_mut(&key) {
                Some(slot) => {
                    if let Some(value) = map.next_value::<Option<String>>()? {
                        *slot = value;
                    }
                }
                None => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(book)
    }
}
