//! Document paths for violation reporting
//!
//! A path is a sequence of field and index accessors from the document root.
//! Displayed as `app.ingesters[0].port`; the root itself is `$root`. Field
//! names that are empty or contain `.`, `[` or `]` are written in bracket
//! form with a JSON-quoted name, e.g. `app["a.b"]`.

use std::fmt;

use serde::{Serialize, Serializer};

/// One accessor step inside a candidate document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member
    Field(String),
    /// Array element
    Index(usize),
}

/// Path from the document root to a value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    segments: Vec<PathSegment>,
}

impl DocumentPath {
    /// The document root
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns a new path one field deeper.
    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Field(name.into()));
        next
    }

    /// Returns a new path one array element deeper.
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Index(index));
        next
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "$root");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if needs_quoting(name) => {
                    let quoted = serde_json::to_string(name).map_err(|_| fmt::Error)?;
                    write!(f, "[{}]", quoted)?
                }
                PathSegment::Field(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

fn needs_quoting(name: &str) -> bool {
    name.is_empty() || name.contains(['.', '[', ']'])
}

impl Serialize for DocumentPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display() {
        assert_eq!(DocumentPath::root().to_string(), "$root");
        assert!(DocumentPath::root().is_root());
    }

    #[test]
    fn test_nested_display() {
        let path = DocumentPath::root()
            .field("app")
            .field("ingesters")
            .index(0)
            .field("port");
        assert_eq!(path.to_string(), "app.ingesters[0].port");
    }

    #[test]
    fn test_dotted_field_names_are_quoted() {
        let dotted = DocumentPath::root().field("a.b");
        let nested = DocumentPath::root().field("a").field("b");
        assert_eq!(dotted.to_string(), "[\"a.b\"]");
        assert_eq!(nested.to_string(), "a.b");
        assert_ne!(dotted.to_string(), nested.to_string());

        let inner = DocumentPath::root().field("x").field("a.b").field("c");
        assert_eq!(inner.to_string(), "x[\"a.b\"].c");

        let bracketed = DocumentPath::root().field("tags[0]");
        assert_eq!(bracketed.to_string(), "[\"tags[0]\"]");
        assert_eq!(DocumentPath::root().field("").to_string(), "[\"\"]");
    }

    #[test]
    fn test_top_level_index() {
        let path = DocumentPath::root().index(2).field("name");
        assert_eq!(path.to_string(), "[2].name");
    }

    #[test]
    fn test_serializes_as_string() {
        let path = DocumentPath::root().field("index");
        assert_eq!(serde_json::to_value(&path).unwrap(), serde_json::json!("index"));
    }
}
