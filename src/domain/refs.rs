// Object references - loosely-typed pointers to metadata objects
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a metadata object, either by identifier or by uri.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjRef {
    Identifier(String),
    Uri(String),
}

impl ObjRef {
    pub fn identifier(id: impl Into<String>) -> Self {
        ObjRef::Identifier(id.into())
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        ObjRef::Uri(uri.into())
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjRef::Identifier(id) => write!(f, "id:{}", id),
            ObjRef::Uri(uri) => write!(f, "uri:{}", uri),
        }
    }
}

/// Identity shared by every object that came from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataObject {
    pub identifier: String,
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

impl MetadataObject {
    pub fn new(identifier: impl Into<String>, uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            uri: uri.into(),
            title: title.into(),
        }
    }

    pub fn matches(&self, obj_ref: &ObjRef) -> bool {
        match obj_ref {
            ObjRef::Identifier(id) => &self.identifier == id,
            ObjRef::Uri(uri) => &self.uri == uri,
        }
    }

    pub fn obj_ref(&self) -> ObjRef {
        ObjRef::Identifier(self.identifier.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_matches_either_ref_kind() {
        let meta = MetadataObject::new("revenue", "/gdc/md/p1/obj/12", "Revenue");

        assert!(meta.matches(&ObjRef::identifier("revenue")));
        assert!(meta.matches(&ObjRef::uri("/gdc/md/p1/obj/12")));
        assert!(!meta.matches(&ObjRef::identifier("/gdc/md/p1/obj/12")));
    }
}
