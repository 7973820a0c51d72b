use std::path::PathBuf;

use page_grounding::dom::document::{Document, NodeId};

pub fn fixture(name: &str) -> PathBuf {
    std::env::current_dir()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn load_fixture(name: &str) -> Document {
    let json = std::fs::read_to_string(fixture(name)).unwrap();
    Document::from_json(&json).unwrap()
}

/// Fresh path under the system temp dir, removed if it already exists.
pub fn temp_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("page-grounding-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_file(&path);
    path
}

/// `outer` strictly contains `inner`.
pub fn strictly_contains(doc: &Document, outer: NodeId, inner: NodeId) -> bool {
    outer != inner && doc.contains(outer, inner)
}
