//! Generic document-tree traversal, decoupled from the markup library.
//!
//! Used to infer a cell's payer from nearby headings when the table has
//! no payer columns: previous siblings are checked first, then each
//! ancestor in turn.

/// Minimal view of a node in a parsed document tree.
pub trait DocNode: Sized + Clone {
    /// All text under this node, whitespace-normalized.
    fn text_content(&self) -> String;
    /// Element siblings preceding this node, nearest first.
    fn prev_siblings(&self) -> Vec<Self>;
    fn parent(&self) -> Option<Self>;
}

/// Walk outward from `start`: probe the text of each previous sibling,
/// then the parent, repeating up the ancestor chain. Returns the first
/// value the probe yields, or None when the root is passed.
pub fn scan_ancestry<N, T, F>(start: &N, probe: F) -> Option<T>
where
    N: DocNode,
    F: Fn(&str) -> Option<T>,
{
    let mut cur = Some(start.clone());
    while let Some(node) = cur {
        for sib in node.prev_siblings() {
            if let Some(found) = probe(&sib.text_content()) {
                return Some(found);
            }
        }
        let parent = node.parent();
        if let Some(ref p) = parent {
            if let Some(found) = probe(&p.text_content()) {
                return Some(found);
            }
        }
        cur = parent;
    }
    None
}
