//! Per-column compressed (radix) trie: dictionary-encodes string values to
//! stable positive integer indices, with prefix sharing (spec.md §4.B).
//!
//! Grounded on `original_source/joedb/joedb.py`'s `Trie`/`TrieNode`
//! (split-on-insert, single-child merge, depth-first renumbering),
//! generalized into the teacher's arena-of-nodes style (`src/trie/trie.rs`
//! keeps children in an ordered `Vec` rather than a `HashMap`, which this
//! module follows so that child iteration order — and thus the tie-break
//! rule in spec.md §4.B — is reproducible across encode/decode).

use crate::error::{Error, Result};
use crate::err_at;
use std::collections::{BTreeSet, HashMap};

const ROOT: usize = 0;

struct Node {
    /// Ordered `(edge label, child node id)` pairs. Order is insertion
    /// order, which the encoder/decoder must both preserve (spec.md §4.B
    /// tie-break rule).
    children: Vec<(Vec<u8>, usize)>,
    index: Option<u32>,
}

impl Node {
    fn new() -> Self {
        Node {
            children: Vec::new(),
            index: None,
        }
    }
}

/// A per-column compressed trie. Node 0 is the arena-allocated root and is
/// never assigned an index; index 0 is the permanent "absent" sentinel.
pub struct Trie {
    nodes: Vec<Node>,
    next_index: u32,
}

impl Default for Trie {
    fn default() -> Self {
        Trie::new()
    }
}

impl Trie {
    pub fn new() -> Trie {
        Trie {
            nodes: vec![Node::new()],
            next_index: 1,
        }
    }

    fn fresh_index(&mut self) -> u32 {
        let idx = self.next_index;
        self.next_index += 1;
        idx
    }

    fn alloc(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Insert `word`, returning its (possibly pre-existing) positive index.
    pub fn insert(&mut self, word: &str) -> u32 {
        let word = word.as_bytes();
        let mut node_id = ROOT;
        let mut pos = 0usize;

        // Descend while a child's whole edge label is a prefix of the
        // remaining word (exact full-edge match only — mirrors
        // `joedb.py`'s descent loop, which only advances on `word[idx:idx+len(key)] == key`).
        loop {
            let mut advanced = None;
            for (label, child) in &self.nodes[node_id].children {
                let remaining = &word[pos..];
                if remaining.len() >= label.len() && &remaining[..label.len()] == label.as_slice()
                {
                    advanced = Some((*child, label.len()));
                    break;
                }
            }
            match advanced {
                Some((child, len)) => {
                    node_id = child;
                    pos += len;
                }
                None => break,
            }
        }

        if pos == word.len() {
            // Every node reachable by fully consuming a nonempty word was
            // indexed when it was created; callers must reject empty
            // strings before they reach `insert` (spec.md §9).
            return self.nodes[node_id]
                .index
                .expect("exact-match trie node must carry an index");
        }

        let remaining_word = &word[pos..];

        // Look for a child sharing a nonzero prefix with the remaining
        // word — first match in iteration order wins (tie-break rule).
        let mut split_at = None;
        for (i, (label, _)) in self.nodes[node_id].children.iter().enumerate() {
            let common = common_prefix_len(remaining_word, label);
            if common > 0 {
                split_at = Some((i, common));
                break;
            }
        }

        match split_at {
            Some((i, common)) => {
                let (old_label, old_child) = self.nodes[node_id].children[i].clone();
                let remaining_key = old_label[common..].to_vec();
                let remaining_suffix = remaining_word[common..].to_vec();

                let new_index = self.fresh_index();
                let mut new_node = Node::new();
                new_node.children.push((remaining_key, old_child));
                new_node.index = Some(new_index);
                let new_node_id = self.alloc(new_node);

                self.nodes[node_id].children[i] = (remaining_word[..common].to_vec(), new_node_id);

                if remaining_suffix.is_empty() {
                    new_index
                } else {
                    let leaf_index = self.fresh_index();
                    let mut leaf = Node::new();
                    leaf.index = Some(leaf_index);
                    let leaf_id = self.alloc(leaf);
                    self.nodes[new_node_id]
                        .children
                        .push((remaining_suffix, leaf_id));
                    leaf_index
                }
            }
            None => {
                let index = self.fresh_index();
                let mut leaf = Node::new();
                leaf.index = Some(index);
                let leaf_id = self.alloc(leaf);
                self.nodes[node_id]
                    .children
                    .push((remaining_word.to_vec(), leaf_id));
                index
            }
        }
    }

    /// Replace any node with exactly one child whose own index is not in
    /// `protected` by concatenating its edge label into the parent edge.
    pub fn merge_single_children(&mut self, protected: &BTreeSet<u32>) {
        self.merge_from(ROOT, protected);
    }

    fn merge_from(&mut self, node_id: usize, protected: &BTreeSet<u32>) {
        let child_ids: Vec<usize> = self.nodes[node_id]
            .children
            .iter()
            .map(|(_, c)| *c)
            .collect();
        for mut child_id in child_ids {
            loop {
                let mergeable = self.nodes[child_id].children.len() == 1
                    && self.nodes[child_id]
                        .index
                        .map(|idx| !protected.contains(&idx))
                        .unwrap_or(true);
                if !mergeable {
                    break;
                }
                let (grandchild_label, grandchild_id) =
                    self.nodes[child_id].children[0].clone();

                let slot = self.nodes[node_id]
                    .children
                    .iter_mut()
                    .find(|(_, c)| *c == child_id)
                    .expect("child_id must be a child of node_id");
                slot.0.extend_from_slice(&grandchild_label);
                slot.1 = grandchild_id;
                child_id = grandchild_id;
            }
            self.merge_from(child_id, protected);
        }
    }

    /// Depth-first traversal from the root; assigns consecutive integers
    /// starting at 1 to every indexed node in visit order. Returns the
    /// `old_index -> new_index` mapping.
    pub fn rename_indices(&mut self) -> HashMap<u32, u32> {
        let mut rename = HashMap::new();
        self.next_index = 1;
        self.rename_from(ROOT, &mut rename);
        rename
    }

    fn rename_from(&mut self, node_id: usize, rename: &mut HashMap<u32, u32>) {
        if let Some(old) = self.nodes[node_id].index {
            let new = self.next_index;
            self.next_index += 1;
            rename.insert(old, new);
            self.nodes[node_id].index = Some(new);
        }
        let child_ids: Vec<usize> = self.nodes[node_id]
            .children
            .iter()
            .map(|(_, c)| *c)
            .collect();
        for child_id in child_ids {
            self.rename_from(child_id, rename);
        }
    }

    /// Depth-first traversal producing `index -> full string`.
    pub fn build_value_map(&self) -> HashMap<u32, String> {
        let mut map = HashMap::new();
        self.walk_values(ROOT, Vec::new(), &mut map);
        map
    }

    fn walk_values(&self, node_id: usize, prefix: Vec<u8>, out: &mut HashMap<u32, String>) {
        if let Some(idx) = self.nodes[node_id].index {
            out.insert(idx, String::from_utf8_lossy(&prefix).into_owned());
        }
        for (label, child) in &self.nodes[node_id].children {
            let mut next = prefix.clone();
            next.extend_from_slice(label);
            self.walk_values(*child, next, out);
        }
    }

    /// Serialize the trie as a depth-first walk per spec.md §6: for each
    /// child of the current node, write its (null-terminated) edge label
    /// and child count, then recurse; after root's own children have all
    /// been written, a single literal `0x00` terminates the section.
    ///
    /// Only the root level needs this terminator: every non-root node's
    /// child count is already known to the reader (its parent wrote it),
    /// so descents below root are bounded by that count instead of a
    /// per-node terminator (matches `original_source/joedb/joedb.py`'s
    /// `_write_trie`/`_read_trie`, where only the top-level walk reads
    /// until a terminator and nested reads are counted).
    pub fn write_depth_first<W: std::io::Write>(&self, w: &mut W) -> Result<()> {
        self.write_node(w, ROOT)?;
        err_at!(IOError, w.write_all(&[0]))
    }

    fn write_node<W: std::io::Write>(&self, w: &mut W, node_id: usize) -> Result<()> {
        for (label, child) in &self.nodes[node_id].children {
            err_at!(IOError, w.write_all(label))?;
            err_at!(IOError, w.write_all(&[0]))?;
            let child_count = self.nodes[*child].children.len();
            if child_count > u8::MAX as usize {
                return err_at!(
                    TrieInvariantViolation,
                    msg: "node has {} children, more than a u8 can hold",
                    child_count
                );
            }
            err_at!(IOError, w.write_all(&[child_count as u8]))?;
            self.write_node(w, *child)?;
        }
        Ok(())
    }

    /// Reconstruct a trie from its depth-first serialized form, assigning
    /// indices in the same traversal order they were read (decoder side
    /// of spec.md §6; indices are dense `1..=K` exactly as renumbered by
    /// the encoder, so no explicit index is stored on the wire).
    pub fn read_depth_first<R: std::io::Read>(r: &mut R) -> Result<Trie> {
        let mut trie = Trie::new();
        trie.next_index = 1;
        // Root's children are read until the terminator byte; each
        // child's own children are then read exactly `child_count` times.
        loop {
            let label = read_null_terminated(r)?;
            if label.is_empty() {
                break;
            }
            let child_count = Self::read_child_count(r)?;
            let child_id = trie.new_child(ROOT, label);
            Self::read_children(r, &mut trie, child_id, child_count)?;
        }
        Ok(trie)
    }

    fn read_children<R: std::io::Read>(
        r: &mut R,
        trie: &mut Trie,
        node_id: usize,
        count: u8,
    ) -> Result<()> {
        for _ in 0..count {
            let label = read_null_terminated(r)?;
            let child_count = Self::read_child_count(r)?;
            let child_id = trie.new_child(node_id, label);
            Self::read_children(r, trie, child_id, child_count)?;
        }
        Ok(())
    }

    fn read_child_count<R: std::io::Read>(r: &mut R) -> Result<u8> {
        let mut buf = [0u8; 1];
        err_at!(IOError, r.read_exact(&mut buf))?;
        Ok(buf[0])
    }

    fn new_child(&mut self, parent: usize, label: Vec<u8>) -> usize {
        let index = self.fresh_index();
        let mut child = Node::new();
        child.index = Some(index);
        let child_id = self.alloc(child);
        self.nodes[parent].children.push((label, child_id));
        child_id
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

fn read_null_terminated<R: std::io::Read>(r: &mut R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match r.read(&mut byte) {
            Ok(0) => {
                return err_at!(
                    TruncatedFile,
                    msg: "EOF while reading a null-terminated string"
                )
            }
            Ok(_) => {
                if byte[0] == 0 {
                    break;
                }
                buf.push(byte[0]);
            }
            Err(e) => return err_at!(IOError, Err::<Vec<u8>, _>(e)),
        }
    }
    Ok(buf)
}
