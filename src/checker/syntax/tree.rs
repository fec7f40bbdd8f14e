use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use super::{Cursor, CursorKind, Diagnostic, NodeHash, SourceLocation, TranslationUnit};
use crate::checker::errors::RainbowError;

/// On-disk shape of one dumped syntax tree node.
///
/// Every field except `kind` is optional so dumps can stay sparse: `hash` is
/// only needed where identity matters, `tokens` only under binary operators,
/// `referenced`/`definition` only on bound references and declarations.
#[derive(Deserialize)]
struct RawNode {
    kind: String,
    #[serde(default)]
    spelling: String,
    #[serde(default)]
    children: Vec<RawNode>,
    #[serde(default)]
    hash: Option<NodeHash>,
    #[serde(default)]
    tokens: Vec<String>,
    #[serde(default)]
    referenced: Option<NodeHash>,
    #[serde(default)]
    definition: Option<NodeHash>,
    #[serde(default)]
    location: Option<SourceLocation>,
}

/// Top level dump document: the root node plus any parser diagnostics.
#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    diagnostics: Vec<Diagnostic>,
    root: RawNode,
}

struct NodeData {
    kind: CursorKind,
    spelling: String,
    hash: NodeHash,
    parent: Option<usize>,
    children: Vec<usize>,
    tokens: Vec<String>,
    referenced: Option<NodeHash>,
    definition: Option<NodeHash>,
    location: SourceLocation,
}

/// An arena backed syntax tree loaded from a JSON dump of one translation
/// unit. Cursors are cheap indices into the arena; parents are recovered
/// from the tree structure. Nodes without an explicit `hash` receive their
/// preorder position as a synthetic identity.
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    diagnostics: Vec<Diagnostic>,
}

impl SyntaxTree {
    /// Load a dumped translation unit from a file.
    pub fn from_file(path: &Path) -> Result<Self, RainbowError> {
        let data = fs::read_to_string(path)
            .map_err(|why| RainbowError::SyntaxTree(format!("{}: {}", path.display(), why)))?;
        Self::from_json(&data)
    }

    /// Load a dumped translation unit from JSON text.
    pub fn from_json(data: &str) -> Result<Self, RainbowError> {
        let document: RawDocument = serde_json::from_str(data)
            .map_err(|why| RainbowError::SyntaxTree(why.to_string()))?;
        Ok(Self::from_document(document))
    }

    /// Load a dumped translation unit from an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RainbowError> {
        let document: RawDocument = serde_json::from_value(value)
            .map_err(|why| RainbowError::SyntaxTree(why.to_string()))?;
        Ok(Self::from_document(document))
    }

    fn from_document(document: RawDocument) -> Self {
        let mut tree = SyntaxTree {
            nodes: Vec::new(),
            diagnostics: document.diagnostics,
        };
        tree.add_node(document.root, None);
        tree
    }

    fn add_node(&mut self, raw: RawNode, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        let kind = CursorKind::from_str(&raw.kind)
            .unwrap_or_else(|_| CursorKind::Other(raw.kind.clone()));
        self.nodes.push(NodeData {
            kind,
            spelling: raw.spelling,
            hash: raw.hash.unwrap_or(index as NodeHash),
            parent,
            children: Vec::new(),
            tokens: raw.tokens,
            referenced: raw.referenced,
            definition: raw.definition,
            location: raw.location.unwrap_or_default(),
        });
        for child in raw.children {
            let child_index = self.add_node(child, Some(index));
            self.nodes[index].children.push(child_index);
        }
        index
    }
}

/// A borrowed cursor into a `SyntaxTree` arena.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a SyntaxTree,
    index: usize,
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a NodeData {
        &self.tree.nodes[self.index]
    }

    fn at(&self, index: usize) -> NodeRef<'a> {
        NodeRef {
            tree: self.tree,
            index,
        }
    }
}

impl<'a> Cursor for NodeRef<'a> {
    fn kind(&self) -> CursorKind {
        self.data().kind.clone()
    }

    fn spelling(&self) -> String {
        self.data().spelling.clone()
    }

    fn children(&self) -> Vec<Self> {
        self.data().children.iter().map(|&index| self.at(index)).collect()
    }

    fn semantic_parent(&self) -> Option<Self> {
        self.data().parent.map(|index| self.at(index))
    }

    fn hash(&self) -> NodeHash {
        self.data().hash
    }

    fn location(&self) -> SourceLocation {
        self.data().location.clone()
    }

    fn tokens(&self) -> Vec<String> {
        self.data().tokens.clone()
    }

    fn referenced_hash(&self) -> Option<NodeHash> {
        self.data().referenced
    }

    fn definition_hash(&self) -> Option<NodeHash> {
        self.data().definition
    }
}

impl<'a> TranslationUnit for &'a SyntaxTree {
    type Node = NodeRef<'a>;

    fn cursor(&self) -> NodeRef<'a> {
        NodeRef {
            tree: *self,
            index: 0,
        }
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
