//! Inline nodes: the frozen result tree and the linked working arena
//! used while delimiters are being resolved.

/// Link or image payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkData {
    /// Destination with backslash escapes and entities resolved.
    pub destination: String,
    /// Title, empty when absent.
    pub title: String,
    pub children: Vec<Inline>,
}

/// The closed set of inline kinds. Never mutated once returned from
/// inline parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    SoftBreak,
    HardBreak,
    Code(String),
    Html(String),
    Emph(Vec<Inline>),
    Strong(Vec<Inline>),
    Link(LinkData),
    Image(LinkData),
    Autolink { uri: String, email: bool },
}

/// Handle into the inline working arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InlId(pub(crate) u32);

impl InlId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Working node kinds. Containers get children via links; the rest carry
/// their literal directly.
#[derive(Debug)]
pub(crate) enum WorkKind {
    Root,
    Text(String),
    SoftBreak,
    HardBreak,
    Code(String),
    Html(String),
    Emph,
    Strong,
    Link { destination: String, title: String },
    Image { destination: String, title: String },
    Autolink { uri: String, email: bool },
}

/// A node in the doubly-linked working tree.
#[derive(Debug)]
pub(crate) struct WorkNode {
    pub kind: WorkKind,
    pub parent: Option<InlId>,
    pub first_child: Option<InlId>,
    pub last_child: Option<InlId>,
    pub prev: Option<InlId>,
    pub next: Option<InlId>,
}

/// Index-based arena for the inline working tree, so unlink/insert are
/// O(1) without reference juggling.
#[derive(Debug)]
pub(crate) struct InlineArena {
    nodes: Vec<WorkNode>,
}

impl InlineArena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(16),
        }
    }

    pub fn alloc(&mut self, kind: WorkKind) -> InlId {
        let id = InlId(self.nodes.len() as u32);
        self.nodes.push(WorkNode {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev: None,
            next: None,
        });
        id
    }

    #[inline]
    pub fn node(&self, id: InlId) -> &WorkNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: InlId) -> &mut WorkNode {
        &mut self.nodes[id.index()]
    }

    /// Append `child` as the last child of `parent`. The child must be
    /// detached.
    pub fn append_child(&mut self, parent: InlId, child: InlId) {
        debug_assert!(self.node(child).parent.is_none());
        let old_last = self.node(parent).last_child;
        self.node_mut(child).parent = Some(parent);
        self.node_mut(child).prev = old_last;
        self.node_mut(child).next = None;
        match old_last {
            Some(last) => self.node_mut(last).next = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);
    }

    /// Insert `node` as the next sibling of `anchor`.
    pub fn insert_after(&mut self, anchor: InlId, node: InlId) {
        debug_assert!(self.node(node).parent.is_none());
        let parent = self.node(anchor).parent;
        let anchor_next = self.node(anchor).next;
        self.node_mut(node).parent = parent;
        self.node_mut(node).prev = Some(anchor);
        self.node_mut(node).next = anchor_next;
        self.node_mut(anchor).next = Some(node);
        match anchor_next {
            Some(next) => self.node_mut(next).prev = Some(node),
            None => {
                if let Some(p) = parent {
                    self.node_mut(p).last_child = Some(node);
                }
            }
        }
    }

    /// Detach a node from its siblings and parent. Its own children are
    /// kept.
    pub fn unlink(&mut self, id: InlId) {
        let WorkNode {
            parent, prev, next, ..
        } = *self.node(id);
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => {
                if let Some(par) = parent {
                    self.node_mut(par).first_child = next;
                }
            }
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => {
                if let Some(par) = parent {
                    self.node_mut(par).last_child = prev;
                }
            }
        }
        let node = self.node_mut(id);
        node.parent = None;
        node.prev = None;
        node.next = None;
    }

    /// Mutable access to a Text node's literal.
    pub fn text_mut(&mut self, id: InlId) -> &mut String {
        match &mut self.node_mut(id).kind {
            WorkKind::Text(s) => s,
            kind => panic!("expected text node, found {kind:?}"),
        }
    }

    /// Convert the working tree below `root` into the frozen inline
    /// representation.
    pub fn into_inlines(&self, root: InlId) -> Vec<Inline> {
        self.collect_children(root)
    }

    fn collect_children(&self, parent: InlId) -> Vec<Inline> {
        let mut out = Vec::new();
        let mut cur = self.node(parent).first_child;
        while let Some(id) = cur {
            let node = self.node(id);
            match &node.kind {
                WorkKind::Root => {}
                WorkKind::Text(s) => {
                    if !s.is_empty() {
                        out.push(Inline::Text(s.clone()));
                    }
                }
                WorkKind::SoftBreak => out.push(Inline::SoftBreak),
                WorkKind::HardBreak => out.push(Inline::HardBreak),
                WorkKind::Code(s) => out.push(Inline::Code(s.clone())),
                WorkKind::Html(s) => out.push(Inline::Html(s.clone())),
                WorkKind::Emph => out.push(Inline::Emph(self.collect_children(id))),
                WorkKind::Strong => out.push(Inline::Strong(self.collect_children(id))),
                WorkKind::Link { destination, title } => out.push(Inline::Link(LinkData {
                    destination: destination.clone(),
                    title: title.clone(),
                    children: self.collect_children(id),
                })),
                WorkKind::Image { destination, title } => out.push(Inline::Image(LinkData {
                    destination: destination.clone(),
                    title: title.clone(),
                    children: self.collect_children(id),
                })),
                WorkKind::Autolink { uri, email } => out.push(Inline::Autolink {
                    uri: uri.clone(),
                    email: *email,
                }),
            }
            cur = node.next;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_collect() {
        let mut arena = InlineArena::new();
        let root = arena.alloc(WorkKind::Root);
        let a = arena.alloc(WorkKind::Text("a".into()));
        let b = arena.alloc(WorkKind::Text("b".into()));
        arena.append_child(root, a);
        arena.append_child(root, b);
        assert_eq!(
            arena.into_inlines(root),
            vec![Inline::Text("a".into()), Inline::Text("b".into())]
        );
    }

    #[test]
    fn test_insert_after_and_unlink() {
        let mut arena = InlineArena::new();
        let root = arena.alloc(WorkKind::Root);
        let a = arena.alloc(WorkKind::Text("a".into()));
        let c = arena.alloc(WorkKind::Text("c".into()));
        arena.append_child(root, a);
        arena.append_child(root, c);
        let b = arena.alloc(WorkKind::Text("b".into()));
        arena.insert_after(a, b);
        assert_eq!(
            arena.into_inlines(root),
            vec![
                Inline::Text("a".into()),
                Inline::Text("b".into()),
                Inline::Text("c".into())
            ]
        );
        arena.unlink(b);
        assert_eq!(
            arena.into_inlines(root),
            vec![Inline::Text("a".into()), Inline::Text("c".into())]
        );
        assert_eq!(arena.node(root).last_child, Some(c));
    }

    #[test]
    fn test_nested_containers() {
        let mut arena = InlineArena::new();
        let root = arena.alloc(WorkKind::Root);
        let em = arena.alloc(WorkKind::Emph);
        let t = arena.alloc(WorkKind::Text("x".into()));
        arena.append_child(root, em);
        arena.append_child(em, t);
        assert_eq!(
            arena.into_inlines(root),
            vec![Inline::Emph(vec![Inline::Text("x".into())])]
        );
    }
}
