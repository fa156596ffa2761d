//! Stack of open elements.

/// Entry in the stack of open elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct OpenElement {
    pub(crate) name: String,
    /// Offset of the element's `<` (or of the markup that implied it).
    pub(crate) start: usize,
}

/// Open-element stack with deterministic push/pop behavior.
#[derive(Clone, Debug, Default)]
pub(crate) struct OpenElementsStack {
    items: Vec<OpenElement>,
    max_depth: usize,
}

impl OpenElementsStack {
    pub(crate) fn push(&mut self, entry: OpenElement) {
        self.items.push(entry);
        self.max_depth = self.max_depth.max(self.items.len());
    }

    pub(crate) fn current(&self) -> Option<&OpenElement> {
        self.items.last()
    }

    pub(crate) fn current_name(&self) -> Option<&str> {
        self.current().map(|entry| entry.name.as_str())
    }

    pub(crate) fn pop(&mut self) -> Option<OpenElement> {
        self.items.pop()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Depth (0 = bottom) of the nearest open element named `name`.
    pub(crate) fn rposition(&self, name: &str) -> Option<usize> {
        self.items.iter().rposition(|entry| entry.name == name)
    }

    /// Bottom to top.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &OpenElement> {
        self.items.iter()
    }
}
