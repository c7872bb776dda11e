//! Source position stack used for diagnostics.
//!
//! One entry per input source currently being read: the top-level input at
//! the bottom, then one per nested include or loop body.  The top entry names
//! the file and line every diagnostic points at.

/// Where the scanner currently is in one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePosition {
    pub source_name: String,
    /// 1-based line number.
    pub line: usize,
}

#[derive(Debug, Default)]
pub struct PositionStack {
    entries: Vec<FilePosition>,
}

impl PositionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `source_name` at line 1.
    pub fn push(&mut self, source_name: impl Into<String>) {
        self.push_at(source_name, 1);
    }

    /// Enter `source_name` at an arbitrary starting line (loop bodies resume
    /// numbering where the loop began).
    pub fn push_at(&mut self, source_name: impl Into<String>, line: usize) {
        let source_name = source_name.into();
        tracing::debug!(source = %source_name, line, depth = self.entries.len() + 1, "enter source");
        self.entries.push(FilePosition { source_name, line });
    }

    pub fn pop(&mut self) -> Option<FilePosition> {
        let popped = self.entries.pop();
        if let Some(p) = &popped {
            tracing::debug!(source = %p.source_name, line = p.line, "leave source");
        }
        popped
    }

    pub fn current(&self) -> Option<&FilePosition> {
        self.entries.last()
    }

    pub fn advance_line(&mut self) {
        if let Some(top) = self.entries.last_mut() {
            top.line += 1;
        }
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_balance() {
        let mut s = PositionStack::new();
        s.push("main.i");
        s.advance_line();
        s.advance_line();
        s.push("inc.i");
        assert_eq!(s.depth(), 2);
        assert_eq!(s.current().unwrap().line, 1);
        s.advance_line();
        assert_eq!(s.pop().unwrap(), FilePosition { source_name: "inc.i".into(), line: 2 });
        let top = s.current().unwrap();
        assert_eq!(top.source_name, "main.i");
        assert_eq!(top.line, 3);
    }

    #[test]
    fn empty_stack_is_harmless() {
        let mut s = PositionStack::new();
        s.advance_line();
        assert!(s.pop().is_none());
        assert!(s.current().is_none());
    }
}
