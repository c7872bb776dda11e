//! Substitution history.
//!
//! When history keeping is on, every evaluated `{…}` region is recorded with
//! the text it was replaced by and the byte offset in the output where the
//! replacement starts.  Tools that post-process the output use this to map
//! output positions back to source expressions.
//!
//! Pure literal passthrough is never logged: an empty original is ignored.

/// One performed substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Source text including its delimiters, e.g. `{X}`.
    pub original: String,
    pub substituted: String,
    /// Output length at the moment the substitution was written.
    pub output_offset: usize,
}

/// Append-only log of substitutions, newest last.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionHistory {
    enabled: bool,
    entries: Vec<HistoryEntry>,
}

impl SubstitutionHistory {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn history keeping on or off.  Turning it off drops the log.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.entries.clear();
        }
    }

    // ── Recording ─────────────────────────────────────────────────────────────

    pub fn record(&mut self, original: &str, substituted: &str, output_offset: usize) {
        if !self.enabled || original.is_empty() {
            return;
        }
        self.entries.push(HistoryEntry {
            original: original.to_owned(),
            substituted: substituted.to_owned(),
            output_offset,
        });
    }

    // ── Access ────────────────────────────────────────────────────────────────

    /// Entries in substitution order.
    pub fn snapshot(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_records_nothing() {
        let mut h = SubstitutionHistory::new(false);
        h.record("{X}", "5", 0);
        assert!(h.is_empty());
    }

    #[test]
    fn records_in_order() {
        let mut h = SubstitutionHistory::new(true);
        h.record("{X}", "5", 10);
        h.record("{Y}", "abc", 12);
        assert_eq!(
            h.snapshot()[0],
            HistoryEntry { original: "{X}".into(), substituted: "5".into(), output_offset: 10 }
        );
        assert_eq!(h.snapshot()[1].output_offset, 12);
    }

    #[test]
    fn empty_original_ignored() {
        let mut h = SubstitutionHistory::new(true);
        h.record("", "text", 3);
        assert!(h.is_empty());
    }

    #[test]
    fn disabling_clears() {
        let mut h = SubstitutionHistory::new(true);
        h.record("{a}", "1", 0);
        h.set_enabled(false);
        assert!(h.is_empty());
        h.record("{a}", "1", 0);
        assert!(h.is_empty());
    }
}
