//! Shared text-emission plumbing for backends.
//!
//! [`CodeWriter`] is an append-only line buffer with indentation
//! tracking; backends only ever push whole lines, which keeps output
//! deterministic and diff-stable.

/// Append-only line buffer.
pub struct CodeWriter {
    buf: String,
    depth: usize,
    unit: &'static str,
}

impl CodeWriter {
    /// Create a writer with the given indentation unit (two spaces for
    /// Dart, four for Kotlin).
    pub fn new(unit: &'static str) -> Self {
        Self {
            buf: String::new(),
            depth: 0,
            unit,
        }
    }

    /// Append one line at the current indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.buf.push('\n');
            return;
        }
        for _ in 0..self.depth {
            self.buf.push_str(self.unit);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    /// Append an empty line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        debug_assert!(self.depth > 0);
        self.depth = self.depth.saturating_sub(1);
    }

    /// Emit a doc comment, one physical line per description line.
    /// Does nothing for `None` or empty text.
    pub fn doc(&mut self, description: Option<&str>, prefix: &str) {
        let Some(text) = description else { return };
        for line in text.lines() {
            if line.is_empty() {
                self.line(prefix.trim_end());
            } else {
                self.line(format!("{prefix}{line}"));
            }
        }
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation_tracks_depth() {
        let mut w = CodeWriter::new("  ");
        w.line("class A {");
        w.indent();
        w.line("int x;");
        w.dedent();
        w.line("}");
        assert_eq!(w.finish(), "class A {\n  int x;\n}\n");
    }

    #[test]
    fn doc_splits_multiline_descriptions() {
        let mut w = CodeWriter::new("  ");
        w.doc(Some("First line.\n\nThird line."), "/// ");
        assert_eq!(w.finish(), "/// First line.\n///\n/// Third line.\n");
    }

    #[test]
    fn doc_skips_missing_descriptions() {
        let mut w = CodeWriter::new("  ");
        w.doc(None, "/// ");
        assert!(w.finish().is_empty());
    }
}
