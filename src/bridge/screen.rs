//! Virtual screen model wrapping the `vt100` terminal emulator.
//!
//! The screen is a fixed-size cell grid with no scrollback: the bridge
//! always snapshots what a terminal of the configured size would show
//! right now. Feeding is infallible — malformed escape sequences are
//! ignored by the emulator's own recovery rules.

use vt100::Parser;

/// Fixed-size virtual terminal screen.
pub struct VirtualScreen {
    parser: Parser,
    cols: u16,
    rows: u16,
}

impl VirtualScreen {
    /// Create a blank screen of the given dimensions.
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            // No scrollback: snapshots cover the visible grid only.
            parser: Parser::new(rows, cols, 0),
            cols,
            rows,
        }
    }

    /// Feed raw child output into the emulator.
    ///
    /// Chunks must arrive in output order; the grid state is the
    /// cumulative interpretation of every byte seen since the last
    /// [`reset`](Self::reset).
    pub fn feed(&mut self, bytes: &[u8]) {
        self.parser.process(bytes);
    }

    /// Reset to an all-blank grid.
    ///
    /// Called on every child (re)start so a stale frame from the
    /// previous process never leaks into the new session.
    pub fn reset(&mut self) {
        self.parser = Parser::new(self.rows, self.cols, 0);
    }

    /// The rendered grid as one string per row, trailing whitespace
    /// trimmed per row.
    #[must_use]
    pub fn rows(&self) -> Vec<String> {
        let screen = self.parser.screen();
        screen
            .rows(0, self.cols)
            .map(|row| row.trim_end().to_owned())
            .collect()
    }

    /// Current cursor position as `(row, col)`.
    #[must_use]
    pub fn cursor(&self) -> (u16, u16) {
        self.parser.screen().cursor_position()
    }

    /// Screen dimensions as `(cols, rows)`.
    #[must_use]
    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_lands_on_first_row() {
        let mut screen = VirtualScreen::new(80, 24);
        screen.feed(b"hello world");
        let rows = screen.rows();
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[0], "hello world");
        assert!(rows[1..].iter().all(String::is_empty));
    }

    #[test]
    fn feed_is_associative_over_concatenation() {
        let input: &[u8] = b"line one\r\nline \x1b[1mtwo\x1b[0m\r\n\x1b[3;5Hcursor";

        let mut whole = VirtualScreen::new(80, 24);
        whole.feed(input);

        let mut chunked = VirtualScreen::new(80, 24);
        for chunk in input.chunks(3) {
            chunked.feed(chunk);
        }

        assert_eq!(whole.rows(), chunked.rows());
        assert_eq!(whole.cursor(), chunked.cursor());
    }

    #[test]
    fn reset_yields_blank_grid() {
        let mut screen = VirtualScreen::new(40, 10);
        screen.feed(b"some output\r\nmore output\x1b[2;10Hx");
        screen.reset();
        assert!(screen.rows().iter().all(String::is_empty));
        assert_eq!(screen.cursor(), (0, 0));
    }

    #[test]
    fn cursor_addressing_overwrites_in_place() {
        let mut screen = VirtualScreen::new(20, 5);
        screen.feed(b"aaaa");
        // Move to row 1, col 1 and overwrite.
        screen.feed(b"\x1b[1;1Hbb");
        assert_eq!(screen.rows()[0], "bbaa");
    }

    #[test]
    fn malformed_sequences_are_ignored() {
        let mut screen = VirtualScreen::new(20, 5);
        screen.feed(b"\x1b[999;999Z\x1b]invalid\x07ok");
        assert!(screen.rows()[0].contains("ok"));
    }
}
