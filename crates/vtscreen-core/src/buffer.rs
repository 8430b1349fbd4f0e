//! The screen buffer: cell grid, cursor, margins, tab stops, scrollback.
//!
//! A [`ScreenBuffer`] is one of the two buffers owned by the screen (primary
//! or alternate). It applies the grid-mutating half of the command algebra;
//! global concerns (callbacks, replies, buffer switching, the viewport) live
//! in the screen dispatcher.
//!
//! Coordinates are 1-based. The cursor is always inside the visible area;
//! the "column past the right margin" state after printing into the last
//! column is represented by the wrap-pending flag, never by an out-of-range
//! column.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, trace};
use rustc_hash::FxHashSet;

use crate::cell::{Cell, CellAttributes, Hyperlink};
use crate::charset::{Charset, CharsetSlot, CharsetTable};
use crate::commands::{Mode, TabClear};
use crate::grapheme;

/// Screen dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowSize {
    /// Characters per line.
    pub columns: usize,
    /// Number of lines.
    pub rows: usize,
}

impl WindowSize {
    /// Create a size value.
    #[must_use]
    pub const fn new(columns: usize, rows: usize) -> Self {
        Self { columns, rows }
    }
}

/// A 1-based grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    /// Row, 1 at the top.
    pub row: usize,
    /// Column, 1 at the left.
    pub column: usize,
}

impl Coordinate {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// An inclusive 1-based range of rows or columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginRange {
    /// First row/column of the range.
    pub from: usize,
    /// Last row/column of the range.
    pub to: usize,
}

impl MarginRange {
    /// Number of rows/columns covered.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.to - self.from + 1
    }

    /// Check if a position lies inside.
    #[must_use]
    pub const fn contains(&self, value: usize) -> bool {
        self.from <= value && value <= self.to
    }
}

/// Scroll margins: vertical (DECSTBM) and horizontal (DECSLRM).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margin {
    /// Top/bottom margin rows.
    pub vertical: MarginRange,
    /// Left/right margin columns.
    pub horizontal: MarginRange,
}

impl Margin {
    /// Margins covering the whole screen.
    #[must_use]
    pub const fn full(size: WindowSize) -> Self {
        Self {
            vertical: MarginRange { from: 1, to: size.rows },
            horizontal: MarginRange { from: 1, to: size.columns },
        }
    }
}

/// Which of the two screen buffers this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// The scrollback-accruing main buffer.
    Primary,
    /// The full-screen-application buffer; never accrues scrollback.
    Alternate,
}

/// One visual line of the grid or the scrollback.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    cells: Vec<Cell>,
    wrapped: bool,
    marked: bool,
}

impl Line {
    /// A line of blank cells carrying the given attributes.
    #[must_use]
    pub fn blank(columns: usize, attributes: CellAttributes) -> Self {
        Self {
            cells: vec![Cell::blank(attributes); columns],
            wrapped: false,
            marked: false,
        }
    }

    /// Cells of this line, left to right.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Cell at a 1-based column.
    #[must_use]
    pub fn cell(&self, column: usize) -> &Cell {
        &self.cells[column - 1]
    }

    pub(crate) fn cell_mut(&mut self, column: usize) -> &mut Cell {
        &mut self.cells[column - 1]
    }

    /// Whether the following line is a soft continuation of this one.
    #[must_use]
    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }

    pub(crate) fn set_wrapped(&mut self, wrapped: bool) {
        self.wrapped = wrapped;
    }

    /// Whether this line carries a navigation mark.
    #[must_use]
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    pub(crate) fn set_marked(&mut self, marked: bool) {
        self.marked = marked;
    }

    /// Grow or shrink to `columns`, padding with blank default cells.
    pub(crate) fn resize(&mut self, columns: usize) {
        self.cells.resize(columns, Cell::blank(CellAttributes::default()));
    }

    fn fill_range(&mut self, from: usize, to: usize, attributes: CellAttributes) {
        for cell in &mut self.cells[from - 1..to] {
            cell.reset(attributes, None);
        }
    }

    fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    /// The line's text, skipping wide-cell continuations; blank cells
    /// render as spaces.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.cells.len());
        for cell in &self.cells {
            if cell.is_continuation() {
                continue;
            }
            if cell.is_empty() {
                out.push(' ');
            } else {
                out.push_str(cell.as_str());
            }
        }
        out
    }
}

/// State captured by DECSC and restored by DECRC.
#[derive(Debug, Clone, Copy)]
struct SavedCursor {
    position: Coordinate,
    attributes: CellAttributes,
    autowrap: bool,
    origin: bool,
    wrap_pending: bool,
    charsets: CharsetTable,
}

/// A primary or alternate screen buffer.
#[derive(Debug)]
pub struct ScreenBuffer {
    kind: BufferType,
    size: WindowSize,
    lines: VecDeque<Line>,
    saved_lines: VecDeque<Line>,
    max_history_line_count: Option<usize>,
    cursor: Coordinate,
    /// Position of the most recently written cluster, for combining input.
    last_cursor: Option<Coordinate>,
    wrap_pending: bool,
    pen: CellAttributes,
    hyperlink: Option<Arc<Hyperlink>>,
    margin: Margin,
    modes: FxHashSet<Mode>,
    // Hot-path copies of mode bits.
    autowrap: bool,
    origin: bool,
    insert: bool,
    cursor_visible: bool,
    /// Explicit tab stops (1-based columns, sorted). Empty means "every
    /// `tab_width` columns" implicitly.
    tabs: Vec<usize>,
    tab_width: usize,
    charsets: CharsetTable,
    saved_cursor: Option<SavedCursor>,
    /// Total lines ever evicted from scrollback; absolute addresses shift
    /// when this grows.
    evicted_lines: u64,
}

impl ScreenBuffer {
    /// Create a blank buffer.
    #[must_use]
    pub fn new(kind: BufferType, size: WindowSize, max_history_line_count: Option<usize>) -> Self {
        let mut modes = FxHashSet::default();
        modes.insert(Mode::AutoWrap);
        modes.insert(Mode::VisibleCursor);
        Self {
            kind,
            size,
            lines: (0..size.rows)
                .map(|_| Line::blank(size.columns, CellAttributes::default()))
                .collect(),
            saved_lines: VecDeque::new(),
            max_history_line_count,
            cursor: Coordinate::new(1, 1),
            last_cursor: None,
            wrap_pending: false,
            pen: CellAttributes::default(),
            hyperlink: None,
            margin: Margin::full(size),
            modes,
            autowrap: true,
            origin: false,
            insert: false,
            cursor_visible: true,
            tabs: Vec::new(),
            tab_width: 8,
            charsets: CharsetTable::new(),
            saved_cursor: None,
            evicted_lines: 0,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Buffer kind tag.
    #[must_use]
    pub fn kind(&self) -> BufferType {
        self.kind
    }

    /// Current dimensions.
    #[must_use]
    pub fn size(&self) -> WindowSize {
        self.size
    }

    /// Current margins.
    #[must_use]
    pub fn margin(&self) -> Margin {
        self.margin
    }

    /// Absolute cursor position (screen-relative, ignoring origin mode).
    #[must_use]
    pub fn real_cursor_position(&self) -> Coordinate {
        self.cursor
    }

    /// Cursor position as the host program sees it: margin-relative when
    /// origin mode is on.
    #[must_use]
    pub fn cursor_position(&self) -> Coordinate {
        if self.origin {
            Coordinate::new(
                self.cursor.row + 1 - self.margin.vertical.from,
                self.cursor.column + 1 - self.margin.horizontal.from,
            )
        } else {
            self.cursor
        }
    }

    /// Whether DECTCEM leaves the cursor visible.
    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    /// Wrap-pending state (printed into the last column with autowrap on).
    #[must_use]
    pub fn wrap_pending(&self) -> bool {
        self.wrap_pending
    }

    /// The current pen.
    #[must_use]
    pub fn pen(&self) -> &CellAttributes {
        &self.pen
    }

    /// Mutable access to the pen (SGR application).
    pub fn pen_mut(&mut self) -> &mut CellAttributes {
        &mut self.pen
    }

    /// Set or clear the active hyperlink for subsequently written cells.
    pub fn set_hyperlink(&mut self, hyperlink: Option<Arc<Hyperlink>>) {
        self.hyperlink = hyperlink;
    }

    /// Number of scrollback lines currently held.
    #[must_use]
    pub fn history_line_count(&self) -> usize {
        self.saved_lines.len()
    }

    /// Change the scrollback capacity, evicting immediately if needed.
    pub fn set_max_history_line_count(&mut self, count: Option<usize>) {
        self.max_history_line_count = count;
        self.clamp_saved_lines();
    }

    /// Configure the implicit tab stop distance.
    pub fn set_tab_width(&mut self, width: usize) {
        self.tab_width = width;
    }

    /// Visible lines, top to bottom.
    #[must_use]
    pub fn visible_lines(&self) -> &VecDeque<Line> {
        &self.lines
    }

    /// Scrollback lines, oldest first.
    #[must_use]
    pub fn scrollback_lines(&self) -> &VecDeque<Line> {
        &self.saved_lines
    }

    /// Cell at a screen-relative 1-based coordinate.
    ///
    /// # Panics
    /// Panics if the coordinate is outside the visible grid; callers clamp
    /// first (commands never produce out-of-range coordinates).
    #[must_use]
    pub fn at(&self, row: usize, column: usize) -> &Cell {
        self.lines[row - 1].cell(column)
    }

    /// Line addressed over scrollback + live area: row 1 is the oldest
    /// scrollback line, `history + row` is live row `row`.
    #[must_use]
    pub fn absolute_line(&self, row: usize) -> Option<&Line> {
        let history = self.saved_lines.len();
        if row == 0 {
            None
        } else if row <= history {
            self.saved_lines.get(row - 1)
        } else {
            self.lines.get(row - history - 1)
        }
    }

    /// Total number of addressable lines (scrollback + live).
    #[must_use]
    pub fn total_line_count(&self) -> usize {
        self.saved_lines.len() + self.lines.len()
    }

    /// Check a mode bit.
    #[must_use]
    pub fn is_mode_enabled(&self, mode: Mode) -> bool {
        self.modes.contains(&mode)
    }

    fn line(&self, row: usize) -> &Line {
        &self.lines[row - 1]
    }

    fn line_mut(&mut self, row: usize) -> &mut Line {
        &mut self.lines[row - 1]
    }

    // ------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------

    /// Apply a mode change and its buffer-local side effects.
    pub fn set_mode(&mut self, mode: Mode, enable: bool) {
        if enable {
            self.modes.insert(mode);
        } else {
            self.modes.remove(&mode);
        }
        match mode {
            Mode::AutoWrap => {
                self.autowrap = enable;
                if !enable {
                    self.wrap_pending = false;
                }
            }
            Mode::Origin => {
                self.origin = enable;
                self.move_cursor_to(Coordinate::new(1, 1));
            }
            Mode::Insert => self.insert = enable,
            Mode::VisibleCursor => self.cursor_visible = enable,
            Mode::LeftRightMargin => {
                if !enable {
                    self.margin.horizontal = MarginRange { from: 1, to: self.size.columns };
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Coordinate handling
    // ------------------------------------------------------------------

    fn to_real_coordinate(&self, coordinate: Coordinate) -> Coordinate {
        if self.origin {
            Coordinate::new(
                coordinate.row + self.margin.vertical.from - 1,
                coordinate.column + self.margin.horizontal.from - 1,
            )
        } else {
            coordinate
        }
    }

    fn clamp_to_screen(&self, coordinate: Coordinate) -> Coordinate {
        let (row_range, column_range) = if self.origin {
            (self.margin.vertical, self.margin.horizontal)
        } else {
            (
                MarginRange { from: 1, to: self.size.rows },
                MarginRange { from: 1, to: self.size.columns },
            )
        };
        Coordinate::new(
            coordinate.row.clamp(row_range.from, row_range.to),
            coordinate.column.clamp(column_range.from, column_range.to),
        )
    }

    /// Right-most column the cursor may occupy while printing.
    fn right_limit(&self) -> usize {
        if self.is_mode_enabled(Mode::LeftRightMargin)
            && self.margin.horizontal.contains(self.cursor.column)
        {
            self.margin.horizontal.to
        } else {
            self.size.columns
        }
    }

    // ------------------------------------------------------------------
    // Printing (the hot path)
    // ------------------------------------------------------------------

    /// Print one scalar value at the cursor.
    pub fn append_char(&mut self, ch: char) {
        let ch = self.charsets.map(ch);

        // Combining input extends the most recently written cluster.
        if let Some(previous) = self.last_cursor {
            let cell = self.lines[previous.row - 1].cell(previous.column);
            if !cell.is_empty() && grapheme::joins_cluster(cell.as_str(), ch) {
                let grown = self.lines[previous.row - 1]
                    .cell_mut(previous.column)
                    .append_character(ch);
                if grown > 0 {
                    self.clear_and_advance(grown);
                }
                return;
            }
        }

        if grapheme::is_zero_width(ch) {
            trace!("dropping zero-width input with no preceding cluster");
            return;
        }

        self.write_char(ch);
    }

    fn write_char(&mut self, ch: char) {
        let width = grapheme::char_width(ch).max(1);

        if self.wrap_pending && self.autowrap {
            self.wrap_to_next_line();
        }

        let mut right_limit = self.right_limit();
        if width == 2 && self.cursor.column + 1 > right_limit {
            // A wide cluster needs two columns before the margin.
            if self.autowrap {
                self.wrap_to_next_line();
                right_limit = self.right_limit();
            } else {
                trace!("dropping wide character at right edge without autowrap");
                return;
            }
        }

        if self.insert {
            self.insert_blank_characters(width);
        }

        let row = self.cursor.row;
        let column = self.cursor.column;
        let pen = self.pen;
        let hyperlink = self.hyperlink.clone();

        self.sanitize_wide_pair(row, column);
        if width == 2 {
            self.sanitize_wide_pair(row, column + 1);
        }

        let line = self.line_mut(row);
        line.cell_mut(column).write(ch, width, pen, hyperlink.clone());
        if width == 2 && column + 1 <= right_limit {
            line.cell_mut(column + 1).make_continuation(pen, hyperlink);
        }

        self.last_cursor = Some(Coordinate::new(row, column));

        let advanced = column + width;
        if advanced > right_limit {
            self.cursor.column = right_limit;
            if self.autowrap {
                self.wrap_pending = true;
            }
        } else {
            self.cursor.column = advanced;
            self.wrap_pending = false;
        }
    }

    /// Mark the current line wrapped and continue on the next one.
    fn wrap_to_next_line(&mut self) {
        let row = self.cursor.row;
        self.line_mut(row).set_wrapped(true);
        let left = self.margin.horizontal.from;
        self.linefeed_to_column(left);
    }

    /// Repair a wide pair when one of its halves is about to be replaced.
    fn sanitize_wide_pair(&mut self, row: usize, column: usize) {
        if column > self.size.columns {
            return;
        }
        let target_width = self.line(row).cell(column).width();
        if self.line(row).cell(column).is_continuation() && column > 1 {
            let attributes = *self.line(row).cell(column - 1).attributes();
            self.line_mut(row).cell_mut(column - 1).reset(attributes, None);
        }
        if target_width == 2 && column < self.size.columns {
            let attributes = *self.line(row).cell(column).attributes();
            self.line_mut(row).cell_mut(column + 1).reset(attributes, None);
        }
    }

    /// Advance over freshly grown cluster columns (combining input widened
    /// the previous cell).
    fn clear_and_advance(&mut self, grown: usize) {
        let right_limit = self.right_limit();
        let pen = self.pen;
        let hyperlink = self.hyperlink.clone();
        let row = self.cursor.row;
        let available = right_limit.saturating_sub(self.cursor.column) + 1;
        let fill = grown.min(available);
        for offset in 0..fill {
            let column = self.cursor.column + offset;
            self.line_mut(row)
                .cell_mut(column)
                .make_continuation(pen, hyperlink.clone());
        }
        let advanced = self.cursor.column + grown;
        if advanced > right_limit {
            self.cursor.column = right_limit;
            if self.autowrap {
                self.wrap_pending = true;
            }
        } else {
            self.cursor.column = advanced;
        }
    }

    /// IRM: shift cells right from the cursor to make room for `width`.
    fn insert_blank_characters(&mut self, width: usize) {
        let row = self.cursor.row;
        self.insert_chars_at(row, width);
    }

    // ------------------------------------------------------------------
    // Cursor movement
    // ------------------------------------------------------------------

    /// Absolute move, origin-mode aware, clamped.
    pub fn move_cursor_to(&mut self, coordinate: Coordinate) {
        self.wrap_pending = false;
        self.last_cursor = None;
        self.cursor = self.clamp_to_screen(self.to_real_coordinate(coordinate));
    }

    /// CUU: up, stopping at the top margin (or screen top when above it).
    pub fn move_cursor_up(&mut self, count: usize) {
        self.wrap_pending = false;
        self.last_cursor = None;
        let top = if self.cursor.row >= self.margin.vertical.from {
            self.margin.vertical.from
        } else {
            1
        };
        self.cursor.row = self.cursor.row.saturating_sub(count).max(top);
    }

    /// CUD: down, stopping at the bottom margin (or screen bottom).
    pub fn move_cursor_down(&mut self, count: usize) {
        self.wrap_pending = false;
        self.last_cursor = None;
        let bottom = if self.cursor.row <= self.margin.vertical.to {
            self.margin.vertical.to
        } else {
            self.size.rows
        };
        self.cursor.row = (self.cursor.row + count).min(bottom);
    }

    /// CUF: right, stopping at the right margin (or screen edge).
    pub fn move_cursor_forward(&mut self, count: usize) {
        self.wrap_pending = false;
        self.last_cursor = None;
        let right = if self.cursor.column <= self.margin.horizontal.to {
            self.margin.horizontal.to
        } else {
            self.size.columns
        };
        self.cursor.column = (self.cursor.column + count).min(right);
    }

    /// CUB: left, stopping at the left margin (or column 1).
    pub fn move_cursor_backward(&mut self, count: usize) {
        self.wrap_pending = false;
        self.last_cursor = None;
        let left = if self.cursor.column >= self.margin.horizontal.from {
            self.margin.horizontal.from
        } else {
            1
        };
        self.cursor.column = self.cursor.column.saturating_sub(count).max(left);
    }

    /// BS: one column left, stopping at the margin.
    pub fn backspace(&mut self) {
        self.wrap_pending = false;
        self.move_cursor_backward(1);
    }

    /// CHA/HPA: absolute column, origin-mode aware.
    pub fn move_cursor_to_column(&mut self, column: usize) {
        self.wrap_pending = false;
        self.last_cursor = None;
        let real = if self.origin {
            self.margin.horizontal.from + column - 1
        } else {
            column
        };
        self.cursor.column = real.clamp(1, self.size.columns);
    }

    /// VPA: absolute line, origin-mode aware.
    pub fn move_cursor_to_line(&mut self, row: usize) {
        self.wrap_pending = false;
        self.last_cursor = None;
        let real = if self.origin {
            self.margin.vertical.from + row - 1
        } else {
            row
        };
        self.cursor.row = real.clamp(1, self.size.rows);
    }

    /// CR: to the left margin (column 1 when left of it).
    pub fn move_cursor_to_begin_of_line(&mut self) {
        self.wrap_pending = false;
        self.last_cursor = None;
        self.cursor.column = if self.cursor.column >= self.margin.horizontal.from {
            self.margin.horizontal.from
        } else {
            1
        };
    }

    /// CNL: N lines down, to the left margin.
    pub fn cursor_next_line(&mut self, count: usize) {
        self.move_cursor_down(count);
        self.move_cursor_to_begin_of_line();
    }

    /// CPL: N lines up, to the left margin.
    pub fn cursor_previous_line(&mut self, count: usize) {
        self.move_cursor_up(count);
        self.move_cursor_to_begin_of_line();
    }

    /// HPR: relative column move.
    pub fn horizontal_position_relative(&mut self, count: usize) {
        self.move_cursor_forward(count);
    }

    // ------------------------------------------------------------------
    // Line feeds and index operations
    // ------------------------------------------------------------------

    /// LF/VT/FF. With `carriage_return` (LNM) also go to the left margin.
    pub fn linefeed(&mut self, carriage_return: bool) {
        let column = if carriage_return {
            self.margin.horizontal.from
        } else {
            self.cursor.column
        };
        self.linefeed_to_column(column);
    }

    fn linefeed_to_column(&mut self, column: usize) {
        self.wrap_pending = false;
        self.last_cursor = None;
        if self.cursor.row == self.margin.vertical.to {
            self.scroll_up(1);
        } else if self.cursor.row < self.size.rows {
            self.cursor.row += 1;
        }
        self.cursor.column = column;
    }

    /// IND: down one line, scrolling inside the margin at the bottom.
    pub fn index(&mut self) {
        self.wrap_pending = false;
        self.last_cursor = None;
        if self.cursor.row == self.margin.vertical.to {
            self.scroll_up(1);
        } else if self.cursor.row < self.size.rows {
            self.cursor.row += 1;
        }
    }

    /// RI: up one line, scrolling down inside the margin at the top.
    pub fn reverse_index(&mut self) {
        self.wrap_pending = false;
        self.last_cursor = None;
        if self.cursor.row == self.margin.vertical.from {
            self.scroll_down(1);
        } else if self.cursor.row > 1 {
            self.cursor.row -= 1;
        }
    }

    /// DECBI: left one column; at the left margin, scroll content right.
    pub fn back_index(&mut self) {
        self.wrap_pending = false;
        self.last_cursor = None;
        if self.cursor.column == self.margin.horizontal.from {
            self.insert_columns(1);
        } else {
            self.move_cursor_backward(1);
        }
    }

    /// DECFI: right one column; at the right margin, scroll content left.
    pub fn forward_index(&mut self) {
        self.wrap_pending = false;
        self.last_cursor = None;
        if self.cursor.column == self.margin.horizontal.to {
            self.delete_columns_at(self.margin.horizontal.from, 1);
        } else {
            self.move_cursor_forward(1);
        }
    }

    // ------------------------------------------------------------------
    // Tab stops
    // ------------------------------------------------------------------

    fn materialize_tabs(&mut self) {
        if self.tabs.is_empty() && self.tab_width != 0 {
            let mut column = self.tab_width;
            while column <= self.size.columns {
                self.tabs.push(column);
                column += self.tab_width;
            }
        }
    }

    fn next_tab_stop(&self, from: usize) -> Option<usize> {
        if self.tabs.is_empty() {
            if self.tab_width == 0 {
                return None;
            }
            let next = (from / self.tab_width + 1) * self.tab_width;
            return (next <= self.size.columns).then_some(next);
        }
        self.tabs.iter().copied().find(|&stop| stop > from)
    }

    fn previous_tab_stop(&self, from: usize) -> Option<usize> {
        if self.tabs.is_empty() {
            if self.tab_width == 0 || from <= 1 {
                return None;
            }
            let previous = (from - 1) / self.tab_width * self.tab_width;
            return (previous >= 1).then_some(previous);
        }
        self.tabs.iter().rev().copied().find(|&stop| stop < from)
    }

    /// HT: next tab stop, stopping at the right margin.
    pub fn move_cursor_to_next_tab(&mut self) {
        self.wrap_pending = false;
        self.last_cursor = None;
        let limit = self.right_limit();
        self.cursor.column = match self.next_tab_stop(self.cursor.column) {
            Some(stop) if stop <= limit => stop,
            _ => limit,
        };
    }

    /// CHT: N tab stops forward.
    pub fn cursor_forward_tab(&mut self, count: usize) {
        for _ in 0..count {
            self.move_cursor_to_next_tab();
        }
    }

    /// CBT: N tab stops backward, stopping at the left margin.
    pub fn cursor_backward_tab(&mut self, count: usize) {
        self.wrap_pending = false;
        self.last_cursor = None;
        let left = self.margin.horizontal.from;
        for _ in 0..count {
            self.cursor.column = match self.previous_tab_stop(self.cursor.column) {
                Some(stop) if stop >= left => stop,
                _ => left,
            };
        }
    }

    /// HTS: set a stop at the cursor column.
    pub fn set_tab_under_cursor(&mut self) {
        self.materialize_tabs();
        let column = self.cursor.column;
        if let Err(index) = self.tabs.binary_search(&column) {
            self.tabs.insert(index, column);
        }
    }

    /// TBC.
    pub fn clear_tabs(&mut self, which: TabClear) {
        match which {
            TabClear::UnderCursor => {
                self.materialize_tabs();
                let column = self.cursor.column;
                self.tabs.retain(|&stop| stop != column);
            }
            TabClear::All => {
                self.tabs.clear();
                self.tab_width = 0;
            }
        }
    }

    // ------------------------------------------------------------------
    // Saved cursor (DECSC / DECRC)
    // ------------------------------------------------------------------

    /// DECSC.
    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(SavedCursor {
            position: self.cursor,
            attributes: self.pen,
            autowrap: self.autowrap,
            origin: self.origin,
            wrap_pending: self.wrap_pending,
            charsets: self.charsets,
        });
    }

    /// DECRC. Without a prior save: home position, default pen.
    pub fn restore_cursor(&mut self) {
        self.last_cursor = None;
        match self.saved_cursor {
            Some(saved) => {
                self.set_mode(Mode::AutoWrap, saved.autowrap);
                self.set_mode(Mode::Origin, saved.origin);
                self.cursor = self.clamp_to_screen(saved.position);
                self.pen = saved.attributes;
                self.charsets = saved.charsets;
                self.wrap_pending = saved.wrap_pending;
            }
            None => {
                debug!("restore cursor without saved state; resetting to home");
                self.cursor = Coordinate::new(1, 1);
                self.pen = CellAttributes::default();
                self.wrap_pending = false;
            }
        }
    }

    // ------------------------------------------------------------------
    // Character sets
    // ------------------------------------------------------------------

    /// ESC ( F and friends.
    pub fn designate_charset(&mut self, slot: CharsetSlot, charset: Charset) {
        self.charsets.designate(slot, charset);
    }

    /// SI/SO.
    pub fn locking_shift(&mut self, slot: CharsetSlot) {
        self.charsets.locking_shift(slot);
    }

    /// SS2/SS3.
    pub fn single_shift(&mut self, slot: CharsetSlot) {
        self.charsets.single_shift(slot);
    }

    /// Forget designations and shifts (RIS, buffer switch).
    pub fn reset_charsets(&mut self) {
        self.charsets = CharsetTable::new();
    }

    /// The effective tab stop columns, materializing the implicit
    /// every-`tab_width` default (DECTABSR).
    #[must_use]
    pub fn tab_stops(&self) -> Vec<usize> {
        if self.tabs.is_empty() {
            if self.tab_width == 0 {
                return Vec::new();
            }
            return (1..=self.size.columns / self.tab_width)
                .map(|i| i * self.tab_width)
                .collect();
        }
        self.tabs.clone()
    }

    // ------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------

    /// SU within the current margins.
    pub fn scroll_up(&mut self, count: usize) {
        self.scroll_up_in(count, self.margin);
    }

    /// SD within the current margins.
    pub fn scroll_down(&mut self, count: usize) {
        self.scroll_down_in(count, self.margin);
    }

    fn scroll_up_in(&mut self, count: usize, margin: Margin) {
        self.last_cursor = None;
        let full_width = margin.horizontal == MarginRange { from: 1, to: self.size.columns };
        let full_height = margin.vertical == MarginRange { from: 1, to: self.size.rows };

        if !full_width {
            // Scroll inside a horizontal sub-region: move cell ranges.
            let height = margin.vertical.length();
            let count = count.min(height);
            let (h_from, h_to) = (margin.horizontal.from, margin.horizontal.to);
            for row in margin.vertical.from..=margin.vertical.to - count {
                let source: Vec<Cell> =
                    self.line(row + count).cells()[h_from - 1..h_to].to_vec();
                self.line_mut(row).cells_mut()[h_from - 1..h_to].clone_from_slice(&source);
            }
            let pen = self.pen;
            for row in margin.vertical.to - count + 1..=margin.vertical.to {
                self.line_mut(row).fill_range(h_from, h_to, pen);
            }
        } else if full_height {
            // Full-screen scroll: this is where scrollback accrues, on the
            // primary buffer only.
            let count = count.min(self.size.rows);
            for _ in 0..count {
                if let Some(line) = self.lines.pop_front() {
                    if self.kind == BufferType::Primary {
                        self.saved_lines.push_back(line);
                    }
                }
            }
            self.clamp_saved_lines();
            let pen = self.pen;
            for _ in 0..count {
                self.lines.push_back(Line::blank(self.size.columns, pen));
            }
        } else {
            // Vertical sub-region, full width: rotate lines in place.
            let height = margin.vertical.length();
            let count = count.min(height);
            let (from, to) = (margin.vertical.from, margin.vertical.to);
            self.lines.make_contiguous()[from - 1..to].rotate_left(count);
            let pen = self.pen;
            for row in to - count + 1..=to {
                *self.line_mut(row) = Line::blank(self.size.columns, pen);
            }
        }
    }

    fn scroll_down_in(&mut self, count: usize, margin: Margin) {
        self.last_cursor = None;
        let full_width = margin.horizontal == MarginRange { from: 1, to: self.size.columns };
        let height = margin.vertical.length();
        let count = count.min(height);

        if !full_width {
            let (h_from, h_to) = (margin.horizontal.from, margin.horizontal.to);
            for row in (margin.vertical.from + count..=margin.vertical.to).rev() {
                let source: Vec<Cell> =
                    self.line(row - count).cells()[h_from - 1..h_to].to_vec();
                self.line_mut(row).cells_mut()[h_from - 1..h_to].clone_from_slice(&source);
            }
            let pen = self.pen;
            for row in margin.vertical.from..margin.vertical.from + count {
                self.line_mut(row).fill_range(h_from, h_to, pen);
            }
        } else {
            let (from, to) = (margin.vertical.from, margin.vertical.to);
            self.lines.make_contiguous()[from - 1..to].rotate_right(count);
            let pen = self.pen;
            for row in from..from + count {
                *self.line_mut(row) = Line::blank(self.size.columns, pen);
            }
        }
    }

    fn clamp_saved_lines(&mut self) {
        if let Some(limit) = self.max_history_line_count {
            while self.saved_lines.len() > limit {
                self.saved_lines.pop_front();
                self.evicted_lines += 1;
            }
        }
    }

    /// Monotonic count of scrollback lines dropped by the capacity bound.
    #[must_use]
    pub fn evicted_line_count(&self) -> u64 {
        self.evicted_lines
    }

    // ------------------------------------------------------------------
    // Insertion and deletion
    // ------------------------------------------------------------------

    /// ICH: shift cells right from the cursor within the margin.
    pub fn insert_characters(&mut self, count: usize) {
        let row = self.cursor.row;
        self.insert_chars_at(row, count);
    }

    fn insert_chars_at(&mut self, row: usize, count: usize) {
        self.last_cursor = None;
        let right = self.margin.horizontal.to.max(self.cursor.column);
        let column = self.cursor.column.min(right);
        let count = count.min(right - column + 1);
        if count == 0 {
            return;
        }
        let pen = self.pen;
        let line = self.line_mut(row);
        line.cells_mut()[column - 1..right].rotate_right(count);
        for cell in &mut line.cells_mut()[column - 1..column - 1 + count] {
            cell.reset(pen, None);
        }
    }

    /// DCH: shift cells left from the cursor within the margin.
    pub fn delete_characters(&mut self, count: usize) {
        let row = self.cursor.row;
        let column = self.cursor.column;
        self.delete_chars_at(row, column, count);
    }

    fn delete_chars_at(&mut self, row: usize, column: usize, count: usize) {
        self.last_cursor = None;
        let right = self.margin.horizontal.to;
        if column > right {
            return;
        }
        let count = count.min(right - column + 1);
        if count == 0 {
            return;
        }
        let pen = self.pen;
        let line = self.line_mut(row);
        line.cells_mut()[column - 1..right].rotate_left(count);
        for cell in &mut line.cells_mut()[right - count..right] {
            cell.reset(pen, None);
        }
    }

    /// IL: insert blank lines at the cursor, inside the vertical margin.
    pub fn insert_lines(&mut self, count: usize) {
        if !self.margin.vertical.contains(self.cursor.row) {
            return;
        }
        let margin = Margin {
            vertical: MarginRange { from: self.cursor.row, to: self.margin.vertical.to },
            horizontal: self.margin.horizontal,
        };
        self.scroll_down_in(count, margin);
        self.cursor.column = self.margin.horizontal.from;
    }

    /// DL: delete lines at the cursor, inside the vertical margin.
    pub fn delete_lines(&mut self, count: usize) {
        if !self.margin.vertical.contains(self.cursor.row) {
            return;
        }
        let margin = Margin {
            vertical: MarginRange { from: self.cursor.row, to: self.margin.vertical.to },
            horizontal: self.margin.horizontal,
        };
        self.scroll_up_in(count, margin);
        self.cursor.column = self.margin.horizontal.from;
    }

    /// DECIC: insert blank columns at the cursor across the vertical margin.
    pub fn insert_columns(&mut self, count: usize) {
        if !self.margin.vertical.contains(self.cursor.row)
            || !self.margin.horizontal.contains(self.cursor.column)
        {
            return;
        }
        for row in self.margin.vertical.from..=self.margin.vertical.to {
            self.insert_chars_at(row, count);
        }
    }

    /// DECDC: delete columns at the cursor across the vertical margin.
    pub fn delete_columns(&mut self, count: usize) {
        if !self.margin.vertical.contains(self.cursor.row)
            || !self.margin.horizontal.contains(self.cursor.column)
        {
            return;
        }
        let column = self.cursor.column;
        self.delete_columns_at(column, count);
    }

    fn delete_columns_at(&mut self, column: usize, count: usize) {
        for row in self.margin.vertical.from..=self.margin.vertical.to {
            self.delete_chars_at(row, column, count);
        }
    }

    // ------------------------------------------------------------------
    // Erasure
    // ------------------------------------------------------------------

    /// ECH: erase N cells rightward without moving the cursor.
    pub fn erase_characters(&mut self, count: usize) {
        self.last_cursor = None;
        let column = self.cursor.column;
        let to = (column + count - 1).min(self.size.columns);
        let pen = self.pen;
        let row = self.cursor.row;
        self.line_mut(row).fill_range(column, to, pen);
    }

    /// EL 0.
    pub fn clear_to_end_of_line(&mut self) {
        self.last_cursor = None;
        let (row, column, columns) = (self.cursor.row, self.cursor.column, self.size.columns);
        let pen = self.pen;
        self.line_mut(row).fill_range(column, columns, pen);
    }

    /// EL 1.
    pub fn clear_to_begin_of_line(&mut self) {
        self.last_cursor = None;
        let (row, column) = (self.cursor.row, self.cursor.column);
        let pen = self.pen;
        self.line_mut(row).fill_range(1, column, pen);
    }

    /// EL 2.
    pub fn clear_line(&mut self) {
        self.last_cursor = None;
        let (row, columns) = (self.cursor.row, self.size.columns);
        let pen = self.pen;
        self.line_mut(row).fill_range(1, columns, pen);
    }

    /// ED 0.
    pub fn clear_to_end_of_screen(&mut self) {
        self.clear_to_end_of_line();
        let pen = self.pen;
        let columns = self.size.columns;
        for row in self.cursor.row + 1..=self.size.rows {
            *self.line_mut(row) = Line::blank(columns, pen);
        }
    }

    /// ED 1.
    pub fn clear_to_begin_of_screen(&mut self) {
        self.clear_to_begin_of_line();
        let pen = self.pen;
        let columns = self.size.columns;
        for row in 1..self.cursor.row {
            *self.line_mut(row) = Line::blank(columns, pen);
        }
    }

    /// ED 2.
    pub fn clear_screen(&mut self) {
        self.last_cursor = None;
        let pen = self.pen;
        let columns = self.size.columns;
        for line in &mut self.lines {
            *line = Line::blank(columns, pen);
        }
    }

    /// ED 3.
    pub fn clear_scrollback(&mut self) {
        self.saved_lines.clear();
    }

    /// DECALN: fill with `E`, reset margins, home the cursor.
    pub fn screen_alignment_pattern(&mut self) {
        self.margin = Margin::full(self.size);
        self.last_cursor = None;
        self.wrap_pending = false;
        self.cursor = Coordinate::new(1, 1);
        for line in &mut self.lines {
            for cell in line.cells_mut() {
                cell.write('E', 1, CellAttributes::default(), None);
            }
        }
    }

    // ------------------------------------------------------------------
    // Margins
    // ------------------------------------------------------------------

    /// DECSTBM. Zero parameters mean the respective screen edge.
    pub fn set_top_bottom_margin(&mut self, top: usize, bottom: usize) {
        let top = if top == 0 { 1 } else { top };
        let bottom = if bottom == 0 { self.size.rows } else { bottom.min(self.size.rows) };
        if top >= bottom {
            debug!("ignoring DECSTBM with top {top} >= bottom {bottom}");
            return;
        }
        self.margin.vertical = MarginRange { from: top, to: bottom };
        self.move_cursor_to(Coordinate::new(1, 1));
    }

    /// DECSLRM; the dispatcher only routes this while DECLRMM is set.
    pub fn set_left_right_margin(&mut self, left: usize, right: usize) {
        let left = if left == 0 { 1 } else { left };
        let right = if right == 0 {
            self.size.columns
        } else {
            right.min(self.size.columns)
        };
        if left >= right {
            debug!("ignoring DECSLRM with left {left} >= right {right}");
            return;
        }
        self.margin.horizontal = MarginRange { from: left, to: right };
        self.move_cursor_to(Coordinate::new(1, 1));
    }

    // ------------------------------------------------------------------
    // Marks
    // ------------------------------------------------------------------

    /// Mark the cursor line for mark navigation.
    pub fn set_mark(&mut self) {
        let row = self.cursor.row;
        self.line_mut(row).set_marked(true);
    }

    /// Scrollback offset of the nearest mark above `scroll_offset`, if any.
    #[must_use]
    pub fn find_prev_marker(&self, scroll_offset: usize) -> Option<usize> {
        let history = self.saved_lines.len();
        let start = scroll_offset.min(history);
        ((start + 1)..=history).find(|&offset| self.saved_lines[history - offset].is_marked())
    }

    /// Scrollback offset of the nearest mark below `scroll_offset`; falls
    /// back to the live bottom (offset 0).
    #[must_use]
    pub fn find_next_marker(&self, scroll_offset: usize) -> Option<usize> {
        let history = self.saved_lines.len();
        let start = scroll_offset.min(history);
        if start == 0 {
            return None;
        }
        Some(
            (1..start)
                .rev()
                .find(|&offset| self.saved_lines[history - offset].is_marked())
                .unwrap_or(0),
        )
    }

    // ------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------

    /// DECSTR-scope reset: modes, pen, margins, charsets; contents stay.
    pub fn reset_soft(&mut self) {
        self.pen = CellAttributes::default();
        self.hyperlink = None;
        self.modes.clear();
        self.modes.insert(Mode::AutoWrap);
        self.modes.insert(Mode::VisibleCursor);
        self.autowrap = true;
        self.origin = false;
        self.insert = false;
        self.cursor_visible = true;
        self.wrap_pending = false;
        self.margin = Margin::full(self.size);
        self.charsets = CharsetTable::new();
        self.saved_cursor = None;
        self.last_cursor = None;
    }

    // ------------------------------------------------------------------
    // Resize
    // ------------------------------------------------------------------

    /// Resize the buffer. The primary buffer reflows soft-wrapped lines;
    /// the alternate buffer crops or pads. Margins reset to the full
    /// screen, the cursor is clamped into the new bounds.
    pub fn resize(&mut self, new_size: WindowSize) {
        if new_size == self.size {
            return;
        }

        if new_size.columns != self.size.columns {
            match self.kind {
                BufferType::Primary => self.reflow_columns(new_size.columns),
                BufferType::Alternate => {
                    for line in &mut self.lines {
                        line.resize(new_size.columns);
                    }
                    if self.wrap_pending {
                        self.wrap_pending = false;
                    }
                }
            }
            self.size.columns = new_size.columns;
            self.cursor.column = self.cursor.column.min(new_size.columns);
        }

        if new_size.rows != self.size.rows {
            self.resize_rows(new_size.rows);
            self.size.rows = new_size.rows;
        }

        self.margin = Margin::full(new_size);
        self.tabs.retain(|&stop| stop <= new_size.columns);
        self.cursor = Coordinate::new(
            self.cursor.row.clamp(1, new_size.rows),
            self.cursor.column.clamp(1, new_size.columns),
        );
        self.last_cursor = None;
    }

    /// Re-split soft-wrapped logical lines at a new column count.
    fn reflow_columns(&mut self, new_columns: usize) {
        let pending_column = if self.wrap_pending {
            // A pending wrap conceptually sits one past the margin.
            self.cursor.column + 1
        } else {
            self.cursor.column
        };
        self.wrap_pending = false;

        // Join physical lines into logical lines.
        let old_saved = self.saved_lines.len();
        let mut logical: Vec<(Vec<Cell>, bool)> = Vec::new();
        let mut current: Vec<Cell> = Vec::new();
        let mut current_marked = false;
        let mut open = false;
        let all: Vec<Line> = self
            .saved_lines
            .drain(..)
            .chain(self.lines.drain(..))
            .collect();
        for line in all {
            if !open {
                current = Vec::new();
                current_marked = line.is_marked();
                open = true;
            }
            let wrapped = line.is_wrapped();
            current.extend(line.into_cells());
            if !wrapped {
                trim_trailing_blanks(&mut current);
                logical.push((std::mem::take(&mut current), current_marked));
                open = false;
            }
        }
        if open {
            trim_trailing_blanks(&mut current);
            logical.push((current, current_marked));
        }

        // Re-split each logical line at the new width.
        let mut physical: Vec<Line> = Vec::new();
        for (cells, marked) in logical {
            let segments = split_cells(cells, new_columns);
            let last = segments.len() - 1;
            for (index, mut segment) in segments.into_iter().enumerate() {
                segment.resize(new_columns, Cell::blank(CellAttributes::default()));
                physical.push(Line {
                    cells: segment,
                    wrapped: index < last,
                    marked: index == 0 && marked,
                });
            }
        }

        // Blank rows below the content are not preserved; they re-grow as
        // bottom padding. Without this, splitting a wrapped line would push
        // real content into history while blanks fill the screen.
        while physical
            .last()
            .is_some_and(|line| !line.is_marked() && line_is_blank(line))
        {
            physical.pop();
        }

        // Bottom `rows` lines stay live; the overflow is history.
        let rows = self.size.rows;
        let live_count = physical.len().min(rows);
        let overflow = physical.len() - live_count;
        self.saved_lines = physical.drain(..overflow).collect();
        self.lines = physical.into_iter().collect();
        while self.lines.len() < rows {
            self.lines
                .push_back(Line::blank(new_columns, CellAttributes::default()));
        }
        self.clamp_saved_lines();

        // The cursor keeps its row relative to the live area as the
        // history grows or shrinks, then clamps.
        let new_saved = self.saved_lines.len();
        let row = self.cursor.row as isize - (new_saved as isize - old_saved as isize);
        self.cursor.row = row.clamp(1, rows as isize) as usize;
        self.cursor.column = pending_column.min(new_columns);
    }

    fn resize_rows(&mut self, new_rows: usize) {
        let old_rows = self.size.rows;
        if new_rows > old_rows {
            let mut grow = new_rows - old_rows;
            // Pull history back onto the screen first (primary only).
            while grow > 0 && !self.saved_lines.is_empty() {
                if let Some(mut line) = self.saved_lines.pop_back() {
                    line.resize(self.size.columns);
                    self.lines.push_front(line);
                    self.cursor.row += 1;
                    grow -= 1;
                }
            }
            for _ in 0..grow {
                self.lines
                    .push_back(Line::blank(self.size.columns, CellAttributes::default()));
            }
        } else {
            let shrink = old_rows - new_rows;
            if self.cursor.row == old_rows {
                // Cursor at the bottom: spill the top into history.
                for _ in 0..shrink {
                    if let Some(line) = self.lines.pop_front() {
                        if self.kind == BufferType::Primary {
                            self.saved_lines.push_back(line);
                        }
                    }
                }
                self.clamp_saved_lines();
                self.cursor.row = self.cursor.row.saturating_sub(shrink).max(1);
            } else {
                // Cursor above: hard-cut below.
                self.lines.truncate(new_rows);
            }
        }
    }

    // ------------------------------------------------------------------
    // Rendering helpers
    // ------------------------------------------------------------------

    /// One visible row as plain text.
    #[must_use]
    pub fn render_text_line(&self, row: usize) -> String {
        self.line(row).text()
    }

    /// The whole visible grid as text, lines terminated by LF.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::with_capacity(self.size.rows * (self.size.columns + 1));
        for row in 1..=self.size.rows {
            out.push_str(&self.render_text_line(row));
            out.push('\n');
        }
        out
    }

    /// The n'th most recent scrollback line as text (1-based).
    #[must_use]
    pub fn render_history_text_line(&self, n: usize) -> Option<String> {
        let history = self.saved_lines.len();
        if n == 0 || n > history {
            return None;
        }
        Some(self.saved_lines[history - n].text())
    }

    /// VT byte sequence that reproduces the visible grid on a fresh screen
    /// of the same size, including pen state per run and the cursor
    /// position.
    #[must_use]
    pub fn screenshot(&self) -> String {
        let mut out = String::new();
        let mut pen: Option<CellAttributes> = None;
        for row in 1..=self.size.rows {
            out.push_str(&format!("\x1b[{row};1H"));
            for cell in self.line(row).cells() {
                if cell.is_continuation() {
                    continue;
                }
                if pen != Some(*cell.attributes()) {
                    out.push_str(&cell.attributes().sgr_sequence());
                    pen = Some(*cell.attributes());
                }
                if cell.is_empty() {
                    out.push(' ');
                } else {
                    out.push_str(cell.as_str());
                }
            }
        }
        out.push_str("\x1b[0m");
        out.push_str(&format!(
            "\x1b[{};{}H",
            self.cursor.row, self.cursor.column
        ));
        out
    }
}

fn line_is_blank(line: &Line) -> bool {
    !line.is_wrapped()
        && line
            .cells()
            .iter()
            .all(|cell| cell.is_empty() && !cell.is_continuation() && cell.attributes().is_default())
}

/// Drop trailing blank default cells (reflow join normalization). A
/// trailing wide-cell continuation is kept with its head.
fn trim_trailing_blanks(cells: &mut Vec<Cell>) {
    while let Some(cell) = cells.last() {
        if cell.is_empty() && !cell.is_continuation() && cell.attributes().is_default() {
            cells.pop();
        } else {
            break;
        }
    }
}

/// Split a logical line into physical segments of at most `columns`
/// display columns, never separating a wide cell from its continuation.
fn split_cells(cells: Vec<Cell>, columns: usize) -> Vec<Vec<Cell>> {
    let mut segments = Vec::new();
    let mut current: Vec<Cell> = Vec::new();
    let mut used = 0usize;
    for cell in cells {
        if cell.is_continuation() {
            // Continuations are re-created next to their head below.
            continue;
        }
        let width = cell.width().max(1);
        if used + width > columns {
            segments.push(std::mem::take(&mut current));
            used = 0;
        }
        used += width;
        let wide = cell.width() == 2;
        let attributes = *cell.attributes();
        let hyperlink = cell.hyperlink().cloned();
        current.push(cell);
        if wide {
            let mut continuation = Cell::blank(attributes);
            continuation.make_continuation(attributes, hyperlink);
            current.push(continuation);
        }
    }
    segments.push(current);
    segments
}
