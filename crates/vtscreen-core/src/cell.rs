//! Grid cell representation and the graphics pen.
//!
//! A [`Cell`] owns one grapheme cluster (inline for the common short case),
//! its display width, the [`CellAttributes`] it was written with, and an
//! optional hyperlink. The second column of a wide cluster is a
//! *continuation* cell: width 0, no text.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::color::Color;
use crate::grapheme;

bitflags::bitflags! {
    /// Graphic renditions applied by SGR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u16 {
        const BOLD             = 1 << 0;
        const FAINT            = 1 << 1;
        const ITALIC           = 1 << 2;
        const UNDERLINE        = 1 << 3;
        const DOUBLE_UNDERLINE = 1 << 4;
        const CURLY_UNDERLINE  = 1 << 5;
        const DOTTED_UNDERLINE = 1 << 6;
        const DASHED_UNDERLINE = 1 << 7;
        const BLINK            = 1 << 8;
        const RAPID_BLINK      = 1 << 9;
        const REVERSE          = 1 << 10;
        const HIDDEN           = 1 << 11;
        const CROSSED_OUT      = 1 << 12;
        const OVERLINE         = 1 << 13;
    }
}

impl CellFlags {
    /// All underline styles (they are mutually exclusive when set via SGR).
    pub const ANY_UNDERLINE: Self = Self::UNDERLINE
        .union(Self::DOUBLE_UNDERLINE)
        .union(Self::CURLY_UNDERLINE)
        .union(Self::DOTTED_UNDERLINE)
        .union(Self::DASHED_UNDERLINE);
}

/// A single SGR rendition change (subset of CSI `m` parameters that do not
/// carry a color payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicsRendition {
    /// SGR 0: reset the pen to defaults.
    Reset,
    Bold,
    Faint,
    Italic,
    Underline,
    DoublyUnderlined,
    CurlyUnderlined,
    DottedUnderline,
    DashedUnderline,
    Blinking,
    RapidBlinking,
    Inverse,
    Hidden,
    CrossedOut,
    Overline,
    /// SGR 22: neither bold nor faint.
    Normal,
    NoItalic,
    NoUnderline,
    NoBlinking,
    NoInverse,
    NoHidden,
    NoCrossedOut,
    NoOverline,
}

/// The pen: colors and renditions applied to newly written cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellAttributes {
    /// Foreground color.
    pub foreground: Color,
    /// Background color.
    pub background: Color,
    /// Underline color (SGR 58/59); `Default` means "same as foreground".
    pub underline_color: Color,
    /// Rendition bitset.
    pub flags: CellFlags,
}

impl CellAttributes {
    /// Apply a single rendition change to the pen.
    pub fn apply(&mut self, rendition: GraphicsRendition) {
        use GraphicsRendition::*;
        match rendition {
            Reset => *self = Self::default(),
            Bold => self.flags.insert(CellFlags::BOLD),
            Faint => self.flags.insert(CellFlags::FAINT),
            Italic => self.flags.insert(CellFlags::ITALIC),
            Underline => self.set_underline(CellFlags::UNDERLINE),
            DoublyUnderlined => self.set_underline(CellFlags::DOUBLE_UNDERLINE),
            CurlyUnderlined => self.set_underline(CellFlags::CURLY_UNDERLINE),
            DottedUnderline => self.set_underline(CellFlags::DOTTED_UNDERLINE),
            DashedUnderline => self.set_underline(CellFlags::DASHED_UNDERLINE),
            Blinking => self.flags.insert(CellFlags::BLINK),
            RapidBlinking => self.flags.insert(CellFlags::RAPID_BLINK),
            Inverse => self.flags.insert(CellFlags::REVERSE),
            Hidden => self.flags.insert(CellFlags::HIDDEN),
            CrossedOut => self.flags.insert(CellFlags::CROSSED_OUT),
            Overline => self.flags.insert(CellFlags::OVERLINE),
            Normal => self.flags.remove(CellFlags::BOLD | CellFlags::FAINT),
            NoItalic => self.flags.remove(CellFlags::ITALIC),
            NoUnderline => self.flags.remove(CellFlags::ANY_UNDERLINE),
            NoBlinking => self.flags.remove(CellFlags::BLINK | CellFlags::RAPID_BLINK),
            NoInverse => self.flags.remove(CellFlags::REVERSE),
            NoHidden => self.flags.remove(CellFlags::HIDDEN),
            NoCrossedOut => self.flags.remove(CellFlags::CROSSED_OUT),
            NoOverline => self.flags.remove(CellFlags::OVERLINE),
        }
    }

    fn set_underline(&mut self, style: CellFlags) {
        self.flags.remove(CellFlags::ANY_UNDERLINE);
        self.flags.insert(style);
    }

    /// Check if every field is at its default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Render this pen as a full SGR sequence, starting from a reset.
    ///
    /// Used by `screenshot` output so re-parsing reproduces the grid.
    #[must_use]
    pub fn sgr_sequence(&self) -> String {
        let mut params = String::from("0");
        let mut push = |p: &str| {
            params.push(';');
            params.push_str(p);
        };
        if self.flags.contains(CellFlags::BOLD) {
            push("1");
        }
        if self.flags.contains(CellFlags::FAINT) {
            push("2");
        }
        if self.flags.contains(CellFlags::ITALIC) {
            push("3");
        }
        if self.flags.contains(CellFlags::UNDERLINE) {
            push("4");
        }
        if self.flags.contains(CellFlags::DOUBLE_UNDERLINE) {
            push("4:2");
        }
        if self.flags.contains(CellFlags::CURLY_UNDERLINE) {
            push("4:3");
        }
        if self.flags.contains(CellFlags::DOTTED_UNDERLINE) {
            push("4:4");
        }
        if self.flags.contains(CellFlags::DASHED_UNDERLINE) {
            push("4:5");
        }
        if self.flags.contains(CellFlags::BLINK) {
            push("5");
        }
        if self.flags.contains(CellFlags::RAPID_BLINK) {
            push("6");
        }
        if self.flags.contains(CellFlags::REVERSE) {
            push("7");
        }
        if self.flags.contains(CellFlags::HIDDEN) {
            push("8");
        }
        if self.flags.contains(CellFlags::CROSSED_OUT) {
            push("9");
        }
        if self.flags.contains(CellFlags::OVERLINE) {
            push("53");
        }
        match self.foreground {
            Color::Default => {}
            Color::Indexed(index) => push(&format!("38;5;{index}")),
            Color::Rgb(rgb) => push(&format!("38;2;{};{};{}", rgb.red, rgb.green, rgb.blue)),
        }
        match self.background {
            Color::Default => {}
            Color::Indexed(index) => push(&format!("48;5;{index}")),
            Color::Rgb(rgb) => push(&format!("48;2;{};{};{}", rgb.red, rgb.green, rgb.blue)),
        }
        match self.underline_color {
            Color::Default => {}
            Color::Indexed(index) => push(&format!("58;5;{index}")),
            Color::Rgb(rgb) => push(&format!("58;2;{};{};{}", rgb.red, rgb.green, rgb.blue)),
        }
        format!("\x1b[{params}m")
    }
}

/// An OSC 8 hyperlink, interned and shared between the cells it spans.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hyperlink {
    /// The `id=` parameter, possibly empty.
    pub id: String,
    /// Target URI.
    pub uri: String,
}

/// Inline capacity for cluster bytes; longer clusters spill to the heap.
const INLINE_CLUSTER_BYTES: usize = 8;

/// One grid position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    text: SmallVec<[u8; INLINE_CLUSTER_BYTES]>,
    width: u8,
    attributes: CellAttributes,
    hyperlink: Option<Arc<Hyperlink>>,
    dirty: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank(CellAttributes::default())
    }
}

impl Cell {
    /// An empty cell with the given attributes (used for erase fills).
    #[must_use]
    pub fn blank(attributes: CellAttributes) -> Self {
        Self {
            text: SmallVec::new(),
            width: 1,
            attributes,
            hyperlink: None,
            dirty: true,
        }
    }

    /// Write a character into this cell, replacing previous content.
    pub fn write(
        &mut self,
        ch: char,
        width: usize,
        attributes: CellAttributes,
        hyperlink: Option<Arc<Hyperlink>>,
    ) {
        self.text.clear();
        let mut buf = [0u8; 4];
        self.text.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        self.width = width.min(u8::MAX as usize) as u8;
        self.attributes = attributes;
        self.hyperlink = hyperlink;
        self.dirty = true;
    }

    /// Append a combining character to the cluster.
    ///
    /// Returns the growth in display width (usually 0; emoji sequences can
    /// widen a narrow base to 2 cells).
    pub fn append_character(&mut self, ch: char) -> usize {
        let old_width = usize::from(self.width);
        let mut buf = [0u8; 4];
        self.text.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        let new_width = grapheme::cluster_width(self.as_str()).max(old_width);
        self.width = new_width.min(u8::MAX as usize) as u8;
        self.dirty = true;
        new_width - old_width
    }

    /// Turn this cell into the continuation half of a wide cluster.
    pub fn make_continuation(&mut self, attributes: CellAttributes, hyperlink: Option<Arc<Hyperlink>>) {
        self.text.clear();
        self.width = 0;
        self.attributes = attributes;
        self.hyperlink = hyperlink;
        self.dirty = true;
    }

    /// Reset to an empty cell with the given attributes.
    pub fn reset(&mut self, attributes: CellAttributes, hyperlink: Option<Arc<Hyperlink>>) {
        self.text.clear();
        self.width = 1;
        self.attributes = attributes;
        self.hyperlink = hyperlink;
        self.dirty = true;
    }

    /// The grapheme cluster as a string slice; empty for blank cells and
    /// continuations.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        // The buffer only ever holds `char::encode_utf8` output.
        std::str::from_utf8(&self.text).unwrap_or("")
    }

    /// Display width: 1 or 2, 0 for a continuation cell.
    #[must_use]
    #[inline]
    pub fn width(&self) -> usize {
        usize::from(self.width)
    }

    /// Check if this is the continuation half of a wide cluster.
    #[must_use]
    #[inline]
    pub fn is_continuation(&self) -> bool {
        self.width == 0 && self.text.is_empty()
    }

    /// Check if no text has been written.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of scalar values in the cluster.
    #[must_use]
    pub fn codepoint_count(&self) -> usize {
        self.as_str().chars().count()
    }

    /// Attributes this cell was written with.
    #[must_use]
    #[inline]
    pub fn attributes(&self) -> &CellAttributes {
        &self.attributes
    }

    /// Hyperlink attached to this cell, if any.
    #[must_use]
    pub fn hyperlink(&self) -> Option<&Arc<Hyperlink>> {
        self.hyperlink.as_ref()
    }

    /// Check and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Check the dirty flag.
    #[must_use]
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cell_is_empty() {
        let cell = Cell::blank(CellAttributes::default());
        assert!(cell.is_empty());
        assert_eq!(cell.width(), 1);
        assert!(!cell.is_continuation());
    }

    #[test]
    fn write_replaces_content() {
        let mut cell = Cell::blank(CellAttributes::default());
        cell.write('a', 1, CellAttributes::default(), None);
        cell.write('中', 2, CellAttributes::default(), None);
        assert_eq!(cell.as_str(), "中");
        assert_eq!(cell.width(), 2);
    }

    #[test]
    fn append_combining_mark() {
        let mut cell = Cell::blank(CellAttributes::default());
        cell.write('e', 1, CellAttributes::default(), None);
        let grown = cell.append_character('\u{0301}');
        assert_eq!(grown, 0);
        assert_eq!(cell.as_str(), "e\u{0301}");
        assert_eq!(cell.codepoint_count(), 2);
        assert_eq!(cell.width(), 1);
    }

    #[test]
    fn continuation_cell() {
        let mut cell = Cell::blank(CellAttributes::default());
        cell.make_continuation(CellAttributes::default(), None);
        assert!(cell.is_continuation());
        assert_eq!(cell.width(), 0);
    }

    #[test]
    fn sgr_underline_styles_are_exclusive() {
        let mut pen = CellAttributes::default();
        pen.apply(GraphicsRendition::Underline);
        pen.apply(GraphicsRendition::CurlyUnderlined);
        assert!(pen.flags.contains(CellFlags::CURLY_UNDERLINE));
        assert!(!pen.flags.contains(CellFlags::UNDERLINE));
        pen.apply(GraphicsRendition::NoUnderline);
        assert!(!pen.flags.intersects(CellFlags::ANY_UNDERLINE));
    }

    #[test]
    fn sgr_reset_clears_everything() {
        let mut pen = CellAttributes {
            foreground: Color::Indexed(3),
            ..Default::default()
        };
        pen.apply(GraphicsRendition::Bold);
        pen.apply(GraphicsRendition::Reset);
        assert!(pen.is_default());
    }

    #[test]
    fn sgr_normal_clears_bold_and_faint() {
        let mut pen = CellAttributes::default();
        pen.apply(GraphicsRendition::Bold);
        pen.apply(GraphicsRendition::Faint);
        pen.apply(GraphicsRendition::Normal);
        assert!(!pen.flags.intersects(CellFlags::BOLD | CellFlags::FAINT));
    }
}
