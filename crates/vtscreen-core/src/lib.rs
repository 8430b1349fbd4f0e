//! Virtual terminal screen engine.
//!
//! `vtscreen-core` consumes the raw byte stream a host program writes to
//! its terminal and maintains the resulting screen state: a grid of styled
//! cells, a cursor, scroll margins, tab stops, a bounded scrollback
//! history, and the modal state of a VT500/xterm-class terminal. It renders
//! nothing and owns no process; a GUI or TUI embedder drives it and
//! observes side effects through the [`EventListener`] callback surface.
//!
//! The pipeline has three stages:
//!
//! 1. [`Parser`] — an ECMA-48 state machine turning bytes into events
//!    (printables, controls, CSI/OSC/DCS sequences).
//! 2. [`CommandBuilder`] — classification of those events into the closed
//!    [`Command`] algebra, with parameter clamping.
//! 3. [`Screen`] — exhaustive dispatch over the algebra, mutating the
//!    active [`ScreenBuffer`] (primary or alternate) and emitting replies
//!    and callbacks in command order.
//!
//! ```
//! use vtscreen_core::{NullListener, Screen, WindowSize};
//!
//! let mut screen = Screen::new(WindowSize::new(80, 24), NullListener);
//! screen.write(b"\x1b[1;31mhello\x1b[0m world");
//! assert_eq!(screen.render_text_line(1).trim_end(), "hello world");
//! ```
//!
//! The engine is synchronous and single-threaded: `write` applies every
//! byte before returning, and callbacks run inline. Nothing on the input
//! path can fail; malformed UTF-8 becomes U+FFFD and unrecognized
//! sequences are logged at trace level and ignored.

pub mod buffer;
pub mod builder;
pub mod cell;
pub mod charset;
pub mod color;
pub mod commands;
pub mod grapheme;
pub mod parser;
pub mod screen;
pub mod selector;
mod utf8;

#[cfg(test)]
mod tests;

pub use buffer::{BufferType, Coordinate, Line, Margin, MarginRange, ScreenBuffer, WindowSize};
pub use builder::CommandBuilder;
pub use cell::{Cell, CellAttributes, CellFlags, GraphicsRendition, Hyperlink};
pub use charset::{Charset, CharsetSlot, CharsetTable};
pub use color::{ansi_256_to_rgb, Color, DynamicColorName, RgbColor};
pub use commands::{
    Command, CursorDisplay, CursorShape, Mode, MouseProtocol, MouseTransport, MouseWheelMode,
    ResizeUnit, TabClear, VTType,
};
pub use parser::{ControlStringKind, Params, Parser, ParserListener};
pub use screen::{EventListener, NullListener, Screen, ScreenError};
pub use selector::{SelectionMode, SelectionRange, Selector, SelectorState};
pub use utf8::{Utf8Decoder, Utf8Step};
