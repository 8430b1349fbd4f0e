//! The terminal screen: dispatcher, mode state, two buffers, callbacks.
//!
//! [`Screen`] owns the parser, the command builder, and both screen
//! buffers. `write` runs the whole pipeline synchronously in the caller's
//! context: bytes are parsed, classified into commands, and applied in
//! byte-stream order; host callbacks and reply bytes are issued inline, in
//! command order. The type is not reentrant and not thread-safe; the
//! embedder serializes access.

use std::sync::Arc;

use log::trace;
use thiserror::Error;

use crate::buffer::{BufferType, Coordinate, ScreenBuffer, WindowSize};
use crate::builder::CommandBuilder;
use crate::cell::{Cell, CellAttributes};
use crate::color::{DynamicColorName, RgbColor};
use crate::commands::{
    Command, CursorDisplay, CursorShape, Mode, MouseProtocol, MouseTransport, MouseWheelMode,
    ResizeUnit, VTType,
};
use crate::parser::Parser;
use crate::selector::{word_range_at, SelectionMode, SelectionRange, Selector, SelectorState,
    WORD_DELIMITERS};

/// Errors reported by the fallible parts of the screen API.
///
/// Nothing on the byte-input path fails; these cover embedder calls only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScreenError {
    /// `resize` was asked for a zero-sized screen.
    #[error("invalid screen size: {columns}x{rows}")]
    InvalidSize {
        /// Requested column count.
        columns: usize,
        /// Requested row count.
        rows: usize,
    },
}

/// Embedder capability set, invoked synchronously from inside dispatch.
///
/// Every method defaults to a no-op, so embedders implement only what they
/// care about. Callbacks must not call back into the same [`Screen`].
#[allow(unused_variables)]
pub trait EventListener {
    /// Send reply bytes to the host program's input.
    fn reply(&mut self, data: &str) {}

    /// DECCKM changed.
    fn use_application_cursor_keys(&mut self, enable: bool) {}

    /// The window title changed; read it via [`Screen::window_title`].
    fn window_title_changed(&mut self) {}

    /// xterm window resize request (CSI t); `in_pixels` distinguishes
    /// pixel from character units.
    fn resize_window(&mut self, width: usize, height: usize, in_pixels: bool) {}

    /// DECKPAM/DECKPNM.
    fn set_application_keypad_mode(&mut self, enable: bool) {}

    /// Bracketed paste (mode 2004).
    fn set_bracketed_paste(&mut self, enable: bool) {}

    /// A mouse protocol was switched on or off.
    fn set_mouse_protocol(&mut self, protocol: MouseProtocol, enable: bool) {}

    /// The mouse coordinate encoding changed.
    fn set_mouse_transport(&mut self, transport: MouseTransport) {}

    /// The wheel behavior changed (DECCKM / mode 1007).
    fn set_mouse_wheel_mode(&mut self, mode: MouseWheelMode) {}

    /// DECSCUSR.
    fn set_cursor_style(&mut self, display: CursorDisplay, shape: CursorShape) {}

    /// The active buffer switched.
    fn buffer_changed(&mut self, buffer: BufferType) {}

    /// BEL.
    fn bell(&mut self) {}

    /// OSC color query; return the color to report, or `None` to stay
    /// silent.
    fn request_dynamic_color(&mut self, name: DynamicColorName) -> Option<RgbColor> {
        None
    }

    /// OSC color reset.
    fn reset_dynamic_color(&mut self, name: DynamicColorName) {}

    /// OSC color set.
    fn set_dynamic_color(&mut self, name: DynamicColorName, color: RgbColor) {}

    /// Focus tracking (mode 1004).
    fn set_generate_focus_events(&mut self, enable: bool) {}

    /// OSC 777 desktop notification.
    fn notify(&mut self, title: &str, body: &str) {}

    /// Tap on the dispatched command stream, before application.
    fn commands(&mut self, commands: &[Command]) {}
}

/// A listener that ignores everything (tests, headless use).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl EventListener for NullListener {}

/// The virtual terminal screen.
pub struct Screen<T> {
    listener: T,
    parser: Parser,
    builder: CommandBuilder,
    primary: ScreenBuffer,
    alternate: ScreenBuffer,
    active: BufferType,
    size: WindowSize,
    max_history_line_count: Option<usize>,
    terminal_id: VTType,
    window_title: String,
    icon_title: String,
    saved_window_titles: Vec<String>,
    scroll_offset: usize,
    selector: Option<Selector>,
    cursor_style: (CursorDisplay, CursorShape),
    focused: bool,
    command_counter: u64,
}

impl<T: EventListener> Screen<T> {
    /// Create a screen with unbounded scrollback.
    #[must_use]
    pub fn new(size: WindowSize, listener: T) -> Self {
        Self::with_history(size, None, listener)
    }

    /// Create a screen with a bounded scrollback capacity.
    #[must_use]
    pub fn with_history(
        size: WindowSize,
        max_history_line_count: Option<usize>,
        listener: T,
    ) -> Self {
        Self {
            listener,
            parser: Parser::new(),
            builder: CommandBuilder::new(),
            primary: ScreenBuffer::new(BufferType::Primary, size, max_history_line_count),
            alternate: ScreenBuffer::new(BufferType::Alternate, size, Some(0)),
            active: BufferType::Primary,
            size,
            max_history_line_count,
            terminal_id: VTType::default(),
            window_title: String::new(),
            icon_title: String::new(),
            saved_window_titles: Vec::new(),
            scroll_offset: 0,
            selector: None,
            cursor_style: (CursorDisplay::Blink, CursorShape::Block),
            focused: true,
            command_counter: 0,
        }
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Consume host program output. Returns when every byte is applied.
    pub fn write(&mut self, data: &[u8]) {
        self.parser.advance(&mut self.builder, data);
        let commands = self.builder.take_commands();
        if commands.is_empty() {
            return;
        }
        // Host output snaps the viewport back to the live area.
        self.scroll_offset = 0;
        self.listener.commands(&commands);
        for command in commands {
            self.apply(command);
        }
    }

    /// Convenience wrapper over [`Self::write`].
    pub fn write_str(&mut self, text: &str) {
        self.write(text.as_bytes());
    }

    /// Apply one command directly, bypassing the parser.
    pub fn apply(&mut self, command: Command) {
        self.command_counter += 1;
        let evicted_before = self.active_buffer().evicted_line_count();
        self.dispatch(command);
        if self.active_buffer().evicted_line_count() != evicted_before {
            // Eviction shifts absolute addresses under the selection.
            self.demote_selection();
        }
    }

    #[allow(clippy::too_many_lines)]
    fn dispatch(&mut self, command: Command) {
        use Command::*;
        match command {
            Bell => self.listener.bell(),
            Linefeed => {
                let newline = self.active_buffer().is_mode_enabled(Mode::Newline);
                self.active_buffer_mut().linefeed(newline);
            }
            Backspace => self.active_buffer_mut().backspace(),
            // RIS from the byte stream must not clear the parser: its state
            // already belongs to bytes that followed ESC c.
            FullReset => self.reset_state(),
            SoftTerminalReset => self.reset_soft(),

            AppendChar(ch) => {
                self.demote_selection_at_cursor();
                self.active_buffer_mut().append_char(ch);
            }

            MoveCursorTo { row, column } => self
                .active_buffer_mut()
                .move_cursor_to(Coordinate::new(row, column)),
            MoveCursorUp(n) => self.active_buffer_mut().move_cursor_up(n),
            MoveCursorDown(n) => self.active_buffer_mut().move_cursor_down(n),
            MoveCursorForward(n) => self.active_buffer_mut().move_cursor_forward(n),
            MoveCursorBackward(n) => self.active_buffer_mut().move_cursor_backward(n),
            CursorNextLine(n) => self.active_buffer_mut().cursor_next_line(n),
            CursorPreviousLine(n) => self.active_buffer_mut().cursor_previous_line(n),
            MoveCursorToColumn(n) => self.active_buffer_mut().move_cursor_to_column(n),
            MoveCursorToLine(n) => self.active_buffer_mut().move_cursor_to_line(n),
            HorizontalPositionRelative(n) => {
                self.active_buffer_mut().horizontal_position_relative(n);
            }
            MoveCursorToBeginOfLine => self.active_buffer_mut().move_cursor_to_begin_of_line(),
            MoveCursorToNextTab => self.active_buffer_mut().move_cursor_to_next_tab(),
            CursorForwardTab(n) => self.active_buffer_mut().cursor_forward_tab(n),
            CursorBackwardTab(n) => self.active_buffer_mut().cursor_backward_tab(n),
            HorizontalTabSet => self.active_buffer_mut().set_tab_under_cursor(),
            HorizontalTabClear(which) => self.active_buffer_mut().clear_tabs(which),

            SaveCursor => self.active_buffer_mut().save_cursor(),
            RestoreCursor => self.active_buffer_mut().restore_cursor(),
            Index => {
                self.demote_selection_in_margin();
                self.active_buffer_mut().index();
            }
            ReverseIndex => {
                self.demote_selection_in_margin();
                self.active_buffer_mut().reverse_index();
            }
            BackIndex => {
                self.demote_selection_in_margin();
                self.active_buffer_mut().back_index();
            }
            ForwardIndex => {
                self.demote_selection_in_margin();
                self.active_buffer_mut().forward_index();
            }

            ClearToEndOfScreen => {
                self.demote_selection_rows(self.active_buffer().real_cursor_position().row, self.size.rows);
                self.active_buffer_mut().clear_to_end_of_screen();
            }
            ClearToBeginOfScreen => {
                self.demote_selection_rows(1, self.active_buffer().real_cursor_position().row);
                self.active_buffer_mut().clear_to_begin_of_screen();
            }
            ClearScreen => {
                self.demote_selection_rows(1, self.size.rows);
                self.active_buffer_mut().clear_screen();
            }
            ClearScrollbackBuffer => {
                self.demote_selection();
                self.active_buffer_mut().clear_scrollback();
                self.scroll_offset = 0;
            }
            ClearToEndOfLine => {
                self.demote_selection_at_cursor();
                self.active_buffer_mut().clear_to_end_of_line();
            }
            ClearToBeginOfLine => {
                self.demote_selection_at_cursor();
                self.active_buffer_mut().clear_to_begin_of_line();
            }
            ClearLine => {
                self.demote_selection_at_cursor();
                self.active_buffer_mut().clear_line();
            }
            EraseCharacters(n) => {
                self.demote_selection_at_cursor();
                self.active_buffer_mut().erase_characters(n);
            }

            ScrollUp(n) => {
                self.demote_selection_in_margin();
                self.active_buffer_mut().scroll_up(n);
            }
            ScrollDown(n) => {
                self.demote_selection_in_margin();
                self.active_buffer_mut().scroll_down(n);
            }
            InsertCharacters(n) => {
                self.demote_selection_at_cursor();
                self.active_buffer_mut().insert_characters(n);
            }
            InsertLines(n) => {
                self.demote_selection_in_margin();
                self.active_buffer_mut().insert_lines(n);
            }
            InsertColumns(n) => {
                self.demote_selection_in_margin();
                self.active_buffer_mut().insert_columns(n);
            }
            DeleteCharacters(n) => {
                self.demote_selection_at_cursor();
                self.active_buffer_mut().delete_characters(n);
            }
            DeleteLines(n) => {
                self.demote_selection_in_margin();
                self.active_buffer_mut().delete_lines(n);
            }
            DeleteColumns(n) => {
                self.demote_selection_in_margin();
                self.active_buffer_mut().delete_columns(n);
            }

            SetForegroundColor(color) => self.active_buffer_mut().pen_mut().foreground = color,
            SetBackgroundColor(color) => self.active_buffer_mut().pen_mut().background = color,
            SetUnderlineColor(color) => {
                self.active_buffer_mut().pen_mut().underline_color = color;
            }
            SetGraphicsRendition(rendition) => {
                self.active_buffer_mut().pen_mut().apply(rendition);
            }

            SetMode { mode, enable } => self.set_mode(mode, enable),
            RequestMode { ansi, number } => self.reply_mode_status(ansi, number),
            SetTopBottomMargin { top, bottom } => {
                self.active_buffer_mut().set_top_bottom_margin(top, bottom);
            }
            SetLeftRightMargin { left, right } => {
                if self.active_buffer().is_mode_enabled(Mode::LeftRightMargin) {
                    self.active_buffer_mut().set_left_right_margin(left, right);
                } else {
                    trace!("ignoring DECSLRM while DECLRMM is reset");
                }
            }
            ScreenAlignmentPattern => {
                self.demote_selection_rows(1, self.size.rows);
                self.active_buffer_mut().screen_alignment_pattern();
            }
            SendMouseEvents { protocol, enable } => {
                let mode = match protocol {
                    MouseProtocol::X10 => Mode::MouseX10,
                    MouseProtocol::Normal => Mode::MouseNormal,
                    MouseProtocol::ButtonEvent => Mode::MouseButtonEvent,
                    MouseProtocol::AnyEvent => Mode::MouseAnyEvent,
                };
                self.active_buffer_mut().set_mode(mode, enable);
                self.listener.set_mouse_protocol(protocol, enable);
            }
            ApplicationKeypadMode(enable) => {
                self.listener.set_application_keypad_mode(enable);
            }
            DesignateCharset { slot, charset } => {
                self.active_buffer_mut().designate_charset(slot, charset);
            }
            SingleShiftSelect(slot) => self.active_buffer_mut().single_shift(slot),
            LockingShift(slot) => self.active_buffer_mut().locking_shift(slot),
            SetCursorStyle { display, shape } => {
                self.cursor_style = (display, shape);
                self.listener.set_cursor_style(display, shape);
            }

            DeviceStatusReport => self.reply("\x1b[0n".into()),
            ReportCursorPosition => {
                let position = self.active_buffer().cursor_position();
                self.reply(format!("\x1b[{};{}R", position.row, position.column));
            }
            ReportExtendedCursorPosition => {
                let position = self.active_buffer().cursor_position();
                self.reply(format!("\x1b[?{};{};1R", position.row, position.column));
            }
            SendDeviceAttributes => self.reply_device_attributes(),
            SendTerminalId => {
                self.reply(format!("\x1b[>{};10;0c", self.terminal_id.id()));
            }
            RequestStatusString(setting) => self.reply_status_string(&setting),
            RequestTabStops => self.reply_tab_stops(),

            Hyperlink { id, uri } => {
                let link = if uri.is_empty() {
                    None
                } else {
                    Some(Arc::new(crate::cell::Hyperlink { id, uri }))
                };
                self.active_buffer_mut().set_hyperlink(link);
            }
            Notify { title, body } => self.listener.notify(&title, &body),
            ChangeWindowTitle(title) => {
                self.window_title = title;
                self.listener.window_title_changed();
            }
            ChangeIconTitle(title) => self.icon_title = title,
            SaveWindowTitle => {
                self.saved_window_titles.push(self.window_title.clone());
            }
            RestoreWindowTitle => {
                if let Some(title) = self.saved_window_titles.pop() {
                    self.window_title = title;
                    self.listener.window_title_changed();
                }
            }
            ResizeWindow { width, height, unit } => {
                self.listener
                    .resize_window(width, height, unit == ResizeUnit::Pixels);
            }
            SetMark => self.active_buffer_mut().set_mark(),

            RequestDynamicColor(name) => {
                if let Some(color) = self.listener.request_dynamic_color(name) {
                    self.reply(format!(
                        "\x1b]{};{}\x1b\\",
                        name.code(),
                        color.to_x11_spec()
                    ));
                }
            }
            ResetDynamicColor(name) => self.listener.reset_dynamic_color(name),
            SetDynamicColor { name, color } => self.listener.set_dynamic_color(name, color),

            Ignored(_) => {}
        }
    }

    // ------------------------------------------------------------------
    // Modes and buffer switching
    // ------------------------------------------------------------------

    fn set_mode(&mut self, mode: Mode, enable: bool) {
        match mode {
            Mode::UseAlternateScreen => {
                self.set_buffer(if enable {
                    BufferType::Alternate
                } else {
                    BufferType::Primary
                });
            }
            Mode::UseAlternateScreenClearing => {
                if enable {
                    self.set_buffer(BufferType::Alternate);
                } else {
                    if self.active == BufferType::Alternate {
                        self.alternate.clear_screen();
                    }
                    self.set_buffer(BufferType::Primary);
                }
            }
            Mode::UseAlternateScreenSaveCursor => {
                if enable {
                    self.primary.save_cursor();
                    self.set_buffer(BufferType::Alternate);
                    self.alternate.clear_screen();
                    self.alternate.move_cursor_to(Coordinate::new(1, 1));
                } else {
                    if self.active == BufferType::Alternate {
                        self.alternate.clear_screen();
                    }
                    self.set_buffer(BufferType::Primary);
                    self.primary.restore_cursor();
                }
            }
            Mode::ApplicationCursorKeys => {
                self.active_buffer_mut().set_mode(mode, enable);
                self.listener.use_application_cursor_keys(enable);
                self.listener.set_mouse_wheel_mode(if enable {
                    MouseWheelMode::ApplicationCursorKeys
                } else {
                    MouseWheelMode::NormalCursorKeys
                });
            }
            Mode::MouseAlternateScroll => {
                self.active_buffer_mut().set_mode(mode, enable);
                self.listener.set_mouse_wheel_mode(if enable {
                    MouseWheelMode::ScrollEvents
                } else {
                    MouseWheelMode::Default
                });
            }
            Mode::MouseExtended => {
                self.active_buffer_mut().set_mode(mode, enable);
                self.set_transport(MouseTransport::Extended, enable);
            }
            Mode::MouseSgr => {
                self.active_buffer_mut().set_mode(mode, enable);
                self.set_transport(MouseTransport::Sgr, enable);
            }
            Mode::MouseUrxvt => {
                self.active_buffer_mut().set_mode(mode, enable);
                self.set_transport(MouseTransport::Urxvt, enable);
            }
            Mode::BracketedPaste => {
                self.active_buffer_mut().set_mode(mode, enable);
                self.listener.set_bracketed_paste(enable);
            }
            Mode::FocusTracking => {
                self.active_buffer_mut().set_mode(mode, enable);
                self.listener.set_generate_focus_events(enable);
            }
            Mode::Columns132 => {
                // DECCOLM: clear, home, reset margins; the embedder decides
                // whether to actually resize.
                self.active_buffer_mut().set_mode(mode, enable);
                self.demote_selection_rows(1, self.size.rows);
                self.active_buffer_mut().clear_screen();
                self.active_buffer_mut().set_top_bottom_margin(0, 0);
                self.active_buffer_mut().move_cursor_to(Coordinate::new(1, 1));
                let columns = if enable { 132 } else { 80 };
                self.listener.resize_window(columns, self.size.rows, false);
            }
            _ => self.active_buffer_mut().set_mode(mode, enable),
        }
    }

    fn set_transport(&mut self, transport: MouseTransport, enable: bool) {
        self.listener.set_mouse_transport(if enable {
            transport
        } else {
            MouseTransport::Standard
        });
    }

    fn set_buffer(&mut self, buffer: BufferType) {
        if self.active == buffer {
            return;
        }
        self.active = buffer;
        self.scroll_offset = 0;
        self.demote_selection();
        self.active_buffer_mut().reset_charsets();
        self.listener.buffer_changed(buffer);
    }

    // ------------------------------------------------------------------
    // Replies
    // ------------------------------------------------------------------

    fn reply(&mut self, message: String) {
        self.listener.reply(&message);
    }

    fn reply_device_attributes(&mut self) {
        let reply = match self.terminal_id {
            VTType::VT100 => "\x1b[?1;2c".to_string(),
            VTType::VT102 => "\x1b[?6c".to_string(),
            other => format!("\x1b[?{};6;9;15;22c", other.id()),
        };
        self.reply(reply);
    }

    fn reply_mode_status(&mut self, ansi: bool, number: u16) {
        let mode = if ansi {
            Mode::from_ansi(number)
        } else {
            Mode::from_dec(number)
        };
        let status = match mode {
            None => 0,
            Some(
                Mode::UseAlternateScreen
                | Mode::UseAlternateScreenClearing
                | Mode::UseAlternateScreenSaveCursor,
            ) => {
                if self.active == BufferType::Alternate {
                    1
                } else {
                    2
                }
            }
            Some(mode) => {
                if self.active_buffer().is_mode_enabled(mode) {
                    1
                } else {
                    2
                }
            }
        };
        let prefix = if ansi { "" } else { "?" };
        self.reply(format!("\x1b[{prefix}{number};{status}$y"));
    }

    fn reply_status_string(&mut self, setting: &str) {
        let payload = match setting {
            "m" => {
                let sequence = self.active_buffer().pen().sgr_sequence();
                sequence
                    .strip_prefix("\x1b[")
                    .map(str::to_string)
            }
            "r" => {
                let margin = self.active_buffer().margin().vertical;
                Some(format!("{};{}r", margin.from, margin.to))
            }
            " q" => Some(format!("{} q", cursor_style_code(self.cursor_style))),
            _ => None,
        };
        match payload {
            Some(payload) => self.reply(format!("\x1bP1$r{payload}\x1b\\")),
            None => self.reply("\x1bP0$r\x1b\\".into()),
        }
    }

    fn reply_tab_stops(&mut self) {
        let stops = self.active_buffer().tab_stops();
        let stops = stops
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/");
        self.reply(format!("\x1bP2$u{stops}\x1b\\"));
    }

    // ------------------------------------------------------------------
    // Resets
    // ------------------------------------------------------------------

    /// DECSTR: modes and pen to defaults; contents, history, title stay.
    pub fn reset_soft(&mut self) {
        self.active_buffer_mut().reset_soft();
        self.cursor_style = (CursorDisplay::Blink, CursorShape::Block);
    }

    /// RIS: everything back to construction state, including any in-flight
    /// escape sequence (the embedder's escape hatch for a stuck parser).
    pub fn reset_hard(&mut self) {
        self.reset_state();
        self.parser.reset();
    }

    fn reset_state(&mut self) {
        let was_alternate = self.active == BufferType::Alternate;
        self.primary =
            ScreenBuffer::new(BufferType::Primary, self.size, self.max_history_line_count);
        self.alternate = ScreenBuffer::new(BufferType::Alternate, self.size, Some(0));
        self.active = BufferType::Primary;
        self.window_title.clear();
        self.icon_title.clear();
        self.saved_window_titles.clear();
        self.scroll_offset = 0;
        self.selector = None;
        self.cursor_style = (CursorDisplay::Blink, CursorShape::Block);
        if was_alternate {
            self.listener.buffer_changed(BufferType::Primary);
        }
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Resize both buffers. Zero dimensions are rejected and leave the
    /// screen untouched.
    pub fn resize(&mut self, new_size: WindowSize) -> Result<(), ScreenError> {
        if new_size.columns == 0 || new_size.rows == 0 {
            return Err(ScreenError::InvalidSize {
                columns: new_size.columns,
                rows: new_size.rows,
            });
        }
        if new_size != self.size {
            self.demote_selection();
            self.primary.resize(new_size);
            self.alternate.resize(new_size);
            self.size = new_size;
            self.scroll_offset = self
                .scroll_offset
                .min(self.active_buffer().history_line_count());
        }
        Ok(())
    }

    /// Current dimensions.
    #[must_use]
    pub fn size(&self) -> WindowSize {
        self.size
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The buffer currently receiving commands.
    #[must_use]
    pub fn active_buffer(&self) -> &ScreenBuffer {
        match self.active {
            BufferType::Primary => &self.primary,
            BufferType::Alternate => &self.alternate,
        }
    }

    fn active_buffer_mut(&mut self) -> &mut ScreenBuffer {
        match self.active {
            BufferType::Primary => &mut self.primary,
            BufferType::Alternate => &mut self.alternate,
        }
    }

    /// Which buffer is active.
    #[must_use]
    pub fn buffer_type(&self) -> BufferType {
        self.active
    }

    /// Check if the primary buffer is active.
    #[must_use]
    pub fn is_primary_screen(&self) -> bool {
        self.active == BufferType::Primary
    }

    /// Check if the alternate buffer is active.
    #[must_use]
    pub fn is_alternate_screen(&self) -> bool {
        self.active == BufferType::Alternate
    }

    /// Check a mode on the active buffer; the alternate-screen modes
    /// reflect which buffer is active.
    #[must_use]
    pub fn is_mode_enabled(&self, mode: Mode) -> bool {
        match mode {
            Mode::UseAlternateScreen
            | Mode::UseAlternateScreenClearing
            | Mode::UseAlternateScreenSaveCursor => self.is_alternate_screen(),
            _ => self.active_buffer().is_mode_enabled(mode),
        }
    }

    /// Cursor position as reported to the host (origin-mode aware).
    #[must_use]
    pub fn cursor_position(&self) -> Coordinate {
        self.active_buffer().cursor_position()
    }

    /// Cursor position in screen coordinates.
    #[must_use]
    pub fn real_cursor_position(&self) -> Coordinate {
        self.active_buffer().real_cursor_position()
    }

    /// Current window title.
    #[must_use]
    pub fn window_title(&self) -> &str {
        &self.window_title
    }

    /// Current icon title.
    #[must_use]
    pub fn icon_title(&self) -> &str {
        &self.icon_title
    }

    /// Scrollback length of the primary buffer.
    #[must_use]
    pub fn history_line_count(&self) -> usize {
        self.primary.history_line_count()
    }

    /// Configure the terminal generation reported by DA1/DA2.
    pub fn set_terminal_id(&mut self, id: VTType) {
        self.terminal_id = id;
    }

    /// Change the scrollback capacity.
    pub fn set_max_history_line_count(&mut self, count: Option<usize>) {
        self.max_history_line_count = count;
        self.primary.set_max_history_line_count(count);
        self.scroll_offset = self.scroll_offset.min(self.primary.history_line_count());
    }

    /// Configure the implicit tab width on both buffers.
    pub fn set_tab_width(&mut self, width: usize) {
        self.primary.set_tab_width(width);
        self.alternate.set_tab_width(width);
    }

    /// Host focus state (used by embedders driving focus reporting).
    pub fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Check the host focus state.
    #[must_use]
    pub fn focused(&self) -> bool {
        self.focused
    }

    /// Number of commands applied since construction.
    #[must_use]
    pub fn command_count(&self) -> u64 {
        self.command_counter
    }

    /// The embedder listener.
    #[must_use]
    pub fn listener(&self) -> &T {
        &self.listener
    }

    /// Mutable access to the embedder listener.
    pub fn listener_mut(&mut self) -> &mut T {
        &mut self.listener
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    /// Lines scrolled up into history; 0 means live view.
    #[must_use]
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Scroll the viewport up into history. Returns whether it moved.
    pub fn scroll_viewport_up(&mut self, lines: usize) -> bool {
        let limit = self.active_buffer().history_line_count();
        let new = (self.scroll_offset + lines).min(limit);
        let changed = new != self.scroll_offset;
        self.scroll_offset = new;
        changed
    }

    /// Scroll the viewport toward the live area. Returns whether it moved.
    pub fn scroll_viewport_down(&mut self, lines: usize) -> bool {
        let new = self.scroll_offset.saturating_sub(lines);
        let changed = new != self.scroll_offset;
        self.scroll_offset = new;
        changed
    }

    /// Jump to the oldest history line.
    pub fn scroll_to_top(&mut self) -> bool {
        let limit = self.active_buffer().history_line_count();
        let changed = self.scroll_offset != limit;
        self.scroll_offset = limit;
        changed
    }

    /// Jump back to the live area.
    pub fn scroll_to_bottom(&mut self) -> bool {
        let changed = self.scroll_offset != 0;
        self.scroll_offset = 0;
        changed
    }

    /// Scroll to the previous marked line, if any.
    pub fn scroll_mark_up(&mut self) -> bool {
        match self.active_buffer().find_prev_marker(self.scroll_offset) {
            Some(offset) => {
                self.scroll_offset = offset;
                true
            }
            None => false,
        }
    }

    /// Scroll to the next marked line (or the live bottom).
    pub fn scroll_mark_down(&mut self) -> bool {
        match self.active_buffer().find_next_marker(self.scroll_offset) {
            Some(offset) => {
                self.scroll_offset = offset;
                true
            }
            None => false,
        }
    }

    /// Check whether an absolute line is inside the current viewport.
    #[must_use]
    pub fn is_absolute_line_visible(&self, absolute_row: usize) -> bool {
        let history = self.active_buffer().history_line_count();
        let top = history.saturating_sub(self.scroll_offset);
        absolute_row > top && absolute_row <= top + self.size.rows
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Walk every viewport cell at the given scroll offset.
    pub fn render<F>(&self, mut renderer: F, scroll_offset: usize)
    where
        F: FnMut(Coordinate, &Cell),
    {
        let buffer = self.active_buffer();
        let history = buffer.history_line_count();
        let offset = scroll_offset.min(history);
        let top = history - offset;
        for row in 1..=self.size.rows {
            if let Some(line) = buffer.absolute_line(top + row) {
                for column in 1..=self.size.columns.min(line.cells().len()) {
                    renderer(Coordinate::new(row, column), line.cell(column));
                }
            }
        }
    }

    /// One visible row of the active buffer as text.
    #[must_use]
    pub fn render_text_line(&self, row: usize) -> String {
        self.active_buffer().render_text_line(row)
    }

    /// The visible grid as text, lines terminated by LF.
    #[must_use]
    pub fn render_text(&self) -> String {
        self.active_buffer().render_text()
    }

    /// The n'th most recent history line as text.
    #[must_use]
    pub fn render_history_text_line(&self, n: usize) -> Option<String> {
        self.active_buffer().render_history_text_line(n)
    }

    /// VT replay of the active buffer.
    #[must_use]
    pub fn screenshot(&self) -> String {
        self.active_buffer().screenshot()
    }

    /// Cell access on the active buffer (screen-relative, 1-based).
    #[must_use]
    pub fn at(&self, row: usize, column: usize) -> &Cell {
        self.active_buffer().at(row, column)
    }

    /// The current pen of the active buffer.
    #[must_use]
    pub fn pen(&self) -> &CellAttributes {
        self.active_buffer().pen()
    }

    /// Hyperlink under the given cell, if any.
    #[must_use]
    pub fn hyperlink_at(&self, row: usize, column: usize) -> Option<&Arc<crate::cell::Hyperlink>> {
        self.active_buffer().at(row, column).hyperlink()
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Begin a selection at an absolute coordinate (scrollback + live).
    pub fn start_selection(&mut self, mode: SelectionMode, coordinate: Coordinate) {
        let mut selector = Selector::new(mode);
        if mode == SelectionMode::LinearWordWise {
            if let Some(line) = self.active_buffer().absolute_line(coordinate.row) {
                let (from, to) = word_range_at(line, coordinate.column, WORD_DELIMITERS);
                selector.start(Coordinate::new(coordinate.row, from));
                selector.extend(Coordinate::new(coordinate.row, to));
                self.selector = Some(selector);
                return;
            }
        }
        selector.start(coordinate);
        self.selector = Some(selector);
    }

    /// Move the active selection's extension point.
    pub fn extend_selection(&mut self, coordinate: Coordinate) {
        let Some((mode, anchor)) = self
            .selector
            .as_ref()
            .map(|selector| (selector.mode(), selector.normalized().0))
        else {
            return;
        };
        let target = if mode == SelectionMode::LinearWordWise {
            match self.active_buffer().absolute_line(coordinate.row) {
                Some(line) => {
                    let (from, to) = word_range_at(line, coordinate.column, WORD_DELIMITERS);
                    if (coordinate.row, coordinate.column) >= (anchor.row, anchor.column) {
                        Coordinate::new(coordinate.row, to)
                    } else {
                        Coordinate::new(coordinate.row, from)
                    }
                }
                None => coordinate,
            }
        } else {
            coordinate
        };
        if let Some(selector) = &mut self.selector {
            selector.extend(target);
        }
    }

    /// Fix the selection endpoints.
    pub fn complete_selection(&mut self) {
        if let Some(selector) = &mut self.selector {
            selector.complete();
        }
    }

    /// Drop the selection entirely.
    pub fn clear_selection(&mut self) {
        self.selector = None;
    }

    /// A selection exists and has a region (not `Waiting`).
    #[must_use]
    pub fn is_selection_available(&self) -> bool {
        self.selector
            .as_ref()
            .is_some_and(|selector| selector.state() != SelectorState::Waiting)
    }

    /// The selected spans, clipped to the grid.
    #[must_use]
    pub fn selection_ranges(&self) -> Vec<SelectionRange> {
        let Some(selector) = &self.selector else {
            return Vec::new();
        };
        let total = self.active_buffer().total_line_count();
        selector
            .ranges(self.size.columns)
            .into_iter()
            .filter(|range| range.line <= total)
            .collect()
    }

    /// The selected text, lines joined with newlines.
    #[must_use]
    pub fn selected_text(&self) -> String {
        let mut lines = Vec::new();
        for range in self.selection_ranges() {
            let Some(line) = self.active_buffer().absolute_line(range.line) else {
                continue;
            };
            let mut text = String::new();
            for column in range.from_column..=range.to_column.min(line.cells().len()) {
                let cell = line.cell(column);
                if cell.is_continuation() {
                    continue;
                }
                if cell.is_empty() {
                    text.push(' ');
                } else {
                    text.push_str(cell.as_str());
                }
            }
            lines.push(text.trim_end().to_string());
        }
        lines.join("\n")
    }

    /// Walk the selected cells.
    pub fn render_selection<F>(&self, mut renderer: F)
    where
        F: FnMut(Coordinate, &Cell),
    {
        for range in self.selection_ranges() {
            if let Some(line) = self.active_buffer().absolute_line(range.line) {
                for column in range.from_column..=range.to_column.min(line.cells().len()) {
                    renderer(Coordinate::new(range.line, column), line.cell(column));
                }
            }
        }
    }

    /// Direct access to the selector, if one is set.
    #[must_use]
    pub fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    fn demote_selection(&mut self) {
        if let Some(selector) = &mut self.selector {
            selector.clear();
        }
    }

    fn demote_selection_at_cursor(&mut self) {
        let row = self.active_buffer().real_cursor_position().row;
        self.demote_selection_rows(row, row);
    }

    fn demote_selection_in_margin(&mut self) {
        let margin = self.active_buffer().margin().vertical;
        self.demote_selection_rows(margin.from, margin.to);
    }

    fn demote_selection_rows(&mut self, from: usize, to: usize) {
        let base = self.active_buffer().history_line_count();
        if let Some(selector) = &mut self.selector {
            if selector.intersects_rows(base + from, base + to) {
                selector.clear();
            }
        }
    }
}

/// DECSCUSR code for a cursor style pair.
fn cursor_style_code(style: (CursorDisplay, CursorShape)) -> u16 {
    match style {
        (CursorDisplay::Blink, CursorShape::Block) => 1,
        (CursorDisplay::Steady, CursorShape::Block) => 2,
        (CursorDisplay::Blink, CursorShape::Underscore) => 3,
        (CursorDisplay::Steady, CursorShape::Underscore) => 4,
        (CursorDisplay::Blink, CursorShape::Bar) => 5,
        (CursorDisplay::Steady, CursorShape::Bar) => 6,
    }
}
