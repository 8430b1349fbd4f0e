//! The typed command algebra.
//!
//! Every recognized escape sequence maps to exactly one [`Command`] variant;
//! the screen dispatches over the closed set, so adding a command means
//! extending the enum, the builder mapping, and one dispatch arm — the
//! compiler enforces completeness.

use crate::cell::GraphicsRendition;
use crate::charset::{Charset, CharsetSlot};
use crate::color::{Color, DynamicColorName, RgbColor};

/// ANSI and DEC private modes the engine recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    // ANSI modes (CSI h / CSI l)
    /// IRM (4): insert rather than replace on print.
    Insert,
    /// LNM (20): linefeed implies carriage return.
    Newline,

    // DEC private modes (CSI ? h / CSI ? l)
    /// DECCKM (?1): application cursor keys.
    ApplicationCursorKeys,
    /// DECANM (?2): VT52/ANSI switching; tracked, not acted on.
    DesignateCharsetUsAscii,
    /// DECCOLM (?3): 132-column mode.
    Columns132,
    /// DECSCLM (?4): smooth scroll; tracked only.
    SmoothScroll,
    /// DECSCNM (?5): reverse video for the whole screen.
    ReverseVideo,
    /// DECOM (?6): cursor addressing is margin-relative.
    Origin,
    /// DECAWM (?7): auto-wrap at the right margin.
    AutoWrap,
    /// DECARM (?8): keyboard auto-repeat; tracked only.
    AutoRepeat,
    /// X10 mouse reporting (?9).
    MouseX10,
    /// DECTCEM (?25): cursor visible.
    VisibleCursor,
    /// DECLRMM (?69): left/right margin mode.
    LeftRightMargin,
    /// VT200 mouse reporting (?1000).
    MouseNormal,
    /// Button-event mouse reporting (?1002).
    MouseButtonEvent,
    /// Any-event mouse reporting (?1003).
    MouseAnyEvent,
    /// Focus in/out reporting (?1004).
    FocusTracking,
    /// UTF-8 extended mouse coordinates (?1005).
    MouseExtended,
    /// SGR mouse coordinates (?1006).
    MouseSgr,
    /// Alternate-scroll wheel mode (?1007).
    MouseAlternateScroll,
    /// URXVT mouse coordinates (?1015).
    MouseUrxvt,
    /// Plain alternate screen (?47).
    UseAlternateScreen,
    /// Alternate screen, cleared when left (?1047).
    UseAlternateScreenClearing,
    /// Save cursor, switch, clear; restore on leave (?1049).
    UseAlternateScreenSaveCursor,
    /// Bracketed paste (?2004).
    BracketedPaste,
}

impl Mode {
    /// Map an ANSI mode number (CSI h/l without `?`).
    #[must_use]
    pub const fn from_ansi(number: u16) -> Option<Self> {
        match number {
            4 => Some(Self::Insert),
            20 => Some(Self::Newline),
            _ => None,
        }
    }

    /// Map a DEC private mode number (CSI ? h/l).
    #[must_use]
    pub const fn from_dec(number: u16) -> Option<Self> {
        match number {
            1 => Some(Self::ApplicationCursorKeys),
            2 => Some(Self::DesignateCharsetUsAscii),
            3 => Some(Self::Columns132),
            4 => Some(Self::SmoothScroll),
            5 => Some(Self::ReverseVideo),
            6 => Some(Self::Origin),
            7 => Some(Self::AutoWrap),
            8 => Some(Self::AutoRepeat),
            9 => Some(Self::MouseX10),
            25 => Some(Self::VisibleCursor),
            47 => Some(Self::UseAlternateScreen),
            69 => Some(Self::LeftRightMargin),
            1000 => Some(Self::MouseNormal),
            1002 => Some(Self::MouseButtonEvent),
            1003 => Some(Self::MouseAnyEvent),
            1004 => Some(Self::FocusTracking),
            1005 => Some(Self::MouseExtended),
            1006 => Some(Self::MouseSgr),
            1007 => Some(Self::MouseAlternateScroll),
            1015 => Some(Self::MouseUrxvt),
            1047 => Some(Self::UseAlternateScreenClearing),
            1049 => Some(Self::UseAlternateScreenSaveCursor),
            2004 => Some(Self::BracketedPaste),
            _ => None,
        }
    }
}

/// Mouse reporting protocols selectable through DEC private modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseProtocol {
    /// Press-only reporting (mode 9).
    X10,
    /// Press/release reporting (mode 1000).
    Normal,
    /// Press/release plus motion-while-pressed (mode 1002).
    ButtonEvent,
    /// All motion (mode 1003).
    AnyEvent,
}

/// Coordinate encodings for mouse reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseTransport {
    /// Single-byte X10 encoding.
    Standard,
    /// UTF-8 extended coordinates (mode 1005).
    Extended,
    /// SGR encoding (mode 1006).
    Sgr,
    /// URXVT decimal encoding (mode 1015).
    Urxvt,
}

/// What the mouse wheel does when no mouse protocol is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseWheelMode {
    /// Scroll the viewport.
    Default,
    /// Send cursor up/down key sequences.
    NormalCursorKeys,
    /// Send application cursor-key sequences.
    ApplicationCursorKeys,
    /// Alternate-scroll (mode 1007): arrow keys on the alternate screen.
    ScrollEvents,
}

/// Cursor blink selection from DECSCUSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorDisplay {
    Blink,
    Steady,
}

/// Cursor shape from DECSCUSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Block,
    Underscore,
    Bar,
}

/// Terminal generation used for DA1/DA2 replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VTType {
    VT100,
    VT102,
    VT220,
    VT320,
    VT420,
    VT520,
    #[default]
    VT525,
}

impl VTType {
    /// The DA1 operating-level identifier.
    #[must_use]
    pub const fn id(self) -> u16 {
        match self {
            Self::VT100 => 1,
            Self::VT102 => 6,
            Self::VT220 => 62,
            Self::VT320 => 63,
            Self::VT420 => 64,
            Self::VT520 | Self::VT525 => 65,
        }
    }
}

/// TBC parameter: which tab stops to clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabClear {
    /// TBC 0: the stop under the cursor.
    UnderCursor,
    /// TBC 3: every stop.
    All,
}

/// Unit of an xterm window resize request (CSI t).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeUnit {
    Pixels,
    Characters,
}

/// A high-level operation produced by the command builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Ring the bell.
    Bell,
    /// Move to the next line, scrolling inside the margin at the bottom.
    Linefeed,
    /// Move one column left, stopping at the margin.
    Backspace,
    /// RIS: reset everything.
    FullReset,
    /// DECSTR: reset modes and pen, keep contents.
    SoftTerminalReset,

    /// Print one scalar value at the cursor.
    AppendChar(char),

    /// CUP/HVP: absolute position, origin-mode aware.
    MoveCursorTo { row: usize, column: usize },
    /// CUU.
    MoveCursorUp(usize),
    /// CUD.
    MoveCursorDown(usize),
    /// CUF.
    MoveCursorForward(usize),
    /// CUB.
    MoveCursorBackward(usize),
    /// CNL: down N, column 1.
    CursorNextLine(usize),
    /// CPL: up N, column 1.
    CursorPreviousLine(usize),
    /// CHA/HPA.
    MoveCursorToColumn(usize),
    /// VPA.
    MoveCursorToLine(usize),
    /// HPR: relative column move.
    HorizontalPositionRelative(usize),
    /// CR.
    MoveCursorToBeginOfLine,
    /// HT: one tab stop forward.
    MoveCursorToNextTab,
    /// CHT: N tab stops forward.
    CursorForwardTab(usize),
    /// CBT: N tab stops backward.
    CursorBackwardTab(usize),
    /// HTS.
    HorizontalTabSet,
    /// TBC.
    HorizontalTabClear(TabClear),

    /// DECSC / SCOSC.
    SaveCursor,
    /// DECRC / SCORC.
    RestoreCursor,
    /// IND.
    Index,
    /// RI.
    ReverseIndex,
    /// DECBI.
    BackIndex,
    /// DECFI.
    ForwardIndex,

    /// ED 0.
    ClearToEndOfScreen,
    /// ED 1.
    ClearToBeginOfScreen,
    /// ED 2.
    ClearScreen,
    /// ED 3.
    ClearScrollbackBuffer,
    /// EL 0.
    ClearToEndOfLine,
    /// EL 1.
    ClearToBeginOfLine,
    /// EL 2.
    ClearLine,
    /// ECH.
    EraseCharacters(usize),

    /// SU.
    ScrollUp(usize),
    /// SD.
    ScrollDown(usize),
    /// ICH.
    InsertCharacters(usize),
    /// IL.
    InsertLines(usize),
    /// DECIC.
    InsertColumns(usize),
    /// DCH.
    DeleteCharacters(usize),
    /// DL.
    DeleteLines(usize),
    /// DECDC.
    DeleteColumns(usize),

    /// SGR 30-38, 90-97.
    SetForegroundColor(Color),
    /// SGR 40-48, 100-107.
    SetBackgroundColor(Color),
    /// SGR 58/59.
    SetUnderlineColor(Color),
    /// Any non-color SGR parameter.
    SetGraphicsRendition(GraphicsRendition),

    /// SM/RM (ANSI) and DECSET/DECRST.
    SetMode { mode: Mode, enable: bool },
    /// DECRQM; `ansi` distinguishes the two request forms. The raw number
    /// is kept so unknown modes can be answered with "not recognized".
    RequestMode { ansi: bool, number: u16 },
    /// DECSTBM. Zero means "default edge".
    SetTopBottomMargin { top: usize, bottom: usize },
    /// DECSLRM (only honored while DECLRMM is set).
    SetLeftRightMargin { left: usize, right: usize },
    /// DECALN.
    ScreenAlignmentPattern,
    /// Mouse protocol selection via DECSET, routed to the embedder.
    SendMouseEvents { protocol: MouseProtocol, enable: bool },
    /// DECKPAM/DECKPNM.
    ApplicationKeypadMode(bool),
    /// ESC ( F etc.
    DesignateCharset { slot: CharsetSlot, charset: Charset },
    /// SS2/SS3.
    SingleShiftSelect(CharsetSlot),
    /// SI/SO (locking shifts for GL).
    LockingShift(CharsetSlot),
    /// DECSCUSR.
    SetCursorStyle { display: CursorDisplay, shape: CursorShape },

    /// DSR 5.
    DeviceStatusReport,
    /// DSR 6 (CPR).
    ReportCursorPosition,
    /// DECXCPR (CSI ? 6 n).
    ReportExtendedCursorPosition,
    /// DA1.
    SendDeviceAttributes,
    /// DA2.
    SendTerminalId,
    /// DECRQSS: the requested setting name (DCS `$ q` payload).
    RequestStatusString(String),
    /// DECRQTSR 2: tab stop report.
    RequestTabStops,

    /// OSC 8.
    Hyperlink { id: String, uri: String },
    /// OSC 777.
    Notify { title: String, body: String },
    /// OSC 0/2.
    ChangeWindowTitle(String),
    /// OSC 0/1.
    ChangeIconTitle(String),
    /// XTWINOPS 22.
    SaveWindowTitle,
    /// XTWINOPS 23.
    RestoreWindowTitle,
    /// XTWINOPS 4/8.
    ResizeWindow { width: usize, height: usize, unit: ResizeUnit },
    /// Set a navigation mark on the current line.
    SetMark,

    /// OSC 10/11/12/17/19 with a `?` payload.
    RequestDynamicColor(DynamicColorName),
    /// OSC 110..119.
    ResetDynamicColor(DynamicColorName),
    /// OSC 10/11/12/17/19 with a color payload.
    SetDynamicColor { name: DynamicColorName, color: RgbColor },

    /// Anything recognized by the parser but not by the builder. Applied as
    /// a no-op; the description feeds trace logging.
    Ignored(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dec_mode_numbers() {
        assert_eq!(Mode::from_dec(7), Some(Mode::AutoWrap));
        assert_eq!(Mode::from_dec(1049), Some(Mode::UseAlternateScreenSaveCursor));
        assert_eq!(Mode::from_dec(2004), Some(Mode::BracketedPaste));
        assert_eq!(Mode::from_dec(12345), None);
    }

    #[test]
    fn ansi_mode_numbers() {
        assert_eq!(Mode::from_ansi(4), Some(Mode::Insert));
        assert_eq!(Mode::from_ansi(20), Some(Mode::Newline));
        assert_eq!(Mode::from_ansi(6), None);
    }

    #[test]
    fn terminal_ids() {
        assert_eq!(VTType::VT100.id(), 1);
        assert_eq!(VTType::VT525.id(), 65);
        assert_eq!(VTType::default(), VTType::VT525);
    }
}
