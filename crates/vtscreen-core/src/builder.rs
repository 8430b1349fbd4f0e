//! Translation from parser events to the typed command algebra.
//!
//! The builder implements [`ParserListener`], classifies every event into
//! exactly one [`Command`] (or several, for compound sequences like SGR),
//! clamps parameters into their valid ranges, and turns anything it does not
//! recognize into [`Command::Ignored`] — never a failure.

use log::trace;

use crate::cell::GraphicsRendition;
use crate::charset::{Charset, CharsetSlot};
use crate::color::{Color, DynamicColorName, RgbColor};
use crate::commands::{
    Command, CursorDisplay, CursorShape, Mode, MouseProtocol, ResizeUnit, TabClear,
};
use crate::parser::{ControlStringKind, Params, ParserListener};

/// Accumulates commands produced from one batch of parser events.
#[derive(Debug, Default)]
pub struct CommandBuilder {
    commands: Vec<Command>,
}

impl CommandBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all commands accumulated so far.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Number of pending commands.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    fn emit(&mut self, command: Command) {
        if let Command::Ignored(what) = &command {
            trace!("ignoring unsupported sequence: {what}");
        }
        self.commands.push(command);
    }

    // ------------------------------------------------------------------
    // CSI classification
    // ------------------------------------------------------------------

    fn csi_plain(&mut self, params: &Params, final_byte: u8) {
        let count = count_param(params, 0);
        match final_byte {
            b'@' => self.emit(Command::InsertCharacters(count)),
            b'A' => self.emit(Command::MoveCursorUp(count)),
            b'B' | b'e' => self.emit(Command::MoveCursorDown(count)),
            b'C' => self.emit(Command::MoveCursorForward(count)),
            b'D' => self.emit(Command::MoveCursorBackward(count)),
            b'E' => self.emit(Command::CursorNextLine(count)),
            b'F' => self.emit(Command::CursorPreviousLine(count)),
            b'G' | b'`' => self.emit(Command::MoveCursorToColumn(count)),
            b'H' | b'f' => self.emit(Command::MoveCursorTo {
                row: count_param(params, 0),
                column: count_param(params, 1),
            }),
            b'I' => self.emit(Command::CursorForwardTab(count)),
            b'J' => match params.get(0) {
                0 => self.emit(Command::ClearToEndOfScreen),
                1 => self.emit(Command::ClearToBeginOfScreen),
                2 => self.emit(Command::ClearScreen),
                3 => self.emit(Command::ClearScrollbackBuffer),
                _ => self.emit(Command::Ignored("ED with unknown selector")),
            },
            b'K' => match params.get(0) {
                0 => self.emit(Command::ClearToEndOfLine),
                1 => self.emit(Command::ClearToBeginOfLine),
                2 => self.emit(Command::ClearLine),
                _ => self.emit(Command::Ignored("EL with unknown selector")),
            },
            b'L' => self.emit(Command::InsertLines(count)),
            b'M' => self.emit(Command::DeleteLines(count)),
            b'P' => self.emit(Command::DeleteCharacters(count)),
            b'S' => self.emit(Command::ScrollUp(count)),
            b'T' => {
                if params.len() > 1 {
                    self.emit(Command::Ignored("mouse highlight tracking"));
                } else {
                    self.emit(Command::ScrollDown(count));
                }
            }
            b'X' => self.emit(Command::EraseCharacters(count)),
            b'Z' => self.emit(Command::CursorBackwardTab(count)),
            b'a' => self.emit(Command::HorizontalPositionRelative(count)),
            b'c' => self.emit(Command::SendDeviceAttributes),
            b'd' => self.emit(Command::MoveCursorToLine(count)),
            b'g' => match params.get(0) {
                0 => self.emit(Command::HorizontalTabClear(TabClear::UnderCursor)),
                3 => self.emit(Command::HorizontalTabClear(TabClear::All)),
                _ => self.emit(Command::Ignored("TBC with unknown selector")),
            },
            b'h' => self.ansi_modes(params, true),
            b'l' => self.ansi_modes(params, false),
            b'm' => self.select_graphics_rendition(params),
            b'n' => match params.get(0) {
                5 => self.emit(Command::DeviceStatusReport),
                6 => self.emit(Command::ReportCursorPosition),
                _ => self.emit(Command::Ignored("DSR with unknown selector")),
            },
            b'r' => self.emit(Command::SetTopBottomMargin {
                top: params.get(0) as usize,
                bottom: params.get(1) as usize,
            }),
            b's' => {
                if params.is_empty() {
                    self.emit(Command::SaveCursor);
                } else {
                    self.emit(Command::SetLeftRightMargin {
                        left: params.get(0) as usize,
                        right: params.get(1) as usize,
                    });
                }
            }
            b't' => self.window_ops(params),
            b'u' => self.emit(Command::RestoreCursor),
            _ => self.emit(Command::Ignored("unknown CSI final byte")),
        }
    }

    fn csi_dec_private(&mut self, params: &Params, final_byte: u8) {
        match final_byte {
            b'h' => self.dec_modes(params, true),
            b'l' => self.dec_modes(params, false),
            b'n' => match params.get(0) {
                6 => self.emit(Command::ReportExtendedCursorPosition),
                _ => self.emit(Command::Ignored("private DSR selector")),
            },
            _ => self.emit(Command::Ignored("unknown private CSI")),
        }
    }

    fn csi_intermediate(&mut self, params: &Params, intermediates: &[u8], final_byte: u8) {
        let count = count_param(params, 0);
        match (intermediates, final_byte) {
            ([b' '], b'q') => self.cursor_style(params.get(0)),
            ([b'!'], b'p') => self.emit(Command::SoftTerminalReset),
            ([b'$'], b'w') => {
                if params.get(0) == 2 {
                    self.emit(Command::RequestTabStops);
                } else {
                    self.emit(Command::Ignored("DECRQTSR selector"));
                }
            }
            ([b'\''], b'}') => self.emit(Command::InsertColumns(count)),
            ([b'\''], b'~') => self.emit(Command::DeleteColumns(count)),
            _ => self.emit(Command::Ignored("unknown CSI intermediate")),
        }
    }

    fn cursor_style(&mut self, selector: u16) {
        let style = match selector {
            0 | 1 => Some((CursorDisplay::Blink, CursorShape::Block)),
            2 => Some((CursorDisplay::Steady, CursorShape::Block)),
            3 => Some((CursorDisplay::Blink, CursorShape::Underscore)),
            4 => Some((CursorDisplay::Steady, CursorShape::Underscore)),
            5 => Some((CursorDisplay::Blink, CursorShape::Bar)),
            6 => Some((CursorDisplay::Steady, CursorShape::Bar)),
            _ => None,
        };
        match style {
            Some((display, shape)) => self.emit(Command::SetCursorStyle { display, shape }),
            None => self.emit(Command::Ignored("DECSCUSR selector")),
        }
    }

    fn ansi_modes(&mut self, params: &Params, enable: bool) {
        for group in params.iter() {
            let number = group.first().copied().unwrap_or(0);
            match Mode::from_ansi(number) {
                Some(mode) => self.emit(Command::SetMode { mode, enable }),
                None => self.emit(Command::Ignored("unknown ANSI mode")),
            }
        }
    }

    fn dec_modes(&mut self, params: &Params, enable: bool) {
        for group in params.iter() {
            let number = group.first().copied().unwrap_or(0);
            // Mouse protocol selection doubles as a mode; the embedder gets
            // a dedicated callback for it.
            let protocol = match number {
                9 => Some(MouseProtocol::X10),
                1000 => Some(MouseProtocol::Normal),
                1002 => Some(MouseProtocol::ButtonEvent),
                1003 => Some(MouseProtocol::AnyEvent),
                _ => None,
            };
            if let Some(protocol) = protocol {
                self.emit(Command::SendMouseEvents { protocol, enable });
                continue;
            }
            // 1048 is DECSC/DECRC dressed up as a mode.
            if number == 1048 {
                self.emit(if enable {
                    Command::SaveCursor
                } else {
                    Command::RestoreCursor
                });
                continue;
            }
            match Mode::from_dec(number) {
                Some(mode) => self.emit(Command::SetMode { mode, enable }),
                None => self.emit(Command::Ignored("unknown DEC mode")),
            }
        }
    }

    fn window_ops(&mut self, params: &Params) {
        match params.get(0) {
            4 => self.emit(Command::ResizeWindow {
                width: params.get(2) as usize,
                height: params.get(1) as usize,
                unit: ResizeUnit::Pixels,
            }),
            8 => self.emit(Command::ResizeWindow {
                width: params.get(2) as usize,
                height: params.get(1) as usize,
                unit: ResizeUnit::Characters,
            }),
            22 => self.emit(Command::SaveWindowTitle),
            23 => self.emit(Command::RestoreWindowTitle),
            _ => self.emit(Command::Ignored("window operation")),
        }
    }

    // ------------------------------------------------------------------
    // SGR
    // ------------------------------------------------------------------

    fn select_graphics_rendition(&mut self, params: &Params) {
        if params.is_empty() {
            self.emit(Command::SetGraphicsRendition(GraphicsRendition::Reset));
            return;
        }

        let groups: Vec<&[u16]> = params.iter().collect();
        let mut i = 0;
        while i < groups.len() {
            let group = groups[i];
            let value = group.first().copied().unwrap_or(0);
            match value {
                0 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::Reset)),
                1 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::Bold)),
                2 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::Faint)),
                3 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::Italic)),
                4 => self.underline_style(group),
                5 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::Blinking)),
                6 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::RapidBlinking)),
                7 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::Inverse)),
                8 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::Hidden)),
                9 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::CrossedOut)),
                21 => self.emit(Command::SetGraphicsRendition(
                    GraphicsRendition::DoublyUnderlined,
                )),
                22 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::Normal)),
                23 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::NoItalic)),
                24 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::NoUnderline)),
                25 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::NoBlinking)),
                27 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::NoInverse)),
                28 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::NoHidden)),
                29 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::NoCrossedOut)),
                30..=37 => self.emit(Command::SetForegroundColor(Color::Indexed(value as u8 - 30))),
                38 => {
                    let color = extended_color(&groups, &mut i);
                    match color {
                        Some(color) => self.emit(Command::SetForegroundColor(color)),
                        None => self.emit(Command::Ignored("malformed SGR 38")),
                    }
                }
                39 => self.emit(Command::SetForegroundColor(Color::Default)),
                40..=47 => self.emit(Command::SetBackgroundColor(Color::Indexed(value as u8 - 40))),
                48 => {
                    let color = extended_color(&groups, &mut i);
                    match color {
                        Some(color) => self.emit(Command::SetBackgroundColor(color)),
                        None => self.emit(Command::Ignored("malformed SGR 48")),
                    }
                }
                49 => self.emit(Command::SetBackgroundColor(Color::Default)),
                53 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::Overline)),
                55 => self.emit(Command::SetGraphicsRendition(GraphicsRendition::NoOverline)),
                58 => {
                    let color = extended_color(&groups, &mut i);
                    match color {
                        Some(color) => self.emit(Command::SetUnderlineColor(color)),
                        None => self.emit(Command::Ignored("malformed SGR 58")),
                    }
                }
                59 => self.emit(Command::SetUnderlineColor(Color::Default)),
                90..=97 => self.emit(Command::SetForegroundColor(Color::Indexed(
                    value as u8 - 90 + 8,
                ))),
                100..=107 => self.emit(Command::SetBackgroundColor(Color::Indexed(
                    value as u8 - 100 + 8,
                ))),
                _ => self.emit(Command::Ignored("unknown SGR parameter")),
            }
            i += 1;
        }
    }

    fn underline_style(&mut self, group: &[u16]) {
        let rendition = match group.get(1) {
            None | Some(1) => GraphicsRendition::Underline,
            Some(0) => GraphicsRendition::NoUnderline,
            Some(2) => GraphicsRendition::DoublyUnderlined,
            Some(3) => GraphicsRendition::CurlyUnderlined,
            Some(4) => GraphicsRendition::DottedUnderline,
            Some(5) => GraphicsRendition::DashedUnderline,
            Some(_) => {
                self.emit(Command::Ignored("SGR 4 substyle"));
                return;
            }
        };
        self.emit(Command::SetGraphicsRendition(rendition));
    }

    // ------------------------------------------------------------------
    // OSC
    // ------------------------------------------------------------------

    fn osc(&mut self, data: &[u8]) {
        let text = String::from_utf8_lossy(data);
        let (code, payload) = match text.split_once(';') {
            Some((code, payload)) => (code, payload),
            None => (text.as_ref(), ""),
        };
        let Ok(code) = code.parse::<u16>() else {
            self.emit(Command::Ignored("OSC without numeric code"));
            return;
        };

        match code {
            0 => {
                self.emit(Command::ChangeIconTitle(payload.to_string()));
                self.emit(Command::ChangeWindowTitle(payload.to_string()));
            }
            1 => self.emit(Command::ChangeIconTitle(payload.to_string())),
            2 => self.emit(Command::ChangeWindowTitle(payload.to_string())),
            8 => self.hyperlink(payload),
            10 | 11 | 12 | 17 | 19 => {
                // from_code cannot fail for the numbers matched here
                let Some(name) = DynamicColorName::from_code(code) else {
                    return;
                };
                if payload == "?" {
                    self.emit(Command::RequestDynamicColor(name));
                } else {
                    match RgbColor::parse(payload) {
                        Some(color) => self.emit(Command::SetDynamicColor { name, color }),
                        None => self.emit(Command::Ignored("unparsable dynamic color")),
                    }
                }
            }
            110 | 111 | 112 | 117 | 119 => {
                if let Some(name) = DynamicColorName::from_reset_code(code) {
                    self.emit(Command::ResetDynamicColor(name));
                }
            }
            777 => {
                // 777;notify;title;body
                let mut parts = payload.splitn(3, ';');
                if parts.next() == Some("notify") {
                    let title = parts.next().unwrap_or("").to_string();
                    let body = parts.next().unwrap_or("").to_string();
                    self.emit(Command::Notify { title, body });
                } else {
                    self.emit(Command::Ignored("OSC 777 selector"));
                }
            }
            1337 => {
                if payload == "SetMark" {
                    self.emit(Command::SetMark);
                } else {
                    self.emit(Command::Ignored("OSC 1337 selector"));
                }
            }
            _ => self.emit(Command::Ignored("unknown OSC code")),
        }
    }

    fn hyperlink(&mut self, payload: &str) {
        // OSC 8 ; params ; uri — params are key=value pairs separated by ':'.
        let Some((params, uri)) = payload.split_once(';') else {
            self.emit(Command::Ignored("malformed OSC 8"));
            return;
        };
        let id = params
            .split(':')
            .find_map(|kv| kv.strip_prefix("id="))
            .unwrap_or("")
            .to_string();
        self.emit(Command::Hyperlink {
            id,
            uri: uri.to_string(),
        });
    }
}

/// Count-style parameter: defaults to 1, zero means 1.
fn count_param(params: &Params, index: usize) -> usize {
    let value = params.get(index);
    if value == 0 {
        1
    } else {
        value as usize
    }
}

/// Parse SGR 38/48/58 extended color, consuming legacy `;`-separated
/// arguments when the subparameter form is not used.
fn extended_color(groups: &[&[u16]], i: &mut usize) -> Option<Color> {
    let group = groups[*i];
    if group.len() > 1 {
        // Subparameter form: 38:5:idx or 38:2[:colorspace]:r:g:b
        match group.get(1)? {
            5 => Some(Color::Indexed(*group.get(2)? as u8)),
            2 => {
                let rgb: &[u16] = match group.len() {
                    5 => &group[2..5],
                    6.. => &group[3..6],
                    _ => return None,
                };
                Some(Color::Rgb(RgbColor::new(
                    rgb[0].min(255) as u8,
                    rgb[1].min(255) as u8,
                    rgb[2].min(255) as u8,
                )))
            }
            _ => None,
        }
    } else {
        // Legacy form: 38;5;idx or 38;2;r;g;b
        let selector = groups.get(*i + 1)?.first().copied()?;
        match selector {
            5 => {
                let index = groups.get(*i + 2)?.first().copied()?;
                *i += 2;
                Some(Color::Indexed(index.min(255) as u8))
            }
            2 => {
                let r = groups.get(*i + 2)?.first().copied()?;
                let g = groups.get(*i + 3)?.first().copied()?;
                let b = groups.get(*i + 4)?.first().copied()?;
                *i += 4;
                Some(Color::Rgb(RgbColor::new(
                    r.min(255) as u8,
                    g.min(255) as u8,
                    b.min(255) as u8,
                )))
            }
            _ => None,
        }
    }
}

impl ParserListener for CommandBuilder {
    fn print(&mut self, ch: char) {
        self.emit(Command::AppendChar(ch));
    }

    fn execute(&mut self, control: u8) {
        match control {
            0x07 => self.emit(Command::Bell),
            0x08 => self.emit(Command::Backspace),
            0x09 => self.emit(Command::MoveCursorToNextTab),
            0x0A..=0x0C => self.emit(Command::Linefeed),
            0x0D => self.emit(Command::MoveCursorToBeginOfLine),
            0x0E => self.emit(Command::LockingShift(CharsetSlot::G1)),
            0x0F => self.emit(Command::LockingShift(CharsetSlot::G0)),
            0x84 => self.emit(Command::Index),
            0x85 => self.emit(Command::CursorNextLine(1)),
            0x88 => self.emit(Command::HorizontalTabSet),
            0x8D => self.emit(Command::ReverseIndex),
            0x8E => self.emit(Command::SingleShiftSelect(CharsetSlot::G2)),
            0x8F => self.emit(Command::SingleShiftSelect(CharsetSlot::G3)),
            _ => self.emit(Command::Ignored("control code")),
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], final_byte: u8) {
        match (intermediates, final_byte) {
            ([], b'6') => self.emit(Command::BackIndex),
            ([], b'7') => self.emit(Command::SaveCursor),
            ([], b'8') => self.emit(Command::RestoreCursor),
            ([], b'9') => self.emit(Command::ForwardIndex),
            ([], b'=') => self.emit(Command::ApplicationKeypadMode(true)),
            ([], b'>') => self.emit(Command::ApplicationKeypadMode(false)),
            ([], b'D') => self.emit(Command::Index),
            ([], b'E') => self.emit(Command::CursorNextLine(1)),
            ([], b'H') => self.emit(Command::HorizontalTabSet),
            ([], b'M') => self.emit(Command::ReverseIndex),
            ([], b'N') => self.emit(Command::SingleShiftSelect(CharsetSlot::G2)),
            ([], b'O') => self.emit(Command::SingleShiftSelect(CharsetSlot::G3)),
            ([], b'Z') => self.emit(Command::SendDeviceAttributes),
            ([], b'c') => self.emit(Command::FullReset),
            ([], b'\\') => {} // stray string terminator
            ([b'#'], b'8') => self.emit(Command::ScreenAlignmentPattern),
            ([slot @ (b'(' | b')' | b'*' | b'+')], final_byte) => {
                let slot = match slot {
                    b'(' => CharsetSlot::G0,
                    b')' => CharsetSlot::G1,
                    b'*' => CharsetSlot::G2,
                    _ => CharsetSlot::G3,
                };
                match Charset::from_final_byte(final_byte) {
                    Some(charset) => self.emit(Command::DesignateCharset { slot, charset }),
                    None => self.emit(Command::Ignored("unknown charset designation")),
                }
            }
            _ => self.emit(Command::Ignored("unknown ESC sequence")),
        }
    }

    fn csi_dispatch(
        &mut self,
        prefix: Option<u8>,
        params: &Params,
        intermediates: &[u8],
        final_byte: u8,
    ) {
        match (prefix, intermediates) {
            (None, []) => self.csi_plain(params, final_byte),
            (Some(b'?'), []) => self.csi_dec_private(params, final_byte),
            (Some(b'?'), [b'$']) if final_byte == b'p' => self.emit(Command::RequestMode {
                ansi: false,
                number: params.get(0),
            }),
            (Some(b'>'), []) if final_byte == b'c' => self.emit(Command::SendTerminalId),
            (None, [b'$']) if final_byte == b'p' => self.emit(Command::RequestMode {
                ansi: true,
                number: params.get(0),
            }),
            (None, _) => self.csi_intermediate(params, intermediates, final_byte),
            _ => self.emit(Command::Ignored("unknown CSI prefix")),
        }
    }

    fn osc_dispatch(&mut self, data: &[u8]) {
        self.osc(data);
    }

    fn dcs_dispatch(
        &mut self,
        _prefix: Option<u8>,
        _params: &Params,
        intermediates: &[u8],
        final_byte: u8,
        data: &[u8],
    ) {
        match (intermediates, final_byte) {
            ([b'$'], b'q') => self.emit(Command::RequestStatusString(
                String::from_utf8_lossy(data).into_owned(),
            )),
            _ => self.emit(Command::Ignored("unknown DCS sequence")),
        }
    }

    fn control_string(&mut self, kind: ControlStringKind, _data: &[u8]) {
        self.emit(Command::Ignored(match kind {
            ControlStringKind::Sos => "SOS string",
            ControlStringKind::Pm => "PM string",
            ControlStringKind::Apc => "APC string",
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn build(bytes: &[u8]) -> Vec<Command> {
        let mut parser = Parser::new();
        let mut builder = CommandBuilder::new();
        parser.advance(&mut builder, bytes);
        builder.take_commands()
    }

    #[test]
    fn cursor_movement() {
        assert_eq!(build(b"\x1b[A"), vec![Command::MoveCursorUp(1)]);
        assert_eq!(build(b"\x1b[3B"), vec![Command::MoveCursorDown(3)]);
        assert_eq!(build(b"\x1b[0C"), vec![Command::MoveCursorForward(1)]);
        assert_eq!(
            build(b"\x1b[5;10H"),
            vec![Command::MoveCursorTo { row: 5, column: 10 }]
        );
        assert_eq!(
            build(b"\x1b[H"),
            vec![Command::MoveCursorTo { row: 1, column: 1 }]
        );
    }

    #[test]
    fn erase_commands() {
        assert_eq!(build(b"\x1b[J"), vec![Command::ClearToEndOfScreen]);
        assert_eq!(build(b"\x1b[2J"), vec![Command::ClearScreen]);
        assert_eq!(build(b"\x1b[3J"), vec![Command::ClearScrollbackBuffer]);
        assert_eq!(build(b"\x1b[1K"), vec![Command::ClearToBeginOfLine]);
        assert_eq!(build(b"\x1b[4X"), vec![Command::EraseCharacters(4)]);
    }

    #[test]
    fn sgr_colors() {
        assert_eq!(
            build(b"\x1b[31m"),
            vec![Command::SetForegroundColor(Color::Indexed(1))]
        );
        assert_eq!(
            build(b"\x1b[48;5;100m"),
            vec![Command::SetBackgroundColor(Color::Indexed(100))]
        );
        assert_eq!(
            build(b"\x1b[38;2;10;20;30m"),
            vec![Command::SetForegroundColor(Color::Rgb(RgbColor::new(
                10, 20, 30
            )))]
        );
        assert_eq!(
            build(b"\x1b[38:2:1:10:20:30m"),
            vec![Command::SetForegroundColor(Color::Rgb(RgbColor::new(
                10, 20, 30
            )))]
        );
        assert_eq!(
            build(b"\x1b[95m"),
            vec![Command::SetForegroundColor(Color::Indexed(13))]
        );
    }

    #[test]
    fn sgr_mixed_sequence() {
        assert_eq!(
            build(b"\x1b[1;31;4m"),
            vec![
                Command::SetGraphicsRendition(GraphicsRendition::Bold),
                Command::SetForegroundColor(Color::Indexed(1)),
                Command::SetGraphicsRendition(GraphicsRendition::Underline),
            ]
        );
    }

    #[test]
    fn sgr_curly_underline() {
        assert_eq!(
            build(b"\x1b[4:3m"),
            vec![Command::SetGraphicsRendition(
                GraphicsRendition::CurlyUnderlined
            )]
        );
    }

    #[test]
    fn dec_modes() {
        assert_eq!(
            build(b"\x1b[?7h"),
            vec![Command::SetMode {
                mode: Mode::AutoWrap,
                enable: true
            }]
        );
        assert_eq!(
            build(b"\x1b[?6;25l"),
            vec![
                Command::SetMode {
                    mode: Mode::Origin,
                    enable: false
                },
                Command::SetMode {
                    mode: Mode::VisibleCursor,
                    enable: false
                },
            ]
        );
    }

    #[test]
    fn mouse_protocol_modes() {
        assert_eq!(
            build(b"\x1b[?1000h"),
            vec![Command::SendMouseEvents {
                protocol: MouseProtocol::Normal,
                enable: true
            }]
        );
        assert_eq!(
            build(b"\x1b[?1006h"),
            vec![Command::SetMode {
                mode: Mode::MouseSgr,
                enable: true
            }]
        );
    }

    #[test]
    fn margins() {
        assert_eq!(
            build(b"\x1b[5;10r"),
            vec![Command::SetTopBottomMargin { top: 5, bottom: 10 }]
        );
        assert_eq!(
            build(b"\x1b[r"),
            vec![Command::SetTopBottomMargin { top: 0, bottom: 0 }]
        );
        assert_eq!(build(b"\x1b[s"), vec![Command::SaveCursor]);
        assert_eq!(
            build(b"\x1b[2;40s"),
            vec![Command::SetLeftRightMargin { left: 2, right: 40 }]
        );
    }

    #[test]
    fn device_reports() {
        assert_eq!(build(b"\x1b[6n"), vec![Command::ReportCursorPosition]);
        assert_eq!(
            build(b"\x1b[?6n"),
            vec![Command::ReportExtendedCursorPosition]
        );
        assert_eq!(build(b"\x1b[c"), vec![Command::SendDeviceAttributes]);
        assert_eq!(build(b"\x1b[>c"), vec![Command::SendTerminalId]);
        assert_eq!(
            build(b"\x1b[?1$p"),
            vec![Command::RequestMode {
                ansi: false,
                number: 1
            }]
        );
    }

    #[test]
    fn resets() {
        assert_eq!(build(b"\x1bc"), vec![Command::FullReset]);
        assert_eq!(build(b"\x1b[!p"), vec![Command::SoftTerminalReset]);
    }

    #[test]
    fn charsets() {
        assert_eq!(
            build(b"\x1b(0"),
            vec![Command::DesignateCharset {
                slot: CharsetSlot::G0,
                charset: Charset::Special
            }]
        );
        assert_eq!(
            build(b"\x1bN"),
            vec![Command::SingleShiftSelect(CharsetSlot::G2)]
        );
        assert_eq!(build(b"\x0e"), vec![Command::LockingShift(CharsetSlot::G1)]);
    }

    #[test]
    fn titles() {
        assert_eq!(
            build(b"\x1b]2;my title\x07"),
            vec![Command::ChangeWindowTitle("my title".into())]
        );
        assert_eq!(
            build(b"\x1b]0;both\x07"),
            vec![
                Command::ChangeIconTitle("both".into()),
                Command::ChangeWindowTitle("both".into()),
            ]
        );
        assert_eq!(build(b"\x1b[22t"), vec![Command::SaveWindowTitle]);
        assert_eq!(build(b"\x1b[23t"), vec![Command::RestoreWindowTitle]);
    }

    #[test]
    fn hyperlinks() {
        assert_eq!(
            build(b"\x1b]8;id=x1;https://example.com\x1b\\"),
            vec![Command::Hyperlink {
                id: "x1".into(),
                uri: "https://example.com".into()
            }]
        );
        assert_eq!(
            build(b"\x1b]8;;\x1b\\"),
            vec![Command::Hyperlink {
                id: String::new(),
                uri: String::new()
            }]
        );
    }

    #[test]
    fn dynamic_colors() {
        assert_eq!(
            build(b"\x1b]11;?\x07"),
            vec![Command::RequestDynamicColor(
                DynamicColorName::DefaultBackgroundColor
            )]
        );
        assert_eq!(
            build(b"\x1b]10;#102030\x07"),
            vec![Command::SetDynamicColor {
                name: DynamicColorName::DefaultForegroundColor,
                color: RgbColor::new(0x10, 0x20, 0x30)
            }]
        );
        assert_eq!(
            build(b"\x1b]112\x07"),
            vec![Command::ResetDynamicColor(DynamicColorName::TextCursorColor)]
        );
    }

    #[test]
    fn notify() {
        assert_eq!(
            build(b"\x1b]777;notify;Title;Body text\x07"),
            vec![Command::Notify {
                title: "Title".into(),
                body: "Body text".into()
            }]
        );
    }

    #[test]
    fn decrqss() {
        assert_eq!(
            build(b"\x1bP$qm\x1b\\"),
            vec![Command::RequestStatusString("m".into())]
        );
    }

    #[test]
    fn window_resize() {
        assert_eq!(
            build(b"\x1b[8;24;80t"),
            vec![Command::ResizeWindow {
                width: 80,
                height: 24,
                unit: ResizeUnit::Characters
            }]
        );
    }

    #[test]
    fn unknown_sequences_become_ignored() {
        let commands = build(b"\x1b[99Z\x1b[?9999h");
        // CBT is known; the unknown mode is not.
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], Command::CursorBackwardTab(99));
        assert!(matches!(commands[1], Command::Ignored(_)));
    }

    #[test]
    fn set_mark() {
        assert_eq!(build(b"\x1b]1337;SetMark\x07"), vec![Command::SetMark]);
    }

    #[test]
    fn mode_1048_is_save_restore_cursor() {
        assert_eq!(build(b"\x1b[?1048h"), vec![Command::SaveCursor]);
        assert_eq!(build(b"\x1b[?1048l"), vec![Command::RestoreCursor]);
    }
}
