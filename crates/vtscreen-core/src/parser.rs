//! ECMA-48 / DEC escape sequence parser.
//!
//! A byte-driven state machine following the canonical VT500-series parser
//! states: `ground`, `escape`, `escape_intermediate`, `csi_entry`,
//! `csi_param`, `csi_intermediate`, `csi_ignore`, `dcs_entry`, `dcs_param`,
//! `dcs_intermediate`, `dcs_passthrough`, `dcs_ignore`, `osc_string`, and
//! `sos_pm_apc_string`. Recognized events are delivered synchronously to a
//! [`ParserListener`]; the machine makes progress on every byte and is
//! resumable at any state across `advance` calls.
//!
//! 8-bit C1 controls (0x80-0x9F) enter their substates directly when the
//! UTF-8 decoder is not mid-sequence; otherwise they are continuation bytes.
//! String sequences terminate at BEL or ST; CAN and SUB abort any sequence.

use log::debug;
use smallvec::SmallVec;

use crate::utf8::{Utf8Decoder, Utf8Step};

/// Maximum number of CSI/DCS parameters retained; extras are dropped.
pub const MAX_PARAMETERS: usize = 16;
/// Maximum subparameters per parameter (`:`-separated).
pub const MAX_SUBPARAMETERS: usize = 8;
/// Parameter values saturate here.
pub const MAX_PARAMETER_VALUE: u16 = 65535;
/// Collected intermediates beyond this force the ignore state.
pub const MAX_INTERMEDIATES: usize = 2;
/// OSC/DCS/APC/PM/SOS payload cap; the remainder of an oversized string is
/// discarded while the state machine stays in the string state.
pub const MAX_STRING_LENGTH: usize = 64 * 1024;

/// Parser states, named after the canonical DEC parser diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    CsiIgnore,
    DcsEntry,
    DcsParam,
    DcsIntermediate,
    DcsPassthrough,
    DcsIgnore,
    OscString,
    SosPmApcString,
}

/// Which control string introducer opened a generic string sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlStringKind {
    /// Start of String (SOS).
    Sos,
    /// Privacy Message (PM).
    Pm,
    /// Application Program Command (APC).
    #[default]
    Apc,
}

/// Numeric parameters of a CSI or DCS sequence.
///
/// Parameters are `;`-separated; each may carry `:`-separated subparameters
/// (used by SGR extended colors). A missing parameter reads as 0; command
/// builders interpret 0 as "default" per command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    groups: SmallVec<[SmallVec<[u16; 2]>; MAX_PARAMETERS]>,
    skip: bool,
}

impl Params {
    /// Number of parameters.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if no parameters were given.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Primary value of parameter `index`, 0 when absent.
    #[must_use]
    pub fn get(&self, index: usize) -> u16 {
        self.groups
            .get(index)
            .and_then(|group| group.first())
            .copied()
            .unwrap_or(0)
    }

    /// Subparameters of parameter `index` (including the primary value).
    #[must_use]
    pub fn subparams(&self, index: usize) -> &[u16] {
        self.groups.get(index).map_or(&[], |group| group.as_slice())
    }

    /// Iterate over all parameter groups.
    pub fn iter(&self) -> impl Iterator<Item = &[u16]> {
        self.groups.iter().map(|group| group.as_slice())
    }

    fn clear(&mut self) {
        self.groups.clear();
        self.skip = false;
    }

    fn ensure_group(&mut self) {
        if self.groups.is_empty() {
            self.groups.push(SmallVec::from_slice(&[0]));
        }
    }

    fn push_digit(&mut self, digit: u8) {
        if self.skip {
            return;
        }
        self.ensure_group();
        // Both unwraps are unreachable: ensure_group pushed a non-empty group.
        if let Some(value) = self.groups.last_mut().and_then(|g| g.last_mut()) {
            *value = value
                .saturating_mul(10)
                .saturating_add(u16::from(digit))
                .min(MAX_PARAMETER_VALUE);
        }
    }

    fn next_param(&mut self) {
        self.ensure_group();
        if self.groups.len() == MAX_PARAMETERS {
            self.skip = true;
            return;
        }
        self.skip = false;
        self.groups.push(SmallVec::from_slice(&[0]));
    }

    fn next_subparam(&mut self) {
        self.ensure_group();
        if let Some(group) = self.groups.last_mut() {
            if group.len() == MAX_SUBPARAMETERS {
                self.skip = true;
                return;
            }
            group.push(0);
        }
    }
}

/// Receiver for recognized parser events.
///
/// All methods default to no-ops so tests and partial consumers stay small.
pub trait ParserListener {
    /// A printable scalar value reached the ground state.
    fn print(&mut self, _ch: char) {}

    /// A C0 or C1 control to execute.
    fn execute(&mut self, _control: u8) {}

    /// Final byte of an ESC sequence.
    fn esc_dispatch(&mut self, _intermediates: &[u8], _final_byte: u8) {}

    /// Final byte of a CSI sequence. `prefix` is a private marker from
    /// 0x3C-0x3F (`?`, `>`, `<`, `=`), if present.
    fn csi_dispatch(
        &mut self,
        _prefix: Option<u8>,
        _params: &Params,
        _intermediates: &[u8],
        _final_byte: u8,
    ) {
    }

    /// A complete OSC string (raw bytes between introducer and terminator).
    fn osc_dispatch(&mut self, _data: &[u8]) {}

    /// A complete DCS sequence with its passthrough payload.
    fn dcs_dispatch(
        &mut self,
        _prefix: Option<u8>,
        _params: &Params,
        _intermediates: &[u8],
        _final_byte: u8,
        _data: &[u8],
    ) {
    }

    /// A complete SOS/PM/APC string.
    fn control_string(&mut self, _kind: ControlStringKind, _data: &[u8]) {}
}

/// Bounded byte buffer for string-mode sequences.
#[derive(Debug, Default)]
struct StringBuffer {
    data: Vec<u8>,
    truncated: bool,
}

impl StringBuffer {
    fn clear(&mut self) {
        self.data.clear();
        self.truncated = false;
    }

    fn push(&mut self, byte: u8, what: &str) {
        if self.data.len() >= MAX_STRING_LENGTH {
            if !self.truncated {
                self.truncated = true;
                debug!("{what} string exceeds {MAX_STRING_LENGTH} bytes; truncating");
            }
            return;
        }
        self.data.push(byte);
    }
}

/// The escape-sequence state machine.
#[derive(Debug, Default)]
pub struct Parser {
    state: State,
    utf8: Utf8Decoder,
    intermediates: SmallVec<[u8; MAX_INTERMEDIATES]>,
    prefix: Option<u8>,
    params: Params,
    final_byte: u8,
    string: StringBuffer,
    string_kind: ControlStringKind,
    pending_esc: bool,
}

impl Parser {
    /// Create a parser in the ground state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, delivering events to `listener` as they complete.
    pub fn advance<L: ParserListener>(&mut self, listener: &mut L, bytes: &[u8]) {
        for &byte in bytes {
            self.advance_byte(listener, byte);
        }
    }

    /// Drop any in-flight sequence and return to ground.
    pub fn reset(&mut self) {
        self.state = State::Ground;
        self.utf8.cancel();
        self.pending_esc = false;
        self.clear_sequence();
        self.string.clear();
    }

    fn advance_byte<L: ParserListener>(&mut self, listener: &mut L, byte: u8) {
        match self.state {
            State::Ground => self.advance_ground(listener, byte),
            State::OscString | State::SosPmApcString | State::DcsPassthrough | State::DcsIgnore => {
                self.advance_string(listener, byte)
            }
            _ => self.advance_sequence(listener, byte),
        }
    }

    fn clear_sequence(&mut self) {
        self.intermediates.clear();
        self.prefix = None;
        self.params.clear();
        self.final_byte = 0;
    }

    fn enter_escape(&mut self) {
        self.state = State::Escape;
        self.clear_sequence();
    }

    // ------------------------------------------------------------------
    // Ground
    // ------------------------------------------------------------------

    fn advance_ground<L: ParserListener>(&mut self, listener: &mut L, byte: u8) {
        if self.utf8.in_progress() {
            // Controls interrupt a multi-byte sequence; everything else is
            // decoded (ill-formed bytes are absorbed with one U+FFFD).
            if byte < 0x20 || byte == 0x7F {
                if self.utf8.cancel() {
                    listener.print('\u{FFFD}');
                }
            } else {
                self.decode_text(listener, byte);
                return;
            }
        }

        match byte {
            0x1B => self.enter_escape(),
            0x00..=0x1F => listener.execute(byte),
            0x7F => {}
            0x20..=0x7E => listener.print(byte as char),
            0x80..=0x9F => self.c1_dispatch(listener, byte),
            _ => self.decode_text(listener, byte),
        }
    }

    fn decode_text<L: ParserListener>(&mut self, listener: &mut L, byte: u8) {
        match self.utf8.push(byte) {
            Utf8Step::Decoded(ch) => listener.print(ch),
            Utf8Step::Malformed => listener.print('\u{FFFD}'),
            Utf8Step::Pending => {}
        }
    }

    fn c1_dispatch<L: ParserListener>(&mut self, listener: &mut L, byte: u8) {
        match byte {
            0x90 => {
                self.state = State::DcsEntry;
                self.clear_sequence();
            }
            0x9B => {
                self.state = State::CsiEntry;
                self.clear_sequence();
            }
            0x9D => {
                self.state = State::OscString;
                self.string.clear();
            }
            0x98 | 0x9E | 0x9F => {
                self.state = State::SosPmApcString;
                self.string.clear();
                self.string_kind = match byte {
                    0x98 => ControlStringKind::Sos,
                    0x9E => ControlStringKind::Pm,
                    _ => ControlStringKind::Apc,
                };
            }
            // Stray ST terminates nothing.
            0x9C => {}
            _ => listener.execute(byte),
        }
    }

    // ------------------------------------------------------------------
    // ESC / CSI / DCS header states
    // ------------------------------------------------------------------

    fn advance_sequence<L: ParserListener>(&mut self, listener: &mut L, byte: u8) {
        // Rules common to every non-string sequence state.
        match byte {
            0x18 | 0x1A => {
                self.state = State::Ground;
                return;
            }
            0x1B => {
                self.enter_escape();
                return;
            }
            0x00..=0x1F => {
                // C0 controls execute immediately within CSI/ESC sequences
                // but are swallowed inside DCS headers.
                if !matches!(
                    self.state,
                    State::DcsEntry | State::DcsParam | State::DcsIntermediate
                ) {
                    listener.execute(byte);
                }
                return;
            }
            0x7F => return,
            0x80.. => {
                // 8-bit bytes have no meaning inside a 7-bit sequence
                // header; restart from ground.
                self.state = State::Ground;
                self.advance_ground(listener, byte);
                return;
            }
            _ => {}
        }

        match self.state {
            State::Escape => self.escape(listener, byte),
            State::EscapeIntermediate => self.escape_intermediate(listener, byte),
            State::CsiEntry => self.csi_entry(listener, byte),
            State::CsiParam => self.csi_param(listener, byte),
            State::CsiIntermediate => self.csi_intermediate(listener, byte),
            State::CsiIgnore => {
                if (0x40..=0x7E).contains(&byte) {
                    self.state = State::Ground;
                }
            }
            State::DcsEntry => self.dcs_entry(byte),
            State::DcsParam => self.dcs_param(byte),
            State::DcsIntermediate => self.dcs_intermediate(byte),
            // Ground and string states are handled before dispatch.
            _ => {}
        }
    }

    fn escape<L: ParserListener>(&mut self, listener: &mut L, byte: u8) {
        match byte {
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::EscapeIntermediate;
            }
            b'[' => {
                self.state = State::CsiEntry;
                self.clear_sequence();
            }
            b']' => {
                self.state = State::OscString;
                self.string.clear();
            }
            b'P' => {
                self.state = State::DcsEntry;
                self.clear_sequence();
            }
            b'X' | b'^' | b'_' => {
                self.state = State::SosPmApcString;
                self.string.clear();
                self.string_kind = match byte {
                    b'X' => ControlStringKind::Sos,
                    b'^' => ControlStringKind::Pm,
                    _ => ControlStringKind::Apc,
                };
            }
            _ => {
                listener.esc_dispatch(&self.intermediates, byte);
                self.state = State::Ground;
            }
        }
    }

    fn escape_intermediate<L: ParserListener>(&mut self, listener: &mut L, byte: u8) {
        match byte {
            0x20..=0x2F => self.collect(byte),
            _ => {
                listener.esc_dispatch(&self.intermediates, byte);
                self.state = State::Ground;
            }
        }
    }

    fn csi_entry<L: ParserListener>(&mut self, listener: &mut L, byte: u8) {
        match byte {
            0x30..=0x39 | b';' | b':' => {
                self.state = State::CsiParam;
                self.param_byte(byte);
            }
            0x3C..=0x3F => {
                self.prefix = Some(byte);
                self.state = State::CsiParam;
            }
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::CsiIntermediate;
            }
            _ => self.csi_finish(listener, byte),
        }
    }

    fn csi_param<L: ParserListener>(&mut self, listener: &mut L, byte: u8) {
        match byte {
            0x30..=0x39 | b';' | b':' => self.param_byte(byte),
            0x3C..=0x3F => self.state = State::CsiIgnore,
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::CsiIntermediate;
            }
            _ => self.csi_finish(listener, byte),
        }
    }

    fn csi_intermediate<L: ParserListener>(&mut self, listener: &mut L, byte: u8) {
        match byte {
            0x20..=0x2F => self.collect(byte),
            0x30..=0x3F => self.state = State::CsiIgnore,
            _ => self.csi_finish(listener, byte),
        }
    }

    fn csi_finish<L: ParserListener>(&mut self, listener: &mut L, final_byte: u8) {
        listener.csi_dispatch(self.prefix, &self.params, &self.intermediates, final_byte);
        self.state = State::Ground;
    }

    fn dcs_entry(&mut self, byte: u8) {
        match byte {
            0x30..=0x39 | b';' | b':' => {
                self.state = State::DcsParam;
                self.param_byte(byte);
            }
            0x3C..=0x3F => {
                self.prefix = Some(byte);
                self.state = State::DcsParam;
            }
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::DcsIntermediate;
            }
            _ => self.dcs_hook(byte),
        }
    }

    fn dcs_param(&mut self, byte: u8) {
        match byte {
            0x30..=0x39 | b';' | b':' => self.param_byte(byte),
            0x3C..=0x3F => self.state = State::DcsIgnore,
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::DcsIntermediate;
            }
            _ => self.dcs_hook(byte),
        }
    }

    fn dcs_intermediate(&mut self, byte: u8) {
        match byte {
            0x20..=0x2F => self.collect(byte),
            0x30..=0x3F => self.state = State::DcsIgnore,
            _ => self.dcs_hook(byte),
        }
    }

    fn dcs_hook(&mut self, final_byte: u8) {
        self.final_byte = final_byte;
        self.string.clear();
        self.state = State::DcsPassthrough;
    }

    fn collect(&mut self, byte: u8) {
        if self.intermediates.len() == MAX_INTERMEDIATES {
            // Too many intermediates: the sequence can no longer be valid.
            self.state = match self.state {
                State::DcsEntry | State::DcsParam | State::DcsIntermediate => State::DcsIgnore,
                _ => State::CsiIgnore,
            };
            return;
        }
        self.intermediates.push(byte);
    }

    fn param_byte(&mut self, byte: u8) {
        match byte {
            b';' => self.params.next_param(),
            b':' => self.params.next_subparam(),
            _ => self.params.push_digit(byte - b'0'),
        }
    }

    // ------------------------------------------------------------------
    // String states (OSC, DCS passthrough, SOS/PM/APC)
    // ------------------------------------------------------------------

    fn advance_string<L: ParserListener>(&mut self, listener: &mut L, byte: u8) {
        if self.pending_esc {
            self.pending_esc = false;
            if byte == b'\\' {
                self.finish_string(listener);
                self.state = State::Ground;
                return;
            }
            // ESC without ST aborts the string; reprocess from escape.
            self.enter_escape();
            self.advance_byte(listener, byte);
            return;
        }

        match byte {
            0x1B => self.pending_esc = true,
            0x07 | 0x9C => {
                // BEL and 8-bit ST both terminate (xterm accepts BEL for
                // DCS as well; the spec terminates all strings at BEL/ST).
                self.finish_string(listener);
                self.state = State::Ground;
            }
            0x18 | 0x1A => self.state = State::Ground,
            0x00..=0x1F => {} // other C0 controls are dropped in strings
            _ => {
                if self.state != State::DcsIgnore {
                    let what = match self.state {
                        State::OscString => "OSC",
                        State::DcsPassthrough => "DCS",
                        _ => "control",
                    };
                    self.string.push(byte, what);
                }
            }
        }
    }

    fn finish_string<L: ParserListener>(&mut self, listener: &mut L) {
        match self.state {
            State::OscString => listener.osc_dispatch(&self.string.data),
            State::DcsPassthrough => listener.dcs_dispatch(
                self.prefix,
                &self.params,
                &self.intermediates,
                self.final_byte,
                &self.string.data,
            ),
            State::SosPmApcString => listener.control_string(self.string_kind, &self.string.data),
            _ => {}
        }
        self.string.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Event {
        Print(char),
        Execute(u8),
        Esc(Vec<u8>, u8),
        Csi(Option<u8>, Vec<Vec<u16>>, Vec<u8>, u8),
        Osc(Vec<u8>),
        Dcs(Vec<Vec<u16>>, Vec<u8>, u8, Vec<u8>),
        ControlString(ControlStringKind, Vec<u8>),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl ParserListener for Recorder {
        fn print(&mut self, ch: char) {
            self.events.push(Event::Print(ch));
        }
        fn execute(&mut self, control: u8) {
            self.events.push(Event::Execute(control));
        }
        fn esc_dispatch(&mut self, intermediates: &[u8], final_byte: u8) {
            self.events.push(Event::Esc(intermediates.to_vec(), final_byte));
        }
        fn csi_dispatch(
            &mut self,
            prefix: Option<u8>,
            params: &Params,
            intermediates: &[u8],
            final_byte: u8,
        ) {
            self.events.push(Event::Csi(
                prefix,
                params.iter().map(<[u16]>::to_vec).collect(),
                intermediates.to_vec(),
                final_byte,
            ));
        }
        fn osc_dispatch(&mut self, data: &[u8]) {
            self.events.push(Event::Osc(data.to_vec()));
        }
        fn dcs_dispatch(
            &mut self,
            _prefix: Option<u8>,
            params: &Params,
            intermediates: &[u8],
            final_byte: u8,
            data: &[u8],
        ) {
            self.events.push(Event::Dcs(
                params.iter().map(<[u16]>::to_vec).collect(),
                intermediates.to_vec(),
                final_byte,
                data.to_vec(),
            ));
        }
        fn control_string(&mut self, kind: ControlStringKind, data: &[u8]) {
            self.events.push(Event::ControlString(kind, data.to_vec()));
        }
    }

    fn run(bytes: &[u8]) -> Vec<Event> {
        let mut parser = Parser::new();
        let mut recorder = Recorder::default();
        parser.advance(&mut recorder, bytes);
        recorder.events
    }

    #[test]
    fn plain_text_prints() {
        assert_eq!(
            run(b"hi"),
            vec![Event::Print('h'), Event::Print('i')]
        );
    }

    #[test]
    fn c0_executes() {
        assert_eq!(
            run(b"a\nb"),
            vec![Event::Print('a'), Event::Execute(0x0A), Event::Print('b')]
        );
    }

    #[test]
    fn csi_with_params() {
        assert_eq!(
            run(b"\x1b[5;10H"),
            vec![Event::Csi(None, vec![vec![5], vec![10]], vec![], b'H')]
        );
    }

    #[test]
    fn csi_missing_params_default_zero() {
        assert_eq!(
            run(b"\x1b[;5H"),
            vec![Event::Csi(None, vec![vec![0], vec![5]], vec![], b'H')]
        );
        assert_eq!(run(b"\x1b[H"), vec![Event::Csi(None, vec![], vec![], b'H')]);
    }

    #[test]
    fn csi_private_prefix() {
        assert_eq!(
            run(b"\x1b[?1049h"),
            vec![Event::Csi(Some(b'?'), vec![vec![1049]], vec![], b'h')]
        );
    }

    #[test]
    fn csi_subparams() {
        assert_eq!(
            run(b"\x1b[4:3m"),
            vec![Event::Csi(None, vec![vec![4, 3]], vec![], b'm')]
        );
        assert_eq!(
            run(b"\x1b[38:2:10:20:30m"),
            vec![Event::Csi(None, vec![vec![38, 2, 10, 20, 30]], vec![], b'm')]
        );
    }

    #[test]
    fn csi_intermediates() {
        assert_eq!(
            run(b"\x1b[!p"),
            vec![Event::Csi(None, vec![], vec![b'!'], b'p')]
        );
        assert_eq!(
            run(b"\x1b[2 q"),
            vec![Event::Csi(None, vec![vec![2]], vec![b' '], b'q')]
        );
    }

    #[test]
    fn csi_param_overflow_saturates() {
        assert_eq!(
            run(b"\x1b[99999999999A"),
            vec![Event::Csi(None, vec![vec![65535]], vec![], b'A')]
        );
    }

    #[test]
    fn esc_dispatch() {
        assert_eq!(run(b"\x1b7"), vec![Event::Esc(vec![], b'7')]);
        assert_eq!(run(b"\x1b#8"), vec![Event::Esc(vec![b'#'], b'8')]);
        assert_eq!(run(b"\x1b(0"), vec![Event::Esc(vec![b'('], b'0')]);
    }

    #[test]
    fn osc_bel_terminated() {
        assert_eq!(run(b"\x1b]0;title\x07"), vec![Event::Osc(b"0;title".to_vec())]);
    }

    #[test]
    fn osc_st_terminated() {
        assert_eq!(
            run(b"\x1b]2;hello\x1b\\"),
            vec![Event::Osc(b"2;hello".to_vec())]
        );
    }

    #[test]
    fn osc_survives_split_writes() {
        let mut parser = Parser::new();
        let mut recorder = Recorder::default();
        parser.advance(&mut recorder, b"\x1b]0;par");
        parser.advance(&mut recorder, b"tial\x07");
        assert_eq!(recorder.events, vec![Event::Osc(b"0;partial".to_vec())]);
    }

    #[test]
    fn can_aborts_csi() {
        assert_eq!(
            run(b"\x1b[12\x18A"),
            vec![Event::Print('A')]
        );
    }

    #[test]
    fn sub_aborts_osc() {
        assert_eq!(run(b"\x1b]0;oops\x1aZ"), vec![Event::Print('Z')]);
    }

    #[test]
    fn dcs_passthrough() {
        assert_eq!(
            run(b"\x1bP$qm\x1b\\"),
            vec![Event::Dcs(vec![], vec![b'$'], b'q', b"m".to_vec())]
        );
    }

    #[test]
    fn apc_string() {
        assert_eq!(
            run(b"\x1b_payload\x1b\\"),
            vec![Event::ControlString(ControlStringKind::Apc, b"payload".to_vec())]
        );
    }

    #[test]
    fn c1_csi() {
        assert_eq!(
            run(b"\x9b3A"),
            vec![Event::Csi(None, vec![vec![3]], vec![], b'A')]
        );
    }

    #[test]
    fn c1_execute() {
        assert_eq!(run(b"\x85"), vec![Event::Execute(0x85)]);
    }

    #[test]
    fn c1_not_recognized_mid_utf8() {
        // 0xE4 0xB8 0xAD is '中'; 0xB8/0xAD must not be taken as C1.
        assert_eq!(run("中".as_bytes()), vec![Event::Print('中')]);
    }

    #[test]
    fn utf8_text_with_csi() {
        assert_eq!(
            run("é\u{1b}[m".as_bytes()),
            vec![
                Event::Print('é'),
                Event::Csi(None, vec![], vec![], b'm'),
            ]
        );
    }

    #[test]
    fn esc_interrupts_utf8() {
        let mut bytes = vec![0xC3]; // lead byte, missing continuation
        bytes.extend_from_slice(b"\x1b[m");
        assert_eq!(
            run(&bytes),
            vec![Event::Print('\u{FFFD}'), Event::Csi(None, vec![], vec![], b'm')]
        );
    }

    #[test]
    fn control_interrupts_utf8() {
        let mut bytes = vec![0xE4, 0xB8]; // '中' missing its last byte
        bytes.push(0x0A);
        assert_eq!(
            run(&bytes),
            vec![Event::Print('\u{FFFD}'), Event::Execute(0x0A)]
        );
    }

    #[test]
    fn oversized_osc_truncates_but_terminates() {
        let mut bytes = b"\x1b]0;".to_vec();
        bytes.extend(std::iter::repeat(b'x').take(MAX_STRING_LENGTH + 100));
        bytes.push(0x07);
        let events = run(&bytes);
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::Osc(data) => assert_eq!(data.len(), MAX_STRING_LENGTH),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn param_count_caps() {
        let mut bytes = b"\x1b[".to_vec();
        for _ in 0..40 {
            bytes.extend_from_slice(b"1;");
        }
        bytes.push(b'm');
        let events = run(&bytes);
        match &events[0] {
            Event::Csi(_, params, _, b'm') => assert_eq!(params.len(), MAX_PARAMETERS),
            other => panic!("unexpected event {other:?}"),
        }
    }
}
