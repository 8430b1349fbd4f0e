//! Property tests for the universally quantified invariants: whatever bytes
//! arrive, the cursor stays in bounds, wide cells keep their continuation
//! pairing, and the alternate buffer never accrues history.

use proptest::prelude::*;

use crate::buffer::WindowSize;
use crate::screen::{NullListener, Screen};

fn arbitrary_bytes() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..2048)
}

/// Fragments biased toward escape sequences, so the parser states actually
/// get exercised rather than drowning in plain text.
const FRAGMENTS: &[&[u8]] = &[
    b"\x1b[", b"\x1b]", b"\x1bP", b"\x1b", b";", b"?", b"\x07", b"\x9c", b"1049", b"25", b"h",
    b"l", b"m", b"H", b"r", b"J", b"\r\n", b"\x1bc", "中".as_bytes(),
];

fn escape_heavy_bytes() -> impl Strategy<Value = Vec<u8>> {
    let fragment = prop_oneof![
        4 => (0..FRAGMENTS.len()).prop_map(|index| FRAGMENTS[index].to_vec()),
        1 => proptest::collection::vec(any::<u8>(), 1..8),
    ];
    proptest::collection::vec(fragment, 0..128).prop_map(|chunks| chunks.concat())
}

fn check_invariants(screen: &Screen<NullListener>) {
    let size = screen.size();
    let cursor = screen.real_cursor_position();
    assert!(cursor.row >= 1 && cursor.row <= size.rows, "cursor row {cursor:?}");
    assert!(
        cursor.column >= 1 && cursor.column <= size.columns,
        "cursor column {cursor:?}"
    );

    for buffer in [screen.active_buffer()] {
        for line in buffer.visible_lines() {
            assert_eq!(line.cells().len(), size.columns);
            for column in 1..=size.columns {
                let cell = line.cell(column);
                if cell.width() == 2 && column < size.columns {
                    assert!(
                        line.cell(column + 1).is_continuation(),
                        "wide cell at column {column} lacks its continuation"
                    );
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn cursor_stays_in_bounds(bytes in arbitrary_bytes()) {
        let mut screen = Screen::new(WindowSize::new(20, 6), NullListener);
        screen.write(&bytes);
        check_invariants(&screen);
    }

    #[test]
    fn escape_sequences_keep_invariants(bytes in escape_heavy_bytes()) {
        let mut screen = Screen::new(WindowSize::new(20, 6), NullListener);
        screen.write(&bytes);
        check_invariants(&screen);
    }

    #[test]
    fn alternate_buffer_never_accrues_history(bytes in escape_heavy_bytes()) {
        let mut screen = Screen::new(WindowSize::new(20, 6), NullListener);
        screen.write(b"\x1b[?1049h");
        screen.write(&bytes);
        // Whatever happened, switching forth and back leaves no alternate
        // history behind.
        screen.write(b"\x1b[?1049h");
        prop_assert_eq!(
            match screen.buffer_type() {
                crate::buffer::BufferType::Alternate =>
                    screen.active_buffer().history_line_count(),
                crate::buffer::BufferType::Primary => 0,
            },
            0
        );
    }

    #[test]
    fn write_in_chunks_equals_one_write(bytes in escape_heavy_bytes(), split in 0usize..2048) {
        let mut whole = Screen::new(WindowSize::new(20, 6), NullListener);
        whole.write(&bytes);

        let mut chunked = Screen::new(WindowSize::new(20, 6), NullListener);
        let split = split.min(bytes.len());
        chunked.write(&bytes[..split]);
        chunked.write(&bytes[split..]);

        prop_assert_eq!(whole.render_text(), chunked.render_text());
        prop_assert_eq!(whole.real_cursor_position(), chunked.real_cursor_position());
    }

    #[test]
    fn hard_reset_equals_fresh(bytes in escape_heavy_bytes()) {
        let mut screen = Screen::new(WindowSize::new(20, 6), NullListener);
        screen.write(&bytes);
        screen.write(b"\x1bc");

        let fresh = Screen::new(WindowSize::new(20, 6), NullListener);
        prop_assert_eq!(screen.render_text(), fresh.render_text());
        prop_assert_eq!(screen.real_cursor_position(), fresh.real_cursor_position());
        prop_assert_eq!(screen.history_line_count(), 0);
        prop_assert!(screen.is_primary_screen());
    }
}
