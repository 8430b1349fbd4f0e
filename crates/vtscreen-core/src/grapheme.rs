//! Grapheme cluster width classification.
//!
//! Builds on `unicode-segmentation` for UAX #29 boundaries and
//! `unicode-width` for wcwidth-style display width. Terminals clamp every
//! cluster to at most two cells; anything wider (rare ideographic sequences)
//! still occupies two.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a single scalar value: 0, 1, or 2.
///
/// Control characters report 0; they never reach the grid as printables.
#[must_use]
#[inline]
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0).min(2)
}

/// Check if a scalar value occupies no column of its own (combining marks,
/// zero-width joiners, variation selectors).
#[must_use]
#[inline]
pub fn is_zero_width(ch: char) -> bool {
    char_width(ch) == 0
}

/// Display width of a full grapheme cluster, clamped to 2.
#[must_use]
pub fn cluster_width(cluster: &str) -> usize {
    UnicodeWidthStr::width(cluster).min(2)
}

/// Check if appending `ch` to `cluster` still forms a single grapheme.
///
/// This is the merge test for combining input: `e` + U+0301 joins, `a` + `b`
/// does not. ZWJ emoji sequences join through their zero-width joiner.
#[must_use]
pub fn joins_cluster(cluster: &str, ch: char) -> bool {
    if cluster.is_empty() {
        return false;
    }
    let mut combined = String::with_capacity(cluster.len() + ch.len_utf8());
    combined.push_str(cluster);
    combined.push(ch);
    combined.graphemes(true).count() == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_narrow() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width(' '), 1);
    }

    #[test]
    fn cjk_is_wide() {
        assert_eq!(char_width('中'), 2);
        assert_eq!(char_width('文'), 2);
    }

    #[test]
    fn combining_marks_are_zero_width() {
        assert!(is_zero_width('\u{0301}'));
        assert!(is_zero_width('\u{200D}'));
        assert!(!is_zero_width('x'));
    }

    #[test]
    fn cluster_width_clamps_to_two() {
        assert_eq!(cluster_width("中"), 2);
        assert_eq!(cluster_width("e\u{0301}"), 1);
    }

    #[test]
    fn combining_joins_previous() {
        assert!(joins_cluster("e", '\u{0301}'));
        assert!(!joins_cluster("e", 'x'));
        assert!(!joins_cluster("", '\u{0301}'));
    }

    #[test]
    fn zwj_sequence_joins() {
        // Woman + ZWJ joins; the following emoji continues the cluster.
        assert!(joins_cluster("\u{1F469}", '\u{200D}'));
        assert!(joins_cluster("\u{1F469}\u{200D}", '\u{1F4BB}'));
    }
}
