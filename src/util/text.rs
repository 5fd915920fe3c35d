use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a string in terminal columns.
///
/// CJK characters and emoji count as two columns, combining marks as zero.
/// Menu items routinely mix ASCII and Japanese, so every column computation
/// in the UI goes through this rather than `str::len`.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Truncate a string to at most `max_width` terminal columns, appending
/// `...` when text was cut.
///
/// Returns `Cow::Borrowed` when the string already fits (the common case in
/// render loops). Widths of three columns or fewer return a plain prefix
/// without the ellipsis, since nothing useful fits next to it.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    // Room reserved for the ellipsis, unless the budget is too small for one
    let target = if max_width > ELLIPSIS_WIDTH {
        max_width - ELLIPSIS_WIDTH
    } else {
        max_width
    };

    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > target {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    if max_width > ELLIPSIS_WIDTH {
        Cow::Owned(format!("{}{}", &s[..end], ELLIPSIS))
    } else {
        Cow::Owned(s[..end].to_string())
    }
}

/// Strip terminal control characters and escape sequences from text.
///
/// Food names, category labels, and recommendation prose arrive from the
/// network; a hostile payload must not be able to move the cursor or retitle
/// the window. Removes C0 controls (keeping tab/newline/CR), DEL, CSI and
/// OSC escape sequences, and bare ESC bytes. Clean input returns borrowed.
pub fn sanitize_display(s: &str) -> Cow<'_, str> {
    fn is_banned(c: char) -> bool {
        c == '\u{1b}'
            || c == '\u{7f}'
            || (c < '\u{20}' && c != '\t' && c != '\n' && c != '\r')
    }

    if !s.chars().any(is_banned) {
        return Cow::Borrowed(s);
    }

    #[derive(PartialEq)]
    enum Mode {
        Text,
        Esc,
        Csi,
        Osc,
        OscEsc,
    }

    let mut out = String::with_capacity(s.len());
    let mut mode = Mode::Text;

    for c in s.chars() {
        match mode {
            Mode::Text => {
                if c == '\u{1b}' {
                    mode = Mode::Esc;
                } else if !is_banned(c) {
                    out.push(c);
                }
            }
            Mode::Esc => match c {
                '[' => mode = Mode::Csi,
                ']' => mode = Mode::Osc,
                '\u{1b}' => {}
                _ => {
                    // Bare ESC: only the ESC byte itself is dropped
                    mode = Mode::Text;
                    if !is_banned(c) {
                        out.push(c);
                    }
                }
            },
            Mode::Csi => {
                // Final bytes 0x40..=0x7e end a CSI sequence
                if ('\u{40}'..='\u{7e}').contains(&c) {
                    mode = Mode::Text;
                }
            }
            Mode::Osc => {
                if c == '\u{07}' {
                    mode = Mode::Text;
                } else if c == '\u{1b}' {
                    mode = Mode::OscEsc;
                }
            }
            Mode::OscEsc => {
                // ESC \ is the ST terminator; anything else stays inside OSC
                mode = if c == '\\' { Mode::Text } else { Mode::Osc };
            }
        }
    }

    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_counts_cjk_double() {
        assert_eq!(display_width("Rice"), 4);
        assert_eq!(display_width("唐揚げ"), 6);
        assert_eq!(display_width("Set 定食"), 9);
    }

    #[test]
    fn truncate_fits_returns_borrowed() {
        let result = truncate_to_width("Miso Soup", 20);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Miso Soup");
    }

    #[test]
    fn truncate_appends_ellipsis() {
        assert_eq!(truncate_to_width("Hamburger Steak", 10), "Hamburg...");
    }

    #[test]
    fn truncate_respects_cjk_boundaries() {
        // Each character is two columns; never split mid-glyph
        assert_eq!(truncate_to_width("唐揚げ定食", 7), "唐揚...");
        assert_eq!(truncate_to_width("唐揚げ定食", 10), "唐揚げ定食");
    }

    #[test]
    fn truncate_narrow_widths_skip_ellipsis() {
        assert_eq!(truncate_to_width("Curry", 0), "");
        assert_eq!(truncate_to_width("Curry", 1), "C");
        assert_eq!(truncate_to_width("Curry", 3), "Cur");
        assert_eq!(truncate_to_width("唐揚げ", 3), "唐");
    }

    #[test]
    fn sanitize_clean_text_borrows() {
        let input = "Grilled fish set\nwith rice";
        let result = sanitize_display(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn sanitize_strips_c0_and_del() {
        assert_eq!(sanitize_display("fi\x00sh\x07 set\x7f"), "fish set");
    }

    #[test]
    fn sanitize_keeps_tab_newline_cr() {
        let input = "a\tb\nc\r\nd";
        assert_eq!(sanitize_display(input), input);
    }

    #[test]
    fn sanitize_strips_csi_sequences() {
        assert_eq!(sanitize_display("\x1b[31mRed Curry\x1b[0m"), "Red Curry");
        assert_eq!(sanitize_display("up\x1b[2Adown"), "updown");
    }

    #[test]
    fn sanitize_strips_osc_sequences() {
        assert_eq!(sanitize_display("\x1b]0;evil title\x07Rice"), "Rice");
        assert_eq!(sanitize_display("\x1b]0;evil\x1b\\Rice"), "Rice");
    }

    #[test]
    fn sanitize_strips_bare_esc() {
        assert_eq!(sanitize_display("a\x1bb"), "ab");
    }

    #[test]
    fn sanitize_preserves_unicode() {
        assert_eq!(
            sanitize_display("味噌汁 \x1b[31m赤\x1b[0m 定食"),
            "味噌汁 赤 定食"
        );
    }
}
