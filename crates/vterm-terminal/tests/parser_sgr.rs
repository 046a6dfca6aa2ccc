use pretty_assertions::assert_eq;
use test_case::test_case;
use vterm_terminal::{DisplayMode, Rgba, Terminal, ANSI_PALETTE, DEFAULT_BG, DEFAULT_FG};

fn terminal() -> Terminal {
    Terminal::new(DisplayMode::MonochromeText40x25).expect("40x25 text mode")
}

fn cell_colors(term: &Terminal, col: u16) -> (Rgba, Rgba) {
    let (_, color) = term.active().cell(0, col).expect("cell on row 0");
    (color.fg(), color.bg())
}

#[test_case(30, 0; "black")]
#[test_case(31, 1; "red")]
#[test_case(32, 2; "green")]
#[test_case(33, 3; "yellow")]
#[test_case(34, 4; "blue")]
#[test_case(35, 5; "magenta")]
#[test_case(36, 6; "cyan")]
#[test_case(37, 7; "white")]
fn foreground_code_sets_only_foreground(code: u32, slot: usize) {
    let mut term = terminal();
    term.process(format!("\x1b[{code}mX").as_bytes());

    assert_eq!(cell_colors(&term, 0), (ANSI_PALETTE[slot], DEFAULT_BG));
}

#[test_case(40, 0; "black")]
#[test_case(41, 1; "red")]
#[test_case(42, 2; "green")]
#[test_case(43, 3; "yellow")]
#[test_case(44, 4; "blue")]
#[test_case(45, 5; "magenta")]
#[test_case(46, 6; "cyan")]
#[test_case(47, 7; "white")]
fn background_code_sets_only_background(code: u32, slot: usize) {
    let mut term = terminal();
    term.process(format!("\x1b[{code}mX").as_bytes());

    assert_eq!(cell_colors(&term, 0), (DEFAULT_FG, ANSI_PALETTE[slot]));
}

#[test]
fn color_carries_forward_until_changed() {
    let mut term = terminal();
    term.process(b"\x1b[32mab\x1b[44mc");

    assert_eq!(cell_colors(&term, 0), (ANSI_PALETTE[2], DEFAULT_BG));
    assert_eq!(cell_colors(&term, 1), (ANSI_PALETTE[2], DEFAULT_BG));
    assert_eq!(cell_colors(&term, 2), (ANSI_PALETTE[2], ANSI_PALETTE[4]));
}

#[test]
fn reset_restores_both_halves() {
    let mut term = terminal();
    term.process(b"\x1b[31;46ma\x1b[0mb");

    assert_eq!(cell_colors(&term, 0), (ANSI_PALETTE[1], ANSI_PALETTE[6]));
    assert_eq!(cell_colors(&term, 1), (DEFAULT_FG, DEFAULT_BG));
    assert_eq!(term.active().current_color(), term.active().default_color());
}

#[test]
fn unsupported_codes_are_ignored() {
    let mut term = terminal();
    term.process(b"\x1b[33m\x1b[1;4;90;38mZ");

    assert_eq!(cell_colors(&term, 0), (ANSI_PALETTE[3], DEFAULT_BG));
}

#[test]
fn packed_value_puts_foreground_in_high_half() {
    let mut term = terminal();
    term.process(b"\x1b[31;44mQ");

    let (_, color) = term.active().cell(0, 0).unwrap();
    let raw = color.as_u64();
    assert_eq!((raw >> 32) as u32, ANSI_PALETTE[1].to_u32());
    assert_eq!(raw as u32, ANSI_PALETTE[4].to_u32());
}
