use pretty_assertions::assert_eq;
use vterm_terminal::{DisplayMode, Terminal};

fn terminal() -> Terminal {
    Terminal::new(DisplayMode::MonochromeText40x25).expect("40x25 text mode")
}

#[test]
fn leaving_alternate_restores_primary() {
    let mut term = terminal();
    term.process(b"\x1b[31mprompt $ \x1b[3;5Hls");
    let primary = term.screen().clone();

    term.process(b"\x1b[?1049h");
    assert!(term.screen().is_alternate_active());
    assert_eq!(term.active().cursor(), (0, 0));

    term.process(b"\x1b[2J\x1b[10;10Hfull screen app\x1b[44m\r\nmore");
    term.process(b"\x1b[?1049l");

    assert!(!term.screen().is_alternate_active());
    assert_eq!(term.screen(), &primary);
}

#[test]
fn mode_1047_also_switches() {
    let mut term = terminal();
    term.process(b"main");

    term.process(b"\x1b[?1047hALT");
    assert_eq!(term.active().row_text(0).unwrap().trim_end(), "ALT");
    assert_eq!(term.screen().row_text(0).unwrap().trim_end(), "main");

    term.process(b"\x1b[?1047l");
    assert_eq!(term.active().row_text(0).unwrap().trim_end(), "main");
}

#[test]
fn entering_twice_keeps_alternate_content() {
    let mut term = terminal();
    term.process(b"\x1b[?1049hone\x1b[?1049h");

    assert_eq!(term.active().row_text(0).unwrap().trim_end(), "one");
}

#[test]
fn reentering_starts_blank() {
    let mut term = terminal();
    term.process(b"\x1b[?1049hstale\x1b[?1049l\x1b[?1049h");

    assert!(term.active().data().iter().all(|&b| b == 0));
}

#[test]
fn other_private_modes_are_ignored() {
    let mut term = terminal();
    term.process(b"x\x1b[?25l\x1b[?7h\x1b[4h");

    assert!(!term.screen().is_alternate_active());
    assert_eq!(term.active().cursor(), (0, 1));
}

#[test]
fn alternate_without_private_marker_is_ignored() {
    let mut term = terminal();
    term.process(b"\x1b[1049h");

    assert!(!term.screen().is_alternate_active());
}
