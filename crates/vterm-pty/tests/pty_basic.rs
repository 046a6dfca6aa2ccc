mod common;

use std::path::Path;
use std::time::{Duration, Instant};
use vterm_pty::{PtyError, PtySession, DEFAULT_SHELL};

#[cfg(unix)]
#[test]
fn allocate_and_size_pty() {
    common::init_test_logging();

    let mut pty = PtySession::open().expect("allocate pty");
    pty.set_window_size(25, 40).expect("set window size");
    assert!(pty.slave_path().starts_with("/dev"));
    assert!(pty.child_pid().is_none());
}

#[cfg(unix)]
#[test]
fn shell_sees_configured_term() {
    common::init_test_logging();

    let mut pty = PtySession::open().unwrap();
    pty.set_term("vterm-test");
    pty.spawn(Path::new(DEFAULT_SHELL)).unwrap();
    pty.write_bytes(b"echo T=$TERM.\n").unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut output = Vec::new();
    while Instant::now() < deadline {
        match pty.try_read_byte() {
            Ok(Some(b)) => output.push(b),
            Ok(None) => {
                if String::from_utf8_lossy(&output).contains("T=vterm-test.") {
                    break;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert!(String::from_utf8_lossy(&output).contains("T=vterm-test."));
}

#[cfg(unix)]
#[test]
fn exit_reports_child_closed() {
    common::init_test_logging();

    let mut pty = PtySession::open().unwrap();
    pty.spawn(Path::new(DEFAULT_SHELL)).unwrap();
    pty.write_bytes(b"exit\n").unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut closed = false;
    while Instant::now() < deadline {
        match pty.try_read_byte() {
            Ok(Some(_)) => {}
            Ok(None) => std::thread::sleep(Duration::from_millis(5)),
            Err(PtyError::ChildClosed) => {
                closed = true;
                break;
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert!(closed, "shell exit was never reported");
}

#[cfg(unix)]
#[test]
fn missing_shell_exits_child() {
    common::init_test_logging();

    let mut pty = PtySession::open().unwrap();
    pty.spawn(Path::new("/nonexistent/shell")).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut closed = false;
    while Instant::now() < deadline {
        match pty.try_read_byte() {
            Ok(_) => std::thread::sleep(Duration::from_millis(5)),
            Err(PtyError::ChildClosed) => {
                closed = true;
                break;
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert!(closed);
}
