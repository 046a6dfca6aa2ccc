//! Low-level PTY allocation and management
//!
//! Provides the master/slave pair, the forked shell attached to the slave
//! side, and non-blocking byte I/O on the master side for Unix-like systems

use crate::PtyError;
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::pty::{grantpt, posix_openpt, unlockpt, PtyMaster, Winsize};
use nix::unistd::{dup2, fork, setsid, ForkResult, Pid};
use std::ffi::{c_char, CString};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Shell used when none is configured
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// `TERM` handed to the child; it must match what the parser understands
pub const DEFAULT_TERM: &str = "dumb";

/// A pseudo-terminal pair and the shell attached to it
#[derive(Debug)]
pub struct PtySession {
    /// Master side, non-blocking
    master: File,

    /// Slave side, held only until the shell is spawned
    slave: Option<OwnedFd>,

    slave_path: PathBuf,
    shell: PathBuf,
    term: String,
    child: Option<Pid>,
}

impl PtySession {
    /// Allocate a new PTY pair
    pub fn open() -> Result<Self, PtyError> {
        let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY)
            .map_err(|e| PtyError::Allocation(format!("posix_openpt failed: {}", e)))?;

        grantpt(&master).map_err(|e| PtyError::Allocation(format!("grantpt failed: {}", e)))?;
        unlockpt(&master)
            .map_err(|e| PtyError::Allocation(format!("unlockpt failed: {}", e)))?;

        let slave_path = PathBuf::from(slave_name(&master)?);
        let slave = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&slave_path)
            .map_err(|e| {
                PtyError::Allocation(format!("open({}) failed: {}", slave_path.display(), e))
            })?;

        // SAFETY: the descriptor was just released by `PtyMaster` and has no
        // other owner.
        let master = unsafe { File::from_raw_fd(master.into_raw_fd()) };

        // Set non-blocking mode on master
        fcntl(master.as_raw_fd(), FcntlArg::F_SETFL(OFlag::O_NONBLOCK))
            .map_err(|e| PtyError::Allocation(format!("Failed to set non-blocking: {}", e)))?;

        // Keep this master out of shells spawned for other buffers
        fcntl(master.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))
            .map_err(|e| PtyError::Allocation(format!("Failed to set close-on-exec: {}", e)))?;

        debug!("Allocated PTY {}", slave_path.display());

        Ok(Self {
            master,
            slave: Some(OwnedFd::from(slave)),
            slave_path,
            shell: PathBuf::from(DEFAULT_SHELL),
            term: DEFAULT_TERM.to_string(),
            child: None,
        })
    }

    /// Path of the slave device, e.g. `/dev/pts/3`
    pub fn slave_path(&self) -> &Path {
        &self.slave_path
    }

    /// Shell running (or to be run) on the slave side
    pub fn shell(&self) -> &Path {
        &self.shell
    }

    /// `TERM` value given to the child
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Choose the `TERM` value for a later [`PtySession::spawn`]
    pub fn set_term(&mut self, term: impl Into<String>) {
        self.term = term.into();
    }

    /// Process ID of the shell, once spawned
    pub fn child_pid(&self) -> Option<Pid> {
        self.child
    }

    /// Set the kernel window size seen by the shell
    pub fn set_window_size(&mut self, rows: u16, cols: u16) -> Result<(), PtyError> {
        let winsize = Winsize {
            ws_row: rows,
            ws_col: cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };

        // SAFETY: TIOCSWINSZ reads one `winsize` from the pointer.
        let ret = unsafe {
            libc::ioctl(self.master.as_raw_fd(), libc::TIOCSWINSZ, &winsize as *const _)
        };
        if ret < 0 {
            return Err(PtyError::Io(io::Error::last_os_error()));
        }

        Ok(())
    }

    /// Fork and run `shell` on the slave side.
    ///
    /// The parent closes its copy of the slave and returns immediately; it
    /// never waits on the child.
    pub fn spawn(&mut self, shell: &Path) -> Result<Pid, PtyError> {
        let slave = self.slave.take().ok_or(PtyError::AlreadySpawned)?;

        // Everything the child needs is allocated before forking.
        let program = CString::new(shell.as_os_str().as_bytes())
            .map_err(|_| PtyError::Fork(format!("shell path {:?} contains NUL", shell)))?;
        let env = CString::new(format!("TERM={}", self.term))
            .map_err(|_| PtyError::Fork(format!("TERM value {:?} contains NUL", self.term)))?;
        let argv: [*const c_char; 2] = [program.as_ptr(), std::ptr::null()];
        let envp: [*const c_char; 2] = [env.as_ptr(), std::ptr::null()];

        // SAFETY: the child only calls async-signal-safe functions before
        // exec or `_exit`.
        match unsafe { fork() } {
            Err(e) => {
                self.slave = Some(slave);
                Err(PtyError::Fork(format!("Fork failed: {}", e)))
            }
            Ok(ForkResult::Parent { child }) => {
                // Close slave FD as we don't need it
                drop(slave);
                self.child = Some(child);
                self.shell = shell.to_path_buf();
                debug!("Spawned {} as pid {} (TERM={})", shell.display(), child, self.term);
                Ok(child)
            }
            Ok(ForkResult::Child) => {
                exec_child(self.master.as_raw_fd(), slave.as_raw_fd(), &argv, &envp)
            }
        }
    }

    /// Read one byte if the master is readable right now.
    ///
    /// `Ok(None)` means nothing is pending. End of stream, or `EIO` once
    /// the last slave descriptor is gone, reports [`PtyError::ChildClosed`].
    pub fn try_read_byte(&mut self) -> Result<Option<u8>, PtyError> {
        let revents = {
            let mut fds = [PollFd::new(self.master.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, PollTimeout::ZERO) {
                Ok(0) => return Ok(None),
                Ok(_) => fds[0].revents().unwrap_or(PollFlags::empty()),
                Err(nix::errno::Errno::EINTR) => return Ok(None),
                Err(e) => return Err(PtyError::Io(io::Error::from(e))),
            }
        };

        if !revents.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR) {
            return Ok(None);
        }

        let mut byte = [0u8; 1];
        match self.master.read(&mut byte) {
            Ok(0) => Err(self.closed()),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if is_transient(&e) => Ok(None),
            Err(e) if e.raw_os_error() == Some(libc::EIO) => Err(self.closed()),
            Err(e) => Err(PtyError::Io(e)),
        }
    }

    /// Write to the master without blocking.
    ///
    /// Returns how many bytes the kernel accepted; a short or zero-length
    /// write is not retried.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize, PtyError> {
        match self.master.write(bytes) {
            Ok(n) => Ok(n),
            Err(e) if is_transient(&e) => Ok(0),
            Err(e) if e.raw_os_error() == Some(libc::EIO) => Err(self.closed()),
            Err(e) => Err(PtyError::Io(e)),
        }
    }

    fn closed(&self) -> PtyError {
        warn!("Shell {} closed the PTY", self.shell.display());
        PtyError::ChildClosed
    }
}

impl AsRawFd for PtySession {
    fn as_raw_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

#[cfg(target_os = "linux")]
fn slave_name(master: &PtyMaster) -> Result<String, PtyError> {
    nix::pty::ptsname_r(master)
        .map_err(|e| PtyError::Allocation(format!("ptsname failed: {}", e)))
}

#[cfg(not(target_os = "linux"))]
fn slave_name(master: &PtyMaster) -> Result<String, PtyError> {
    // SAFETY: ptsname's static buffer is copied out before any other call.
    unsafe { nix::pty::ptsname(master) }
        .map_err(|e| PtyError::Allocation(format!("ptsname failed: {}", e)))
}

/// Child half of [`PtySession::spawn`]. Never returns.
fn exec_child(
    master_fd: RawFd,
    slave_fd: RawFd,
    argv: &[*const c_char; 2],
    envp: &[*const c_char; 2],
) -> ! {
    // SAFETY: plain descriptor syscalls on descriptors this process owns;
    // `_exit` skips destructors that belong to the parent's state.
    unsafe {
        libc::close(master_fd);

        // New session, detached from the parent's controlling terminal
        if setsid().is_err() {
            libc::_exit(1);
        }

        // Make the slave the controlling terminal
        if libc::ioctl(slave_fd, libc::TIOCSCTTY as _, 0) < 0 {
            libc::_exit(1);
        }

        for target in 0..=2 {
            if dup2(slave_fd, target).is_err() {
                libc::_exit(1);
            }
        }
        if slave_fd > 2 {
            libc::close(slave_fd);
        }

        libc::execve(argv[0], argv.as_ptr(), envp.as_ptr());
        libc::_exit(127)
    }
}
