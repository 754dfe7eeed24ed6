use std::io;
use std::os::unix::io::RawFd;
use std::sync::Mutex;

use super::TerminalController;

/// termios-based controller for a Unix terminal.
///
/// Only `ICANON` and `ECHO` are cleared. Output processing is left alone so
/// results streamed to stdout while listening keep their line endings.
pub struct UnixTermios {
    fd: RawFd,
    saved: Mutex<Option<libc::termios>>,
}

impl UnixTermios {
    pub fn new(fd: RawFd) -> Self {
        Self {
            fd,
            saved: Mutex::new(None),
        }
    }

    /// Controller for standard input
    pub fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO)
    }

    /// Reads the current terminal attributes
    pub fn current_mode(&self) -> io::Result<libc::termios> {
        // SAFETY: termios is plain data; tcgetattr fully initializes it on success.
        let mut mode: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(self.fd, &mut mode) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(mode)
    }

    fn apply(&self, mode: &libc::termios, action: libc::c_int) -> io::Result<()> {
        // SAFETY: mode points to a valid termios for the duration of the call.
        if unsafe { libc::tcsetattr(self.fd, action, mode) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl TerminalController for UnixTermios {
    fn is_interactive(&self) -> bool {
        // SAFETY: isatty only inspects the descriptor.
        unsafe { libc::isatty(self.fd) == 1 }
    }

    fn enter_raw_mode(&self) -> io::Result<()> {
        let original = self.current_mode()?;

        let mut raw = original;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        self.apply(&raw, libc::TCSANOW)?;

        let mut saved = self
            .saved
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "terminal state lock poisoned"))?;
        *saved = Some(original);
        Ok(())
    }

    fn restore_mode(&self) -> io::Result<()> {
        let original = self
            .saved
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "terminal state lock poisoned"))?
            .take();
        match original {
            // Discard keys typed during the search so they don't leak into the next prompt
            Some(mode) => self.apply(&mode, libc::TCSAFLUSH),
            None => Ok(()),
        }
    }

    fn poll_byte(&self) -> io::Result<Option<u8>> {
        let mut pfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: pfd is a single valid pollfd; a zero timeout never blocks.
        let ready = unsafe { libc::poll(&mut pfd, 1, 0) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            return if err.kind() == io::ErrorKind::Interrupted {
                Ok(None)
            } else {
                Err(err)
            };
        }
        if ready == 0 {
            return Ok(None);
        }
        if pfd.revents & libc::POLLIN == 0 {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "terminal input closed",
            ));
        }

        let mut byte = 0u8;
        // SAFETY: poll reported the fd readable, so a 1-byte read does not block.
        let n = unsafe { libc::read(self.fd, (&mut byte as *mut u8).cast(), 1) };
        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => Ok(None),
                    _ => Err(err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipe() -> (RawFd, RawFd) {
        let mut fds = [0 as RawFd; 2];
        // SAFETY: fds is a valid 2-element array.
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        (fds[0], fds[1])
    }

    fn close(fd: RawFd) {
        // SAFETY: fd was created by pipe() in this test.
        unsafe {
            libc::close(fd);
        }
    }

    #[test]
    fn test_pipe_is_not_interactive() {
        let (read_fd, write_fd) = pipe();
        let controller = UnixTermios::new(read_fd);
        assert!(!controller.is_interactive());
        assert!(controller.enter_raw_mode().is_err());
        // Nothing was saved, so there is nothing to restore
        assert!(controller.restore_mode().is_ok());
        close(read_fd);
        close(write_fd);
    }

    #[test]
    fn test_poll_byte_reads_without_blocking() {
        let (read_fd, write_fd) = pipe();
        let controller = UnixTermios::new(read_fd);

        assert_eq!(controller.poll_byte().unwrap(), None);

        // SAFETY: write_fd is a valid pipe write end.
        let written = unsafe { libc::write(write_fd, b"sx".as_ptr().cast(), 2) };
        assert_eq!(written, 2);

        assert_eq!(controller.poll_byte().unwrap(), Some(b's'));
        assert_eq!(controller.poll_byte().unwrap(), Some(b'x'));
        assert_eq!(controller.poll_byte().unwrap(), None);

        close(write_fd);
        close(read_fd);
    }
}
