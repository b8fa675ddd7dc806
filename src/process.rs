use std::io;
use std::os::fd::RawFd;

pub(crate) enum Fork {
    Parent(libc::pid_t),
    Child,
}

pub(crate) fn fork() -> io::Result<Fork> {
    match unsafe { libc::fork() } {
        -1 => Err(io::Error::last_os_error()),
        0 => Ok(Fork::Child),
        pid => Ok(Fork::Parent(pid)),
    }
}

/// Terminate a forked child without running destructors or flushing the
/// parent's copied state.
pub(crate) fn exit_child(code: i32) -> ! {
    unsafe { libc::_exit(code) }
}

/// Block until `pid` terminates and return its shell exit code.
pub(crate) fn wait_for_pid(pid: libc::pid_t) -> io::Result<i32> {
    let mut raw_status: libc::c_int = 0;

    loop {
        let rc = unsafe { libc::waitpid(pid, &mut raw_status, 0) };
        if rc >= 0 {
            return Ok(crate::status::exit_code_from_wait_status(raw_status));
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}

/// Make `target` refer to the same open file as `source`.
pub(crate) fn redirect_fd(source: RawFd, target: RawFd) -> io::Result<()> {
    loop {
        let rc = unsafe { libc::dup2(source, target) };
        if rc >= 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}

pub(crate) fn close_fd(fd: RawFd) {
    unsafe {
        libc::close(fd);
    }
}

/// A standard descriptor whose original file was set aside.
///
/// Dropping it puts the original back.
pub(crate) struct SavedFd {
    target: RawFd,
    saved: RawFd,
}

impl SavedFd {
    /// Save `target` aside and point it at `source`.
    pub(crate) fn replace(target: RawFd, source: RawFd) -> io::Result<Self> {
        // Close-on-exec so children spawned while the redirection is active
        // don't inherit the saved copy.
        let saved = unsafe { libc::fcntl(target, libc::F_DUPFD_CLOEXEC, 3) };
        if saved < 0 {
            return Err(io::Error::last_os_error());
        }

        if let Err(err) = redirect_fd(source, target) {
            close_fd(saved);
            return Err(err);
        }

        Ok(Self { target, saved })
    }
}

impl Drop for SavedFd {
    fn drop(&mut self) {
        let _ = redirect_fd(self.saved, self.target);
        close_fd(self.saved);
    }
}
