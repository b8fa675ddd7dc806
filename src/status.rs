/// Convert an OS process status into the shell's exit code.
///
/// A process that did not exit normally (killed by a signal) is recorded as 1.
pub fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Same conversion for a raw `waitpid` status word.
pub fn exit_code_from_wait_status(raw_status: libc::c_int) -> i32 {
    if unsafe { libc::WIFEXITED(raw_status) } {
        return unsafe { libc::WEXITSTATUS(raw_status) };
    }

    1
}
