use std::io::Write;
use std::path::Path;

use crate::resolver;

/// Commands implemented inside the shell process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Pwd,
    Exit,
    Die,
    Which,
}

impl Builtin {
    /// Look up a builtin by command name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cd" => Some(Builtin::Cd),
            "pwd" => Some(Builtin::Pwd),
            "exit" => Some(Builtin::Exit),
            "die" => Some(Builtin::Die),
            "which" => Some(Builtin::Which),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => "cd",
            Builtin::Pwd => "pwd",
            Builtin::Exit => "exit",
            Builtin::Die => "die",
            Builtin::Which => "which",
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum BuiltinAction {
    Continue(i32),
    Exit(i32),
}

impl BuiltinAction {
    pub fn status(&self) -> i32 {
        match self {
            BuiltinAction::Continue(code) | BuiltinAction::Exit(code) => *code,
        }
    }
}

/// Execute a builtin, writing output to the provided streams.
///
/// `args` is the stage's full argument list, so `args[0]` is the builtin's name.
pub fn execute(
    builtin: Builtin,
    args: &[String],
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> BuiltinAction {
    let operands = args.get(1..).unwrap_or_default();
    let action = match builtin {
        Builtin::Cd => BuiltinAction::Continue(builtin_cd(operands, stderr)),
        Builtin::Pwd => BuiltinAction::Continue(builtin_pwd(stdout, stderr)),
        Builtin::Exit => builtin_exit(operands, stderr),
        Builtin::Die => builtin_die(operands, stderr),
        Builtin::Which => BuiltinAction::Continue(builtin_which(operands, stdout, stderr)),
    };
    let _ = stdout.flush();
    action
}

fn builtin_cd(args: &[String], stderr: &mut dyn Write) -> i32 {
    let target = match args {
        [] => match std::env::var("HOME") {
            Ok(home) => home,
            Err(_) => {
                let _ = writeln!(stderr, "cd: HOME not set");
                return 1;
            }
        },
        [dir] => dir.clone(),
        _ => {
            let _ = writeln!(stderr, "cd: expected one argument");
            return 1;
        }
    };

    if let Err(e) = std::env::set_current_dir(Path::new(&target)) {
        let _ = writeln!(stderr, "cd: {target}: {e}");
        return 1;
    }

    0
}

fn builtin_pwd(stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32 {
    match std::env::current_dir() {
        Ok(path) => {
            let _ = writeln!(stdout, "{}", path.display());
            0
        }
        Err(e) => {
            let _ = writeln!(stderr, "pwd: {e}");
            1
        }
    }
}

fn builtin_exit(args: &[String], stderr: &mut dyn Write) -> BuiltinAction {
    match args {
        [] => BuiltinAction::Exit(0),
        [code] => match code.parse::<i32>() {
            Ok(status @ 0..=255) => BuiltinAction::Exit(status),
            Ok(_) => {
                let _ = writeln!(stderr, "exit: {code}: status must be between 0 and 255");
                BuiltinAction::Continue(2)
            }
            Err(_) => {
                let _ = writeln!(stderr, "exit: {code}: numeric argument required");
                BuiltinAction::Continue(2)
            }
        },
        _ => {
            let _ = writeln!(stderr, "exit: too many arguments");
            BuiltinAction::Continue(1)
        }
    }
}

fn builtin_die(args: &[String], stderr: &mut dyn Write) -> BuiltinAction {
    let _ = writeln!(stderr, "{}", args.join(" "));
    BuiltinAction::Exit(1)
}

fn builtin_which(args: &[String], stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32 {
    let [name] = args else {
        let _ = writeln!(stderr, "which: expected one argument");
        return 1;
    };

    match resolver::find_in_dirs(name, resolver::SEARCH_DIRS) {
        Some(path) => {
            let _ = writeln!(stdout, "{}", path.display());
            0
        }
        None => {
            let _ = writeln!(stderr, "which: {name} not found");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(builtin: Builtin, args: &[&str]) -> (BuiltinAction, String, String) {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let action = execute(builtin, &args, &mut out, &mut err);
        (
            action,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn recognizes_builtin_names() {
        for builtin in [Builtin::Cd, Builtin::Pwd, Builtin::Exit, Builtin::Die, Builtin::Which] {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::from_name("ls"), None);
        assert_eq!(Builtin::from_name("CD"), None);
    }

    #[test]
    fn pwd_prints_current_dir() {
        let (action, out, _) = run(Builtin::Pwd, &["pwd"]);
        assert_eq!(action, BuiltinAction::Continue(0));
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(out.trim_end(), cwd.display().to_string());
    }

    #[test]
    fn cd_missing_dir_fails() {
        let (action, _, err) = run(Builtin::Cd, &["cd", "/definitely/not/a/dir"]);
        assert_eq!(action, BuiltinAction::Continue(1));
        assert!(err.starts_with("cd: /definitely/not/a/dir"), "stderr was: {err}");
    }

    #[test]
    fn cd_rejects_extra_arguments() {
        let (action, _, err) = run(Builtin::Cd, &["cd", "a", "b"]);
        assert_eq!(action, BuiltinAction::Continue(1));
        assert!(err.contains("expected one argument"));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(run(Builtin::Exit, &["exit"]).0, BuiltinAction::Exit(0));
        assert_eq!(run(Builtin::Exit, &["exit", "7"]).0, BuiltinAction::Exit(7));
        assert_eq!(run(Builtin::Exit, &["exit", "x"]).0, BuiltinAction::Continue(2));
        assert_eq!(run(Builtin::Exit, &["exit", "1", "2"]).0, BuiltinAction::Continue(1));
        assert_eq!(run(Builtin::Exit, &["exit", "255"]).0, BuiltinAction::Exit(255));
    }

    #[test]
    fn exit_rejects_out_of_range_codes() {
        for code in ["256", "-1"] {
            let (action, _, err) = run(Builtin::Exit, &["exit", code]);
            assert_eq!(action, BuiltinAction::Continue(2));
            assert!(err.contains("between 0 and 255"), "stderr was: {err}");
        }
    }

    #[test]
    fn die_prints_message_and_exits() {
        let (action, out, err) = run(Builtin::Die, &["die", "something", "broke"]);
        assert_eq!(action, BuiltinAction::Exit(1));
        assert!(out.is_empty());
        assert_eq!(err, "something broke\n");
    }

    #[test]
    fn which_finds_sh() {
        let (action, out, _) = run(Builtin::Which, &["which", "sh"]);
        assert_eq!(action, BuiltinAction::Continue(0));
        assert!(out.trim_end().ends_with("/sh"), "stdout was: {out}");
    }

    #[test]
    fn which_reports_missing() {
        let (action, out, err) = run(Builtin::Which, &["which", "no-such-program-xyz"]);
        assert_eq!(action, BuiltinAction::Continue(1));
        assert!(out.is_empty());
        assert_eq!(err, "which: no-such-program-xyz not found\n");
    }
}
