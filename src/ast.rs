use crate::builtins::Builtin;

/// Controls whether a chain runs based on the previous chain's exit status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Condition {
    /// No operator — always run.
    #[default]
    Unconditional,
    /// `and` — run only if the previous chain succeeded (status 0).
    IfPrevSucceeded,
    /// `or` — run only if the previous chain failed (status != 0).
    IfPrevFailed,
}

impl Condition {
    /// The reserved word that produces this condition, if any.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Condition::Unconditional => None,
            Condition::IfPrevSucceeded => Some("and"),
            Condition::IfPrevFailed => Some("or"),
        }
    }
}

/// One pipeline stage.
///
/// `args` is never empty and `args[0]` is always `program`.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub program: String,
    pub args: Vec<String>,
    /// Set when `program` names a shell builtin.
    pub builtin: Option<Builtin>,
    /// `< file`
    pub input: Option<String>,
    /// `> file`
    pub output: Option<String>,
}

impl Command {
    /// Finalize an argument list into a stage. Returns `None` for an empty list.
    pub fn from_args(
        args: Vec<String>,
        input: Option<String>,
        output: Option<String>,
    ) -> Option<Self> {
        let program = args.first()?.clone();
        let builtin = Builtin::from_name(&program);
        Some(Self {
            program,
            args,
            builtin,
            input,
            output,
        })
    }
}

/// All stages built from one input line. Stage `n` pipes its output into
/// stage `n + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    condition: Condition,
    stages: Vec<Command>,
}

impl Chain {
    /// Most stages a single pipeline may have.
    pub const MAX_STAGES: usize = 2;

    /// Returns `None` unless `stages` holds between one and [`Chain::MAX_STAGES`] commands.
    pub fn new(condition: Condition, stages: Vec<Command>) -> Option<Self> {
        if stages.is_empty() || stages.len() > Self::MAX_STAGES {
            return None;
        }
        Some(Self { condition, stages })
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn stages(&self) -> &[Command] {
        &self.stages
    }
}
