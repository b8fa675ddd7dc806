use thiserror::Error;

use crate::ast::{Chain, Command, Condition};
use crate::executor::Session;
use crate::expander;

#[derive(Debug, Error, PartialEq)]
pub enum SyntaxError {
    #[error("missing input file after '<'")]
    MissingInputFile,
    #[error("missing output file after '>'")]
    MissingOutputFile,
    #[error("conditional operator cannot appear after a pipe")]
    ConditionalAfterPipe,
    #[error("'{0}' cannot start the first command")]
    LeadingConditional(&'static str),
    #[error("missing command")]
    MissingCommand,
    #[error("pipelines are limited to {} commands", Chain::MAX_STAGES)]
    TooManyStages,
}

/// If `token` is a conditional operator, return the [`Condition`] it sets.
fn conditional_op(token: &str) -> Option<Condition> {
    match token {
        "and" => Some(Condition::IfPrevSucceeded),
        "or" => Some(Condition::IfPrevFailed),
        _ => None,
    }
}

/// A stage still collecting tokens.
#[derive(Default)]
struct StageBuilder {
    args: Vec<String>,
    input: Option<String>,
    output: Option<String>,
}

impl StageBuilder {
    fn finish(self) -> Result<Command, SyntaxError> {
        Command::from_args(self.args, self.input, self.output).ok_or(SyntaxError::MissingCommand)
    }
}

/// Build the chain for one line of tokens.
///
/// Returns `Ok(None)` for a line with no tokens. Wildcards are expanded
/// while building; nothing is executed.
pub fn build_chain(tokens: &[String], session: &Session) -> Result<Option<Chain>, SyntaxError> {
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut finished: Vec<StageBuilder> = Vec::new();
    let mut current = StageBuilder::default();
    let mut condition = Condition::Unconditional;
    let mut iter = tokens.iter().enumerate();

    while let Some((position, token)) = iter.next() {
        match token.as_str() {
            "<" => {
                let (_, path) = iter.next().ok_or(SyntaxError::MissingInputFile)?;
                current.input = Some(path.clone());
            }
            ">" => {
                let (_, path) = iter.next().ok_or(SyntaxError::MissingOutputFile)?;
                current.output = Some(path.clone());
            }
            "|" => {
                if finished.len() + 2 > Chain::MAX_STAGES {
                    return Err(SyntaxError::TooManyStages);
                }
                finished.push(std::mem::take(&mut current));
            }
            word => {
                if let Some(cond) = conditional_op(word) {
                    if !finished.is_empty() {
                        return Err(SyntaxError::ConditionalAfterPipe);
                    }
                    if position == 0 && !session.has_run_any_command() {
                        return Err(SyntaxError::LeadingConditional(
                            cond.keyword().unwrap_or_default(),
                        ));
                    }
                    condition = cond;
                } else if word.contains('*') {
                    expander::expand_wildcard(word, &mut current.args);
                } else {
                    current.args.push(word.to_string());
                }
            }
        }
    }
    finished.push(current);

    let stages = finished
        .into_iter()
        .map(StageBuilder::finish)
        .collect::<Result<Vec<_>, _>>()?;

    Chain::new(condition, stages)
        .map(Some)
        .ok_or(SyntaxError::TooManyStages)
}
