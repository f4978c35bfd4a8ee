//! Metavariable refinement: the multi-round disambiguation protocol.
//!
//! All three variants run the same explicit state machine. The opening
//! request yields a candidate list; the user's choice yields either the
//! refined expression (single-step variants) or, for the recursive
//! variant, another round of candidates. The client places no bound on the
//! number of rounds; termination comes from the elaborator's finite
//! candidate sets.

use crate::client::{ElabClient, LoadMode};
use crate::edit::EditShape;
use crate::errors::{ClientError, Operation};
use crate::editor::SourceBuffer;
use chisel_wire::decode::{self, RefineRound};
use chisel_wire::{Command, Value};

/// Which refinement protocol variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineStyle {
    /// One candidate round, then materialise the refined expression.
    Plain,
    /// Like `Plain`, with candidates completed against the hole's text.
    WithCompletion,
    /// Recursive disambiguation: rounds continue until the elaborator
    /// produces a final expression.
    Recursive,
}

impl RefineStyle {
    fn opening_command(self, name: &str) -> Command {
        let name = name.to_owned();
        match self {
            Self::Plain => Command::CompatibleIdentifiers { name },
            Self::WithCompletion => Command::CompleteCompatibleIdentifiers { name },
            Self::Recursive => Command::CompatibleIdentifiersRecursive { name },
        }
    }

    fn follow_up_command(self, name: &str, choice: &str) -> Command {
        let name = name.to_owned();
        let choice = choice.to_owned();
        match self {
            Self::Recursive => Command::ChooseIdentifier { name, choice },
            Self::Plain | Self::WithCompletion => {
                Command::MakeRefinedExpression { name, choice }
            }
        }
    }
}

enum RefineState {
    Start,
    AwaitingChoice { candidates: Vec<String> },
    Done { expression: String },
}

impl ElabClient {
    /// Refines the metavariable under the cursor, replacing its `?name`
    /// marker with the expression the disambiguation dialog produces, then
    /// reloads the buffer to re-validate.
    ///
    /// # Errors
    ///
    /// Fails with [`ClientError::NoTargetAtPoint`] when the cursor is not
    /// on a hole, with [`ClientError::MetavariableVanished`] when the
    /// marker was edited away before the final expression arrived, or with
    /// the load/call errors of the underlying protocol.
    pub fn refine_hole(
        &mut self,
        buffer: &mut dyn SourceBuffer,
        style: RefineStyle,
    ) -> Result<(), ClientError> {
        let (name, _line) = buffer
            .identifier_at_cursor()
            .ok_or(ClientError::NoTargetAtPoint)?;
        self.load_if_needed(buffer, LoadMode::Sync)?;

        let mut state = RefineState::Start;
        loop {
            state = match state {
                RefineState::Start => {
                    let value =
                        self.call_sync_for(Operation::Refine, style.opening_command(&name))?;
                    self.flush();
                    let opened = match style {
                        RefineStyle::Recursive => Self::next_round(&value)?,
                        RefineStyle::Plain | RefineStyle::WithCompletion => {
                            let candidates = decode::names(&value).map_err(|source| {
                                ClientError::unexpected_reply(Operation::Refine, source)
                            })?;
                            RefineState::AwaitingChoice { candidates }
                        }
                    };
                    if let RefineState::AwaitingChoice { candidates } = &opened {
                        if candidates.is_empty() {
                            self.presenter_mut()
                                .message(&format!("no compatible identifiers for '?{name}'"));
                            return Ok(());
                        }
                    }
                    opened
                }
                RefineState::AwaitingChoice { candidates } => {
                    let Some(choice) =
                        self.presenter_mut().choose("Refine with", &candidates)
                    else {
                        self.presenter_mut().message("refinement cancelled");
                        return Ok(());
                    };
                    let value = self.call_sync_for(
                        Operation::Refine,
                        style.follow_up_command(&name, &choice),
                    )?;
                    self.flush();
                    match style {
                        RefineStyle::Recursive => Self::next_round(&value)?,
                        RefineStyle::Plain | RefineStyle::WithCompletion => RefineState::Done {
                            expression: decode::text(&value).map_err(|source| {
                                ClientError::unexpected_reply(Operation::Refine, source)
                            })?,
                        },
                    }
                }
                RefineState::Done { expression } => {
                    return self.finish_refinement(buffer, &name, &expression);
                }
            };
        }
    }

    fn next_round(value: &Value) -> Result<RefineState, ClientError> {
        match decode::refine_round(value)
            .map_err(|source| ClientError::unexpected_reply(Operation::Refine, source))?
        {
            RefineRound::MoreChoices(candidates) => {
                Ok(RefineState::AwaitingChoice { candidates })
            }
            RefineRound::Final(expression) => Ok(RefineState::Done { expression }),
        }
    }

    fn finish_refinement(
        &mut self,
        buffer: &mut dyn SourceBuffer,
        name: &str,
        expression: &str,
    ) -> Result<(), ClientError> {
        let marker = format!("?{name}");
        let line = buffer.current_line_text();
        let start = line.find(&marker).ok_or_else(|| ClientError::vanished(name))?;
        self.apply(
            buffer,
            expression,
            EditShape::ReplaceSpan {
                start,
                end: start + marker.len(),
            },
        );
        self.session_mut().mark_dirty(buffer.file_path());
        self.load_if_needed(buffer, LoadMode::Sync)
    }
}
