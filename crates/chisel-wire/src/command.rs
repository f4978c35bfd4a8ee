//! Outgoing command encoding.

use crate::value::Value;

/// A single outgoing request body: a wire tag plus its fixed-arity
/// arguments. Commands are immutable once constructed; the dispatcher wraps
/// them in a [`Request`](crate::Request) envelope before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load a source file into the elaborator.
    LoadFile {
        /// File name relative to the working directory.
        path: String,
    },
    /// Evaluate REPL input verbatim; also carries directory changes.
    Interpret {
        /// The input line handed to the elaborator's interpreter.
        input: String,
    },
    /// Ask for the type of a name.
    TypeOf {
        /// Identifier to query.
        name: String,
    },
    /// Split the pattern variable under the cursor into its constructors.
    CaseSplit {
        /// 1-based source line.
        line: u32,
        /// Pattern variable to split.
        name: String,
    },
    /// Generate an initial clause for a declared function.
    AddClause {
        /// 1-based source line.
        line: u32,
        /// Function being given a clause.
        name: String,
    },
    /// Generate an initial clause in proof style.
    AddProofClause {
        /// 1-based source line.
        line: u32,
        /// Function being given a clause.
        name: String,
    },
    /// Generate clauses for missing cases.
    AddMissing {
        /// 1-based source line.
        line: u32,
        /// Function with uncovered cases.
        name: String,
    },
    /// Rewrite the current clause into a `with` block.
    MakeWith {
        /// 1-based source line.
        line: u32,
        /// Function whose clause is rewritten.
        name: String,
    },
    /// Search for an expression filling the hole, optionally guided by hints.
    ProofSearch {
        /// 1-based source line.
        line: u32,
        /// Hole name without the marker.
        name: String,
        /// User-supplied hint identifiers.
        hints: Vec<String>,
    },
    /// Completion candidates for a REPL-style identifier prefix.
    ReplCompletions {
        /// Identifier prefix ending at the cursor.
        prefix: String,
    },
    /// Identifiers compatible with the hole's type.
    CompatibleIdentifiers {
        /// Hole name without the marker.
        name: String,
    },
    /// Compatible identifiers, completed against the hole's partial text.
    CompleteCompatibleIdentifiers {
        /// Hole name without the marker.
        name: String,
    },
    /// Open a recursive disambiguation session for the hole.
    CompatibleIdentifiersRecursive {
        /// Hole name without the marker.
        name: String,
    },
    /// Continue a recursive disambiguation round with a chosen identifier.
    ChooseIdentifier {
        /// Hole name without the marker.
        name: String,
        /// The identifier picked in the previous round.
        choice: String,
    },
    /// Materialise the refined expression from a chosen identifier.
    MakeRefinedExpression {
        /// Hole name without the marker.
        name: String,
        /// The identifier picked by the user.
        choice: String,
    },
}

impl Command {
    /// The wire tag for this command.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::LoadFile { .. } => "load-file",
            Self::Interpret { .. } => "interpret",
            Self::TypeOf { .. } => "type-of",
            Self::CaseSplit { .. } => "case-split",
            Self::AddClause { .. } => "add-clause",
            Self::AddProofClause { .. } => "add-proof-clause",
            Self::AddMissing { .. } => "add-missing",
            Self::MakeWith { .. } => "make-with",
            Self::ProofSearch { .. } => "proof-search",
            Self::ReplCompletions { .. } => "repl-completions",
            Self::CompatibleIdentifiers { .. } => "compatible-identifiers",
            Self::CompleteCompatibleIdentifiers { .. } => "complete-compatible-identifiers",
            Self::CompatibleIdentifiersRecursive { .. } => "compatible-identifiers-recursive",
            Self::ChooseIdentifier { .. } => "choose-identifier",
            Self::MakeRefinedExpression { .. } => "make-refined-expression",
        }
    }

    /// Encodes the command as a tagged list.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut items = vec![Value::atom(self.tag())];
        items.extend(self.arguments());
        Value::List(items)
    }

    fn arguments(&self) -> Vec<Value> {
        match self {
            Self::LoadFile { path } => vec![Value::str(path.clone())],
            Self::Interpret { input } => vec![Value::str(input.clone())],
            Self::TypeOf { name }
            | Self::CompatibleIdentifiers { name }
            | Self::CompleteCompatibleIdentifiers { name }
            | Self::CompatibleIdentifiersRecursive { name } => vec![Value::str(name.clone())],
            Self::CaseSplit { line, name }
            | Self::AddClause { line, name }
            | Self::AddProofClause { line, name }
            | Self::AddMissing { line, name }
            | Self::MakeWith { line, name } => {
                vec![Value::Num(i64::from(*line)), Value::str(name.clone())]
            }
            Self::ProofSearch { line, name, hints } => vec![
                Value::Num(i64::from(*line)),
                Value::str(name.clone()),
                Value::List(hints.iter().cloned().map(Value::str).collect()),
            ],
            Self::ReplCompletions { prefix } => vec![Value::str(prefix.clone())],
            Self::ChooseIdentifier { name, choice }
            | Self::MakeRefinedExpression { name, choice } => {
                vec![Value::str(name.clone()), Value::str(choice.clone())]
            }
        }
    }
}
