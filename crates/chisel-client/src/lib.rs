//! Editor-side client core for an interactive elaborator.
#![deny(missing_docs)]
//!
//! The crate drives a long-running elaborator process through a structured
//! message protocol and layers interactive developer commands on top of
//! that channel: type queries, case splitting, clause generation, proof
//! search, metavariable refinement, and completion. The hard part is the
//! session layer: tracking which buffer the process actually has loaded,
//! serialising edits against synchronous and asynchronous round-trips, and
//! running multi-round disambiguation dialogs. That is what lives here,
//! behind narrow capability traits for the transport
//! ([`Channel`]), the text ([`SourceBuffer`]), and the UI ([`Presenter`],
//! [`DiagnosticsSink`]). Tests inject recording implementations; the host
//! editor injects real ones.

mod adapter;
mod channel;
mod client;
mod dispatch;
mod edit;
mod editor;
mod errors;
mod refine;
mod session;

#[cfg(test)]
mod tests;

pub use adapter::{ElabConfig, ProcessChannel};
pub use channel::{Channel, ProcessLifecycle, TransportFault};
pub use client::{Completion, ElabClient, LoadMode};
pub use edit::{EditShape, PlainApplier, ResultApplier, TemplateApplier};
pub use editor::{DiagnosticsSink, Position, Presenter, SourceBuffer};
pub use errors::{ClientError, Operation};
pub use refine::RefineStyle;
pub use session::Session;

pub use chisel_wire as wire;
