use tracing::info;

use crate::types::Diagnostic;

/// Where the loop reports each iteration. Nothing depends on delivery.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: &Diagnostic);
}

/// Structured `tracing` event per iteration, under the `hapkit::diag` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        info!(
            target: "hapkit::diag",
            target_position = diagnostic.target_position,
            current_position = diagnostic.current_position,
            force = diagnostic.force,
            "{}",
            diagnostic
        );
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.push(*diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        (**self).emit(diagnostic);
    }
}
