//! Core type definitions for fixture metadata.

/// Verdict the recorded gateway response carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    /// The analysed message was judged a scam (trap-hunting mode).
    Scam,
    /// The analysed message was judged safe (safety-check mode).
    Safe,
}

/// Describes a single recorded gateway response exposed by the `testdata` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureMeta {
    /// Short name used by tests and the CLI.
    pub name: &'static str,
    /// Path relative to the `fixtures/` directory.
    pub path: &'static str,
    /// Judgment recorded in the response.
    pub kind: FixtureKind,
    /// Number of simulation steps.
    pub steps: usize,
}
