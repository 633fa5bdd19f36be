//! Recorded analysis-gateway responses for tests and demos.

mod types;

pub use types::{FixtureKind, FixtureMeta};

/// Two-step bank alert scam; the first step has traps on fields 0 and 2.
pub const BANK_ALERT: &str = "bank_alert";
/// Three-step parcel fee scam with a trap address bar on every step.
pub const PARCEL_FEE: &str = "parcel_fee";
/// Single-step safe family message with two fields.
pub const GRANDCHILD_RECIPE: &str = "grandchild_recipe";

static FIXTURES: &[(FixtureMeta, &str)] = &[
    (
        FixtureMeta {
            name: BANK_ALERT,
            path: "scam/bank_alert.json",
            kind: FixtureKind::Scam,
            steps: 2,
        },
        include_str!("../fixtures/scam/bank_alert.json"),
    ),
    (
        FixtureMeta {
            name: PARCEL_FEE,
            path: "scam/parcel_fee.json",
            kind: FixtureKind::Scam,
            steps: 3,
        },
        include_str!("../fixtures/scam/parcel_fee.json"),
    ),
    (
        FixtureMeta {
            name: GRANDCHILD_RECIPE,
            path: "safe/grandchild_recipe.json",
            kind: FixtureKind::Safe,
            steps: 1,
        },
        include_str!("../fixtures/safe/grandchild_recipe.json"),
    ),
];

/// Returns metadata for every recorded response.
pub fn list() -> impl Iterator<Item = &'static FixtureMeta> {
    FIXTURES.iter().map(|(meta, _)| meta)
}

/// Looks up fixture metadata by name.
pub fn metadata(name: &str) -> Option<&'static FixtureMeta> {
    FIXTURES
        .iter()
        .find(|(meta, _)| meta.name == name)
        .map(|(meta, _)| meta)
}

/// Returns the raw JSON of a recorded response.
///
/// Panics on unknown names; fixtures are a closed, compiled-in set.
pub fn response(name: &str) -> &'static str {
    FIXTURES
        .iter()
        .find(|(meta, _)| meta.name == name)
        .map(|(_, body)| *body)
        .unwrap_or_else(|| panic!("unknown fixture {name}"))
}
