use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Wire spelling of the address-bar element.
pub const URL_ELEMENT_ID: &str = "url-trap";

/// Identifier of an inspectable element within a step.
///
/// The address bar gets its own variant so no field id can ever shadow it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementId {
    /// The step's address bar.
    Url,
    /// A field, by its id within the owning step.
    Field(String),
}

impl ElementId {
    /// Shorthand for [`ElementId::Field`].
    pub fn field(id: impl Into<String>) -> Self {
        ElementId::Field(id.into())
    }

    /// Returns the wire spelling of this id.
    pub fn as_str(&self) -> &str {
        match self {
            ElementId::Url => URL_ELEMENT_ID,
            ElementId::Field(id) => id,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == URL_ELEMENT_ID {
            ElementId::Url
        } else {
            ElementId::Field(s.to_owned())
        })
    }
}

impl Serialize for ElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Whether an element is a trap, with the explanation shown once inspected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Deceptive element; the warning explains the trick.
    Trap { warning: Option<String> },
    /// Legitimate element; the reason explains the safety signal.
    Safe { reason: Option<String> },
}

impl Verdict {
    /// Builds the verdict selected by a wire `isTrap` flag.
    pub fn select(is_trap: bool, warning: Option<String>, reason: Option<String>) -> Self {
        if is_trap {
            Verdict::Trap { warning }
        } else {
            Verdict::Safe { reason }
        }
    }

    pub fn is_trap(&self) -> bool {
        matches!(self, Verdict::Trap { .. })
    }

    /// The explanation that is active for this verdict, if the gateway sent one.
    pub fn explanation(&self) -> Option<&str> {
        match self {
            Verdict::Trap { warning } => warning.as_deref(),
            Verdict::Safe { reason } => reason.as_deref(),
        }
    }
}

/// Presentation kind of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Password,
    Button,
    Info,
}

/// One interactive element within a step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimulationField {
    /// Unique within the owning step.
    pub id: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub kind: FieldKind,
    pub verdict: Verdict,
}

impl SimulationField {
    pub fn is_trap(&self) -> bool {
        self.verdict.is_trap()
    }

    /// Element id used when this field is inspected.
    pub fn element_id(&self) -> ElementId {
        ElementId::Field(self.id.clone())
    }
}

/// One screen of the simulated message or site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimulationStep {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub display_url: String,
    /// Verdict for the address bar itself.
    pub url_verdict: Verdict,
    /// Opaque color/category tag.
    pub header_theme: String,
    /// Stable visual and tab order.
    pub fields: Vec<SimulationField>,
    /// Read or shown when the step is first entered.
    pub intro_narration: String,
}

impl SimulationStep {
    pub fn url_is_trap(&self) -> bool {
        self.url_verdict.is_trap()
    }

    /// Looks up a field by id.
    pub fn field(&self, id: &str) -> Option<&SimulationField> {
        self.fields.iter().find(|field| field.id == id)
    }

    /// Returns the verdict of an element, or `None` for ids this step does not own.
    pub fn verdict_of(&self, element: &ElementId) -> Option<&Verdict> {
        match element {
            ElementId::Url => Some(&self.url_verdict),
            ElementId::Field(id) => self.field(id).map(|field| &field.verdict),
        }
    }

    /// Whether inspecting `element` should raise an alert.
    pub fn is_trap(&self, element: &ElementId) -> bool {
        self.verdict_of(element).is_some_and(Verdict::is_trap)
    }

    /// Elements the learner must inspect before the step counts as complete.
    ///
    /// Trap-hunting mode only asks for the deceptive elements; safe mode asks
    /// for every field plus the address bar. Fields keep their visual order and
    /// the address bar comes last.
    pub fn required_elements(&self, is_scam: bool) -> SmallVec<[ElementId; 8]> {
        let mut required: SmallVec<[ElementId; 8]> = self
            .fields
            .iter()
            .filter(|field| !is_scam || field.is_trap())
            .map(SimulationField::element_id)
            .collect();
        if !is_scam || self.url_is_trap() {
            required.push(ElementId::Url);
        }
        required
    }

    /// Number of elements required by [`Self::required_elements`].
    pub fn required_count(&self, is_scam: bool) -> usize {
        let fields = if is_scam {
            self.fields.iter().filter(|field| field.is_trap()).count()
        } else {
            self.fields.len()
        };
        let url = usize::from(!is_scam || self.url_is_trap());
        fields + url
    }
}

/// The whole exercise produced by one analysis call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimulationModel {
    /// Brand or persona name shown in the simulated header.
    pub subject_name: String,
    /// Description for the single background illustration.
    pub art_prompt: String,
    /// Never empty once decoded.
    pub steps: Vec<SimulationStep>,
}

impl SimulationModel {
    pub fn step(&self, index: usize) -> Option<&SimulationStep> {
        self.steps.get(index)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}
