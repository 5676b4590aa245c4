use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Serialize, PartialEq, Eq, Debug)]
pub enum ArtifactKind {
    Heatmap,
    Scatter,
    Distribution,
    BoxPlot,
    CategoricalBar,
    Missingness,
    Dashboard,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heatmap => "Correlation heatmap",
            Self::Scatter => "Scatter plot",
            Self::Distribution => "Distribution",
            Self::BoxPlot => "Box plot",
            Self::CategoricalBar => "Value counts",
            Self::Missingness => "Missing values",
            Self::Dashboard => "Dashboard",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chart file written to the output directory.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct ArtifactEntry {
    /// File name, also the path relative to the output directory.
    pub name: String,
    pub title: String,
    pub kind: ArtifactKind,
}

impl ArtifactEntry {
    pub fn relative_path(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub enum OmitReason {
    /// The data does not call for this chart.
    Skipped(String),
    /// Drawing was attempted and errored.
    Failed(String),
}

impl fmt::Display for OmitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped(why) => write!(f, "skipped: {why}"),
            Self::Failed(why) => write!(f, "failed: {why}"),
        }
    }
}

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct OmittedArtifact {
    pub name: String,
    pub kind: ArtifactKind,
    pub reason: OmitReason,
}

/// Produced charts in production order, plus the ones that were not.
#[derive(Clone, Serialize, Debug, Default, PartialEq, Eq)]
pub struct VisualizationManifest {
    pub entries: Vec<ArtifactEntry>,
    pub omitted: Vec<OmittedArtifact>,
}

impl VisualizationManifest {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn count_of(&self, kind: ArtifactKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &OmittedArtifact> {
        self.omitted
            .iter()
            .filter(|o| matches!(o.reason, OmitReason::Failed(_)))
    }
}
