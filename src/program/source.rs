//! Shader source units.

use crate::device::{ShaderStage, StageSet};

/// Source text of one shader stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    /// Stage the source compiles to. Sources without a stage can't be built.
    pub stage: Option<ShaderStage>,
    pub code: String,
    /// Name used in diagnostics, typically the file the source came from.
    pub label: Option<String>,
}

impl ShaderSource {
    pub fn new(stage: ShaderStage, code: impl Into<String>) -> Self {
        Self {
            stage: Some(stage),
            code: code.into(),
            label: None,
        }
    }

    /// Source whose stage is not known yet.
    pub fn unstaged(code: impl Into<String>) -> Self {
        Self {
            stage: None,
            code: code.into(),
            label: None,
        }
    }

    pub fn vertex(code: impl Into<String>) -> Self {
        Self::new(ShaderStage::Vertex, code)
    }

    pub fn tess_control(code: impl Into<String>) -> Self {
        Self::new(ShaderStage::TessControl, code)
    }

    pub fn tess_evaluation(code: impl Into<String>) -> Self {
        Self::new(ShaderStage::TessEvaluation, code)
    }

    pub fn geometry(code: impl Into<String>) -> Self {
        Self::new(ShaderStage::Geometry, code)
    }

    pub fn fragment(code: impl Into<String>) -> Self {
        Self::new(ShaderStage::Fragment, code)
    }

    pub fn compute(code: impl Into<String>) -> Self {
        Self::new(ShaderStage::Compute, code)
    }

    pub fn with_stage(mut self, stage: ShaderStage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label for diagnostics, falling back to the stage name.
    pub fn display_name(&self) -> String {
        match (&self.label, self.stage) {
            (Some(label), _) => label.clone(),
            (None, Some(stage)) => format!("<{} source>", stage),
            (None, None) => "<unnamed source>".to_string(),
        }
    }

    /// The code with every line prefixed by its 1-based number and a tab.
    pub fn numbered_listing(&self) -> String {
        let mut listing = String::with_capacity(self.code.len() + self.code.len() / 8);
        for (number, line) in self.code.lines().enumerate() {
            listing.push_str(&format!("{}\t{}\n", number + 1, line));
        }
        listing
    }
}

/// Stages present in `sources`.
pub fn stages_of(sources: &[ShaderSource]) -> StageSet {
    sources
        .iter()
        .filter_map(|source| source.stage)
        .fold(StageSet::empty(), |set, stage| set | stage.flag())
}
