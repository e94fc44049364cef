//! Transformation templates
//!
//! A template is a JSON array of steps, each naming a transformation mode and
//! optionally overriding the index range and mask classes for that step:
//!
//! ```json
//! [
//!   {"StartIndex": 0, "EndIndex": 2, "Verbose": false, "ReplacementMask": "uld",
//!    "Bypass": false, "TransformationMode": "mask"}
//! ]
//! ```

use crate::error::{Result, TransformError};
use crate::mask::MaskClasses;
use crate::transform::{IndexRange, TransformContext};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One step of a template
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateStep {
    #[serde(default)]
    pub start_index: Option<usize>,
    #[serde(default)]
    pub end_index: Option<usize>,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub replacement_mask: String,
    #[serde(default)]
    pub bypass: bool,
    pub transformation_mode: String,
}

impl TemplateStep {
    /// The run context with this step's overrides applied
    ///
    /// A missing `EndIndex` defaults to `StartIndex`; an empty
    /// `ReplacementMask` keeps the run's classes.
    pub fn context(&self, base: &TransformContext) -> Result<TransformContext> {
        let mut ctx = base.clone();

        match (self.start_index, self.end_index) {
            (Some(start), Some(end)) => ctx.index_range = IndexRange::new(start, end)?,
            (Some(start), None) => ctx.index_range = IndexRange::single(start),
            (None, Some(end)) => ctx.index_range = IndexRange::new(base.index_range.start, end)?,
            (None, None) => {}
        }

        if !self.replacement_mask.is_empty() {
            ctx.classes = MaskClasses::from_letters(&self.replacement_mask)?;
        }

        Ok(ctx)
    }
}

/// Parse template JSON; `path` is only used for error reporting
pub fn parse_template(json: &str, path: &Path) -> Result<Vec<TemplateStep>> {
    serde_json::from_str(json).map_err(|source| TransformError::MalformedInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a template file
pub fn load_template(path: &Path) -> Result<Vec<TemplateStep>> {
    let json = fs::read_to_string(path)?;
    parse_template(&json, path)
}
