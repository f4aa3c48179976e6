//! Transcription: the first step of gene expression.

use std::any::Any;

use crate::error::{MetaModelError, Result};
use crate::genome::{GeneUnit, GenomeSegment};

use super::{Activation, Machine, Output};

/// Copies a source segment keeping only its coding units.
#[derive(Debug)]
pub struct Transcriber {
    segment: GenomeSegment,
}

impl Transcriber {
    pub fn new(segment: GenomeSegment) -> Self {
        Self { segment }
    }

    /// Transcript of `source`: same type and environment, coding units only.
    pub fn transcribe(&self, source: &GenomeSegment) -> GenomeSegment {
        source.filtered(GeneUnit::is_coding)
    }
}

impl Machine for Transcriber {
    fn segment(&self) -> &GenomeSegment {
        &self.segment
    }

    fn act(&self, activation: Activation<'_>) -> Result<Output> {
        let source = activation
            .source
            .ok_or_else(|| MetaModelError::NoSource(self.name().to_string()))?;
        Ok(Output::Segment(self.transcribe(source)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
