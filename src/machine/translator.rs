//! Translation: turning a transcript into a working machine.

use std::any::Any;
use std::sync::Arc;

use crate::error::{MetaModelError, Result};
use crate::genome::GenomeSegment;

use super::{Activation, Machine, Output};

/// Builds the machine a transcript describes, using the transcript's gene type.
#[derive(Debug)]
pub struct Translator {
    segment: GenomeSegment,
}

impl Translator {
    pub fn new(segment: GenomeSegment) -> Self {
        Self { segment }
    }

    /// The machine described by `transcript`, executing in its environment.
    pub fn translate(&self, transcript: &GenomeSegment) -> Result<Arc<dyn Machine>> {
        transcript.gene_type().construct(transcript.clone())
    }
}

impl Machine for Translator {
    fn segment(&self) -> &GenomeSegment {
        &self.segment
    }

    fn act(&self, activation: Activation<'_>) -> Result<Output> {
        let source = activation
            .source
            .ok_or_else(|| MetaModelError::NoSource(self.name().to_string()))?;
        Ok(Output::Machine(self.translate(source)?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
