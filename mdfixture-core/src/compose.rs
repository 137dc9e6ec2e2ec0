use tracing::{debug, info};

use crate::blocks::{BlockRequest, BlockSpec, DocumentBlockBuilder};
use crate::error::FixtureError;
use crate::random::RandomContentProvider;

/// Assembles blocks into one markdown document.
///
/// Blocks keep their input order and are separated by a blank line; the
/// document ends with one trailing blank line.
pub struct DocumentComposer {
    builder: DocumentBlockBuilder,
}

impl DocumentComposer {
    pub fn new(provider: RandomContentProvider) -> Self {
        Self {
            builder: DocumentBlockBuilder::new(provider),
        }
    }

    pub fn provider_mut(&mut self) -> &mut RandomContentProvider {
        self.builder.provider_mut()
    }

    /// Unrecognized block kinds are skipped without error.
    pub fn generate(&mut self, requests: &[BlockRequest]) -> Result<String, FixtureError> {
        let mut specs = Vec::with_capacity(requests.len());
        for request in requests {
            match BlockSpec::from_request(request)? {
                Some(spec) => specs.push(spec),
                None => debug!(kind = %request.block, "Skipping unsupported block kind"),
            }
        }
        self.compose(&specs)
    }

    pub fn compose(&mut self, specs: &[BlockSpec]) -> Result<String, FixtureError> {
        let blocks = specs
            .iter()
            .map(|spec| self.builder.render(spec))
            .collect::<Result<Vec<_>, _>>()?;
        info!(blocks = blocks.len(), "Composed markdown document");
        Ok(blocks.join("\n") + "\n")
    }
}
