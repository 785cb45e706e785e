use rayon::prelude::*;

use crate::compile::compiler::TimelineCompiler;
use crate::compile::plan::RenderPlan;
use crate::container::classify::{ClassifiedChunk, classify};
use crate::container::inspect::Inspection;
use crate::container::scanner::{CancelToken, ChunkScanner};
use crate::extract::model::ExtractedProject;
use crate::extract::project::extract_project;
use crate::foundation::config::ConvertConfig;
use crate::foundation::diagnostics::Diagnostics;
use crate::foundation::error::AeplanResult;
use crate::pipeline::stage::{PipelineFailure, PipelineState, Stage};
use crate::resolve::merge::{MergeFieldMap, resolve_template};
use crate::template::builder::TemplateBuilder;
use crate::template::model::Template;

/// Extraction result plus the warnings raised while producing it.
#[derive(Clone, Debug)]
pub struct Extraction {
    /// Extracted entities.
    pub project: ExtractedProject,
    /// Recoverable conditions, in the order raised.
    pub diagnostics: Diagnostics,
}

/// Drives one conversion through its stages.
///
/// A pipeline borrows an immutable configuration and owns nothing else, so independent
/// pipelines can run concurrently. Every method records the stage it stopped in; see
/// [`Pipeline::state`].
#[derive(Clone, Debug)]
pub struct Pipeline<'c> {
    config: &'c ConvertConfig,
    cancel: Option<CancelToken>,
    state: PipelineState,
}

impl<'c> Pipeline<'c> {
    /// Pipeline over `config`.
    pub fn new(config: &'c ConvertConfig) -> Self {
        Self {
            config,
            cancel: None,
            state: PipelineState::Idle,
        }
    }

    /// Observe `token` while scanning; cancellation surfaces as `Timeout`.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// State after the latest call.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn stage<T>(
        &mut self,
        stage: Stage,
        f: impl FnOnce() -> AeplanResult<T>,
    ) -> Result<T, PipelineFailure> {
        let _span = tracing::debug_span!("stage", %stage).entered();
        f().map_err(|error| {
            tracing::error!(%stage, %error, "conversion failed");
            self.state = PipelineState::Failed(stage);
            PipelineFailure::new(stage, error)
        })
    }

    fn scanner<'a>(&mut self, buf: &'a [u8]) -> Result<ChunkScanner<'a>, PipelineFailure>
    where
        'c: 'a,
    {
        let config = self.config;
        let cancel = self.cancel.clone();
        self.stage(Stage::Scanning, || {
            config.strategy.ensure_supported()?;
            let scanner = ChunkScanner::new(buf, config)?;
            Ok(match cancel {
                Some(token) => scanner.with_cancel(token),
                None => scanner,
            })
        })
    }

    /// List the container's chunks without extracting anything.
    pub fn inspect(&mut self, buf: &[u8]) -> Result<Inspection, PipelineFailure> {
        let scanner = self.scanner(buf)?;
        let inspection = self.stage(Stage::Scanning, || Inspection::collect(&scanner))?;
        self.state = PipelineState::Completed(Stage::Scanning);
        Ok(inspection)
    }

    /// Scan, classify and extract.
    #[tracing::instrument(level = "info", skip_all, fields(bytes = buf.len()))]
    pub fn extract(&mut self, buf: &[u8]) -> Result<Extraction, PipelineFailure> {
        let config = self.config;
        let scanner = self.scanner(buf)?;
        let chunks = self.stage(Stage::Scanning, || scanner.scan_all())?;
        tracing::debug!(chunks = chunks.len(), "scan finished");

        let classified = self.stage(Stage::Classifying, || {
            Ok(chunks.iter().map(classify).collect::<Vec<ClassifiedChunk>>())
        })?;

        let mut diagnostics = Diagnostics::new();
        let project = self.stage(Stage::Extracting, || {
            extract_project(classified, scanner.form_type(), config, &mut diagnostics)
        })?;
        self.state = PipelineState::Completed(Stage::Extracting);
        Ok(Extraction {
            project,
            diagnostics,
        })
    }

    /// Container bytes to [`Template`].
    #[tracing::instrument(level = "info", skip_all, fields(bytes = buf.len()))]
    pub fn template(&mut self, buf: &[u8]) -> Result<Template, PipelineFailure> {
        let config = self.config;
        let Extraction {
            project,
            diagnostics,
        } = self.extract(buf)?;
        let template = self.stage(Stage::Building, || {
            TemplateBuilder::new(config).build(&project, diagnostics.warnings())
        })?;
        self.state = PipelineState::Completed(Stage::Building);
        Ok(template)
    }

    /// Container bytes to [`RenderPlan`], resolving merge fields from `runtime`.
    #[tracing::instrument(level = "info", skip_all, fields(bytes = buf.len()))]
    pub fn compile(
        &mut self,
        buf: &[u8],
        runtime: &MergeFieldMap,
    ) -> Result<RenderPlan, PipelineFailure> {
        let template = self.template(buf)?;
        self.compile_template(&template, runtime)
    }

    /// Resolve and compile an existing template.
    ///
    /// The plan's warnings start with the template's recorded warnings and continue with those
    /// raised while resolving and compiling.
    #[tracing::instrument(level = "info", skip_all, fields(runtime = runtime.len()))]
    pub fn compile_template(
        &mut self,
        template: &Template,
        runtime: &MergeFieldMap,
    ) -> Result<RenderPlan, PipelineFailure> {
        let config = self.config;
        let mut diag = Diagnostics::from_warnings(template.metadata.warnings.clone());
        let resolved = self.stage(Stage::Resolving, || {
            resolve_template(template, runtime, config.resolver, &mut diag)
        })?;
        let mut plan = self.stage(Stage::Compiling, || {
            TimelineCompiler::new(config).compile(&resolved, &mut diag)
        })?;
        plan.warnings = diag.into_warnings();
        self.state = PipelineState::Compiled;
        Ok(plan)
    }
}

/// Container bytes to [`Template`] with a fresh pipeline.
pub fn convert(buf: &[u8], config: &ConvertConfig) -> Result<Template, PipelineFailure> {
    Pipeline::new(config).template(buf)
}

/// Container bytes to [`RenderPlan`] with a fresh pipeline.
pub fn compile(
    buf: &[u8],
    runtime: &MergeFieldMap,
    config: &ConvertConfig,
) -> Result<RenderPlan, PipelineFailure> {
    Pipeline::new(config).compile(buf, runtime)
}

/// Convert independent buffers in parallel. Results keep input order.
#[tracing::instrument(level = "info", skip_all, fields(inputs = inputs.len()))]
pub fn convert_batch<B>(
    inputs: &[B],
    config: &ConvertConfig,
) -> Vec<Result<Template, PipelineFailure>>
where
    B: AsRef<[u8]> + Sync,
{
    inputs
        .par_iter()
        .map(|buf| convert(buf.as_ref(), config))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/run.rs"]
mod tests;
