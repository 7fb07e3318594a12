//! One generation run: probe, plan, render, emit
//!
//! Dependencies are probed first, sequentially and through the run cache.
//! Every artifact is then rendered independently on the blocking pool and
//! written only once its whole text is known.

use crate::config::ProjectConfig;
use crate::emit::{emit, Artifact, ArtifactKind, OutputWriter};
use crate::error::{GenerateError, Result};
use crate::params::{ParameterResolver, ParameterSet};
use crate::probe::{DependencyDescriptor, DependencyProber, ProbeEnvironment, ProbeResult};
use crate::templates::{render, Template, TemplateCorpus};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;

/// A dependency together with how it was resolved
#[derive(Debug, Clone)]
pub struct ResolvedDependency {
    pub descriptor: DependencyDescriptor,
    pub result: ProbeResult,
}

/// Everything needed to render one artifact
#[derive(Debug, Clone)]
pub struct ArtifactPlan {
    pub kind: ArtifactKind,
    pub destination: PathBuf,
    /// Rendered in order and concatenated
    pub templates: Vec<Template>,
    pub base: ParameterSet,
    pub probe: Option<ProbeResult>,
}

/// An artifact that could not be produced
#[derive(Debug)]
pub struct ArtifactFailure {
    /// Destination, or template name when the destination is unknown
    pub unit: String,
    pub error: GenerateError,
}

/// Outcome of a generation run
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub dependencies: Vec<ResolvedDependency>,
    pub written: Vec<(ArtifactKind, PathBuf)>,
    pub failures: Vec<ArtifactFailure>,
    /// The run stopped early; artifacts after the last written one were skipped
    pub cancelled: bool,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

/// Drives generation runs over one corpus and environment
pub struct Generator<E> {
    corpus: TemplateCorpus,
    prober: DependencyProber<E>,
    cancel: Arc<AtomicBool>,
}

impl<E: ProbeEnvironment> Generator<E> {
    pub fn new(corpus: TemplateCorpus, env: E) -> Self {
        Self {
            corpus,
            prober: DependencyProber::new(env),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop the run between artifacts once `cancel` is set
    ///
    /// A write in progress always completes, so no destination is left half
    /// written.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn corpus(&self) -> &TemplateCorpus {
        &self.corpus
    }

    pub fn prober(&self) -> &DependencyProber<E> {
        &self.prober
    }

    /// Probe every configured dependency, stopping at the first fatal error
    pub async fn probe_dependencies(
        &mut self,
        config: &ProjectConfig,
    ) -> Result<Vec<ResolvedDependency>> {
        let mut resolved = Vec::with_capacity(config.dependencies.len());
        for descriptor in &config.dependencies {
            let result = self.prober.probe(descriptor).await?;
            resolved.push(ResolvedDependency {
                descriptor: descriptor.clone(),
                result,
            });
        }
        Ok(resolved)
    }

    /// Work out every artifact of the run
    ///
    /// Units whose destination cannot be derived are reported as failures;
    /// two units sharing a destination abort planning.
    pub fn plan(
        &self,
        config: &ProjectConfig,
        dependencies: &[ResolvedDependency],
    ) -> Result<(Vec<ArtifactPlan>, Vec<ArtifactFailure>)> {
        let mut units: Vec<(ArtifactKind, Vec<Template>, ParameterSet, Option<ProbeResult>)> =
            Vec::new();
        let library = config.library_parameters();

        for kind in [ArtifactKind::LibrarySource, ArtifactKind::HeaderStub] {
            for template in self.corpus.templates(kind) {
                units.push((kind, vec![template.clone()], library.clone(), None));
            }
        }

        if self.corpus.templates(ArtifactKind::TestSource).next().is_some() {
            let sections: Vec<Template> = self
                .corpus
                .type_test_sections()?
                .into_iter()
                .cloned()
                .collect();
            for ty in &config.library.types {
                units.push((
                    ArtifactKind::TestSource,
                    sections.clone(),
                    config.type_parameters(ty),
                    None,
                ));
            }
        }

        for dependency in dependencies {
            let mut base = library.clone();
            base.merge(&dependency.result.tokens(&dependency.descriptor))?;
            for template in self.corpus.templates(ArtifactKind::BuildMacro) {
                units.push((
                    ArtifactKind::BuildMacro,
                    vec![template.clone()],
                    base.clone(),
                    Some(dependency.result.clone()),
                ));
            }
        }

        let mut plans = Vec::with_capacity(units.len());
        let mut failures = Vec::new();
        let mut destinations = BTreeSet::new();
        for (kind, templates, base, probe) in units {
            let Some(first) = templates.first() else {
                continue;
            };
            let name = first.name().to_string();
            let destination = ParameterResolver::new(base.clone())
                .resolve(kind.destination_tokens().iter().copied(), &name)
                .and_then(|params| kind.destination(&name, &params));
            match destination {
                Ok(destination) => {
                    if !destinations.insert(destination.clone()) {
                        return Err(GenerateError::DuplicateDestination { path: destination });
                    }
                    plans.push(ArtifactPlan {
                        kind,
                        destination,
                        templates,
                        base,
                        probe,
                    });
                }
                Err(error) => failures.push(ArtifactFailure { unit: name, error }),
            }
        }

        plans.sort_by(|a, b| a.destination.cmp(&b.destination));
        Ok((plans, failures))
    }

    /// Render all plans concurrently; results come back in plan order
    pub async fn render_plans(
        plans: Vec<ArtifactPlan>,
    ) -> Vec<(PathBuf, Result<Artifact>)> {
        let mut tasks = JoinSet::new();
        for (index, plan) in plans.into_iter().enumerate() {
            tasks.spawn_blocking(move || {
                let destination = plan.destination.clone();
                (index, destination, render_plan(&plan))
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => tracing::warn!("Render task cancelled: {}", e),
            }
        }
        results.sort_by_key(|(index, _, _)| *index);
        results
            .into_iter()
            .map(|(_, destination, result)| (destination, result))
            .collect()
    }

    /// Full run: probe, plan, render, write
    pub async fn generate(
        &mut self,
        config: &ProjectConfig,
        writer: &dyn OutputWriter,
    ) -> Result<GenerationReport> {
        let dependencies = self.probe_dependencies(config).await?;
        let (plans, mut failures) = self.plan(config, &dependencies)?;
        tracing::info!("Planned {} artifact(s)", plans.len());

        let mut written = Vec::new();
        let mut cancelled = false;
        for (destination, result) in Self::render_plans(plans).await {
            if self.is_cancelled() {
                tracing::warn!("Run cancelled before {}", destination.display());
                cancelled = true;
                break;
            }
            let outcome = result.and_then(|artifact| {
                writer.write_artifact(&artifact)?;
                Ok(artifact.kind)
            });
            match outcome {
                Ok(kind) => written.push((kind, destination)),
                Err(error) => {
                    tracing::warn!("Skipping {}: {}", destination.display(), error);
                    failures.push(ArtifactFailure {
                        unit: destination.display().to_string(),
                        error,
                    });
                }
            }
        }

        Ok(GenerationReport {
            dependencies,
            written,
            failures,
            cancelled,
        })
    }
}

/// Render one plan into its artifact
///
/// Sections are resolved and rendered one by one; any failure drops the whole
/// artifact.
pub fn render_plan(plan: &ArtifactPlan) -> Result<Artifact> {
    let resolver = ParameterResolver::new(plan.base.clone());
    let Some(first) = plan.templates.first() else {
        return Err(GenerateError::MissingTemplate {
            name: plan.destination.display().to_string(),
        });
    };

    let mut text = String::new();
    for template in &plan.templates {
        let params = resolver.resolve_template(template)?;
        text.push_str(&render(template, &params)?);
    }

    let params = resolver.resolve(plan.kind.destination_tokens().iter().copied(), first.name())?;
    emit(plan.kind, first.name(), text, &params, plan.probe.as_ref())
}
