//! The staged decision procedure for one dependency

use super::descriptor::{DependencyDescriptor, OverrideValue};
use super::env::{LinkCheck, PackageConfigLookup, ProbeEnvironment};
use super::result::{ProbeOutcome, ProbeResult};
use super::version::meets_minimum;
use crate::error::{GenerateError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Probes dependencies against an environment, once per name per run
pub struct DependencyProber<E> {
    env: E,
    cache: HashMap<String, ProbeResult>,
}

impl<E: ProbeEnvironment> DependencyProber<E> {
    pub fn new(env: E) -> Self {
        Self {
            env,
            cache: HashMap::new(),
        }
    }

    pub fn environment(&self) -> &E {
        &self.env
    }

    /// A result already produced in this run
    pub fn cached(&self, name: &str) -> Option<&ProbeResult> {
        self.cache.get(name)
    }

    /// Resolve a dependency, reusing an earlier result for the same name
    pub async fn probe(&mut self, dependency: &DependencyDescriptor) -> Result<ProbeResult> {
        if let Some(result) = self.cache.get(&dependency.name) {
            tracing::debug!("{}: using cached probe result", dependency.name);
            return Ok(result.clone());
        }

        let result = decide(&self.env, dependency).await?;
        tracing::info!(
            "{}: {} ({})",
            dependency.name,
            result.outcome,
            result.define_pairs().join(" ")
        );
        self.cache.insert(dependency.name.clone(), result.clone());
        Ok(result)
    }
}

/// Run the decision procedure without caching
///
/// Order: user override, explicit disable, package-config, manual probe,
/// local fallback. The first stage that concludes wins. A required
/// dependency never falls back to the local copy.
pub async fn decide<E>(env: &E, dependency: &DependencyDescriptor) -> Result<ProbeResult>
where
    E: ProbeEnvironment + ?Sized,
{
    match &dependency.override_value {
        OverrideValue::Path(path) => return probe_override(env, dependency, path).await,
        OverrideValue::Disabled => {
            tracing::debug!("{}: disabled by override", dependency.name);
            return Ok(ProbeResult::new(
                dependency,
                ProbeOutcome::Disabled,
                Vec::new(),
                Vec::new(),
                None,
            ));
        }
        OverrideValue::Auto | OverrideValue::Required => {}
    }

    if let Some(result) = probe_package_config(env, dependency).await {
        return Ok(result);
    }
    if let Some(result) = probe_manual(env, dependency).await {
        return Ok(result);
    }
    if dependency.override_value == OverrideValue::Required {
        return Err(GenerateError::RequiredMissing {
            dependency: dependency.name.clone(),
        });
    }
    Ok(local_fallback(dependency))
}

async fn probe_override<E>(
    env: &E,
    dependency: &DependencyDescriptor,
    path: &Path,
) -> Result<ProbeResult>
where
    E: ProbeEnvironment + ?Sized,
{
    if !env.path_exists(path) {
        return Err(GenerateError::PathNotFound {
            dependency: dependency.name.clone(),
            path: path.to_path_buf(),
        });
    }

    let cppflags = vec![format!("-I{}", path.join("include").display())];
    let mut ldflags = vec![format!("-L{}", path.join("lib").display())];
    let usable = symbol_available(env, dependency, &cppflags, &ldflags).await;
    if !usable {
        return Err(GenerateError::OverrideUnusable {
            dependency: dependency.name.clone(),
            path: path.to_path_buf(),
        });
    }

    ldflags.push(format!("-l{}", dependency.link_name()));
    Ok(ProbeResult::new(
        dependency,
        ProbeOutcome::SystemViaManualProbe,
        cppflags,
        ldflags,
        Some(path.to_path_buf()),
    ))
}

async fn probe_package_config<E>(env: &E, dependency: &DependencyDescriptor) -> Option<ProbeResult>
where
    E: ProbeEnvironment + ?Sized,
{
    let module = dependency.library_id();
    match env.package_config(&module).await {
        PackageConfigLookup::Found {
            version,
            cflags,
            libs,
        } => {
            if meets_minimum(&version, &dependency.min_version) {
                Some(ProbeResult::new(
                    dependency,
                    ProbeOutcome::SystemViaPackageConfig,
                    cflags,
                    libs,
                    None,
                ))
            } else {
                tracing::debug!(
                    "{}: pkg-config reports {} below minimum {}",
                    dependency.name,
                    version,
                    dependency.min_version
                );
                None
            }
        }
        PackageConfigLookup::NotFound => {
            tracing::debug!("{}: {} not known to pkg-config", dependency.name, module);
            None
        }
        PackageConfigLookup::Unavailable => {
            tracing::debug!("{}: pkg-config unavailable", dependency.name);
            None
        }
    }
}

async fn probe_manual<E>(env: &E, dependency: &DependencyDescriptor) -> Option<ProbeResult>
where
    E: ProbeEnvironment + ?Sized,
{
    if !symbol_available(env, dependency, &[], &[]).await {
        return None;
    }
    Some(ProbeResult::new(
        dependency,
        ProbeOutcome::SystemViaManualProbe,
        Vec::new(),
        vec![format!("-l{}", dependency.link_name())],
        None,
    ))
}

/// Header present and representative symbol links
async fn symbol_available<E>(
    env: &E,
    dependency: &DependencyDescriptor,
    cppflags: &[String],
    ldflags: &[String],
) -> bool
where
    E: ProbeEnvironment + ?Sized,
{
    let header = dependency.header();
    if !env.has_header(&header, cppflags).await {
        tracing::debug!("{}: header {} not found", dependency.name, header);
        return false;
    }

    let symbol = dependency.symbol();
    let mut link_flags = ldflags.to_vec();
    link_flags.push(format!("-l{}", dependency.link_name()));
    match env.link_symbol(&symbol, &link_flags).await {
        LinkCheck::Linked => true,
        LinkCheck::Missing => {
            tracing::debug!("{}: symbol {} missing", dependency.name, symbol);
            false
        }
        LinkCheck::Inconclusive(reason) => {
            tracing::warn!(
                "{}: header {} present but probe for {} was inconclusive ({}), treating as absent",
                dependency.name,
                header,
                symbol,
                reason
            );
            false
        }
    }
}

fn local_fallback(dependency: &DependencyDescriptor) -> ProbeResult {
    match dependency.local_fallback() {
        Some(path) => {
            let library_id = dependency.library_id();
            ProbeResult::new(
                dependency,
                ProbeOutcome::LocalFallback,
                vec![format!("-I{}", path.display())],
                vec![path.join(format!("{}.la", library_id)).display().to_string()],
                Some(path),
            )
        }
        None => ProbeResult::new(dependency, ProbeOutcome::Absent, Vec::new(), Vec::new(), None),
    }
}
