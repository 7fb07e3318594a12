//! Build environment queries used by the probe engine
//!
//! This module provides:
//! - The `ProbeEnvironment` capability trait
//! - `SystemEnvironment`, backed by pkg-config and the C compiler
//! - `FixedEnvironment`, answering from a fixed table

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

/// Default bound for a single external probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Answer of a package-config lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageConfigLookup {
    /// No package-config tool to ask
    Unavailable,
    /// The tool does not know the module
    NotFound,
    Found {
        version: String,
        cflags: Vec<String>,
        libs: Vec<String>,
    },
}

/// Answer of a link probe for a symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCheck {
    Linked,
    Missing,
    /// The probe itself could not be carried out
    Inconclusive(String),
}

/// Read-only view of the build environment
///
/// Implementations must give the same answer to the same question within
/// one run.
#[async_trait]
pub trait ProbeEnvironment: Send + Sync {
    async fn package_config(&self, module: &str) -> PackageConfigLookup;

    async fn has_header(&self, header: &str, cppflags: &[String]) -> bool;

    async fn link_symbol(&self, symbol: &str, ldflags: &[String]) -> LinkCheck;

    fn path_exists(&self, path: &Path) -> bool;
}

/// Outcome of running an external tool
enum ToolRun {
    Finished(Output),
    SpawnFailed(std::io::Error),
    TimedOut,
}

/// Environment backed by the real toolchain
#[derive(Debug, Clone)]
pub struct SystemEnvironment {
    compiler: String,
    pkg_config: String,
    timeout: Duration,
}

impl Default for SystemEnvironment {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl SystemEnvironment {
    /// Use `$CC` and `$PKG_CONFIG` when set, like configure does
    pub fn new(timeout: Duration) -> Self {
        Self {
            compiler: std::env::var("CC").unwrap_or_else(|_| "cc".to_string()),
            pkg_config: std::env::var("PKG_CONFIG").unwrap_or_else(|_| "pkg-config".to_string()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn run(&self, program: &str, args: &[String], cwd: Option<&Path>) -> ToolRun {
        let mut command = TokioCommand::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return ToolRun::SpawnFailed(e),
        };

        // kill_on_drop reaps the child when the timeout drops the future
        match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => ToolRun::Finished(output),
            Ok(Err(e)) => ToolRun::SpawnFailed(e),
            Err(_) => {
                tracing::warn!(
                    "{} timed out after {} seconds",
                    program,
                    self.timeout.as_secs()
                );
                ToolRun::TimedOut
            }
        }
    }

    async fn pkg_config_query(&self, flag: &str, module: &str) -> Option<String> {
        let args = vec![flag.to_string(), module.to_string()];
        match self.run(&self.pkg_config, &args, None).await {
            ToolRun::Finished(out) if out.status.success() => {
                Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
            }
            _ => None,
        }
    }

    /// Write a probe program into a fresh directory
    fn write_probe(source: &str) -> std::io::Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("conftest.c"), source)?;
        Ok(dir)
    }
}

#[async_trait]
impl ProbeEnvironment for SystemEnvironment {
    async fn package_config(&self, module: &str) -> PackageConfigLookup {
        let args = vec!["--modversion".to_string(), module.to_string()];
        let version = match self.run(&self.pkg_config, &args, None).await {
            ToolRun::Finished(out) if out.status.success() => {
                String::from_utf8_lossy(&out.stdout).trim().to_string()
            }
            ToolRun::Finished(_) => return PackageConfigLookup::NotFound,
            ToolRun::SpawnFailed(e) => {
                tracing::debug!("{} not usable: {}", self.pkg_config, e);
                return PackageConfigLookup::Unavailable;
            }
            ToolRun::TimedOut => return PackageConfigLookup::Unavailable,
        };

        let cflags = self.pkg_config_query("--cflags", module).await;
        let libs = self.pkg_config_query("--libs", module).await;
        match (cflags, libs) {
            (Some(cflags), Some(libs)) => PackageConfigLookup::Found {
                version,
                cflags: cflags.split_whitespace().map(String::from).collect(),
                libs: libs.split_whitespace().map(String::from).collect(),
            },
            _ => PackageConfigLookup::NotFound,
        }
    }

    async fn has_header(&self, header: &str, cppflags: &[String]) -> bool {
        let dir = match Self::write_probe(&format!("#include <{}>\n", header)) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("Unable to write header probe for {}: {}", header, e);
                return false;
            }
        };

        let mut args = vec!["-E".to_string()];
        args.extend(cppflags.iter().cloned());
        args.push("conftest.c".to_string());

        matches!(
            self.run(&self.compiler, &args, Some(dir.path())).await,
            ToolRun::Finished(out) if out.status.success()
        )
    }

    async fn link_symbol(&self, symbol: &str, ldflags: &[String]) -> LinkCheck {
        // Same shape as AC_CHECK_LIB: declare, call, link.
        let source = format!(
            "char {symbol}(void);\nint main(void)\n{{\n\treturn( (int) {symbol}() );\n}}\n"
        );
        let dir = match Self::write_probe(&source) {
            Ok(dir) => dir,
            Err(e) => return LinkCheck::Inconclusive(format!("unable to write link probe: {}", e)),
        };

        let mut args = vec![
            "conftest.c".to_string(),
            "-o".to_string(),
            "conftest".to_string(),
        ];
        args.extend(ldflags.iter().cloned());

        match self.run(&self.compiler, &args, Some(dir.path())).await {
            ToolRun::Finished(out) if out.status.success() => LinkCheck::Linked,
            ToolRun::Finished(_) => LinkCheck::Missing,
            ToolRun::SpawnFailed(e) => {
                LinkCheck::Inconclusive(format!("unable to run {}: {}", self.compiler, e))
            }
            ToolRun::TimedOut => LinkCheck::Inconclusive(format!(
                "{} timed out after {} seconds",
                self.compiler,
                self.timeout.as_secs()
            )),
        }
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Environment answering from a fixed table
///
/// Every question not configured gets a negative answer. Package-config is
/// unavailable unless a package is added.
#[derive(Debug, Default)]
pub struct FixedEnvironment {
    package_config_available: bool,
    packages: HashMap<String, (String, Vec<String>, Vec<String>)>,
    headers: HashSet<String>,
    symbols: HashMap<String, LinkCheck>,
    paths: HashSet<PathBuf>,
    package_config_queries: AtomicUsize,
    header_queries: Mutex<Vec<(String, Vec<String>)>>,
}

impl FixedEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Package-config is present but knows no packages yet
    pub fn with_package_config(mut self) -> Self {
        self.package_config_available = true;
        self
    }

    pub fn with_package(mut self, module: &str, version: &str, cflags: &[&str], libs: &[&str]) -> Self {
        self.package_config_available = true;
        self.packages.insert(
            module.to_string(),
            (
                version.to_string(),
                cflags.iter().map(|s| s.to_string()).collect(),
                libs.iter().map(|s| s.to_string()).collect(),
            ),
        );
        self
    }

    pub fn with_header(mut self, header: &str) -> Self {
        self.headers.insert(header.to_string());
        self
    }

    pub fn with_symbol(mut self, symbol: &str, check: LinkCheck) -> Self {
        self.symbols.insert(symbol.to_string(), check);
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(path.into());
        self
    }

    /// Number of package-config lookups answered so far
    pub fn package_config_queries(&self) -> usize {
        self.package_config_queries.load(Ordering::SeqCst)
    }

    /// Header lookups answered so far, with the cppflags they carried
    pub fn header_queries(&self) -> Vec<(String, Vec<String>)> {
        self.header_queries
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProbeEnvironment for FixedEnvironment {
    async fn package_config(&self, module: &str) -> PackageConfigLookup {
        self.package_config_queries.fetch_add(1, Ordering::SeqCst);
        if !self.package_config_available {
            return PackageConfigLookup::Unavailable;
        }
        match self.packages.get(module) {
            Some((version, cflags, libs)) => PackageConfigLookup::Found {
                version: version.clone(),
                cflags: cflags.clone(),
                libs: libs.clone(),
            },
            None => PackageConfigLookup::NotFound,
        }
    }

    async fn has_header(&self, header: &str, cppflags: &[String]) -> bool {
        if let Ok(mut queries) = self.header_queries.lock() {
            queries.push((header.to_string(), cppflags.to_vec()));
        }
        self.headers.contains(header)
    }

    async fn link_symbol(&self, symbol: &str, _ldflags: &[String]) -> LinkCheck {
        self.symbols
            .get(symbol)
            .cloned()
            .unwrap_or(LinkCheck::Missing)
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }
}
