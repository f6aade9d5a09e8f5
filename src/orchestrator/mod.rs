//! Build orchestrator.
//!
//! One pass per invocation through
//! `ResolveConfig → ResolveFeatures → AcquireResources → [PatchBranding →]
//! InvokeCompiler → [RestoreBranding →] AssemblePlatformArtifact → Done`.
//! Every state runs to completion before the next starts and any error ends
//! the run, tagged with the state it came from.

mod plan;

pub use plan::{FFI_BOOL_SIGNATURE, FFI_UINT8_SIGNATURE, compile_plan};

use crate::branding::{BrandingPatcher, PatchGuard, runner_rc_substitutions};
use crate::config::{BuildConfig, EnvOverrides, ReleaseSettings};
use crate::error::{Result, StepContext};
use crate::features::{FeatureCatalog, FeatureWarning, ResolvedFeatureSet, resolve};
use crate::packaging::{PackageContext, PackageTarget, ProjectPaths, assemble_target, run_steps};
use crate::resources::{AcquiredResources, Fetcher, ResourceAcquirer};
use crate::tools::{Notice, ToolRunner};
use crate::utils::fs::copy_contents;
use crate::version::{CounterStore, VersionLedger, VersionRecord};
use std::{fmt, path::PathBuf};

/// States of a build run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildState {
    /// Validate flags and manifest settings
    ResolveConfig,
    /// Resolve features and issue the build number
    ResolveFeatures,
    /// Download and stage resource bundles
    AcquireResources,
    /// Rebrand source files ahead of the compile
    PatchBranding,
    /// Run the compile plan
    InvokeCompiler,
    /// Undo branding patches
    RestoreBranding,
    /// Produce the installer artifact(s)
    AssemblePlatformArtifact,
    /// Finished
    Done,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Version that was built
    pub version: VersionRecord,
    /// Packaging path taken
    pub target: PackageTarget,
    /// Resolved features, including the build-mode baseline
    pub features: Vec<String>,
    /// Dropped feature requests
    pub warnings: Vec<FeatureWarning>,
    /// Staged resource bundles
    pub resources: AcquiredResources,
    /// Produced files
    pub artifacts: Vec<PathBuf>,
    /// Best-effort step outcomes
    pub notices: Vec<Notice>,
}

/// Drives one build run.
#[derive(Debug)]
pub struct Orchestrator<R, F, C> {
    config: BuildConfig,
    settings: ReleaseSettings,
    env: EnvOverrides,
    runner: R,
    fetcher: F,
    ledger: VersionLedger<C>,
    patcher: BrandingPatcher,
    state: BuildState,
}

impl<R, F, C> Orchestrator<R, F, C>
where
    R: ToolRunner,
    F: Fetcher,
    C: CounterStore,
{
    /// Orchestrator over injected tools, fetcher and build counter.
    pub fn new(
        config: BuildConfig,
        settings: ReleaseSettings,
        env: EnvOverrides,
        runner: R,
        fetcher: F,
        ledger: VersionLedger<C>,
    ) -> Self {
        Self {
            config,
            settings,
            env,
            runner,
            fetcher,
            ledger,
            patcher: BrandingPatcher::new(),
            state: BuildState::ResolveConfig,
        }
    }

    /// Current (or, after a failure, failing) state.
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Tool runner, e.g. to inspect a scripted run.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Version ledger.
    pub fn ledger(&self) -> &VersionLedger<C> {
        &self.ledger
    }

    /// Execute the run.
    pub async fn run(&mut self) -> Result<BuildReport> {
        // ===== RESOLVE CONFIG =====
        self.state = BuildState::ResolveConfig;
        let (target, catalog) = self.resolve_config().in_state(BuildState::ResolveConfig)?;
        log::info!("Packaging target: {}", target);

        // ===== RESOLVE FEATURES =====
        self.state = BuildState::ResolveFeatures;
        let resolution = resolve(
            &catalog,
            &self.config.feature_request(),
            self.config.platform.os(),
            self.config.build_mode(),
        );
        for warning in &resolution.warnings {
            log::warn!("{}", warning);
        }
        let features = resolution.features;
        log::info!("Features: {}", features.cargo_feature_arg());
        let version = self.ledger.record_build().in_state(BuildState::ResolveFeatures)?;
        log::info!("Build version: {}", version);

        let paths = ProjectPaths::new(self.config.project_dir.clone(), self.config.platform.os());
        let full_version = version.full_version();
        let package_dir = self.config.package_dir();
        let ctx = PackageContext::new(&paths, &self.settings, &self.env, &full_version)
            .gui(self.config.gui)
            .skip_portable_pack(self.config.skip_portable_pack)
            .package_from(package_dir.as_deref());

        // ===== ACQUIRE RESOURCES =====
        self.state = BuildState::AcquireResources;
        let resources = if target == PackageTarget::DebFromFolder {
            AcquiredResources::default()
        } else {
            acquire(&self.fetcher, &ctx, &features)
                .await
                .in_state(BuildState::AcquireResources)?
        };

        // ===== PATCH BRANDING / INVOKE COMPILER / RESTORE BRANDING =====
        self.state = BuildState::PatchBranding;
        let guard = self
            .branding_guard(&ctx, target)
            .await
            .in_state(BuildState::PatchBranding)?;

        self.state = BuildState::InvokeCompiler;
        let plan = compile_plan(target, &ctx, &features, self.config.skip_compile);
        let compiled = run_steps(&plan, &self.runner)
            .await
            .in_state(BuildState::InvokeCompiler);

        // A failed compile stays the failing state; the restore still runs.
        if compiled.is_ok() && !guard.is_empty() {
            self.state = BuildState::RestoreBranding;
        }
        guard
            .finish(compiled)
            .await
            .in_state(BuildState::RestoreBranding)?;

        // ===== ASSEMBLE PLATFORM ARTIFACT =====
        self.state = BuildState::AssemblePlatformArtifact;
        let assembled = assemble_target(target, &ctx, &self.runner, &self.patcher)
            .await
            .in_state(BuildState::AssemblePlatformArtifact)?;

        self.state = BuildState::Done;
        Ok(BuildReport {
            version,
            target,
            features: features
                .cargo_features()
                .into_iter()
                .map(str::to_string)
                .chain(
                    features
                        .iter()
                        .filter(|f| !f.cargo)
                        .map(|f| f.name.clone()),
                )
                .collect(),
            warnings: resolution.warnings,
            resources,
            artifacts: assembled.artifacts,
            notices: assembled.notices,
        })
    }

    fn resolve_config(&self) -> Result<(PackageTarget, FeatureCatalog)> {
        let target = self.config.validate()?;
        let catalog = FeatureCatalog::with_bundles(&self.settings.features)?;
        self.ledger.current_base_version()?;
        Ok((target, catalog))
    }

    /// Windows GUI builds compile with a rebranded `Runner.rc`.
    async fn branding_guard(
        &self,
        ctx: &PackageContext<'_>,
        target: PackageTarget,
    ) -> Result<PatchGuard> {
        if target != PackageTarget::WindowsPortable {
            return Ok(PatchGuard::empty());
        }
        self.patcher
            .apply(&ctx.paths.runner_rc(), &runner_rc_substitutions(&self.settings))
            .await
    }
}

/// Acquire bundles and, in GUI mode, hand them to the flutter output tree.
async fn acquire<F: Fetcher>(
    fetcher: &F,
    ctx: &PackageContext<'_>,
    features: &ResolvedFeatureSet,
) -> Result<AcquiredResources> {
    let staging = ctx.paths.staging();
    let resources = ResourceAcquirer::new(fetcher).acquire(features, &staging).await?;
    if ctx.gui && !resources.is_empty() {
        copy_contents(&staging, &ctx.paths.flutter_build()).await?;
    }
    Ok(resources)
}
