//! RPM packages built by `rpmbuild` from the project's spec files.

use super::{
    PackageContext,
    artifact::ArtifactName,
    assembler::PackagingLayout,
    steps::BuildStep,
    target::RpmFlavor,
};
use crate::error::{ReleaseError, Result};
use crate::tools::Invocation;

/// Spec-file line prefix rewritten with the build version.
const VERSION_PREFIX: &str = "Version:    ";

/// Layout for `flavor`. `rpmbuild` writes under `$HOME/rpmbuild`.
pub fn layout(ctx: &PackageContext<'_>, flavor: RpmFlavor) -> Result<PackagingLayout> {
    let home = ctx
        .env
        .home
        .as_ref()
        .ok_or_else(|| ReleaseError::invalid_config("HOME is not set; rpmbuild output cannot be located"))?;
    let bin = ctx.settings.binary_name.as_str();
    let root = ctx.paths.root();
    let spec = ctx.paths.res().join(flavor.spec_file());

    let packager = Invocation::new("rpmbuild")
        .arg("-ba")
        .path_arg(ctx.paths.relative(&spec))
        .env("HBB", root.to_string_lossy())
        .cwd(root);
    let produced = home
        .join("rpmbuild/RPMS/x86_64")
        .join(format!("{}-{}-0.x86_64.rpm", bin, ctx.version));
    let artifact = root.join(
        ArtifactName::new(&ctx.settings.package_name, ctx.version, "rpm")
            .with_suffix(flavor.suffix())
            .to_string(),
    );

    let mut layout = PackagingLayout::new("rpm", packager, produced, artifact);
    layout.steps = vec![
        BuildStep::Run(Invocation::new("strip").path_arg(&ctx.paths.release().join(bin))),
        BuildStep::Stamp {
            file: spec,
            prefix: VERSION_PREFIX.to_string(),
            value: ctx.version.to_string(),
        },
    ];
    Ok(layout)
}
