//! macOS disk images built by `create-dmg`.

use super::{
    PackageContext,
    artifact::ArtifactName,
    assembler::PackagingLayout,
    steps::BuildStep,
};
use crate::tools::{Invocation, MacSigner};
use std::path::PathBuf;

/// Application bundle name, e.g. `MDesk.app`.
pub fn app_bundle(ctx: &PackageContext<'_>) -> String {
    format!("{}.app", ctx.settings.product_name)
}

/// Layout for the flutter app in the macOS build products.
pub fn flutter_layout(ctx: &PackageContext<'_>) -> PackagingLayout {
    let app = app_bundle(ctx);
    let workdir = ctx.paths.flutter();
    let dmg_name = format!("{}.dmg", ctx.settings.binary_name);

    let packager = Invocation::new("create-dmg")
        .arg("--volname")
        .arg(format!("{} Installer", ctx.settings.product_name))
        .args(["--window-pos", "200", "120"])
        .args(["--window-size", "800", "400"])
        .args(["--icon-size", "100"])
        .args(["--app-drop-link", "600", "185"])
        .arg("--icon")
        .arg(app.as_str())
        .args(["200", "190"])
        .arg("--hide-extension")
        .arg(app.as_str())
        .arg(dmg_name.as_str())
        .path_arg(&ctx.paths.flutter_build().join(&app))
        .cwd(&workdir);

    PackagingLayout::new("dmg", packager, workdir.join(dmg_name), artifact_path(ctx))
}

/// Layout for the app produced by `cargo bundle`.
///
/// With signing credentials the bundled executables and the app are signed
/// before the image is built.
pub fn bundle_layout(ctx: &PackageContext<'_>, signer: &MacSigner) -> PackagingLayout {
    let app = app_bundle(ctx);
    let root = ctx.paths.root();
    let app_dir = ctx.paths.release().join("bundle/osx").join(&app);
    let macos_dir = app_dir.join("Contents/MacOS");
    let exe = macos_dir.join(&ctx.settings.binary_name);
    let sciter = macos_dir.join("libsciter.dylib");

    let mut steps = vec![
        BuildStep::Run(Invocation::new("strip").path_arg(&exe)),
        BuildStep::copy(root.join("libsciter.dylib"), sciter.clone()),
    ];
    steps.extend(
        [&exe, &sciter, &app_dir]
            .into_iter()
            .filter_map(|target| signer.invocation(target))
            .map(BuildStep::Run),
    );

    let volume = format!("{} {}.dmg", ctx.settings.product_name, ctx.version);
    let packager = Invocation::new("create-dmg")
        .arg(volume.as_str())
        .path_arg(ctx.paths.relative(&app_dir))
        .cwd(root);

    let mut layout = PackagingLayout::new("dmg", packager, root.join(volume), artifact_path(ctx));
    layout.steps = steps;
    layout
}

fn artifact_path(ctx: &PackageContext<'_>) -> PathBuf {
    ctx.paths
        .root()
        .join(ArtifactName::new(&ctx.settings.package_name, ctx.version, "dmg").to_string())
}
