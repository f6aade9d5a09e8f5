//! Arch/Manjaro packages built by `makepkg` from `res/PKGBUILD`.

use super::{
    PackageContext,
    artifact::ArtifactName,
    assembler::PackagingLayout,
    steps::BuildStep,
};
use crate::tools::Invocation;
use std::path::PathBuf;

/// Layout for GUI (flutter bundle) or legacy builds.
pub fn layout(ctx: &PackageContext<'_>) -> PackagingLayout {
    let bin = ctx.settings.binary_name.as_str();
    let root = ctx.paths.root();
    let res = ctx.paths.res();
    let hbb = root.to_string_lossy().into_owned();

    let mut steps = vec![BuildStep::Stamp {
        file: res.join("PKGBUILD"),
        prefix: "pkgver=".to_string(),
        value: ctx.version.to_string(),
    }];

    let (workdir, packager) = if ctx.gui {
        steps.push(BuildStep::Run(
            Invocation::new("strip")
                .path_arg(&ctx.paths.flutter_build().join("lib").join(format!("lib{}.so", bin))),
        ));
        let packager = Invocation::new("makepkg")
            .arg("-f")
            .env("HBB", hbb)
            .env("FLUTTER", "1")
            .cwd(&res);
        (res.clone(), packager)
    } else {
        steps.push(BuildStep::Run(
            Invocation::new("strip").path_arg(&ctx.paths.release().join(bin)),
        ));
        for recipe in ["pacman_install", "PKGBUILD"] {
            steps.push(BuildStep::Symlink {
                target: PathBuf::from("res").join(recipe),
                link: root.join(recipe),
            });
        }
        let packager = Invocation::new("makepkg").arg("-f").env("HBB", hbb).cwd(root);
        (root.to_path_buf(), packager)
    };

    let produced = workdir.join(format!("{}-{}-0-x86_64.pkg.tar.zst", bin, ctx.version));
    let artifact = root.join(
        ArtifactName::new(&ctx.settings.package_name, ctx.version, "pkg.tar.zst")
            .with_suffix("manjaro-arch")
            .to_string(),
    );

    let mut layout = PackagingLayout::new("pacman", packager, produced, artifact);
    layout.steps = steps;
    layout
}
