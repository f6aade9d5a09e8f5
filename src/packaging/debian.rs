//! Debian package layouts.
//!
//! The staged tree mirrors the installed filesystem: the application under
//! `usr/share/<bin>`, systemd unit, icons, desktop entries, X11 session
//! helpers and pam config, plus `DEBIAN/` metadata.

use super::{
    PackageContext,
    artifact::ArtifactName,
    assembler::PackagingLayout,
    control::DebControl,
    steps::BuildStep,
};
use crate::tools::Invocation;
use std::path::{Path, PathBuf};

/// Layout for the flutter bundle produced by `flutter build linux`.
pub fn flutter_layout(ctx: &PackageContext<'_>) -> PackagingLayout {
    folder_layout_with(ctx, &ctx.paths.flutter_build(), true)
}

/// Layout for a prebuilt application folder.
pub fn folder_layout(ctx: &PackageContext<'_>, folder: &Path) -> PackagingLayout {
    let folder = if folder.is_absolute() {
        folder.to_path_buf()
    } else {
        ctx.paths.root().join(folder)
    };
    folder_layout_with(ctx, &folder, false)
}

fn folder_layout_with(ctx: &PackageContext<'_>, source: &Path, session_files: bool) -> PackagingLayout {
    let bin = ctx.settings.binary_name.as_str();
    let res = ctx.paths.res();
    let workdir = ctx.paths.flutter();
    let staging = workdir.join("tmpdeb");
    let share = staging.join("usr/share").join(bin);

    let mut steps = vec![
        BuildStep::Dir(staging.join("usr/bin")),
        BuildStep::Dir(share.clone()),
    ];
    if session_files {
        steps.push(BuildStep::Dir(staging.join("etc").join(bin)));
        steps.push(BuildStep::Dir(staging.join("etc/pam.d")));
    }
    steps.push(BuildStep::Dir(staging.join("usr/share/polkit-1/actions")));
    steps.push(BuildStep::CopyTree {
        from: source.to_path_buf(),
        to: share.clone(),
        required: true,
    });
    steps.extend(desktop_integration(ctx, &staging));
    if session_files {
        steps.push(BuildStep::copy(
            res.join("startwm.sh"),
            staging.join("etc").join(bin).join("startwm.sh"),
        ));
        steps.push(BuildStep::copy(
            res.join("xorg.conf"),
            staging.join("etc").join(bin).join("xorg.conf"),
        ));
        steps.push(BuildStep::copy(
            res.join("pam.d").join(format!("{}.debian", bin)),
            staging.join("etc/pam.d").join(bin),
        ));
    }
    steps.push(BuildStep::Write {
        to: share.join("files/polkit"),
        contents: "#!/bin/sh\n".to_string(),
        executable: true,
    });
    steps.push(metadata_seed(ctx, &staging));

    PackagingLayout {
        format: "deb",
        staging: Some(staging),
        steps,
        control: Some(DebControl::new(ctx.settings, ctx.env, ctx.version)),
        integrity: true,
        packager: dpkg_build(bin, &workdir),
        produced: vec![workdir.join(format!("{}.deb", bin))],
        artifact: artifact_path(ctx),
    }
}

/// Layout that re-packs the deb produced by `cargo bundle`.
///
/// The compile plan leaves that deb at `<root>/<bin>.deb`; its control file
/// is kept as produced apart from `Version:`, which gets the build version.
pub fn bundle_layout(ctx: &PackageContext<'_>) -> PackagingLayout {
    let bin = ctx.settings.binary_name.as_str();
    let root = ctx.paths.root();
    let res = ctx.paths.res();
    let staging = root.join("tmpdeb");
    let share = staging.join("usr/share").join(bin);
    let seed = root.join(format!("{}.deb", bin));

    let mut steps = vec![BuildStep::Run(
        Invocation::new("dpkg-deb")
            .arg("-R")
            .path_arg(&seed)
            .path_arg(&staging)
            .cwd(root),
    )];
    steps.push(BuildStep::Stamp {
        file: staging.join("DEBIAN/control"),
        prefix: "Version: ".to_string(),
        value: ctx.version.to_string(),
    });
    steps.extend(desktop_integration(ctx, &staging));
    steps.extend([
        BuildStep::copy(
            res.join("startwm.sh"),
            staging.join("etc").join(bin).join("startwm.sh"),
        ),
        BuildStep::copy(
            res.join("xorg.conf"),
            staging.join("etc/X11").join(bin).join("xorg.conf"),
        ),
        metadata_seed(ctx, &staging),
        BuildStep::copy(
            res.join("pam.d").join(format!("{}.debian", bin)),
            staging.join("etc/pam.d").join(bin),
        ),
        BuildStep::Run(
            Invocation::new("strip").path_arg(&staging.join("usr/bin").join(bin)),
        ),
        BuildStep::Move {
            from: staging.join("usr/bin").join(bin),
            to: share.join(bin),
        },
        BuildStep::copy(root.join("libsciter-gtk.so"), share.join("libsciter-gtk.so")),
    ]);

    PackagingLayout {
        format: "deb",
        staging: Some(staging),
        steps,
        control: None,
        integrity: true,
        packager: dpkg_build(bin, root),
        produced: vec![seed],
        artifact: artifact_path(ctx),
    }
}

/// Service unit, icons and desktop entries shared by every deb layout.
fn desktop_integration(ctx: &PackageContext<'_>, staging: &Path) -> Vec<BuildStep> {
    let bin = ctx.settings.binary_name.as_str();
    let res = ctx.paths.res();
    let icons = staging.join("usr/share/icons/hicolor");
    let apps = staging.join("usr/share/applications");
    vec![
        BuildStep::copy(
            res.join(format!("{}.service", bin)),
            staging
                .join("usr/share")
                .join(bin)
                .join("files/systemd")
                .join(format!("{}.service", bin)),
        ),
        BuildStep::copy(
            res.join("128x128@2x.png"),
            icons.join("256x256/apps").join(format!("{}.png", bin)),
        ),
        BuildStep::copy(
            res.join("scalable.svg"),
            icons.join("scalable/apps").join(format!("{}.svg", bin)),
        ),
        BuildStep::copy(
            res.join(format!("{}.desktop", bin)),
            apps.join(format!("{}.desktop", bin)),
        ),
        BuildStep::copy(
            res.join(format!("{}-link.desktop", bin)),
            apps.join(format!("{}-link.desktop", bin)),
        ),
    ]
}

/// Maintainer scripts from `res/DEBIAN`, when the project ships any.
fn metadata_seed(ctx: &PackageContext<'_>, staging: &Path) -> BuildStep {
    BuildStep::CopyTree {
        from: ctx.paths.res().join("DEBIAN"),
        to: staging.join("DEBIAN"),
        required: false,
    }
}

fn dpkg_build(bin: &str, workdir: &Path) -> Invocation {
    Invocation::new("dpkg-deb")
        .args(["-b", "tmpdeb"])
        .arg(format!("{}.deb", bin))
        .cwd(workdir)
}

fn artifact_path(ctx: &PackageContext<'_>) -> PathBuf {
    ctx.paths
        .root()
        .join(ArtifactName::new(&ctx.settings.package_name, ctx.version, "deb").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvOverrides, OsFamily, ReleaseSettings};
    use crate::packaging::{ProjectPaths, run_steps};
    use crate::tools::ScriptedRunner;

    fn fixture() -> (ProjectPaths, ReleaseSettings, EnvOverrides) {
        (
            ProjectPaths::new("/src", OsFamily::Linux),
            ReleaseSettings::from_manifest_str("[package]\nname = \"rustdesk\"\n").unwrap(),
            EnvOverrides::default(),
        )
    }

    #[test]
    fn flutter_layout_stages_under_flutter_dir() {
        let (paths, settings, env) = fixture();
        let ctx = PackageContext::new(&paths, &settings, &env, "1.4.0.9");
        let layout = flutter_layout(&ctx);

        assert_eq!(layout.staging, Some(PathBuf::from("/src/flutter/tmpdeb")));
        assert_eq!(layout.artifact, PathBuf::from("/src/rustdesk-1.4.0.9.deb"));
        assert_eq!(layout.produced, vec![PathBuf::from("/src/flutter/rustdesk.deb")]);
        assert_eq!(layout.control.as_ref().map(|c| c.version.as_str()), Some("1.4.0.9"));
        assert!(layout.steps.contains(&BuildStep::copy(
            "/src/res/pam.d/rustdesk.debian",
            "/src/flutter/tmpdeb/etc/pam.d/rustdesk"
        )));
        assert!(layout.steps.contains(&BuildStep::CopyTree {
            from: PathBuf::from("/src/flutter/build/linux/x64/release/bundle"),
            to: PathBuf::from("/src/flutter/tmpdeb/usr/share/rustdesk"),
            required: true,
        }));
    }

    #[test]
    fn folder_layout_skips_session_files() {
        let (paths, settings, env) = fixture();
        let ctx = PackageContext::new(&paths, &settings, &env, "1.4.0.9");
        let layout = folder_layout(&ctx, Path::new("prebuilt"));

        assert!(layout.steps.iter().any(|s| matches!(
            s,
            BuildStep::CopyTree { from, .. } if from == Path::new("/src/prebuilt")
        )));
        assert!(!layout.steps.iter().any(|s| matches!(
            s,
            BuildStep::Copy { to, .. } if to.ends_with("startwm.sh")
        )));
    }

    #[test]
    fn bundle_layout_relocates_binary() {
        let (paths, settings, env) = fixture();
        let ctx = PackageContext::new(&paths, &settings, &env, "1.4.0.9");
        let layout = bundle_layout(&ctx);

        assert!(layout.control.is_none());
        assert!(layout.integrity);
        assert!(layout.steps.contains(&BuildStep::Move {
            from: PathBuf::from("/src/tmpdeb/usr/bin/rustdesk"),
            to: PathBuf::from("/src/tmpdeb/usr/share/rustdesk/rustdesk"),
        }));
        assert!(matches!(&layout.steps[0], BuildStep::Run(inv) if inv.is("dpkg-deb", "-R")));
    }

    #[tokio::test]
    async fn bundle_layout_stamps_build_version_into_control() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(tmp.path(), OsFamily::Linux);
        let settings = ReleaseSettings::from_manifest_str("[package]\nname = \"rustdesk\"\n").unwrap();
        let env = EnvOverrides::default();
        let ctx = PackageContext::new(&paths, &settings, &env, "1.4.0.9");
        let layout = bundle_layout(&ctx);

        let control = tmp.path().join("tmpdeb/DEBIAN/control");
        std::fs::create_dir_all(control.parent().unwrap()).unwrap();
        std::fs::write(&control, "Package: rustdesk\nVersion: 1.4.0\nArchitecture: amd64\n").unwrap();

        // The step right after unpacking the cargo-bundle deb.
        run_steps(&layout.steps[1..2], &ScriptedRunner::succeeding())
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&control).unwrap(),
            "Package: rustdesk\nVersion: 1.4.0.9\nArchitecture: amd64\n"
        );
    }
}
