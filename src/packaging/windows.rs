//! Windows executables: the portable self-extracting build and the legacy
//! installer. Both are produced by the python packer in `libs/portable`.

use super::{
    Assembled, PackageContext,
    artifact::ArtifactName,
    assembler::run_packager,
    steps::{BuildStep, run_steps},
};
use crate::branding::{BrandingPatcher, portable_manifest_substitutions};
use crate::error::{ReleaseError, Result};
use crate::tools::{Invocation, Notice, ToolRunner, WindowsSigner, edit_exe_metadata};
use crate::utils::fs::{copy_file, move_file};
use std::{io, path::{Path, PathBuf}};

/// Executable emitted by the portable packer crate.
pub const PORTABLE_PACKER: &str = "rustdesk-portable-packer.exe";

/// Marker telling the application it runs from a portable pack.
pub const PORTABLE_MARKER: &str = "is_portable";

const VIRTUAL_DISPLAY_DLL: &str = "dylib_virtual_display.dll";

/// Finish the flutter build and, unless `skip_portable_pack`, wrap it into
/// `<Product>_portable.exe` and `<Product>-<version>-install.exe`.
pub async fn portable<R: ToolRunner>(
    ctx: &PackageContext<'_>,
    runner: &R,
    patcher: &BrandingPatcher,
) -> Result<Assembled> {
    let settings = ctx.settings;
    let root = ctx.paths.root();
    let build_dir = ctx.paths.flutter_build();
    let signer = WindowsSigner::from_env(ctx.env, root);
    let mut assembled = Assembled::default();

    copy_file(
        &ctx.paths.release().join("deps").join(VIRTUAL_DISPLAY_DLL),
        &build_dir.join(VIRTUAL_DISPLAY_DLL),
    )
    .await?;

    let exe = build_dir.join(settings.product_exe());
    assembled.notices.push(Notice::new(
        format!("metadata {}", settings.product_exe()),
        edit_exe_metadata(runner, &exe, settings).await,
    ));
    assembled.notices.push(Notice::new(
        format!("signing {}", settings.product_exe()),
        signer.sign(runner, &exe).await?,
    ));

    if ctx.skip_portable_pack {
        log::info!("Portable pack skipped, application left in {}", build_dir.display());
        assembled.artifacts.push(exe);
        return Ok(assembled);
    }

    run_steps(
        &[BuildStep::Write {
            to: build_dir.join(PORTABLE_MARKER),
            contents: "1".to_string(),
            executable: false,
        }],
        runner,
    )
    .await?;
    log::info!("Created portable marker: {}", build_dir.join(PORTABLE_MARKER).display());

    let packer_dir = ctx.paths.portable();
    let rel_build = forward_slashes(ctx.paths.relative(&build_dir));
    let generate = Invocation::new("python")
        .arg("./generate.py")
        .arg("-f")
        .arg(format!("../../{}", rel_build))
        .args(["-o", "."])
        .arg("-e")
        .arg(format!("../../{}/{}", rel_build, settings.product_exe()))
        .cwd(&packer_dir);

    let guard = patcher
        .apply(
            &packer_dir.join("Cargo.toml"),
            &portable_manifest_substitutions(settings),
        )
        .await?;
    let packed = async {
        runner
            .run_checked(
                &Invocation::new("pip")
                    .args(["install", "-r", "requirements.txt"])
                    .cwd(&packer_dir),
            )
            .await?;
        run_packager(runner, &generate, &build_dir).await
    }
    .await;
    guard.finish(packed).await?;

    let packer_exe = locate_packer(&[
        packer_dir.join("target/release").join(PORTABLE_PACKER),
        ctx.paths.release().join(PORTABLE_PACKER),
    ])?;
    let portable_exe = root.join(format!("{}_portable.exe", settings.product_name));
    move_file(&packer_exe, &portable_exe).await?;
    assembled.notices.push(Notice::new(
        "metadata portable executable",
        edit_exe_metadata(runner, &portable_exe, settings).await,
    ));
    log::info!("output location: {}", portable_exe.display());

    let install_exe = root.join(
        ArtifactName::new(&settings.product_name, ctx.version, "exe")
            .with_suffix("install")
            .to_string(),
    );
    copy_file(&portable_exe, &install_exe).await?;
    assembled.notices.push(Notice::new(
        "metadata install executable",
        edit_exe_metadata(runner, &install_exe, settings).await,
    ));
    assembled.notices.push(Notice::new(
        "signing install executable",
        signer.sign(runner, &install_exe).await?,
    ));
    log::info!("output location: {}", install_exe.display());

    assembled.artifacts.push(portable_exe);
    assembled.artifacts.push(install_exe);
    Ok(assembled)
}

/// Rename and sign the legacy build, then pack it with the staged resources
/// into `<pkg>-<version>-win7-install.exe`.
pub async fn installer<R: ToolRunner>(ctx: &PackageContext<'_>, runner: &R) -> Result<Assembled> {
    let settings = ctx.settings;
    let root = ctx.paths.root();
    let staging = ctx.paths.staging();
    let packer_dir = ctx.paths.portable();
    let mut assembled = Assembled::default();

    let built = ctx.paths.release().join(format!("{}.exe", settings.binary_name));
    let exe = ctx.paths.release().join(settings.product_exe());
    move_file(&built, &exe).await?;

    let signer = WindowsSigner::from_env(ctx.env, root);
    assembled.notices.push(Notice::new(
        format!("signing {}", settings.product_exe()),
        signer.sign(runner, &exe).await?,
    ));

    copy_file(&exe, &staging.join(settings.product_exe())).await?;

    let installer_name = ArtifactName::new(&settings.package_name, ctx.version, "exe")
        .with_suffix("win7-install")
        .to_string();
    let rel_staging = forward_slashes(ctx.paths.relative(&staging));
    run_steps(
        &[BuildStep::Run(
            Invocation::new("pip3")
                .args(["install", "-r", "requirements.txt"])
                .cwd(&packer_dir),
        )],
        runner,
    )
    .await?;
    let generate = Invocation::new("python3")
        .arg("./generate.py")
        .arg("-f")
        .arg(format!("../../{}", rel_staging))
        .args(["-o", "."])
        .arg("-e")
        .arg(format!("../../{}/{}", rel_staging, installer_name))
        .cwd(&packer_dir);
    run_packager(runner, &generate, &staging).await?;

    let artifact = root.join(&installer_name);
    move_file(&staging.join(&installer_name), &artifact).await?;
    log::info!("output location: {}", artifact.display());
    assembled.artifacts.push(artifact);
    Ok(assembled)
}

fn locate_packer(candidates: &[PathBuf]) -> Result<PathBuf> {
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| ReleaseError::Fs {
            context: "locating portable packer output",
            path: candidates.last().cloned().unwrap_or_default(),
            error: io::Error::new(
                io::ErrorKind::NotFound,
                "check that cargo build completed in libs/portable",
            ),
        })
}

fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvOverrides, OsFamily, ReleaseSettings};
    use crate::packaging::ProjectPaths;
    use crate::tools::{BestEffort, ScriptedRunner, ToolOutput};

    const MANIFEST: &str = "[package]\nname = \"rustdesk\"\n[package.metadata.release]\nproduct-name = \"MDesk\"\n";

    #[tokio::test]
    async fn skip_portable_pack_stops_after_signing() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(tmp.path(), OsFamily::Windows);
        std::fs::create_dir_all(paths.release().join("deps")).unwrap();
        std::fs::write(paths.release().join("deps").join(VIRTUAL_DISPLAY_DLL), "dll").unwrap();
        std::fs::create_dir_all(paths.flutter_build()).unwrap();
        std::fs::write(paths.flutter_build().join("MDesk.exe"), "exe").unwrap();

        let settings = ReleaseSettings::from_manifest_str(MANIFEST).unwrap();
        let env = EnvOverrides::default();
        let ctx = PackageContext::new(&paths, &settings, &env, "1.4.0.3").skip_portable_pack(true);
        let runner = ScriptedRunner::succeeding();

        let assembled = portable(&ctx, &runner, &BrandingPatcher::new()).await.unwrap();
        assert_eq!(assembled.artifacts, vec![paths.flutter_build().join("MDesk.exe")]);
        assert!(paths.flutter_build().join(VIRTUAL_DISPLAY_DLL).is_file());
        assert!(!paths.flutter_build().join(PORTABLE_MARKER).exists());
        assert!(matches!(assembled.notices[1].outcome, BestEffort::Skipped(_)));
        assert!(runner.calls_to("python").is_empty());
    }

    #[tokio::test]
    async fn failed_packer_restores_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(tmp.path(), OsFamily::Windows);
        std::fs::create_dir_all(paths.release().join("deps")).unwrap();
        std::fs::write(paths.release().join("deps").join(VIRTUAL_DISPLAY_DLL), "dll").unwrap();
        std::fs::create_dir_all(paths.flutter_build()).unwrap();
        std::fs::create_dir_all(paths.portable()).unwrap();
        let manifest = "[package]\ndescription = \"RustDesk Remote Desktop\"\n";
        std::fs::write(paths.portable().join("Cargo.toml"), manifest).unwrap();

        let settings = ReleaseSettings::from_manifest_str(MANIFEST).unwrap();
        let env = EnvOverrides::default();
        let ctx = PackageContext::new(&paths, &settings, &env, "1.4.0.3");
        let runner = ScriptedRunner::new(|inv| {
            if inv.program == "python" {
                Ok(ToolOutput::failed(1, "Traceback"))
            } else {
                Ok(ToolOutput::ok())
            }
        });

        let err = portable(&ctx, &runner, &BrandingPatcher::new()).await.unwrap_err();
        assert!(matches!(err, ReleaseError::PackagingFailed { .. }));
        assert_eq!(
            std::fs::read_to_string(paths.portable().join("Cargo.toml")).unwrap(),
            manifest
        );
        assert!(!paths.portable().join("Cargo.toml.backup").exists());
        assert_eq!(
            std::fs::read_to_string(paths.flutter_build().join(PORTABLE_MARKER)).unwrap(),
            "1"
        );
    }

    #[tokio::test]
    async fn legacy_installer_is_moved_to_root() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(tmp.path(), OsFamily::Windows);
        std::fs::create_dir_all(paths.release()).unwrap();
        std::fs::write(paths.release().join("rustdesk.exe"), "exe").unwrap();

        let settings = ReleaseSettings::from_manifest_str(MANIFEST).unwrap();
        let env = EnvOverrides::default();
        let ctx = PackageContext::new(&paths, &settings, &env, "1.4.0.3");
        let out = paths.staging().join("rustdesk-1.4.0.3-win7-install.exe");
        let runner = ScriptedRunner::new(move |inv| {
            if inv.program == "python3" {
                std::fs::write(&out, "installer")?;
            }
            Ok(ToolOutput::ok())
        });

        let assembled = installer(&ctx, &runner).await.unwrap();
        assert_eq!(
            assembled.artifacts,
            vec![tmp.path().join("rustdesk-1.4.0.3-win7-install.exe")]
        );
        assert!(paths.staging().join("MDesk.exe").is_file());
        let generate = &runner.calls_to("python3")[0];
        assert_eq!(generate.args[2], "../../resources");
    }
}
