//! Compile plans: the steps that turn sources into the binaries a
//! packaging path consumes.

use crate::config::OsFamily;
use crate::features::ResolvedFeatureSet;
use crate::packaging::{BuildStep, PackageContext, PackageTarget, dmg};
use crate::tools::Invocation;

/// Generated-bridge signature the Linux flutter toolchain rejects.
pub const FFI_BOOL_SIGNATURE: &str = "ffi.NativeFunction<ffi.Bool Function(DartPort";
/// Replacement signature.
pub const FFI_UINT8_SIGNATURE: &str = "ffi.NativeFunction<ffi.Uint8 Function(DartPort";

/// Minimum macOS version, matching the flutter Xcode project.
const MACOSX_DEPLOYMENT_TARGET: &str = "10.14";

/// Steps run in the `InvokeCompiler` state for `target`.
///
/// With `skip_compile` the cargo invocations are left out; flutter builds and
/// the file shuffling around them still run.
pub fn compile_plan(
    target: PackageTarget,
    ctx: &PackageContext<'_>,
    features: &ResolvedFeatureSet,
    skip_compile: bool,
) -> Vec<BuildStep> {
    if target == PackageTarget::DebFromFolder {
        return Vec::new();
    }

    let paths = ctx.paths;
    let root = paths.root();
    let bin = ctx.settings.binary_name.as_str();
    let feature_arg = features.cargo_feature_arg();
    let cargo = |extra: &[&str]| {
        Invocation::new("cargo")
            .arg("build")
            .args(["--features", feature_arg.as_str()])
            .args(extra.iter().copied())
            .arg("--release")
            .cwd(root)
    };
    let flutter = |platform: &str| {
        BuildStep::Run(
            Invocation::new("flutter")
                .args(["build", platform, "--release"])
                .cwd(paths.flutter()),
        )
    };
    let ffi_rewrite = || BuildStep::Replace {
        file: paths.generated_bridge(),
        from: FFI_BOOL_SIGNATURE.to_string(),
        to: FFI_UINT8_SIGNATURE.to_string(),
    };

    let mut steps = Vec::new();
    if !ctx.gui {
        let python = if paths.os() == OsFamily::Windows { "python" } else { "python3" };
        steps.push(BuildStep::Run(
            Invocation::new(python).arg("res/inline-sciter.py").cwd(root),
        ));
    }
    if paths.os() == OsFamily::Windows && !skip_compile {
        steps.push(BuildStep::Run(
            Invocation::new("cargo")
                .args(["build", "--release"])
                .cwd(paths.virtual_display()),
        ));
    }

    match target {
        PackageTarget::Deb => {
            if !skip_compile {
                steps.push(BuildStep::Run(cargo(&["--lib"])));
                steps.push(ffi_rewrite());
            }
            steps.push(flutter("linux"));
        }
        PackageTarget::Pacman if ctx.gui => {
            if !skip_compile {
                steps.push(BuildStep::Run(cargo(&["--lib"])));
            }
            steps.push(ffi_rewrite());
            steps.push(flutter("linux"));
        }
        PackageTarget::Pacman | PackageTarget::Rpm(_) | PackageTarget::WindowsInstaller => {
            steps.push(BuildStep::Run(cargo(&[])));
        }
        PackageTarget::DebBundle | PackageTarget::DmgBundle => {
            steps.push(BuildStep::Run(
                Invocation::new("cargo")
                    .args(["bundle", "--release", "--features", feature_arg.as_str()])
                    .cwd(root),
            ));
            if target == PackageTarget::DebBundle {
                steps.push(BuildStep::MoveGlob {
                    pattern: format!(
                        "{}/bundle/deb/{}*.deb",
                        paths.release().to_string_lossy(),
                        bin
                    ),
                    to: root.join(format!("{}.deb", bin)),
                });
            }
        }
        PackageTarget::Dmg => {
            if !skip_compile {
                steps.push(BuildStep::Run(
                    cargo(&[]).env("MACOSX_DEPLOYMENT_TARGET", MACOSX_DEPLOYMENT_TARGET),
                ));
            }
            steps.push(BuildStep::copy(
                paths.release().join(format!("liblib{}.dylib", bin)),
                paths.release().join(format!("lib{}.dylib", bin)),
            ));
            steps.push(flutter("macos"));
            steps.push(BuildStep::copy(
                paths.release().join("service"),
                paths
                    .flutter_build()
                    .join(dmg::app_bundle(ctx))
                    .join("Contents/MacOS/service"),
            ));
        }
        PackageTarget::WindowsPortable => {
            if !skip_compile {
                steps.push(BuildStep::Run(cargo(&["--lib"])));
                steps.push(BuildStep::Expect {
                    path: paths.release().join(format!("lib{}.dll", bin)),
                    hint: "cargo build failed, please check rust source code".to_string(),
                });
            }
            steps.push(flutter("windows"));
        }
        PackageTarget::DebFromFolder => {}
    }
    steps
}
