//! Substitution lists for the files the Windows build rebrands.

use super::Substitution;
use crate::config::ReleaseSettings;

/// Replacements for `flutter/windows/runner/Runner.rc`.
pub fn runner_rc_substitutions(settings: &ReleaseSettings) -> Vec<Substitution> {
    let up = &settings.branding;
    let quoted = |s: &str| format!("\"{}\"", s);
    vec![
        // Longest first so the bare product name doesn't eat the description.
        Substitution::new(quoted(&up.upstream_description), quoted(&settings.file_description)),
        Substitution::new(quoted(&up.upstream_name), quoted(&settings.product_name)),
        Substitution::new(quoted(&up.upstream_exe), quoted(&settings.product_exe())),
    ]
}

/// Replacements for `libs/portable/Cargo.toml` (Windows resource metadata
/// of the self-extracting packer).
pub fn portable_manifest_substitutions(settings: &ReleaseSettings) -> Vec<Substitution> {
    let up = &settings.branding;
    let field = |key: &str, value: &str| format!("{} = \"{}\"", key, value);
    vec![
        Substitution::new(
            field("ProductName", &up.upstream_name),
            field("ProductName", &settings.product_name),
        ),
        Substitution::new(
            field("FileDescription", &up.upstream_description),
            field("FileDescription", &settings.file_description),
        ),
        Substitution::new(
            field("OriginalFilename", &up.upstream_exe),
            field("OriginalFilename", &settings.product_exe()),
        ),
        Substitution::new(
            field("description", &up.upstream_description),
            field("description", &settings.file_description),
        ),
    ]
}
