use std::env;
use std::process::Command;

const VERSION_OVERRIDE_ENV: &str = "PROJECTS_BOARD_VERSION";

/// `v1.2.3` becomes `1.2.3`; anything else is only trimmed.
fn strip_tag_prefix(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let version = match trimmed.strip_prefix('v') {
        Some(rest) if rest.starts_with(|ch: char| ch.is_ascii_digit()) => rest,
        _ => trimmed,
    };
    (!version.is_empty()).then(|| version.to_string())
}

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|output| output.status.success())?;
    strip_tag_prefix(&String::from_utf8_lossy(&output.stdout))
}

fn main() {
    println!("cargo:rerun-if-env-changed={VERSION_OVERRIDE_ENV}");
    for tracked in [".git/HEAD", ".git/packed-refs"] {
        println!("cargo:rerun-if-changed={tracked}");
    }

    let version = env::var(VERSION_OVERRIDE_ENV)
        .ok()
        .and_then(|raw| strip_tag_prefix(&raw))
        .or_else(git_describe)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=PROJECTS_BOARD_BUILD_VERSION={version}");
}
