use std::process::Command;

use chrono::Utc;

fn main() {
    let version = env!("CARGO_PKG_VERSION");

    let Some(git_dir) = git(&["rev-parse", "--absolute-git-dir"]) else {
        println!("cargo:rustc-env=SNAPSHIFT_VERSION={version}+unknown");
        return;
    };
    println!("cargo:rerun-if-changed={git_dir}/HEAD");
    println!("cargo:rerun-if-changed={git_dir}/refs/");

    let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_owned());
    let release_tag = format!("snapshift@v{version}");
    let tagged = git(&["tag", "--points-at", "HEAD"])
        .is_some_and(|tags| tags.lines().any(|tag| tag.trim() == release_tag));

    if tagged {
        println!("cargo:rustc-env=SNAPSHIFT_VERSION={version}");
    } else {
        let date = Utc::now().format("%Y-%m-%d");
        println!("cargo:rustc-env=SNAPSHIFT_VERSION={version}+{hash}.{date}");
    }
}

/// Trimmed stdout of a successful git invocation.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8(output.stdout).ok()?;
    Some(stdout.trim().to_owned())
}
