use std::process::Command;

fn main() {
    // CI can pass the commit explicitly; otherwise ask git
    let git_hash = std::env::var("GIT_COMMIT_SHA").unwrap_or_else(|_| {
        match Command::new("git").args(["rev-parse", "HEAD"]).output() {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            }
            _ => "unknown".to_string(),
        }
    });

    let short_hash = git_hash.get(..7).unwrap_or(&git_hash).to_string();

    println!("cargo:rustc-env=GIT_COMMIT_HASH={git_hash}");
    println!("cargo:rustc-env=GIT_COMMIT_SHORT={short_hash}");
    println!("cargo:rerun-if-env-changed=GIT_COMMIT_SHA");

    if std::path::Path::new(".git/HEAD").exists() {
        println!("cargo:rerun-if-changed=.git/HEAD");
        println!("cargo:rerun-if-changed=.git/refs/heads");
    }
}
