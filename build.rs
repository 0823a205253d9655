use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

const DIST_DIR: &str = "ui/dist";

fn main() {
    println!("cargo:rerun-if-env-changed=PPMS_SKIP_UI_BUILD");
    println!("cargo:rerun-if-changed=ui/package.json");
    println!("cargo:rerun-if-changed=ui/src");
    println!("cargo:rerun-if-changed=ui/index.html");

    let skip_build = env::var("PPMS_SKIP_UI_BUILD").ok().as_deref() == Some("1");
    if skip_build || !Path::new("ui/package.json").exists() {
        ensure_dist_index();
        return;
    }

    let install_args: &[&str] = if Path::new("ui/bun.lock").exists() {
        &["install", "--frozen-lockfile"]
    } else {
        &["install"]
    };

    run_bun(install_args);
    run_bun(&["run", "build"]);
}

fn run_bun(args: &[&str]) {
    let status = Command::new("bun").args(args).current_dir("ui").status();

    match status {
        Ok(exit_status) if exit_status.success() => {}
        Ok(exit_status) => panic!("bun {} failed with status: {exit_status}", args.join(" ")),
        Err(error) => panic!("failed to run bun {}: {error}", args.join(" ")),
    }
}

/// Prebuilt assets dropped into `ui/dist` are kept; an empty dist gets a stub page.
fn ensure_dist_index() {
    let dist_dir = Path::new(DIST_DIR);
    let index = dist_dir.join("index.html");
    if index.exists() {
        return;
    }

    if let Err(error) = fs::create_dir_all(dist_dir) {
        panic!("failed to create {DIST_DIR}: {error}");
    }

    let placeholder = r#"<!doctype html>
<html lang="zh-CN">
  <head>
    <meta charset="utf-8" />
    <title>ppms</title>
  </head>
  <body>
    <main>
      <h1>PPMS</h1>
      <p>The front-end bundle has not been built. The API is served under /api/v1.</p>
    </main>
  </body>
</html>
"#;

    if let Err(error) = fs::write(index, placeholder) {
        panic!("failed to write placeholder index.html: {error}");
    }
}
