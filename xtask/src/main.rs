use std::fs::create_dir_all;
use xtaskops::ops::{clean_files, cmd};

const PACKAGE: &str = "packed_vec";

fn main() -> Result<(), anyhow::Error> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("cover") => cover(args.next().as_deref()),
        Some("bench") => bench(args.next().as_deref()),
        Some("ci") => ci(),
        Some(task) => {
            eprintln!("unknown task: {task}");
            usage();
            Ok(())
        }
        None => {
            usage();
            Ok(())
        }
    }
}

fn usage() {
    eprintln!(
        "tasks:
    cover [xml|cobertura|lcov]  run the tests with coverage and write a report to coverage/
    bench [filter]              run the criterion benches
    ci                          check formatting, lints and tests"
    );
}

// https://blog.rng0.io/how-to-do-code-coverage-in-rust
fn cover(format: Option<&str>) -> Result<(), anyhow::Error> {
    create_dir_all("coverage")?;

    let (fmt, file_ext) = match format.map(str::to_ascii_lowercase).as_deref() {
        Some("xml") | Some("cobertura") | None => ("cobertura", "xml"),
        Some("lcov") => ("lcov", "lcov"),
        Some(s) => {
            eprintln!("Warning: invalid format: {s}");
            ("cobertura", "xml")
        }
    };
    let file = format!("coverage/tests.{file_ext}");

    println!("=== running coverage of {PACKAGE} ({fmt}) ===");
    cmd!("cargo", "test", "--package", PACKAGE)
        .env("CARGO_INCREMENTAL", "0")
        .env("RUSTFLAGS", "-Cinstrument-coverage")
        .env("LLVM_PROFILE_FILE", "cargo-test-%p-%m.profraw")
        .run()?;

    println!("=== generating report ===");
    cmd!(
        "grcov",
        ".",
        "--binary-path",
        "./target/debug/deps",
        "-s",
        ".",
        "-t",
        fmt,
        "--branch",
        "--ignore-not-existing",
        "--ignore",
        "../*",
        "--ignore",
        "/*",
        "--ignore",
        "xtask/*",
        "-o",
        file,
    )
    .run()?;

    println!("=== cleaning up ===");
    clean_files("**/*.profraw")?;
    println!("ok.");

    Ok(())
}

fn bench(filter: Option<&str>) -> Result<(), anyhow::Error> {
    match filter {
        Some(filter) => cmd!("cargo", "bench", "--package", PACKAGE, "--", filter).run()?,
        None => cmd!("cargo", "bench", "--package", PACKAGE).run()?,
    };
    Ok(())
}

fn ci() -> Result<(), anyhow::Error> {
    println!("=== fmt ===");
    cmd!("cargo", "fmt", "--all", "--", "--check").run()?;
    println!("=== clippy ===");
    cmd!("cargo", "clippy", "--workspace", "--all-targets", "--", "-D", "warnings").run()?;
    println!("=== test ===");
    cmd!("cargo", "test", "--workspace").run()?;
    println!("ok.");
    Ok(())
}
