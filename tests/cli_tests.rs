//! CLI integration tests

use assert_cmd::Command;
use image::{GrayImage, Luma};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn cmd(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kdp-coloring").unwrap();
    // Keep a local kdp-coloring.toml out of the picture
    cmd.current_dir(root.path());
    cmd.arg("--output-root").arg(root.path());
    cmd
}

fn write_pages(dir: &Path, count: u32) {
    std::fs::create_dir_all(dir).unwrap();
    for i in 1..=count {
        let img = GrayImage::from_fn(85, 110, |x, y| {
            if (x + y) % 17 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        img.save(dir.join(format!("fbnp_{}.png", i))).unwrap();
    }
}

#[test]
fn test_help() {
    let root = TempDir::new().unwrap();
    cmd(&root)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cover"))
        .stdout(predicate::str::contains("interior"))
        .stdout(predicate::str::contains("spine"));
}

#[test]
fn test_version() {
    let root = TempDir::new().unwrap();
    cmd(&root)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kdp-coloring"));
}

#[test]
fn test_spine_json_letter_30_pages() {
    let root = TempDir::new().unwrap();
    let output = cmd(&root)
        .args(["spine", "--pages", "30", "--paper", "white", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let expected = 17.0 + 30.0 * 0.002252 + 0.25;
    assert!((report["width_in"].as_f64().unwrap() - expected).abs() < 1e-9);
    assert_eq!(report["height_in"].as_f64().unwrap(), 11.25);
    assert_eq!(report["spine_text"], serde_json::Value::Bool(false));
    assert_eq!(report["height_px"].as_u64().unwrap(), 3375);
}

#[test]
fn test_spine_text_threshold() {
    let root = TempDir::new().unwrap();
    cmd(&root)
        .args(["spine", "--pages", "79"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Spine text: allowed"));
    cmd(&root)
        .args(["spine", "--pages", "78"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Spine text: not allowed"));
}

#[test]
fn test_spine_doubling_dpi() {
    let root = TempDir::new().unwrap();
    let at = |dpi: &str| -> serde_json::Value {
        let output = cmd(&root)
            .args(["spine", "--pages", "120", "--json", "--dpi", dpi])
            .output()
            .unwrap();
        serde_json::from_slice(&output.stdout).unwrap()
    };
    let low = at("150");
    let high = at("300");
    let low_w = low["width_px"].as_u64().unwrap();
    let high_w = high["width_px"].as_u64().unwrap();
    assert!(high_w.abs_diff(low_w * 2) <= 1);
    assert_eq!(high["height_px"].as_u64().unwrap(), low["height_px"].as_u64().unwrap() * 2 - 1);
}

#[test]
fn test_bad_paper_exit_code() {
    let root = TempDir::new().unwrap();
    cmd(&root)
        .args(["spine", "--pages", "30", "--paper", "glossy"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("glossy"));
}

#[test]
fn test_zero_pages_exit_code() {
    let root = TempDir::new().unwrap();
    cmd(&root)
        .args(["spine", "--pages", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_interior_empty_dir() {
    let root = TempDir::new().unwrap();
    let book = root.path().join("Empty_Book");
    std::fs::create_dir_all(&book).unwrap();

    cmd(&root)
        .args(["interior", "--safe-title", "Empty_Book"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error"));
    assert!(!book.join("fbnp_interior.pdf").exists());
}

#[test]
fn test_interior_without_front_matter() {
    let root = TempDir::new().unwrap();
    let book = root.path().join("Small_Book");
    write_pages(&book, 3);

    cmd(&root)
        .args([
            "interior",
            "--safe-title",
            "Small_Book",
            "--dpi",
            "40",
            "--no-front-matter",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pages: 3"));

    let doc = lopdf::Document::load(book.join("fbnp_interior.pdf")).unwrap();
    assert_eq!(doc.get_pages().len(), 3);
}

#[test]
fn test_cover_dry_run_writes_nothing() {
    let root = TempDir::new().unwrap();
    let book = root.path().join("Cute_Dinosaurs");
    write_pages(&book, 3);

    cmd(&root)
        .args([
            "cover",
            "--safe-title",
            "Cute_Dinosaurs",
            "--title",
            "Cute Dinosaurs",
            "--description",
            "Roar!",
            "--pages",
            "30",
            "--bg",
            "#FFFFFF",
            "--seed",
            "42",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sample sheets (3)"))
        .stdout(predicate::str::contains("Spine text: NO"));

    assert!(!book.join("fbnp_cover.png").exists());
    assert!(!book.join("fbnp_cover.pdf").exists());
}

#[test]
fn test_cover_dry_run_is_reproducible() {
    let root = TempDir::new().unwrap();
    write_pages(&root.path().join("Book"), 6);
    let run = || {
        let output = cmd(&root)
            .args([
                "cover",
                "--safe-title",
                "Book",
                "--title",
                "Book",
                "--description",
                "d",
                "--pages",
                "80",
                "--seed",
                "9",
                "--dry-run",
            ])
            .output()
            .unwrap();
        assert!(output.status.success());
        output.stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn test_cover_missing_pages() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir_all(root.path().join("Nothing")).unwrap();
    cmd(&root)
        .args([
            "cover",
            "--safe-title",
            "Nothing",
            "--title",
            "Nothing",
            "--description",
            "d",
            "--pages",
            "30",
        ])
        .assert()
        .code(2);
}

#[test]
fn test_cover_unknown_gradient() {
    let root = TempDir::new().unwrap();
    let book = root.path().join("Book");
    write_pages(&book, 2);
    cmd(&root)
        .args([
            "cover",
            "--safe-title",
            "Book",
            "--title",
            "Book",
            "--description",
            "d",
            "--pages",
            "30",
            "--bg",
            "gradient:nope:1",
            "--dpi",
            "30",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nope"));
    assert!(!book.join("fbnp_cover.png").exists());
}

#[test]
fn test_unsafe_title_rejected() {
    let root = TempDir::new().unwrap();
    cmd(&root)
        .args(["interior", "--safe-title", "../escape"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_explicit_config_is_fatal() {
    let root = TempDir::new().unwrap();
    cmd(&root)
        .args(["--config", "does-not-exist.toml", "spine", "--pages", "30"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("does-not-exist.toml"));
}

#[test]
fn test_config_file_sets_dpi() {
    let root = TempDir::new().unwrap();
    let config = root.path().join("custom.toml");
    std::fs::write(&config, "[layout]\ndpi = 100\n").unwrap();

    let output = cmd(&root)
        .arg("--config")
        .arg(&config)
        .args(["spine", "--pages", "30", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["dpi"].as_u64().unwrap(), 100);
    assert_eq!(report["height_px"].as_u64().unwrap(), 1125);
}

#[test]
fn test_configured_spine_threshold() {
    let root = TempDir::new().unwrap();
    let config = root.path().join("custom.toml");
    std::fs::write(&config, "[layout]\nspine_text_min_pages = 120\n").unwrap();

    cmd(&root)
        .arg("--config")
        .arg(&config)
        .args(["spine", "--pages", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Spine text: not allowed"));
}

#[test]
fn test_oversized_trim_rejected() {
    let root = TempDir::new().unwrap();
    cmd(&root)
        .args(["spine", "--pages", "30", "--trim", "100x100"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("limit"));
}

#[test]
fn test_info() {
    let root = TempDir::new().unwrap();
    cmd(&root)
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("kdp-coloring v"))
        .stdout(predicate::str::contains("ImageMagick"));
}
