use assert_cmd::prelude::*;
use predicates::str::contains;
use std::fs;
use std::io::Write;
use std::process::Command;
use tempfile::{tempdir, NamedTempFile};

const SYMBOL_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg">
  <path fill="#000000" d="M0 0 H100 V100 H0 Z M20 20 H80 V80 H20 Z"/>
  <path fill="#D51B30" d="M30 30 H70 V70 H30 Z"/>
</svg>
"##;

fn build_manifest() -> NamedTempFile {
    let scene = r#"<scene name="cli">
  <object>
    <name>Sun</name>
    <type>light</type>
    <intensity>3</intensity>
  </object>
  <object>
    <name>Cross</name>
    <type>cross</type>
    <half-width>0.375</half-width>
    <reach>10</reach>
    <depth>0.8</depth>
  </object>
  <object>
    <name>Badge</name>
    <type>symbol</type>
    <asset>badge.svg</asset>
    <spin>0 -0.005 0</spin>
  </object>
</scene>
"#;
    let mut tmp = NamedTempFile::new().expect("temp manifest");
    tmp.write_all(scene.as_bytes()).expect("write manifest");
    tmp
}

#[test]
fn cli_assembles_manifest_and_advances_ticks() {
    let manifest = build_manifest();
    let assets = tempdir().expect("temp assets");
    fs::write(assets.path().join("badge.svg"), SYMBOL_SVG).expect("write svg");

    let mut cmd = Command::cargo_bin("glass-emblems").expect("binary exists");
    cmd.arg(manifest.path())
        .arg("--assets")
        .arg(assets.path())
        .arg("--ticks")
        .arg("10");
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene cli with 4 nodes (1 lights)"))
        .stdout(contains(" - Cross (mesh)"))
        .stdout(contains(" - Badge (group)"))
        .stdout(contains("Final node states:"))
        .stdout(contains(
            " - Badge pos=(0.00, 0.00, 0.00) rot=(0.000, -0.050, 0.000)",
        ));
}

#[test]
fn cli_reports_missing_assets_for_builtin_scene() {
    let assets = tempdir().expect("temp assets");
    let mut cmd = Command::cargo_bin("glass-emblems").expect("binary exists");
    cmd.arg("montreal").arg("--assets").arg(assets.path());
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene montreal with 1 nodes (2 lights)"))
        .stdout(contains("Skipped Rose:"))
        .stdout(contains("Skipped Chardon:"))
        .stdout(contains(" - Cross pos=(0.00, 0.00, -0.40)"));
}

#[test]
fn cli_exports_obj_and_mtl() {
    let manifest = build_manifest();
    let assets = tempdir().expect("temp assets");
    fs::write(assets.path().join("badge.svg"), SYMBOL_SVG).expect("write svg");
    let out = tempdir().expect("temp output");
    let obj = out.path().join("scene.obj");

    let mut cmd = Command::cargo_bin("glass-emblems").expect("binary exists");
    cmd.arg(manifest.path())
        .arg("--assets")
        .arg(assets.path())
        .arg("--export")
        .arg(&obj);
    cmd.assert()
        .success()
        .stdout(contains("Exported 3 mesh(es) and 3 material(s)"));

    let obj_text = fs::read_to_string(&obj).expect("obj written");
    assert!(obj_text.contains("mtllib scene.mtl"));
    let mtl_text = fs::read_to_string(out.path().join("scene.mtl")).expect("mtl written");
    assert_eq!(mtl_text.matches("newmtl").count(), 3);
}

#[test]
fn cli_rejects_unknown_arguments() {
    let mut cmd = Command::cargo_bin("glass-emblems").expect("binary exists");
    cmd.arg("canada").arg("--fast");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --fast"));

    let mut cmd = Command::cargo_bin("glass-emblems").expect("binary exists");
    cmd.assert().failure().stderr(contains("Usage: glass-emblems"));
}
