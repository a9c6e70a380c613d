use std::env;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use glass_emblems::{
    assemble, presets, write_mtl, write_obj, AssemblyOptions, DirectoryAssets, SceneContext,
    SceneManifest,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;

    let (manifest_xml, default_assets) = match presets::builtin(&options.scene) {
        Some(xml) => (xml.to_string(), PathBuf::from(".")),
        None => {
            let path = Path::new(&options.scene);
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read manifest {}", path.display()))?;
            let dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (xml, dir)
        }
    };
    let manifest =
        SceneManifest::from_xml(&manifest_xml).context("failed to parse scene manifest")?;
    let assets = DirectoryAssets::new(options.assets.clone().unwrap_or(default_assets));

    let assembly_options = AssemblyOptions {
        viewport: options.viewport,
        ..AssemblyOptions::default()
    };
    let assembly = assemble(&manifest, &assets, &assembly_options)?;
    let mut scene = assembly.scene;

    println!(
        "Loaded scene {} with {} nodes ({} lights)",
        scene.name,
        scene.len(),
        scene.lights.len()
    );
    for root in scene.roots() {
        let node = scene.node(*root);
        println!(" - {} ({})", node.name, node.kind.label());
    }
    for skipped in &assembly.skipped {
        println!("Skipped {}: {}", skipped.name, skipped.reason);
    }
    if assembly.rejected_paths > 0 {
        println!("Rejected {} SVG path(s)", assembly.rejected_paths);
    }

    for _ in 0..options.ticks {
        scene.tick();
    }

    if let Some(path) = &options.export {
        export_scene(&scene, path)?;
    }

    print_final_state(&scene);
    Ok(())
}

fn export_scene(scene: &SceneContext, obj_path: &Path) -> Result<()> {
    let mtl_path = obj_path.with_extension("mtl");
    let mtl_name = mtl_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("invalid export path {}", obj_path.display()))?;

    let obj_file = File::create(obj_path)
        .with_context(|| format!("failed to create {}", obj_path.display()))?;
    let meshes = write_obj(scene, &mut BufWriter::new(obj_file), Some(mtl_name))?;
    let mtl_file = File::create(&mtl_path)
        .with_context(|| format!("failed to create {}", mtl_path.display()))?;
    let materials = write_mtl(scene, &mut BufWriter::new(mtl_file))?;

    println!(
        "Exported {meshes} mesh(es) and {materials} material(s) to {}",
        obj_path.display()
    );
    Ok(())
}

fn print_final_state(scene: &SceneContext) {
    println!("Final node states:");
    for root in scene.roots() {
        let node = scene.node(*root);
        let t = node.transform;
        println!(
            " - {} pos=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}, {:.3})",
            node.name,
            t.position.x,
            t.position.y,
            t.position.z,
            t.rotation.x,
            t.rotation.y,
            t.rotation.z
        );
    }
}

struct CliOptions {
    scene: String,
    assets: Option<PathBuf>,
    ticks: u32,
    viewport: (u32, u32),
    export: Option<PathBuf>,
}

const USAGE: &str = "Usage: glass-emblems <manifest.xml|canada|quebec|montreal> [--assets DIR] [--ticks N] [--viewport WxH] [--export FILE.obj]";

impl CliOptions {
    fn parse(args: impl Iterator<Item = String>) -> Result<Self> {
        let mut args = args;
        let Some(scene) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        let mut options = Self {
            scene,
            assets: None,
            ticks: 0,
            viewport: AssemblyOptions::default().viewport,
            export: None,
        };

        while let Some(arg) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| anyhow!("{arg} expects a value. {USAGE}"))
            };
            match arg.as_str() {
                "--assets" => options.assets = Some(PathBuf::from(value()?)),
                "--export" => options.export = Some(PathBuf::from(value()?)),
                "--ticks" => {
                    let raw = value()?;
                    options.ticks = raw
                        .parse()
                        .with_context(|| format!("invalid tick count {raw}"))?;
                }
                "--viewport" => {
                    let raw = value()?;
                    options.viewport = parse_viewport(&raw)
                        .ok_or_else(|| anyhow!("invalid viewport {raw}, expected WIDTHxHEIGHT"))?;
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }
        Ok(options)
    }
}

fn parse_viewport(value: &str) -> Option<(u32, u32)> {
    let (width, height) = value.split_once('x')?;
    let width = width.parse::<u32>().ok().filter(|w| *w > 0)?;
    let height = height.parse::<u32>().ok().filter(|h| *h > 0)?;
    Some((width, height))
}
