// Copyright 2020 TwoCookingMice

use std::env;
use std::process;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use rayloom::core::scene::{RenderMode, Scene};
use rayloom::core::scene_io::load_scene;
use rayloom::core::scene_provider::SharedSceneProvider;
use rayloom::io::exr_utils;
use rayloom::renderers::render_context::{RenderConfig, RenderContext, RenderListener};
use rayloom::renderers::render_manager::{RenderError, RenderManager};

struct ProgressListener {
    bar: ProgressBar,
}

impl RenderListener for ProgressListener {
    fn pass_completed(&self, spp: u32, _target_spp: u32) {
        self.bar.set_position(spp as u64);
    }

    fn render_completed(&self, spp: u32) {
        self.bar.set_position(spp as u64);
        self.bar.finish_with_message("done");
    }
}

fn parse_flag<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    match args.get(i).and_then(|v| v.parse::<T>().ok()) {
        Some(value) => value,
        None => {
            eprintln!("Invalid or missing value for {}.", flag);
            process::exit(1);
        }
    }
}

fn render(manager: &mut RenderManager, scene: Scene) -> Result<(), RenderError> {
    manager.set_scene_provider(SharedSceneProvider::new(scene))?;
    manager.start()?;
    manager.join()
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <scene.xml> <output.exr> [--spp N] [--threads N] [--seed N]", args[0]);
        process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let mut spp_override: Option<u32> = None;
    let mut config = RenderConfig::default();

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--spp" => {
                i += 1;
                spp_override = Some(parse_flag(&args, i, "--spp"));
            }
            "--threads" => {
                i += 1;
                config.render_threads = parse_flag(&args, i, "--threads");
            }
            "--seed" => {
                i += 1;
                config.seed = Some(parse_flag(&args, i, "--seed"));
            }
            other => log::warn!("Ignoring unknown argument '{}'.", other),
        }
        i += 1;
    }

    let mut scene = match load_scene(input_path) {
        Ok(scene) => scene,
        Err(err) => {
            log::error!("Failed to load scene {}: {}.", input_path, err);
            process::exit(1);
        }
    };
    if let Some(spp) = spp_override {
        scene.set_target_spp(spp);
    }
    scene.set_render_mode(RenderMode::Rendering);

    let bar = ProgressBar::new(scene.target_spp() as u64);
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} spp {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let context = RenderContext::new(config).with_listener(Arc::new(ProgressListener { bar }));

    let mut manager = RenderManager::new(context, true);
    if let Err(err) = render(&mut manager, scene) {
        log::error!("Render failed: {}.", err);
        process::exit(1);
    }

    let buffered = manager.buffered_scene();
    if let Err(err) = exr_utils::write_sample_buffer(buffered.sample_buffer(), output_path) {
        log::error!("Failed to write {}: {}.", output_path, err);
        process::exit(1);
    }
    log::info!("EXR written to: {}.", output_path);
}
