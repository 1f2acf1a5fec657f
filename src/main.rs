// Copyright 2020 TwoCookingMice

use madeleine::core::integrator::Integrator;
use madeleine::core::scene_loader::load_scene_with_settings;
use madeleine::integrators::path::PathIntegrator;
use madeleine::io::exr_utils;
use madeleine::renderers::simple::{Renderer, SimpleRenderer};

use std::env;
use std::sync::Arc;

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <scene.xml> <output.exr> [--spp N] [--max-depth N] [--seed N]",
                  args[0]);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let mut spp_override: Option<u32> = None;
    let mut max_depth_override: Option<u32> = None;
    let mut seed: u64 = 0;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--spp" => {
                i += 1;
                spp_override = args.get(i).and_then(|v| v.parse::<u32>().ok());
            }
            "--max-depth" => {
                i += 1;
                max_depth_override = args.get(i).and_then(|v| v.parse::<u32>().ok());
            }
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);
            }
            other => {
                log::warn!("ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    let load_result = load_scene_with_settings(input_path)
        .expect("failed to load scene");

    let scene = load_result.scene;
    let sensor = load_result.sensor.expect("scene has no sensor");
    let spp = spp_override.or(load_result.samples_per_pixel).unwrap_or(32);
    let integrator: Arc<dyn Integrator> = match max_depth_override {
        Some(max_depth) => Arc::new(PathIntegrator::new(max_depth, 3)),
        None => load_result.integrator
            .unwrap_or_else(|| Arc::new(PathIntegrator::default())),
    };

    let renderer = SimpleRenderer::new(integrator, sensor, spp, seed);
    let image = renderer.render(&scene);
    exr_utils::write_exr_to_file(&image.raw_copy(), image.width(), image.height(), output_path);
}
