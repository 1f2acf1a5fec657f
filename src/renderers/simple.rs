// Copyright @yucwang 2021

use crate::core::integrator::Integrator;
use crate::core::sampler::{IndependentSampler, Sampler};
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector2f, Vector3f};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

pub use super::renderer::Renderer;

/// Block renderer: the image is cut into square blocks handed out to a
/// pool of worker threads. Workers share nothing mutable; every pixel
/// owns a deterministically seeded sampler, so concurrent path
/// evaluations stay independent.
pub struct SimpleRenderer {
    integrator: Arc<dyn Integrator>,
    sensor: Box<dyn Sensor>,
    samples_per_pixel: u32,
    seed: u64,
}

impl SimpleRenderer {
    pub fn new(integrator: Arc<dyn Integrator>,
               sensor: Box<dyn Sensor>,
               samples_per_pixel: u32,
               seed: u64) -> Self {
        Self {
            integrator,
            sensor,
            samples_per_pixel: samples_per_pixel.max(1),
            seed,
        }
    }

    fn pixel_seed(&self, x: usize, y: usize) -> u64 {
        ((self.seed & 0xFFF) << 32) | (((y as u64) & 0xFFFF) << 16) | ((x as u64) & 0xFFFF)
    }
}

impl Renderer for SimpleRenderer {
    fn render(&self, scene: &Scene) -> Bitmap {
        let width = self.sensor.bitmap().width();
        let height = self.sensor.bitmap().height();
        if width == 0 || height == 0 {
            return Bitmap::new(0, 0);
        }

        let spp = self.samples_per_pixel;
        let inv_spp = 1.0 / (spp as Float);

        let block_size = 32usize;
        let blocks_x = (width + block_size - 1) / block_size;
        let blocks_y = (height + block_size - 1) / block_size;
        let total_blocks = blocks_x * blocks_y;

        let sensor_ref: &dyn Sensor = self.sensor.as_ref();
        let integrator_ref: &dyn Integrator = self.integrator.as_ref();

        let progress = ProgressBar::new(total_blocks as u64);
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} blocks")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let next_block = Arc::new(AtomicUsize::new(0));
        let thread_count = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let (tx, rx) = mpsc::channel::<(usize, usize, usize, usize, Vec<Vector3f>)>();
        let mut output = vec![Vector3f::zeros(); width * height];

        log::info!("rendering {}x{} at {} spp on {} threads",
                   width, height, spp, thread_count);

        thread::scope(|scope| {
            for _ in 0..thread_count {
                let next_block = Arc::clone(&next_block);
                let tx = tx.clone();
                scope.spawn(move || {
                    loop {
                        let block_index = next_block.fetch_add(1, Ordering::Relaxed);
                        if block_index >= total_blocks {
                            break;
                        }

                        let bx = block_index % blocks_x;
                        let by = block_index / blocks_x;
                        let x0 = bx * block_size;
                        let y0 = by * block_size;
                        let x1 = (x0 + block_size).min(width);
                        let y1 = (y0 + block_size).min(height);

                        let mut block = vec![Vector3f::zeros(); (x1 - x0) * (y1 - y0)];
                        for y in y0..y1 {
                            for x in x0..x1 {
                                let mut sampler = IndependentSampler::new(self.pixel_seed(x, y));
                                let mut color = Vector3f::zeros();
                                for _ in 0..spp {
                                    let jitter = sampler.next_2d();
                                    let u = Vector2f::new(
                                        (x as Float + jitter.x) / (width as Float),
                                        (y as Float + jitter.y) / (height as Float),
                                    );
                                    let ray = sensor_ref.sample_ray(&u);
                                    let radiance =
                                        integrator_ref.li(scene, &mut sampler, &ray);
                                    color += radiance.to_vector();
                                }
                                block[(x - x0) + (x1 - x0) * (y - y0)] = color * inv_spp;
                            }
                        }
                        if tx.send((x0, y0, x1, y1, block)).is_err() {
                            break;
                        }
                    }
                });
            }

            drop(tx);
            for _ in 0..total_blocks {
                if let Ok((x0, y0, x1, y1, block)) = rx.recv() {
                    for y in y0..y1 {
                        for x in x0..x1 {
                            output[x + width * y] = block[(x - x0) + (x1 - x0) * (y - y0)];
                        }
                    }
                    progress.inc(1);
                }
            }
        });
        progress.finish_and_clear();

        let mut bitmap = Bitmap::new(width, height);
        for y in 0..height {
            for x in 0..width {
                bitmap[(x, y)] = output[x + width * y];
            }
        }
        bitmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrators::path::PathIntegrator;
    use crate::integrators::test_support::furnace_scene;
    use crate::sensors::perspective::PerspectiveCamera;

    // Every pixel of a furnace render must converge to the same
    // analytic value, regardless of which worker produced it.
    #[test]
    fn test_renderer_furnace_image_is_uniform() {
        let scene = furnace_scene(0.5, 1.0);
        let camera = PerspectiveCamera::new(
            Vector3f::new(0.0, 0.0, 0.0),
            Vector3f::new(0.0, 0.0, -1.0),
            Vector3f::new(0.0, 1.0, 0.0),
            std::f32::consts::FRAC_PI_2,
            8, 8, 0.0, Float::MAX,
        );
        let renderer = SimpleRenderer::new(
            Arc::new(PathIntegrator::default()),
            Box::new(camera),
            256,
            7,
        );
        let image = renderer.render(&scene);

        let expected = 2.0;
        for y in 0..image.height() {
            for x in 0..image.width() {
                let value = image[(x, y)];
                assert!((value[0] - expected).abs() / expected < 0.15,
                        "pixel ({}, {}) = {}", x, y, value[0]);
            }
        }
    }
}
