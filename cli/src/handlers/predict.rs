use console::Style;
use fabricnet::{backends::cpu::argmax, build_model};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array4, Axis};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::info;

use super::{HandlerResult, ModelArgs};

/// Runs the model over uniformly random inputs, one sample at a time.
pub fn handle_predict(
    args: ModelArgs,
    batch_size: usize,
    input_seed: u64,
) -> HandlerResult {
    let config = args.into_config()?;
    let model = build_model(&config)?;

    let [height, width, channels] = config.input_shape;
    let mut rng = StdRng::seed_from_u64(input_seed);
    let batch = Array4::from_shape_simple_fn(
        (batch_size, height, width, channels),
        || rng.gen_range(0.0f32..1.0),
    );

    let progress_bar = ProgressBar::new(batch_size as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.green} {pos}/{len} {msg}")?,
    );
    let started = std::time::Instant::now();
    let mut outputs = Vec::with_capacity(batch_size);
    for index in 0..batch_size {
        let sample = batch.slice_axis(Axis(0), (index..index + 1).into());
        outputs.push(model.predict(sample)?);
        progress_bar.inc(1);
    }
    progress_bar.finish_and_clear();
    info!(
        samples = batch_size,
        seconds = started.elapsed().as_secs_f64(),
        "prediction finished"
    );

    let style_class = Style::new().bold().cyan();
    for (index, output) in outputs.iter().enumerate() {
        let row: Vec<f32> = output.iter().copied().collect();
        let formatted: Vec<String> =
            row.iter().map(|value| format!("{value:.4}")).collect();
        println!(
            "{index:>4}: [{}] -> class {}",
            formatted.join(", "),
            style_class.apply_to(argmax(&row))
        );
    }
    Ok(())
}
