use console::Style;
use fabricnet::build_model;
use indicatif::{ProgressBar, ProgressStyle};

use super::{HandlerResult, ModelArgs};

pub fn handle_summary(
    args: ModelArgs,
    json: bool,
) -> HandlerResult {
    let config = args.into_config()?;

    let progress_bar = ProgressBar::new_spinner();
    progress_bar.enable_steady_tick(std::time::Duration::from_millis(100));
    progress_bar.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?,
    );
    progress_bar.set_message("Building model");
    let model = build_model(&config);
    progress_bar.finish_and_clear();
    let model = model?;

    if json {
        let report = serde_json::json!({
            "config": config,
            "compile": model.compile_config(),
            "parameters": model.parameter_count(),
            "outputs": model.output_len(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let summary = model.summary();
    println!("{summary}");
    let style_total = Style::new().bold().green();
    println!(
        "{}",
        style_total.apply_to(format!(
            "{} parameters, {} outputs, loss {}",
            summary.total_parameters,
            model.output_len(),
            model.compile_config().loss
        ))
    );
    Ok(())
}
