use console::Style;
use fabricnet::descriptor::{DEFAULT_ENSEMBLE, ENSEMBLE_PRESETS};

use super::HandlerResult;

pub fn handle_presets() -> HandlerResult {
    let style_default = Style::new().bold();
    for preset in ENSEMBLE_PRESETS {
        if preset == DEFAULT_ENSEMBLE {
            println!("{} (default)", style_default.apply_to(preset));
        } else {
            println!("{preset}");
        }
    }
    Ok(())
}
