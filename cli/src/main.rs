use clap::{CommandFactory, Parser, Subcommand};
use cli::{
    handlers::{
        HandlerResult, ModelArgs, handle_check, handle_predict,
        handle_presets, handle_summary, parse_shape,
    },
    logging::init_tracing,
};
use console::Style;

#[derive(Parser)]
#[command(version, about = "Multi-head separable-convolution classifier builder")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a model and print its layers and parameter count
    Summary {
        #[command(flatten)]
        model: ModelArgs,
        /// Print configuration, compile settings and counts as JSON
        #[arg(long)]
        json: bool,
    },
    /// Parse an architecture descriptor and show the branch it builds
    Check {
        /// Descriptor, e.g. S16,3,2_R_D_S32,3,2_R_D ("" for the fallback)
        ensemble: String,
        /// Shape of the trunk features the branch is attached to, H,W,C
        #[arg(long, value_parser = parse_shape, default_value = "19,19,728")]
        features: [usize; 3],
        /// Class index used for layer names
        #[arg(long, default_value_t = 0)]
        class: usize,
    },
    /// List the bundled ensemble structures
    Presets,
    /// Run inference on random inputs
    Predict {
        #[command(flatten)]
        model: ModelArgs,
        #[arg(long, default_value_t = 4)]
        batch_size: usize,
        /// Seed for the random inputs
        #[arg(long, default_value_t = 0)]
        input_seed: u64,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result: HandlerResult = match cli.command {
        Some(Commands::Summary {
            model,
            json,
        }) => handle_summary(model, json),
        Some(Commands::Check {
            ensemble,
            features,
            class,
        }) => handle_check(ensemble, features, class),
        Some(Commands::Presets) => handle_presets(),
        Some(Commands::Predict {
            model,
            batch_size,
            input_seed,
        }) => handle_predict(model, batch_size, input_seed),
        None => {
            let mut cmd = Cli::command();
            cmd.print_help().map_err(Into::into)
        },
    };

    if let Err(error) = result {
        let style_error = Style::new().red().bold();
        eprintln!("{} {error}", style_error.apply_to("error:"));
        std::process::exit(1);
    }
}
