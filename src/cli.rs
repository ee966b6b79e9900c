use clap::builder::styling::{AnsiColor, Color};
use clap::builder::styling::{Style, Styles};
use clap::{ColorChoice, Parser, Subcommand};

pub const BANNER: &str = "\x1b[0;91m ██████ ██   ██ ██ ██████      ███    ██  ██████  ██████  ███    ███\x1b[0m\n\
                      \x1b[0;93m██      ██   ██ ██ ██   ██     ████   ██ ██    ██ ██   ██ ████  ████\x1b[0m\n\
                      \x1b[0;92m██      ███████ ██ ██████      ██ ██  ██ ██    ██ ██████  ██ ████ ██\x1b[0m\n\
                      \x1b[0;96m██      ██   ██ ██ ██          ██  ██ ██ ██    ██ ██   ██ ██  ██  ██\x1b[0m\n\
                      \x1b[0;95m ██████ ██   ██ ██ ██          ██   ████  ██████  ██   ██ ██      ██\x1b[0m\n";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ChIP-seq spike-in normalization",
    version = env!("CARGO_PKG_VERSION"),
    about = BANNER,
    color = ColorChoice::Always,
    styles = get_styles(),
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compute spike-in alpha factors from the experimental and spike-in count logs
    #[command(alias = "r")]
    Run {
        /// Input directory containing the count logs
        #[arg(short, long)]
        input: String,

        /// param file path
        #[arg(short, long, required_unless_present = "preset", conflicts_with = "preset")]
        param: Option<String>,

        /// use a built-in param preset instead of a param file
        #[arg(long)]
        preset: Option<String>,

        /// Output directory, defaults to the input directory
        #[arg(short, long)]
        output: Option<String>,

        /// skip the read proportion plot
        #[arg(long, default_value_t = false)]
        no_plot: bool,
    },

    /// Generate a param file through CLI
    #[command(alias = "g")]
    Generate {},

    /// List built-in param presets, w/o arguments it will list all available preset names.
    Presets {
        /// Print out params for a specific preset
        #[arg(short, long)]
        name: Option<String>,
    },
}

pub fn get_styles() -> Styles {
    Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::White))))
}
