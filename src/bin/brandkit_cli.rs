//! BrandKit CLI - stands in for the branding form
//!
//! Commands: templates, render, export
//! Outputs JSON (or SVG for `render`) to stdout, logs to stderr
//! Returns 1 on bad input, 2 on export failure

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use brandkit_core::{
    Color, DirectorySink, ExportPipeline, OutputKind, ResvgSurface, TemplateDescriptor, TemplateId, Theme,
};

#[derive(Parser)]
#[command(name = "brandkit-cli")]
#[command(about = "BrandKit CLI - channel branding asset export")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available templates
    Templates,

    /// Print the resolved SVG for one template
    Render {
        /// Template ID (profile, banner, watermark)
        #[arg(short, long)]
        template: String,

        /// Print at the preview display size instead of the canvas size
        #[arg(long)]
        preview: bool,

        #[command(flatten)]
        theme: ThemeArgs,
    },

    /// Export assets into a directory
    Export {
        /// Template ID, or "all"
        #[arg(short, long, default_value = "all")]
        template: String,

        #[arg(short, long, value_enum, default_value_t = FormatArg::Both)]
        format: FormatArg,

        /// Output directory
        #[arg(short, long, default_value = "brand-assets")]
        out_dir: PathBuf,

        #[command(flatten)]
        theme: ThemeArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Svg,
    Png,
    Both,
}

impl FormatArg {
    fn kinds(self) -> Vec<OutputKind> {
        match self {
            Self::Svg => vec![OutputKind::Vector],
            Self::Png => vec![OutputKind::Raster],
            Self::Both => vec![OutputKind::Vector, OutputKind::Raster],
        }
    }
}

#[derive(Args)]
struct ThemeArgs {
    /// JSON payload (Theme); individual flags override it
    #[arg(long)]
    theme: Option<String>,

    /// Channel name
    #[arg(long)]
    title: Option<String>,

    /// Tagline
    #[arg(long)]
    subtitle: Option<String>,

    #[arg(long)]
    primary: Option<String>,

    #[arg(long)]
    secondary: Option<String>,

    #[arg(long)]
    background: Option<String>,

    /// Hide the banner safe-area guide
    #[arg(long)]
    no_guides: bool,
}

impl ThemeArgs {
    fn resolve(self) -> Result<Theme, serde_json::Error> {
        let mut theme = match &self.theme {
            Some(payload) => serde_json::from_str(payload)?,
            None => Theme::default(),
        };
        if let Some(title) = self.title {
            theme.title = title;
        }
        if let Some(subtitle) = self.subtitle {
            theme.subtitle = subtitle;
        }
        if let Some(primary) = self.primary {
            theme.primary_color = Color::normalize(&primary);
        }
        if let Some(secondary) = self.secondary {
            theme.secondary_color = Color::normalize(&secondary);
        }
        if let Some(background) = self.background {
            theme.background_color = Color::normalize(&background);
        }
        if self.no_guides {
            theme.show_guides = false;
        }
        Ok(theme)
    }
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(out) => {
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!(r#"{{"error": "Failed to serialize output: {}"}}"#, e);
            ExitCode::FAILURE
        }
    }
}

fn fail(code: u8, error: impl std::fmt::Display) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": error.to_string(),
    });
    println!("{}", output);
    ExitCode::from(code)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Templates => {
            let templates: Vec<_> = TemplateDescriptor::all()
                .iter()
                .map(|t| serde_json::json!({
                    "id": t.id,
                    "name": t.name,
                    "canvasSize": t.canvas_size,
                    "exportSize": t.export_size,
                    "files": [t.vector_filename, t.raster_filename],
                    "guides": t.supports_guides,
                }))
                .collect();
            print_json(&templates)
        }

        Commands::Render { template, preview, theme } => {
            let theme = match theme.resolve() {
                Ok(t) => t,
                Err(e) => return fail(1, format!("Invalid theme payload: {}", e)),
            };
            let Some(id) = TemplateId::parse(&template) else {
                return fail(1, format!("Unknown template: {}", template));
            };

            let doc = brandkit_core::render_fresh(id.descriptor(), &theme);
            let svg = if preview { doc.to_preview_svg() } else { doc.to_svg() };
            match svg {
                Ok(svg) => {
                    println!("{}", svg);
                    ExitCode::SUCCESS
                }
                Err(e) => fail(2, e),
            }
        }

        Commands::Export { template, format, out_dir, theme } => {
            let theme = match theme.resolve() {
                Ok(t) => t,
                Err(e) => return fail(1, format!("Invalid theme payload: {}", e)),
            };
            let templates = if template.eq_ignore_ascii_case("all") {
                TemplateId::ALL.to_vec()
            } else {
                match TemplateId::parse(&template) {
                    Some(id) => vec![id],
                    None => return fail(1, format!("Unknown template: {}", template)),
                }
            };

            let runtime = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => return fail(1, format!("Failed to start runtime: {}", e)),
            };

            let pipeline = ExportPipeline::new(ResvgSurface, DirectorySink::new(&out_dir));
            let kinds = format.kinds();
            match runtime.block_on(pipeline.export_templates(&theme, &templates, &kinds)) {
                Ok(manifest) => {
                    let output = serde_json::json!({
                        "success": true,
                        "outDir": out_dir,
                        "manifest": manifest,
                    });
                    print_json(&output)
                }
                Err(e) => fail(2, e),
            }
        }
    }
}
