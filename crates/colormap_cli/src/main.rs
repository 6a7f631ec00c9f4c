mod logging;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colormap::{
    legend, parse_stop, ColorMap, HeatmapRenderer, Mode, Orientation, Preset, RenderOptions, Rgba,
    ScalarField,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use walkdir::WalkDir;

use crate::logging::{init_logging, LoggingConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Map scalar data to colors and render heatmaps")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the color of each value
    Map(MapArgs),
    /// Print or write a lookup table sampled across a value range
    Table(TableArgs),
    /// Render a scalar grid text file to a PNG heatmap
    Render(RenderArgs),
    /// Render every scalar grid file in a directory
    Batch(BatchArgs),
    /// Write a gradient strip for the selected color map
    Legend(LegendArgs),
    /// Render generated data with the selected color map
    Demo(DemoArgs),
    /// List the built-in presets
    Presets,
}

#[derive(Parser, Debug)]
struct MapArgs {
    /// Values to map
    #[arg(required = true, allow_negative_numbers = true)]
    values: Vec<f64>,
    /// Value mapped onto the first color
    #[arg(long, allow_negative_numbers = true, default_value_t = 0.0)]
    min: f64,
    /// Value mapped onto the last color
    #[arg(long, allow_negative_numbers = true, default_value_t = 1.0)]
    max: f64,
    #[command(flatten)]
    colors: ColorSettings,
}

#[derive(Parser, Debug)]
struct TableArgs {
    #[arg(long, allow_negative_numbers = true, default_value_t = 0.0)]
    min: f64,
    #[arg(long, allow_negative_numbers = true, default_value_t = 1.0)]
    max: f64,
    /// Number of entries
    #[arg(long, default_value_t = colormap::DEFAULT_TABLE_SIZE)]
    size: usize,
    /// Output file path, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[command(flatten)]
    colors: ColorSettings,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input grid path
    input: PathBuf,
    /// Output PNG path
    #[arg(short, long)]
    output: PathBuf,
    #[command(flatten)]
    settings: RenderSettings,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory searched recursively for grid files
    input: PathBuf,
    /// Output directory for PNG files
    #[arg(short, long)]
    out_dir: PathBuf,
    /// Extension of grid files
    #[arg(long, default_value = "txt")]
    extension: String,
    #[command(flatten)]
    settings: RenderSettings,
}

#[derive(Parser, Debug)]
struct LegendArgs {
    /// Output PNG path
    #[arg(short, long)]
    output: PathBuf,
    #[arg(long, default_value_t = 256)]
    width: u32,
    #[arg(long, default_value_t = 24)]
    height: u32,
    /// Minimum at the bottom instead of the left
    #[arg(long, default_value_t = false)]
    vertical: bool,
    #[command(flatten)]
    colors: ColorSettings,
}

#[derive(Parser, Debug)]
struct DemoArgs {
    /// Output PNG path
    #[arg(short, long)]
    output: PathBuf,
    /// Kind of generated data
    #[arg(long, value_enum, default_value = "ramp")]
    data: DemoData,
    /// Number of ramp samples
    #[arg(long, default_value_t = 32)]
    count: usize,
    /// Random field width
    #[arg(long, default_value_t = 64)]
    width: usize,
    /// Random field height
    #[arg(long, default_value_t = 64)]
    height: usize,
    /// Seed for random data
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[command(flatten)]
    settings: RenderSettings,
}

#[derive(Parser, Debug, Clone)]
struct ColorSettings {
    /// Preset providing the base stops
    #[arg(long, value_enum, default_value = "jet")]
    preset: PresetChoice,
    /// Interpolation between stops
    #[arg(long, value_enum, default_value = "scaled")]
    mode: ModeChoice,
    /// Additional stop as POSITION:COLOR, e.g. 0.5:#ffffff (repeatable)
    #[arg(long = "stop", value_parser = parse_stop)]
    stops: Vec<(f64, Rgba)>,
}

#[derive(Parser, Debug, Clone)]
struct RenderSettings {
    #[command(flatten)]
    colors: ColorSettings,
    /// Value mapped onto the first color, derived from the data when omitted
    #[arg(long, allow_negative_numbers = true, requires = "max")]
    min: Option<f64>,
    /// Value mapped onto the last color, derived from the data when omitted
    #[arg(long, allow_negative_numbers = true, requires = "min")]
    max: Option<f64>,
    /// Lookup table size
    #[arg(long, default_value_t = colormap::DEFAULT_TABLE_SIZE)]
    palette_size: usize,
    /// Color for missing samples
    #[arg(long, default_value = "#00000000")]
    nodata: Rgba,
    /// Pixels per cell side
    #[arg(long, default_value_t = 1)]
    scale: u32,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PresetChoice {
    BlackBodyRadiation,
    CoolToWarm,
    Jet,
    Grayscale,
    XRay,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeChoice {
    Fixed,
    Scaled,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DemoData {
    Ramp,
    Random,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_verbosity(cli.verbose));

    match cli.command {
        Commands::Map(args) => map(args),
        Commands::Table(args) => table(args),
        Commands::Render(args) => render(args),
        Commands::Batch(args) => batch(args),
        Commands::Legend(args) => write_legend(args),
        Commands::Demo(args) => demo(args),
        Commands::Presets => presets(),
    }
}

fn map(args: MapArgs) -> Result<()> {
    let color_map = args.colors.to_color_map();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for value in args.values {
        match color_map.map(args.min, args.max, value) {
            Some(color) => writeln!(out, "{value}\t{color}")?,
            None => writeln!(out, "{value}\tnone")?,
        }
    }
    Ok(())
}

fn table(args: TableArgs) -> Result<()> {
    let color_map = args.colors.to_color_map();
    let entries = color_map.lookup_table(args.min, args.max, args.size);

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {:?}", path))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    for (index, color) in entries.iter().enumerate() {
        writeln!(out, "{index}\t{color}")?;
    }
    out.flush()?;
    Ok(())
}

fn render(args: RenderArgs) -> Result<()> {
    let renderer = HeatmapRenderer::default();
    let options = args.settings.to_options();
    render_file(&renderer, &args.input, &args.output, &options)
}

fn batch(args: BatchArgs) -> Result<()> {
    let renderer = HeatmapRenderer::default();
    let options = args.settings.to_options();
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create output directory {:?}", args.out_dir))?;

    let inputs = find_grid_files(&args.input, &args.extension);
    if inputs.is_empty() {
        anyhow::bail!("no .{} files found in {:?}", args.extension, args.input);
    }

    let progress = ProgressBar::new(inputs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} grids",
        )?
        .progress_chars("=> "),
    );

    let mut failures = 0;
    for input in &inputs {
        let output = output_path(&args.out_dir, &args.input, input);
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory {:?}", parent))?;
        }

        if let Err(err) = render_file(&renderer, input, &output, &options) {
            warn!("{err:#}");
            failures += 1;
        }
        progress.inc(1);
    }

    progress.finish_with_message(format!("Heatmaps written to {:?}", args.out_dir));
    if failures > 0 {
        anyhow::bail!("{failures} of {} grids failed to render", inputs.len());
    }
    Ok(())
}

fn write_legend(args: LegendArgs) -> Result<()> {
    let color_map = args.colors.to_color_map();
    let orientation =
        if args.vertical { Orientation::Vertical } else { Orientation::Horizontal };
    let image = legend(&color_map, args.width, args.height, orientation);
    image.save(&args.output).with_context(|| format!("failed to write {:?}", args.output))?;
    info!("legend written to {:?}", args.output);
    Ok(())
}

fn demo(args: DemoArgs) -> Result<()> {
    let field = match args.data {
        DemoData::Ramp => ScalarField::ramp(args.count),
        DemoData::Random => ScalarField::random(args.width, args.height, args.seed),
    }
    .context("failed to generate demo data")?;

    let renderer = HeatmapRenderer::default();
    let options = args.settings.to_options();
    let output = renderer.render_field(&field, &options).context("failed to render demo data")?;
    output.save(&args.output).with_context(|| format!("failed to write {:?}", args.output))?;
    info!("demo written to {:?}", args.output);
    Ok(())
}

fn presets() -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for preset in Preset::ALL {
        let color_map = preset.color_map();
        let stops = color_map
            .stop_table()
            .entries()
            .map(|(position, color)| format!("{position}:{color}"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{preset}\t{stops}")?;
    }
    Ok(())
}

fn render_file(
    renderer: &HeatmapRenderer,
    input: &Path,
    output: &Path,
    options: &RenderOptions,
) -> Result<()> {
    let rendered = renderer
        .render_path(input, options)
        .with_context(|| format!("failed to render {:?}", input))?;
    rendered.save(output).with_context(|| format!("failed to write {:?}", output))?;
    info!(
        "{:?} -> {:?} over [{}, {}]",
        input, output, rendered.range.0, rendered.range.1
    );
    Ok(())
}

fn find_grid_files(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_path_buf())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();
    entries.sort();
    entries
}

/// Mirrors `input`'s location below `root` inside `out_dir`, as a PNG.
fn output_path(out_dir: &Path, root: &Path, input: &Path) -> PathBuf {
    let relative = input.strip_prefix(root).unwrap_or(input);
    let relative = match relative.file_name() {
        Some(_) => relative.to_path_buf(),
        None => PathBuf::from("grid"),
    };
    out_dir.join(relative).with_extension("png")
}

impl ColorSettings {
    fn to_color_map(&self) -> ColorMap {
        self.to_options().color_map()
    }

    fn to_options(&self) -> RenderOptions {
        let mut options = RenderOptions::default();
        options.preset = self.preset.to_preset();
        options.mode = self.mode.to_mode();
        options.stops = self.stops.clone();
        options
    }
}

impl RenderSettings {
    fn to_options(&self) -> RenderOptions {
        let mut options = self.colors.to_options();
        options.range = self.min.zip(self.max);
        options.palette_size = self.palette_size.max(2);
        options.nodata = self.nodata;
        options.scale = self.scale.max(1);
        options
    }
}

impl PresetChoice {
    fn to_preset(self) -> Preset {
        match self {
            PresetChoice::BlackBodyRadiation => Preset::BlackBodyRadiation,
            PresetChoice::CoolToWarm => Preset::CoolToWarm,
            PresetChoice::Jet => Preset::Jet,
            PresetChoice::Grayscale => Preset::Grayscale,
            PresetChoice::XRay => Preset::XRay,
        }
    }
}

impl ModeChoice {
    fn to_mode(self) -> Mode {
        match self {
            ModeChoice::Fixed => Mode::Fixed,
            ModeChoice::Scaled => Mode::Scaled,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_stops_and_negative_range() {
        let cli = Cli::parse_from([
            "colormap", "map", "--min", "-10", "--max", "10", "--preset", "grayscale",
            "--stop", "0.5:#ff0000", "-5", "0",
        ]);
        let Commands::Map(args) = cli.command else { panic!("expected map command") };
        assert_eq!(args.values, vec![-5.0, 0.0]);
        assert_eq!(args.min, -10.0);
        assert_eq!(args.colors.stops, vec![(0.5, Rgba::opaque(255, 0, 0))]);

        let color_map = args.colors.to_color_map();
        assert_eq!(color_map.color_stops(), vec![0.0, 0.5, 1.0]);
        assert_eq!(color_map.map(-10.0, 10.0, 0.0), Some(Rgba::opaque(255, 0, 0)));
    }

    #[test]
    fn render_settings_build_options() {
        let cli = Cli::parse_from([
            "colormap", "render", "in.txt", "-o", "out.png", "--mode", "fixed", "--min", "-1",
            "--max", "1", "--scale", "0", "--nodata", "#ffffff",
        ]);
        let Commands::Render(args) = cli.command else { panic!("expected render command") };
        let options = args.settings.to_options();
        assert_eq!(options.mode, Mode::Fixed);
        assert_eq!(options.preset, Preset::Jet);
        assert_eq!(options.range, Some((-1.0, 1.0)));
        assert_eq!(options.scale, 1);
        assert_eq!(options.nodata, Rgba::WHITE);
    }

    #[test]
    fn range_requires_both_bounds() {
        let result =
            Cli::try_parse_from(["colormap", "render", "in.txt", "-o", "out.png", "--min", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn preset_choices_cover_every_preset() {
        for choice in PresetChoice::value_variants() {
            assert!(Preset::ALL.contains(&choice.to_preset()));
        }
        assert_eq!(PresetChoice::value_variants().len(), Preset::ALL.len());
    }

    #[test]
    fn batch_outputs_mirror_input_tree() {
        let out = output_path(Path::new("out"), Path::new("data"), Path::new("data/a/b.txt"));
        assert_eq!(out, PathBuf::from("out/a/b.png"));
    }
}
