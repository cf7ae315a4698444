use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::LevelFilter;

use sheet_curtain::grid::{DEFAULT_COLUMNS, DEFAULT_ROWS};
use sheet_curtain::{
    default_output_path, is_supported_image, render_mask, DetectionMode, GridSize, Manifest,
    OverlayLayer, ProcessOptions, ProcessResult, RenderCommand, SheetConfig, SheetEngine,
    ViewportGeometry,
};

#[derive(Parser)]
#[command(
    name = "sheet-curtain",
    about = "Detect hand-marked cells on scanned sheets",
    version,
    after_help = "Simple usage: sheet-curtain <image> --mode blue  (print covered cells)\n\
                  Book usage:   sheet-curtain book.json -o previews/\n\n\
                  A manifest lists each sheet's path, detection mode and row offset."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Sheet image, or a JSON sheet manifest
    input: String,

    /// Preview output file, or directory when the input is a manifest
    #[arg(short, long)]
    output: Option<String>,

    /// Write a preview next to a single input image ({name}_masked.{ext})
    #[arg(short, long)]
    preview: bool,

    /// Marking to detect on a single image
    #[arg(short, long, value_enum, default_value_t = DetectionMode::Red)]
    mode: DetectionMode,

    /// Rows to shift overlays down by on a single image
    #[arg(long, default_value_t = 0)]
    row_offset: usize,

    /// Grid columns for a single image
    #[arg(long, default_value_t = DEFAULT_COLUMNS)]
    columns: usize,

    /// Grid rows for a single image
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    rows: usize,

    /// Print the initial overlay instructions for each sheet as JSON lines
    #[arg(long)]
    trace: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

/// Level forced by `-v` or `-q`, overriding `RUST_LOG`.
fn pinned_level(cli: &Cli) -> Option<LevelFilter> {
    if cli.verbose {
        Some(LevelFilter::Debug)
    } else if cli.quiet {
        Some(LevelFilter::Error)
    } else {
        None
    }
}

fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::new();
    match pinned_level(cli) {
        Some(level) => builder.filter_level(level),
        None => builder.parse_env(env_logger::Env::default().default_filter_or("warn")),
    };
    builder.init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let opts = ProcessOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    let is_manifest = input_path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let manifest = if is_manifest {
        match Manifest::load(input_path) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    } else {
        if !is_supported_image(input_path) {
            eprintln!("Error: Unsupported input: {}", cli.input);
            process::exit(1);
        }
        let grid = match GridSize::new(cli.columns, cli.rows) {
            Ok(g) => g,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        };
        Manifest {
            grid,
            sheets: vec![SheetConfig {
                path: input_path.to_path_buf(),
                detection: cli.mode,
                row_offset: cli.row_offset,
            }],
        }
    };

    let engine = match SheetEngine::new(manifest.grid) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Fatal: Failed to initialize engine: {e}");
            process::exit(1);
        }
    };

    let results = if is_manifest {
        let output_dir = cli.output.as_ref().map(PathBuf::from);
        engine.process_manifest(&manifest, output_dir.as_deref(), &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => Some(PathBuf::from(o)),
            None if cli.preview => Some(default_output_path(input_path)),
            None => None,
        };
        vec![engine.process_sheet(&manifest.sheets[0], output_path.as_deref(), &opts)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for (r, sheet) in results.iter().zip(&manifest.sheets) {
        print_result(r, &opts);
        if cli.trace {
            print_trace(r, sheet);
        }
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 || results.len() != manifest.sheets.len() {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    eprint!("{}", format_result(result, opts));
}

/// Status lines for one sheet; with `-v` this is the only place the mask grid is shown.
fn format_result(result: &ProcessResult, opts: &ProcessOptions) -> String {
    if opts.quiet && result.success {
        return String::new();
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if !result.success {
        return format!("[FAIL] {filename}: {}\n", result.message);
    }

    let mut out = format!("[OK] {filename}: {}\n", result.message);
    if let Some(preview) = &result.preview {
        out.push_str(&format!("  -> {}\n", preview.display()));
    }
    if opts.verbose {
        if let Some(mask) = &result.mask {
            out.push_str(&mask.to_string());
        }
    }
    out
}

/// Replay the initial render at natural size and print each instruction.
fn print_trace(result: &ProcessResult, sheet: &SheetConfig) {
    let (Some(mask), Some((width, height))) = (&result.mask, result.dimensions) else {
        return;
    };
    let geometry = ViewportGeometry::sized(f64::from(width), f64::from(height));
    let mut commands: Vec<RenderCommand> = Vec::new();
    render_mask(
        mask,
        sheet.row_offset,
        &geometry,
        &mut OverlayLayer::default(),
        &mut commands,
    );
    for command in &commands {
        match serde_json::to_string(command) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("Error: failed to encode instruction: {e}"),
        }
    }
}
