//! kdp-coloring - Print-ready KDP coloring book covers and interiors
//!
//! CLI entry point

use anyhow::Context;
use clap::Parser;
use kdp_coloring::{
    compute_canvas, compute_spine, exit_codes, generate_cover, generate_interior, inspect_pdf,
    plan_cover, BuildError, Cli, Commands, Config, ConsoleProgress, CoverArgs, InteriorArgs,
    MagickConverter, OutputMode, SeededStream, SpineArgs,
};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::filter::LevelFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    let mode = OutputMode::from_flags(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Info => run_info(),
        command => load_config(&cli).and_then(|config| match command {
            Commands::Cover(args) => run_cover(args, &config, mode),
            Commands::Interior(args) => run_interior(args, &config, mode),
            Commands::Spine(args) => run_spine(args, &config),
            Commands::Info => run_info(),
        }),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BuildError>())
        .map(BuildError::exit_code)
        .unwrap_or(exit_codes::GENERAL_ERROR)
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit `--config` must load; discovered files fall back to defaults
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let file_config = match &cli.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => Config::load()?,
    };
    Ok(file_config.merge_with_cli(&cli.overrides()))
}

// ============ Cover Command ============

fn run_cover(args: &CoverArgs, config: &Config, mode: OutputMode) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let options = args.to_options();

    if args.dry_run {
        let book_dir = config.book_dir(&options.safe_title);
        let mut rng = SeededStream::new(options.seed);
        let plan = plan_cover(&options, &book_dir, &config.layout, &mut rng)
            .with_context(|| format!("cannot plan cover for {}", book_dir.display()))?;
        print_cover_plan(args, config, &plan);
        return Ok(());
    }

    let progress = ConsoleProgress::new(mode);
    let files = generate_cover(&options, config, &progress).context("cover build failed")?;

    if mode.should_show(OutputMode::Normal) {
        println!("Cover PNG: {}", files.png.display());
        println!("Cover PDF: {} ({:?})", files.pdf.display(), files.route);
        report_pdf(&files.pdf);
        println!("Total time: {:.2}s", start_time.elapsed().as_secs_f64());
    }
    Ok(())
}

fn print_cover_plan(args: &CoverArgs, config: &Config, plan: &kdp_coloring::CoverPlan) {
    println!("=== Dry Run - Cover Plan ===");
    println!();
    println!("Book folder: {}", plan.book_dir.display());
    println!("Trim: {} in", args.trim);
    println!("Paper: {} ({} pages)", args.paper, args.pages);
    println!();
    println!("Geometry:");
    println!(
        "  Spine: {:.4} in{}",
        plan.spine.width_in,
        if plan.spine.clamped { " (clamped to minimum)" } else { "" }
    );
    println!(
        "  Canvas: {}x{} px ({:.4}x{:.4} in at {} DPI)",
        plan.canvas.width_px,
        plan.canvas.height_px,
        plan.canvas.width_in(),
        plan.canvas.height_in(),
        plan.canvas.dpi
    );
    println!("  Bleed: {} in", plan.canvas.bleed_in);
    println!(
        "  Spine text: {}",
        if plan.spine_text { "YES" } else { "NO" }
    );
    println!();
    println!("Rendering:");
    println!("  Background: {}", args.background);
    println!(
        "  Seed: {}",
        plan.seed.map_or_else(|| "random".to_string(), |s| s.to_string())
    );
    println!(
        "  PDF route: {}",
        if config.use_magick && !args.no_magick && MagickConverter::detect().is_some() {
            "ImageMagick"
        } else {
            "native"
        }
    );
    println!();
    println!("Sample sheets ({}):", plan.sheets.len());
    for (i, sheet) in plan.sheets.iter().enumerate() {
        println!(
            "  {}. {:?} {}x{} at ({}, {}) {:+.1} deg  {}",
            i + 1,
            sheet.panel,
            sheet.rect.width,
            sheet.rect.height,
            sheet.rect.x,
            sheet.rect.y,
            sheet.angle_deg,
            sheet.source.display()
        );
    }
}

// ============ Interior Command ============

fn run_interior(args: &InteriorArgs, config: &Config, mode: OutputMode) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let options = args.to_options();
    let progress = ConsoleProgress::new(mode);

    let path = generate_interior(
        &args.safe_title,
        args.trim,
        config.layout.dpi,
        args.margin_in,
        !args.no_bleed,
        &options,
        config,
        &progress,
    )
    .context("interior build failed")?;

    if mode.should_show(OutputMode::Normal) {
        println!("Interior PDF: {}", path.display());
        report_pdf(&path);
        println!("Total time: {:.2}s", start_time.elapsed().as_secs_f64());
    }
    Ok(())
}

fn report_pdf(path: &Path) {
    match inspect_pdf(path) {
        Ok(summary) => {
            print!("  Pages: {}", summary.page_count);
            if let Some((w, h)) = summary.first_page_in() {
                print!(", first page {:.3}x{:.3} in", w, h);
            }
            println!();
        }
        Err(e) => eprintln!("Warning: cannot inspect {}: {}", path.display(), e),
    }
}

// ============ Spine Command ============

#[derive(Serialize)]
struct SpineReport {
    pages: u32,
    paper: String,
    trim: String,
    spine_in: f64,
    spine_clamped: bool,
    spine_text: bool,
    dpi: u32,
    bleed_in: f64,
    width_in: f64,
    height_in: f64,
    width_px: u32,
    height_px: u32,
    spine_px: u32,
}

fn run_spine(args: &SpineArgs, config: &Config) -> anyhow::Result<()> {
    let layout = &config.layout;
    let spine = compute_spine(args.pages, args.paper, layout)?;
    let bleed_in = if args.no_bleed { 0.0 } else { layout.bleed_in };
    let canvas = compute_canvas(args.trim, spine.width_in, bleed_in, layout.dpi)?;

    let report = SpineReport {
        pages: args.pages,
        paper: args.paper.to_string(),
        trim: args.trim.to_string(),
        spine_in: spine.width_in,
        spine_clamped: spine.clamped,
        spine_text: spine.text_eligible(layout.spine_text_min_pages),
        dpi: canvas.dpi,
        bleed_in: canvas.bleed_in,
        width_in: canvas.width_in(),
        height_in: canvas.height_in(),
        width_px: canvas.width_px,
        height_px: canvas.height_px,
        spine_px: canvas.spine_px(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Pages: {} ({})", report.pages, report.paper);
    println!("Trim: {} in", report.trim);
    println!(
        "Spine: {:.4} in ({} px){}",
        report.spine_in,
        report.spine_px,
        if report.spine_clamped { ", clamped to minimum" } else { "" }
    );
    println!(
        "Spine text: {}",
        if report.spine_text { "allowed" } else { "not allowed" }
    );
    println!(
        "Canvas: {:.4}x{:.4} in, {}x{} px at {} DPI (bleed {} in)",
        report.width_in, report.height_in, report.width_px, report.height_px, report.dpi, report.bleed_in
    );
    Ok(())
}

// ============ Info Command ============

fn run_info() -> anyhow::Result<()> {
    println!("kdp-coloring v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);

    println!();
    println!("External Tools:");
    match MagickConverter::detect() {
        Some(magick) => match magick.version() {
            Some(version) => println!("  ImageMagick: {} ({})", version, magick.program().display()),
            None => println!("  ImageMagick: {} (version unknown)", magick.program().display()),
        },
        None => println!("  ImageMagick: Not found (native PDF export is used)"),
    }

    println!();
    println!("Fonts:");
    let config = Config::load().unwrap_or_default();
    let layout = &config.layout;
    for (role, paths) in [("Title", &layout.title_fonts), ("Text", &layout.text_fonts)] {
        match paths.iter().find(|p| p.is_file()) {
            Some(path) => println!("  {}: {}", role, path.display()),
            None => println!("  {}: Not found ({} candidates)", role, paths.len()),
        }
    }

    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        let status = if path.is_file() { "found" } else { "not found" };
        println!("  {} ({})", path.display(), status);
    }
    println!("  Output root: {}", config.output_root.display());

    Ok(())
}
