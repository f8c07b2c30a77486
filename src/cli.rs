//! CLI argument definitions
//!
//! Parsed with clap derive; value types with a `FromStr` impl (trim, paper,
//! background) are validated by clap before any command runs.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::background::BackgroundSpec;
use crate::config::CliOverrides;
use crate::cover::CoverOptions;
use crate::interior::{InteriorOptions, DEFAULT_MARGIN_IN, DEFAULT_MAX_UPSCALE};
use crate::sheets::MAX_SHEETS;
use crate::sizing::{PaperProfile, TrimSize};

/// Print-ready KDP coloring book covers and interiors
#[derive(Parser, Debug)]
#[command(name = "kdp-coloring")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding one folder per book [default: /mnt/ai_data/ColoringBooks]
    #[arg(long, global = true)]
    pub output_root: Option<PathBuf>,

    /// Config file (TOML); failures to read it are fatal
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the wraparound cover (PNG preview + PDF)
    Cover(CoverArgs),
    /// Build the interior PDF from fbnp_<N>.png pages
    Interior(InteriorArgs),
    /// Print spine and canvas geometry without writing files
    Spine(SpineArgs),
    /// Show version, external tools and config locations
    Info,
}

/// Arguments for the cover command
#[derive(Args, Debug)]
pub struct CoverArgs {
    /// Book folder name under the output root
    #[arg(long)]
    pub safe_title: String,

    /// Front cover title
    #[arg(long)]
    pub title: String,

    /// Back cover description
    #[arg(long)]
    pub description: String,

    /// Interior page count (decides the spine width)
    #[arg(long)]
    pub pages: u32,

    /// Paper stock: white, cream, color, color_standard
    #[arg(long, default_value = "white")]
    pub paper: PaperProfile,

    /// Trim size in inches, WxH
    #[arg(long, default_value = "8.5x11")]
    pub trim: TrimSize,

    /// Number of sample sheets (clamped to 2-5)
    #[arg(long, default_value_t = MAX_SHEETS)]
    pub max_images: usize,

    /// Spine title (drawn only when the page count allows spine text)
    #[arg(long)]
    pub spine_title: Option<String>,

    /// Line under the title
    #[arg(long)]
    pub subtitle: Option<String>,

    /// Background: #RRGGBB or gradient:<preset>:<variant>
    #[arg(long = "bg", default_value = "gradient:pastel:1")]
    pub background: BackgroundSpec,

    /// Seed for sheet selection and placement
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output resolution [default: from config, 300]
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Build without bleed
    #[arg(long)]
    pub no_bleed: bool,

    /// Never use ImageMagick for the PDF
    #[arg(long)]
    pub no_magick: bool,

    /// Show the plan without rendering or writing
    #[arg(long)]
    pub dry_run: bool,
}

impl CoverArgs {
    pub fn to_options(&self) -> CoverOptions {
        CoverOptions::builder()
            .safe_title(self.safe_title.clone())
            .title(self.title.clone())
            .subtitle(self.subtitle.clone())
            .description(self.description.clone())
            .pages(self.pages)
            .paper(self.paper)
            .trim(self.trim)
            .max_images(self.max_images)
            .spine_title(self.spine_title.clone())
            .background(self.background.clone())
            .seed(self.seed)
            .bleed(!self.no_bleed)
            .use_magick(!self.no_magick)
            .build()
    }
}

/// Arguments for the interior command
#[derive(Args, Debug)]
pub struct InteriorArgs {
    /// Book folder name under the output root
    #[arg(long)]
    pub safe_title: String,

    /// Trim size in inches, WxH
    #[arg(long, default_value = "8.5x11")]
    pub trim: TrimSize,

    /// Output resolution [default: from config, 300]
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Safe margin from the trim edge (inches)
    #[arg(long, default_value_t = DEFAULT_MARGIN_IN)]
    pub margin_in: f64,

    /// Build without bleed
    #[arg(long)]
    pub no_bleed: bool,

    /// Upscale limit for small pages
    #[arg(long, default_value_t = DEFAULT_MAX_UPSCALE)]
    pub max_upscale: f64,

    /// Name on the copyright page
    #[arg(long)]
    pub copyright_holder: Option<String>,

    /// Year on the copyright page [default: current year]
    #[arg(long)]
    pub copyright_year: Option<i32>,

    /// Skip the ownership and copyright pages
    #[arg(long)]
    pub no_front_matter: bool,
}

impl InteriorArgs {
    pub fn to_options(&self) -> InteriorOptions {
        let mut builder = InteriorOptions::builder()
            .max_upscale(self.max_upscale)
            .front_matter(!self.no_front_matter)
            .title(self.safe_title.clone());
        if let Some(holder) = &self.copyright_holder {
            builder = builder.copyright_holder(holder.clone());
        }
        if let Some(year) = self.copyright_year {
            builder = builder.copyright_year(year);
        }
        builder.build()
    }
}

/// Arguments for the spine command
#[derive(Args, Debug)]
pub struct SpineArgs {
    /// Interior page count
    #[arg(long)]
    pub pages: u32,

    /// Paper stock: white, cream, color, color_standard
    #[arg(long, default_value = "white")]
    pub paper: PaperProfile,

    /// Trim size in inches, WxH
    #[arg(long, default_value = "8.5x11")]
    pub trim: TrimSize,

    /// Output resolution [default: from config, 300]
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Geometry without bleed
    #[arg(long)]
    pub no_bleed: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Overrides that apply to every command
    pub fn overrides(&self) -> CliOverrides {
        let dpi = match &self.command {
            Commands::Cover(args) => args.dpi,
            Commands::Interior(args) => args.dpi,
            Commands::Spine(args) => args.dpi,
            Commands::Info => None,
        };
        let use_magick = match &self.command {
            Commands::Cover(args) if args.no_magick => Some(false),
            _ => None,
        };
        CliOverrides {
            output_root: self.output_root.clone(),
            use_magick,
            dpi,
            bleed_in: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cover_defaults() {
        let cli = Cli::try_parse_from([
            "kdp-coloring",
            "cover",
            "--safe-title",
            "Cute_Dinosaurs",
            "--title",
            "Cute Dinosaurs",
            "--description",
            "Roar!",
            "--pages",
            "30",
        ])
        .unwrap();
        let Commands::Cover(args) = &cli.command else {
            panic!("expected cover command");
        };
        assert_eq!(args.paper, PaperProfile::White);
        assert_eq!(args.trim, TrimSize::letter());
        assert_eq!(args.max_images, 5);
        assert_eq!(args.background.to_string(), "gradient:pastel:1");

        let options = args.to_options();
        assert!(options.bleed);
        assert!(options.use_magick);
        assert_eq!(options.pages, 30);
        assert_eq!(cli.overrides(), CliOverrides::default());
    }

    #[test]
    fn test_cover_flags() {
        let cli = Cli::try_parse_from([
            "kdp-coloring",
            "--output-root",
            "/tmp/books",
            "cover",
            "--safe-title",
            "x",
            "--title",
            "X",
            "--description",
            "d",
            "--pages",
            "100",
            "--paper",
            "CREAM",
            "--trim",
            "6 X 9",
            "--bg",
            "#FFFFFF",
            "--seed",
            "7",
            "--dpi",
            "150",
            "--no-bleed",
            "--no-magick",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.output_root, Some(PathBuf::from("/tmp/books")));
        assert_eq!(overrides.dpi, Some(150));
        assert_eq!(overrides.use_magick, Some(false));

        let Commands::Cover(args) = &cli.command else {
            panic!("expected cover command");
        };
        let options = args.to_options();
        assert_eq!(options.paper, PaperProfile::Cream);
        assert_eq!(options.trim.width_in, 6.0);
        assert_eq!(options.seed, Some(7));
        assert!(!options.bleed);
    }

    #[test]
    fn test_bad_paper_rejected() {
        let result = Cli::try_parse_from(["kdp-coloring", "spine", "--pages", "30", "--paper", "glossy"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_interior_options() {
        let cli = Cli::try_parse_from([
            "kdp-coloring",
            "interior",
            "--safe-title",
            "Book",
            "--copyright-holder",
            "Acme",
            "--copyright-year",
            "2024",
            "--max-upscale",
            "2",
        ])
        .unwrap();
        let Commands::Interior(args) = &cli.command else {
            panic!("expected interior command");
        };
        assert_eq!(args.margin_in, 0.5);
        let options = args.to_options();
        assert_eq!(options.copyright_holder, "Acme");
        assert_eq!(options.copyright_year, 2024);
        assert_eq!(options.max_upscale, 2.0);
        assert!(options.front_matter);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["kdp-coloring", "-q", "-v", "info"]);
        assert!(result.is_err());
    }
}
