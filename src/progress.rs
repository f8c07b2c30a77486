//! Build progress reporting
//!
//! Composers report stages and per-page progress through [`ProgressCallback`].
//! The CLI installs [`ConsoleProgress`]; library callers and tests use
//! [`SilentProgress`].

use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::fmt;
use std::time::Instant;
use tracing::debug;

/// Build stages, in the order a cover build passes through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildStage {
    #[default]
    Initializing,
    /// Spine and canvas geometry
    Sizing,
    /// Solid or gradient fill
    Background,
    /// Title, spine text and description card
    Text,
    /// Sample sheet rendering
    Sheets,
    /// Interior page placement
    Pages,
    /// PNG preview encoding
    EncodingPreview,
    WritingPdf,
    Completed,
}

impl BuildStage {
    pub fn name(&self) -> &'static str {
        match self {
            BuildStage::Initializing => "Initializing",
            BuildStage::Sizing => "Sizing",
            BuildStage::Background => "Background",
            BuildStage::Text => "Text",
            BuildStage::Sheets => "Sheets",
            BuildStage::Pages => "Pages",
            BuildStage::EncodingPreview => "EncodingPreview",
            BuildStage::WritingPdf => "WritingPdf",
            BuildStage::Completed => "Completed",
        }
    }

    /// Short human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            BuildStage::Initializing => "loading inputs",
            BuildStage::Sizing => "computing spine and canvas",
            BuildStage::Background => "painting background",
            BuildStage::Text => "drawing text",
            BuildStage::Sheets => "placing sample sheets",
            BuildStage::Pages => "laying out pages",
            BuildStage::EncodingPreview => "encoding preview",
            BuildStage::WritingPdf => "writing PDF",
            BuildStage::Completed => "done",
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.description())
    }
}

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    Quiet,
    /// Stage lines only
    #[default]
    Normal,
    /// Adds a per-page progress bar
    Verbose,
    VeryVerbose,
}

impl OutputMode {
    pub fn from_verbosity(level: u8) -> Self {
        match level {
            0 => OutputMode::Normal,
            1 => OutputMode::Verbose,
            _ => OutputMode::VeryVerbose,
        }
    }

    /// `-q` wins over any number of `-v`
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            OutputMode::Quiet
        } else {
            Self::from_verbosity(verbose)
        }
    }

    /// Check if output should be shown at this mode
    pub fn should_show(&self, required: OutputMode) -> bool {
        use OutputMode::*;
        match (self, required) {
            (Quiet, _) => false,
            (Normal, Quiet | Normal) => true,
            (Verbose, Quiet | Normal | Verbose) => true,
            (VeryVerbose, _) => true,
            _ => false,
        }
    }
}

/// Receives build progress
pub trait ProgressCallback {
    /// A new stage started
    fn on_stage(&self, stage: BuildStage);

    /// Item `current` of `total` within the current stage finished (1-based)
    fn on_item(&self, current: usize, total: usize, item: &str);

    /// Build finished
    fn on_complete(&self);
}

/// Discards all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_stage(&self, _stage: BuildStage) {}

    fn on_item(&self, _current: usize, _total: usize, _item: &str) {}

    fn on_complete(&self) {}
}

/// Stage lines on stderr, plus an `indicatif` bar for items in verbose mode
///
/// Stage lines do not depend on the `tracing` filter; they are also logged
/// at debug level.
#[derive(Debug)]
pub struct ConsoleProgress {
    mode: OutputMode,
    started: Instant,
    bar: RefCell<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            started: Instant::now(),
            bar: RefCell::new(None),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn finish_bar(&self) {
        if let Some(bar) = self.bar.borrow_mut().take() {
            bar.finish_and_clear();
        }
    }

    fn new_bar(total: usize) -> ProgressBar {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("  [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar
    }

    /// Line printed when `stage` starts, if this mode shows stages
    fn stage_line(&self, stage: BuildStage) -> Option<String> {
        self.mode
            .should_show(OutputMode::Normal)
            .then(|| format!("  {}", stage))
    }

    fn completion_line(&self) -> Option<String> {
        self.mode
            .should_show(OutputMode::Normal)
            .then(|| format!("  Completed in {:.2}s", self.elapsed_secs()))
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_stage(&self, stage: BuildStage) {
        self.finish_bar();
        debug!(stage = stage.name(), "{}", stage.description());
        if let Some(line) = self.stage_line(stage) {
            eprintln!("{}", line);
        }
    }

    fn on_item(&self, current: usize, total: usize, item: &str) {
        if !self.mode.should_show(OutputMode::Verbose) || total == 0 {
            return;
        }
        let mut slot = self.bar.borrow_mut();
        let bar = slot.get_or_insert_with(|| Self::new_bar(total));
        bar.set_position(current as u64);
        if self.mode.should_show(OutputMode::VeryVerbose) {
            bar.set_message(item.to_string());
            debug!(current, total, item, "item done");
        }
    }

    fn on_complete(&self) {
        self.finish_bar();
        debug!(elapsed_secs = self.elapsed_secs(), "build completed");
        if let Some(line) = self.completion_line() {
            eprintln!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        stages: RefCell<Vec<BuildStage>>,
        items: RefCell<Vec<(usize, usize)>>,
        completed: RefCell<bool>,
    }

    impl ProgressCallback for Recorder {
        fn on_stage(&self, stage: BuildStage) {
            self.stages.borrow_mut().push(stage);
        }

        fn on_item(&self, current: usize, total: usize, _item: &str) {
            self.items.borrow_mut().push((current, total));
        }

        fn on_complete(&self) {
            *self.completed.borrow_mut() = true;
        }
    }

    #[test]
    fn test_callback_records_calls() {
        let rec = Recorder::default();
        let cb: &dyn ProgressCallback = &rec;
        cb.on_stage(BuildStage::Pages);
        cb.on_item(1, 2, "fbnp_1.png");
        cb.on_item(2, 2, "fbnp_2.png");
        cb.on_complete();

        assert_eq!(*rec.stages.borrow(), vec![BuildStage::Pages]);
        assert_eq!(*rec.items.borrow(), vec![(1, 2), (2, 2)]);
        assert!(*rec.completed.borrow());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(BuildStage::Sheets.name(), "Sheets");
        assert_eq!(
            BuildStage::WritingPdf.to_string(),
            "WritingPdf (writing PDF)"
        );
        assert_eq!(BuildStage::default(), BuildStage::Initializing);
    }

    #[test]
    fn test_output_mode_from_flags() {
        assert_eq!(OutputMode::from_flags(0, false), OutputMode::Normal);
        assert_eq!(OutputMode::from_flags(1, false), OutputMode::Verbose);
        assert_eq!(OutputMode::from_flags(5, false), OutputMode::VeryVerbose);
        assert_eq!(OutputMode::from_flags(2, true), OutputMode::Quiet);
    }

    #[test]
    fn test_output_mode_should_show() {
        let quiet = OutputMode::Quiet;
        assert!(!quiet.should_show(OutputMode::Quiet));
        assert!(!quiet.should_show(OutputMode::Normal));

        let normal = OutputMode::Normal;
        assert!(normal.should_show(OutputMode::Normal));
        assert!(!normal.should_show(OutputMode::Verbose));

        let verbose = OutputMode::Verbose;
        assert!(verbose.should_show(OutputMode::Verbose));
        assert!(!verbose.should_show(OutputMode::VeryVerbose));

        assert!(OutputMode::VeryVerbose.should_show(OutputMode::VeryVerbose));
    }

    #[test]
    fn test_console_progress_quiet_is_inert() {
        let progress = ConsoleProgress::new(OutputMode::Quiet);
        progress.on_stage(BuildStage::Pages);
        progress.on_item(1, 3, "fbnp_1.png");
        assert!(progress.bar.borrow().is_none());
        progress.on_complete();
        assert!(progress.elapsed_secs() >= 0.0);
    }

    #[test]
    fn test_stage_lines_follow_mode_not_log_filter() {
        let normal = ConsoleProgress::new(OutputMode::Normal);
        assert_eq!(
            normal.stage_line(BuildStage::Pages).as_deref(),
            Some("  Pages (laying out pages)")
        );
        assert!(normal.completion_line().unwrap().starts_with("  Completed in "));

        let quiet = ConsoleProgress::new(OutputMode::Quiet);
        assert!(quiet.stage_line(BuildStage::Pages).is_none());
        assert!(quiet.completion_line().is_none());
    }

    #[test]
    fn test_console_progress_bar_lifecycle() {
        let progress = ConsoleProgress::new(OutputMode::Verbose);
        progress.on_item(1, 3, "fbnp_1.png");
        assert!(progress.bar.borrow().is_some());
        progress.on_stage(BuildStage::WritingPdf);
        assert!(progress.bar.borrow().is_none());
    }
}
