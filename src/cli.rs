use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Combines the pages of an MkDocs site into a single Markdown document
#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    /// The site's configuration file
    #[clap(short = 'f', long, default_value = "mkdocs.yml")]
    pub config_file: PathBuf,

    /// Write the combined Markdown here instead of to stdout
    #[clap(short, long)]
    pub outfile: Option<PathBuf>,

    /// Encoding of the pages and of the output
    #[clap(short, long, default_value = "utf-8")]
    pub encoding: String,

    /// Leave out pages matching this glob; may be repeated
    #[clap(short = 'x', long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Keep metadata blocks at the top of pages
    #[clap(short = 'm', long, overrides_with = "no_meta")]
    pub meta: bool,

    /// Strip metadata blocks from the top of pages
    #[clap(short = 'M', long)]
    pub no_meta: bool,

    /// Add a heading with the page title at the top of every page
    #[clap(short = 't', long, overrides_with = "no_titles")]
    pub titles: bool,

    /// Don't add page title headings
    #[clap(short = 'T', long)]
    pub no_titles: bool,

    /// Convert pipe tables to grid tables
    #[clap(short = 'g', long, overrides_with = "orig_tables")]
    pub grid_tables: bool,

    /// Keep pipe tables as they are
    #[clap(short = 'G', long)]
    pub orig_tables: bool,

    /// Total width of generated grid tables
    #[clap(short, long, default_value_t = 100)]
    pub width: usize,

    /// Turn links between pages into links to headings of the combined document
    #[clap(short = 'r', long, overrides_with = "no_xrefs")]
    pub xrefs: bool,

    /// Replace links between pages with their text
    #[clap(short = 'R', long)]
    pub no_xrefs: bool,

    /// Keep HTML anchors
    #[clap(short = 'a', long, overrides_with = "no_anchors")]
    pub anchors: bool,

    /// Strip HTML anchors
    #[clap(short = 'A', long)]
    pub no_anchors: bool,

    /// Convert `\( ... \)` inline math to `$$ ... $$`
    #[clap(long, overrides_with = "no_convert_math")]
    pub convert_math: bool,

    #[clap(long)]
    pub no_convert_math: bool,

    /// Replace the extension of every image, e.g. `png`
    #[clap(short, long, value_name = "EXT")]
    pub image_ext: Option<String>,

    /// Insert a `\newpage` after every page
    #[clap(long)]
    pub page_break: bool,

    /// Turn admonitions into blockquotes
    #[clap(long)]
    pub convert_admonitions: bool,

    /// CSS class to attach to page title headings
    #[clap(long, value_name = "CLASS")]
    pub title_class: Option<String>,

    /// Keep each page's headings at their original levels
    #[clap(long)]
    pub no_increase_heads: bool,

    /// Also render the combined document as HTML to this path
    #[clap(long, value_name = "PATH")]
    pub html: Option<PathBuf>,

    /// Log more; repeat for more detail
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn strip_metadata(&self) -> bool {
        self.no_meta && !self.meta
    }

    pub fn add_chapter_heads(&self) -> bool {
        !self.no_titles || self.titles
    }

    pub fn grid_tables(&self) -> bool {
        self.grid_tables && !self.orig_tables
    }

    pub fn normalize_xrefs(&self) -> bool {
        self.xrefs && !self.no_xrefs
    }

    pub fn strip_anchors(&self) -> bool {
        !self.anchors || self.no_anchors
    }

    pub fn convert_math(&self) -> bool {
        self.convert_math && !self.no_convert_math
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
