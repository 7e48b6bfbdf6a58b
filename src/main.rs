use anyhow::{Context, Result};
use cli::Cli;
use combiner::{Combiner, OptionsBuilder};
use config::SiteConfig;
use filters::XrefMode;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

mod cli;
mod combiner;
mod config;
mod filters;
mod pages;
mod render;
mod text;

fn main() -> ExitCode {
    if let Err(e) = try_main() {
        eprintln!("{}: {e:#}", console::style("Error").red());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let encoding = text::encoding_for_label(&cli.encoding)?;
    let site = SiteConfig::load(&cli.config_file, encoding)?;
    log::info!(
        "combining {} from {}",
        site.site_name.as_deref().unwrap_or("site"),
        site.docs_dir.display()
    );

    let options = OptionsBuilder::default()
        .encoding(encoding)
        .exclude(cli.exclude.clone())
        .strip_metadata(cli.strip_metadata())
        .add_chapter_heads(cli.add_chapter_heads())
        .increase_heads(!cli.no_increase_heads)
        .title_class(cli.title_class.clone())
        .image_ext(cli.image_ext.clone())
        .strip_anchors(cli.strip_anchors())
        .convert_math(cli.convert_math())
        .xrefs(if cli.normalize_xrefs() {
            XrefMode::Normalize
        } else {
            XrefMode::Replace
        })
        .convert_admonitions(cli.convert_admonitions)
        .grid_tables(cli.grid_tables())
        .width(cli.width)
        .add_page_break(cli.page_break)
        .build()
        .with_context(|| "Failed to build conversion options")?;

    let combiner = Combiner::new(site, options)?;
    let lines = combiner.combine()?;

    let markdown = text::encode_lines(&lines, encoding)?;
    match &cli.outfile {
        Some(path) => write_file(path, &markdown)?,
        None => std::io::stdout()
            .lock()
            .write_all(&markdown)
            .with_context(|| "Couldn't write to stdout")?,
    }

    if let Some(path) = &cli.html {
        let html = render::to_html(&lines, combiner.site().site_name.as_deref());
        write_file(path, html.as_bytes())?;
        log::info!("wrote HTML to {}", path.display());
    }

    Ok(())
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("Couldn't open {} for writing", path.display()))
}
