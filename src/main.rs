// this_file: src/main.rs

//! glyphrules CLI: regenerate the Nerd Fonts constraint table.
//!
//! Reads the vendored `font-patcher`, compiles its patch sets against the
//! given Symbols Nerd Font and writes `src/font/nerd_font_attributes.zig`.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Parser;
use glyphrules::{CodegenOptions, ProjectLayout};

/// Compile Nerd Fonts patch-set rules into a codepoint constraint table
#[derive(Parser)]
#[command(name = "glyphrules")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Destination font (Symbols Nerd Font, not the Mono variant)
    font: Utf8PathBuf,

    /// Project root that conventional paths are resolved against
    #[arg(long, env = "GLYPHRULES_PROJECT_ROOT")]
    project_root: Option<Utf8PathBuf>,

    /// Write the table here instead of src/font/nerd_font_attributes.zig
    #[arg(short, long)]
    output: Option<Utf8PathBuf>,

    /// Read origin fonts from this Nerd Fonts checkout
    #[arg(long)]
    mirror: Option<Utf8PathBuf>,

    /// Origin font location inside the mirror, with {version} and {filename} placeholders
    #[arg(long, default_value = glyphrules_ttf::DEFAULT_TEMPLATE)]
    mirror_template: String,

    /// Neither read nor write the crosswalk and origin font caches
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let root = match cli.project_root {
        Some(root) => root,
        None => Utf8PathBuf::from_path_buf(std::env::current_dir()?).map_err(|path| {
            anyhow::anyhow!("current directory is not valid UTF-8: {}", path.display())
        })?,
    };
    let layout = ProjectLayout::new(root);
    let options = CodegenOptions {
        output: cli.output,
        mirror: cli.mirror,
        mirror_template: Some(cli.mirror_template),
        use_cache: !cli.no_cache,
        ..CodegenOptions::new(cli.font)
    };

    let compiled = glyphrules::run(&layout, &options)
        .with_context(|| format!("Failed to generate constraints for {}", options.font))?;
    log::info!(
        "{} patch sets, {} codepoints, {} rules",
        compiled.diagnostics.patch_sets,
        compiled.diagnostics.codepoints,
        compiled.diagnostics.rules
    );
    Ok(())
}

/// Initialize logging based on verbosity.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}
