//! `sdtex`: turns a `.sdtex` document into page images and/or Markdown.
//!
//! Usage:
//!   sdtex <input.sdtex> [-pdf] [-md] [--out-dir <DIR>] [--font <PATH>] [-v]...
//!
//! Without a format flag, paged output is produced. Artifacts go to
//! `Output/` next to the executable unless `--out-dir` says otherwise.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sdtex_engine::logging::{init_logging, LoggingConfig};
use sdtex_engine::render::{RasterConfig, RasterPageWriter};
use sdtex_engine::text::FontSystem;
use sdtex_layout::{
    to_markdown, FontMetrics, FontSet, LayoutConfig, LayoutEngine, LocalImageFetcher, PageRecorder, PlotConfig,
    PlotRenderer,
};

fn main() {
    let matches = cli().get_matches_from(normalize_args(std::env::args_os()));
    let options = Options::from_matches(&matches);

    init_logging(LoggingConfig::default().with_verbosity(options.verbosity));

    if let Err(err) = run(&options) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

// ── arguments ─────────────────────────────────────────────────────────────

fn cli() -> Command {
    Command::new("sdtex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Lay out SdTeX markup onto pages")
        .arg(
            Arg::new("input")
                .help("Path to the .sdtex document")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("pdf")
                .long("pdf")
                .help("Paged output: one PNG per page (default when no format is given)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("md")
                .long("md")
                .help("Markdown output: Output/output.md")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("out-dir")
                .long("out-dir")
                .help("Directory for generated files (default: Output/ next to the executable)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("font")
                .long("font")
                .help("TTF/OTF font used for measuring and drawing text")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .help("Log more (repeat for trace); RUST_LOG overrides")
                .action(ArgAction::Count),
        )
}

/// Accepts the single-dash `-pdf` / `-md` spellings alongside `--pdf` / `--md`.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-pdf") => OsString::from("--pdf"),
            Some("-md") => OsString::from("--md"),
            _ => arg,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
struct Options {
    input: PathBuf,
    pdf: bool,
    md: bool,
    out_dir: Option<PathBuf>,
    font: Option<PathBuf>,
    verbosity: u8,
}

impl Options {
    fn from_matches(m: &ArgMatches) -> Self {
        let md = m.get_flag("md");
        // Paged output unless only Markdown was asked for.
        let pdf = m.get_flag("pdf") || !md;
        Self {
            input: m.get_one::<PathBuf>("input").cloned().unwrap_or_default(),
            pdf,
            md,
            out_dir: m.get_one::<PathBuf>("out-dir").cloned(),
            font: m.get_one::<PathBuf>("font").cloned(),
            verbosity: m.get_count("verbose"),
        }
    }
}

// ── run ───────────────────────────────────────────────────────────────────

fn run(options: &Options) -> Result<()> {
    let source = std::fs::read_to_string(&options.input)
        .with_context(|| format!("cannot read {}", options.input.display()))?;
    let document = sdtex_markup::parse(&source)
        .with_context(|| format!("cannot parse {}", options.input.display()))?;
    log::info!("parsed {} top-level tags from {}", document.nodes.len(), options.input.display());

    let out_dir = match &options.out_dir {
        Some(dir) => dir.clone(),
        None => default_output_dir()?,
    };
    std::fs::create_dir_all(&out_dir).with_context(|| format!("cannot create {}", out_dir.display()))?;

    if options.md {
        let path = out_dir.join("output.md");
        std::fs::write(&path, to_markdown(&document)).with_context(|| format!("cannot write {}", path.display()))?;
        println!("wrote {}", path.display());
    }

    if options.pdf {
        let mut fonts = FontSystem::new();
        let set = load_fonts(&mut fonts, options.font.as_deref())?;
        let config = LayoutConfig::default();

        let base_dir = options.input.parent().map(Path::to_path_buf).unwrap_or_default();
        let images = LocalImageFetcher::new(base_dir);
        let graphs = PlotRenderer::new(PlotConfig::default().with_out_dir(out_dir.join("graphs")));
        let metrics = FontMetrics::new(&fonts, set);
        let engine = LayoutEngine::new(&metrics, &images, &graphs).with_config(config.clone());

        let mut recorder = PageRecorder::new(&metrics, set);
        let summary = engine.render(&document, &mut recorder).context("layout failed")?;

        let geometry = config.geometry;
        let raster = RasterConfig::default()
            .with_dpi(config.dpi)
            .with_page_size(geometry.width, geometry.height);
        let written = RasterPageWriter::new(&fonts, raster)
            .write_pages(recorder.pages(), &out_dir)
            .context("cannot write pages")?;

        println!("{} blocks on {} pages", summary.blocks, summary.pages);
        for path in written {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn default_output_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot locate the executable")?;
    let dir = exe.parent().context("executable has no parent directory")?;
    Ok(dir.join("Output"))
}

// ── fonts ─────────────────────────────────────────────────────────────────

const REGULAR_FONTS: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const BOLD_FONTS: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/noto/NotoSans-Bold.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
];

const ITALIC_FONTS: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/noto/NotoSans-Italic.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Italic.ttf",
];

const MONO_FONTS: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/noto/NotoSansMono-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansMono-Regular.ttf",
];

/// Loads `explicit` (which must work) or the first usable system font, plus
/// whichever bold, italic and monospace variants exist.
fn load_fonts(fonts: &mut FontSystem, explicit: Option<&Path>) -> Result<FontSet> {
    let regular = match explicit {
        Some(path) => fonts.load_font_file(path).context("cannot use --font")?,
        None => match probe(fonts, REGULAR_FONTS) {
            Some(id) => id,
            None => bail!("no usable system font found; pass --font <PATH> (or use -md, which needs none)"),
        },
    };
    Ok(FontSet {
        regular,
        bold: probe(fonts, BOLD_FONTS),
        italic: probe(fonts, ITALIC_FONTS),
        mono: probe(fonts, MONO_FONTS),
    })
}

fn probe(fonts: &mut FontSystem, candidates: &[&str]) -> Option<sdtex_engine::text::FontId> {
    candidates.iter().find_map(|p| {
        let path = Path::new(p);
        if !path.is_file() {
            return None;
        }
        match fonts.load_font_file(path) {
            Ok(id) => Some(id),
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Options {
        let argv = normalize_args(args.iter().map(OsString::from));
        Options::from_matches(&cli().try_get_matches_from(argv).unwrap())
    }

    // ── arguments ─────────────────────────────────────────────────────────

    #[test]
    fn single_dash_formats_are_normalized() {
        let argv = normalize_args(["sdtex", "doc.sdtex", "-pdf", "-md", "-v"].map(OsString::from));
        assert_eq!(argv, ["sdtex", "doc.sdtex", "--pdf", "--md", "-v"].map(OsString::from).to_vec());
    }

    #[test]
    fn paged_output_is_the_default() {
        let o = parse_args(&["sdtex", "doc.sdtex"]);
        assert!(o.pdf && !o.md);
        assert_eq!(o.input, PathBuf::from("doc.sdtex"));
    }

    #[test]
    fn markdown_only() {
        let o = parse_args(&["sdtex", "doc.sdtex", "-md"]);
        assert!(o.md && !o.pdf);
    }

    #[test]
    fn both_formats_and_options() {
        let o = parse_args(&["sdtex", "-pdf", "doc.sdtex", "-md", "--out-dir", "out", "--font", "f.ttf", "-vv"]);
        assert!(o.md && o.pdf);
        assert_eq!(o.out_dir, Some(PathBuf::from("out")));
        assert_eq!(o.font, Some(PathBuf::from("f.ttf")));
        assert_eq!(o.verbosity, 2);
    }

    #[test]
    fn input_is_required() {
        assert!(cli().try_get_matches_from(["sdtex", "--md"]).is_err());
    }

    // ── run ───────────────────────────────────────────────────────────────

    fn options(input: PathBuf, out_dir: PathBuf) -> Options {
        Options { input, pdf: false, md: true, out_dir: Some(out_dir), font: None, verbosity: 0 }
    }

    #[test]
    fn markdown_is_written_to_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.sdtex");
        std::fs::write(&input, "who: \"World\"\n(sdtitle)Hello $who(!sdtitle)").unwrap();
        let out = dir.path().join("Output");

        run(&options(input, out.clone())).unwrap();
        assert_eq!(std::fs::read_to_string(out.join("output.md")).unwrap(), "# Hello World\n");
    }

    #[test]
    fn parse_errors_fail_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.sdtex");
        std::fs::write(&input, "(sdtitle)Hello").unwrap();

        let err = run(&options(input, dir.path().join("Output"))).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("sdtitle"), "{msg}");
    }

    #[test]
    fn missing_input_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&options(dir.path().join("absent.sdtex"), dir.path().join("Output"))).unwrap_err();
        assert!(format!("{err:#}").contains("cannot read"));
    }

    #[test]
    fn explicit_bad_font_fails_paged_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.sdtex");
        std::fs::write(&input, "(sdtext)x(!sdtext)").unwrap();
        let mut o = options(input, dir.path().join("Output"));
        o.pdf = true;
        o.md = false;
        o.font = Some(dir.path().join("missing.ttf"));

        let err = run(&o).unwrap_err();
        assert!(format!("{err:#}").contains("--font"));
    }
}
