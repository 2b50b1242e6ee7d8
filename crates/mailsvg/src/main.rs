// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path;

use mailsvg::raster::{PNG_MIME, SVG_MIME};
use mailsvg::svg2vml;

fn main() {
    if let Err(e) = process() {
        eprintln!("Error: {}.", e);
        std::process::exit(1);
    }
}

fn timed<F, T>(perf: bool, name: &str, mut f: F) -> T
where
    F: FnMut() -> T,
{
    let now = std::time::Instant::now();
    let result = f();
    if perf {
        let elapsed = now.elapsed().as_micros() as f64 / 1000.0;
        eprintln!("{}: {:.2}ms", name, elapsed);
    }

    result
}

fn process() -> Result<(), String> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            println!("{}", HELP);
            return Err(e);
        }
    };

    if !args.quiet {
        if let Ok(()) = log::set_logger(&LOGGER) {
            log::set_max_level(log::LevelFilter::Warn);
        }
    }

    let data = timed(args.perf, "Reading", || -> Result<Vec<u8>, &str> {
        if let InputFrom::File(ref file) = args.input {
            std::fs::read(file).map_err(|_| "failed to open the provided file")
        } else {
            use std::io::Read;
            let mut buf = Vec::new();
            std::io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .map_err(|_| "failed to read stdin")?;
            Ok(buf)
        }
    })?;

    let markup = if args.vml_only {
        let doc = timed(args.perf, "VML", || transpile(&args, &data))?;
        if args.report {
            print_findings(doc.report());
        }

        doc.markup().to_string()
    } else {
        let codec = mailsvg::SkiaCodec::default();
        let output = timed(args.perf, "Processing", || {
            mailsvg::process(&data, &args.mime, &args.opt, &codec).map_err(|e| e.to_string())
        })?;

        if args.report {
            print_findings(&output.report);
            print_choices(&output);
        }

        output.document.markup().to_string()
    };

    match args.output {
        Some(ref file) => timed(args.perf, "Saving", || {
            std::fs::write(file, &markup).map_err(|_| "failed to write the output file".to_string())
        })?,
        None => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(markup.as_bytes())
                .and_then(|_| stdout.write_all(b"\n"))
                .map_err(|_| "failed to write to stdout".to_string())?;
        }
    }

    Ok(())
}

fn transpile(args: &Args, data: &[u8]) -> Result<svg2vml::DialectDocument, String> {
    if !mailsvg::raster::is_vector(data, &args.mime) {
        return Err("VML can be generated only from SVG".to_string());
    }

    let source = svg2vml::VectorSource::from_data(data).map_err(|e| e.to_string())?;
    let opt = svg2vml::TranspileOptions {
        width: args.opt.width.map(f64::from),
        height: args.opt.height.map(f64::from),
        ..svg2vml::TranspileOptions::default()
    };

    Ok(svg2vml::transpile_with(&svg2vml::sanitize(source.text()), &opt))
}

fn print_findings(report: &svg2vml::ComplexityReport) {
    if report.is_empty() {
        eprintln!("No findings.");
    }

    for finding in report {
        eprintln!("{}", finding);
    }
}

fn print_choices(output: &mailsvg::Output) {
    for choice in &output.choices {
        eprintln!(
            "{:<28} {:<16} {}",
            choice.surface.name,
            choice.kind.to_str(),
            choice.quality
        );
    }

    let summary = output.summary();
    eprintln!("Vector coverage: {:.1}%", summary.vector_share());
    for quality in mailsvg::Quality::ALL {
        let share = summary.quality_share(quality);
        if share > 0.0 {
            eprintln!("{}: {:.1}%", quality, share);
        }
    }

    if output.raster_is_placeholder {
        eprintln!("Raster: placeholder");
    }
}

const HELP: &str = "\
mailsvg packs a logo into layered SVG, VML and PNG markup for email clients.

USAGE:
  mailsvg [OPTIONS] <in-file> [<out-html>]  # from file to file or stdout
  mailsvg [OPTIONS] - [<out-html>]          # from stdin

  mailsvg logo.svg logo.html
  mailsvg -w 120 --alt 'ACME' logo.svg
  mailsvg --vml-only logo.svg

OPTIONS:
      --help                    Prints this help
  -V, --version                 Prints version

  -w, --width LENGTH            Sets the logo width in pixels
  -h, --height LENGTH           Sets the logo height in pixels
      --alt TEXT                Sets the alternative text
      --no-native               Omits the inline SVG layer
      --no-vml                  Omits the VML layer
      --vml-only                Prints only the VML markup
      --report                  Prints findings and per-client choices to stderr

      --perf                    Prints performance stats
      --quiet                   Disables warnings

ARGS:
  <in-file>                     Input file: SVG, SVGZ or PNG
  <out-html>                    Output file [default: stdout]
";

#[derive(Debug)]
struct CliArgs {
    width: Option<u32>,
    height: Option<u32>,
    alt: Option<String>,
    no_native: bool,
    no_vml: bool,
    vml_only: bool,
    report: bool,
    perf: bool,
    quiet: bool,
    input: String,
    output: Option<String>,
}

fn collect_args() -> Result<CliArgs, pico_args::Error> {
    let mut input = pico_args::Arguments::from_env();

    if input.contains("--help") {
        print!("{}", HELP);
        std::process::exit(0);
    }

    if input.contains(["-V", "--version"]) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    Ok(CliArgs {
        width: input.opt_value_from_fn(["-w", "--width"], parse_length)?,
        height: input.opt_value_from_fn(["-h", "--height"], parse_length)?,
        alt: input.opt_value_from_str("--alt")?,
        no_native: input.contains("--no-native"),
        no_vml: input.contains("--no-vml"),
        vml_only: input.contains("--vml-only"),
        report: input.contains("--report"),
        perf: input.contains("--perf"),
        quiet: input.contains("--quiet"),
        input: input.free_from_str()?,
        output: input.opt_free_from_str()?,
    })
}

fn parse_length(s: &str) -> Result<u32, String> {
    let n: u32 = s.parse().map_err(|_| "invalid length")?;

    if n > 0 {
        Ok(n)
    } else {
        Err("LENGTH cannot be zero".to_string())
    }
}

#[derive(Clone, PartialEq, Debug)]
enum InputFrom {
    Stdin,
    File(path::PathBuf),
}

struct Args {
    input: InputFrom,
    output: Option<path::PathBuf>,
    mime: String,
    vml_only: bool,
    report: bool,
    perf: bool,
    quiet: bool,
    opt: mailsvg::Options,
}

fn parse_args() -> Result<Args, String> {
    let args = collect_args().map_err(|e| e.to_string())?;

    let input = match args.input.as_str() {
        "-" => InputFrom::Stdin,
        path => InputFrom::File(path.into()),
    };

    let mime = match input {
        InputFrom::File(ref path) => mime_from_path(path),
        InputFrom::Stdin => "",
    };

    if args.vml_only && args.no_vml {
        return Err("--vml-only and --no-vml cannot be set together".to_string());
    }

    let opt = mailsvg::Options {
        width: args.width,
        height: args.height,
        alt: args.alt.unwrap_or_default(),
        native: !args.no_native,
        dialect: !args.no_vml,
        ..mailsvg::Options::default()
    };

    Ok(Args {
        input,
        output: args.output.map(path::PathBuf::from),
        mime: mime.to_string(),
        vml_only: args.vml_only,
        report: args.report,
        perf: args.perf,
        quiet: args.quiet,
        opt,
    })
}

fn mime_from_path(path: &path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("svg") | Some("svgz") => SVG_MIME,
        Some("png") => PNG_MIME,
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "",
    }
}

/// A simple stderr logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::LevelFilter::Warn
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            let line = record.line().unwrap_or(0);
            let args = record.args();

            match record.level() {
                log::Level::Error => eprintln!("Error (in {}:{}): {}", target, line, args),
                log::Level::Warn => eprintln!("Warning (in {}:{}): {}", target, line, args),
                log::Level::Info => eprintln!("Info (in {}:{}): {}", target, line, args),
                log::Level::Debug => eprintln!("Debug (in {}:{}): {}", target, line, args),
                log::Level::Trace => eprintln!("Trace (in {}:{}): {}", target, line, args),
            }
        }
    }

    fn flush(&self) {}
}
