use std::env;
use std::io::{self, Read, Write};
use std::process;
use std::sync::Arc;

use anyhow::Context;
use regex_railroad::{parse, RenderConfig, RenderError, Renderer, SvgSurface, SyntaxError};

const USAGE: &str = "usage: regex-railroad [--json] [--ast] [-o FILE] [PATTERN | -]";

struct Args {
    pattern: Option<String>,
    output: Option<String>,
    json: bool,
    ast: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        pattern: None,
        output: None,
        json: false,
        ast: false,
    };
    let mut rest = env::args().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--json" => args.json = true,
            "--ast" => args.ast = true,
            "-o" | "--output" => {
                args.output = Some(rest.next().ok_or("expected a file after -o")?);
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            "-" => args.pattern = None,
            _ if args.pattern.is_none() => args.pattern = Some(arg),
            _ => return Err(format!("unexpected argument '{arg}'\n{USAGE}")),
        }
    }
    Ok(args)
}

// Patterns typed over several lines are treated as one pattern with `\n` escapes.
fn read_pattern(arg: Option<String>) -> anyhow::Result<String> {
    let raw = match arg {
        Some(pattern) => pattern,
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("reading pattern from stdin")?;
            input.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    Ok(raw.replace("\r\n", "\\n").replace('\n', "\\n"))
}

fn report_syntax_error(source: &str, err: &SyntaxError) {
    eprintln!("error: {err}");
    eprintln!("  {source}");
    eprintln!("  {}^", " ".repeat(err.offset));
}

// Usage: regex-railroad '(a|b)*c' > diagram.svg
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            process::exit(2);
        }
    };
    let source = read_pattern(args.pattern)?;
    let config = RenderConfig::from_env().context("reading render configuration")?;

    if args.ast {
        match parse(&source) {
            Ok(expr) => {
                let json = serde_json::to_string_pretty(&expr).context("serializing AST")?;
                println!("{json}");
                return Ok(());
            }
            Err(err) => {
                report_syntax_error(&source, &err);
                process::exit(1);
            }
        }
    }

    let renderer = Arc::new(Renderer::new(SvgSurface::new(), config));
    tokio::spawn({
        let renderer = Arc::clone(&renderer);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                renderer.cancel();
            }
        }
    });

    let output = match renderer.show_expression(&source).await {
        Ok(output) => output,
        Err(RenderError::Syntax(err)) => {
            report_syntax_error(&source, &err);
            process::exit(1);
        }
        Err(RenderError::Cancelled) => {
            eprintln!("render cancelled");
            process::exit(130);
        }
        Err(err) => return Err(err).context("rendering diagram"),
    };

    let svg = renderer.surface().lock().await.to_svg();
    match &args.output {
        Some(path) => std::fs::write(path, &svg).with_context(|| format!("writing {path}"))?,
        None if !args.json => io::stdout()
            .write_all(&svg)
            .context("writing SVG to stdout")?,
        None => {}
    }
    if args.json {
        let json = serde_json::to_string(&output).context("serializing render output")?;
        println!("{json}");
    }
    Ok(())
}
