use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use awol::{
    article::Article,
    config::Config,
    extract::{Outcome, ResourceExtractor},
    language::WhatlangClassifier,
    merge::merge,
    resource::Resource,
    router::DomainRouter,
    store::Store,
    translator::{BiblioFetcher, http::UreqClient},
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, Source};

mod cli;

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);
    match args.command {
        Command::Parse {
            config,
            enrich,
            out,
            progress,
            from,
        } => parse(config.as_deref(), enrich, out, progress, &from),
        Command::Domains { config, from } => domains(config.as_deref(), &from),
        Command::Merge { left, right } => merge_files(&left, &right),
    }
}

fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none_or(|v| v.is_empty())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(color_enabled())
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_path(path).with_context(|| format!("loading {}", path.display())),
        None => Config::builtin().context("loading the built-in tables"),
    }
}

fn files(from: &[Source]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for source in from {
        files.extend(source.files().with_context(|| format!("reading {source:?}"))?);
    }
    Ok(files)
}

fn parse(
    config: Option<&Path>,
    enrich: bool,
    out: Option<PathBuf>,
    progress: bool,
    from: &[Source],
) -> Result<()> {
    let config = load_config(config)?;
    let classifier = WhatlangClassifier;
    let fetcher = enrich.then(|| BiblioFetcher::new(&config, UreqClient::default()));
    let mut extractor = ResourceExtractor::new(&config, &classifier);
    if let Some(fetcher) = &fetcher {
        extractor = extractor.with_fetcher(fetcher);
    }
    let router = DomainRouter::new(&config);
    let mut store = out.map(Store::new);
    let files = files(from)?;

    let pb = if progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut stdout = io::stdout().lock();
    let (mut ok, mut failed) = (0usize, 0usize);
    for path in &files {
        pb.set_message(path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
        let articles = match Article::from_path(path) {
            Ok(articles) => articles,
            Err(e) => {
                pb.suspend(|| error!(path = %path.display(), "{e}"));
                failed += 1;
                pb.inc(1);
                continue;
            }
        };
        for article in &articles {
            let resources = match router.parse(&extractor, article) {
                Ok(Outcome::Skipped) => {
                    info!(article = %article.id, "no resources");
                    ok += 1;
                    continue;
                }
                Ok(Outcome::Extracted(resources)) => resources,
                Err(e) => {
                    pb.suspend(|| error!(article = %article.id, "{e}"));
                    failed += 1;
                    continue;
                }
            };
            match emit(&mut stdout, store.as_mut(), &resources) {
                Ok(()) => ok += 1,
                Err(e) => {
                    pb.suspend(|| error!(article = %article.id, "{e:#}"));
                    failed += 1;
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if let Some(store) = &store {
        info!(root = %store.root().display(), "resources written");
    }
    summary(ok, failed);
    Ok(())
}

fn emit(stdout: &mut impl Write, store: Option<&mut Store>, resources: &[Resource]) -> Result<()> {
    match store {
        Some(store) => {
            for resource in resources {
                store
                    .save(resource)
                    .with_context(|| format!("saving {}", resource.url))?;
            }
        }
        None => {
            for resource in resources {
                writeln!(stdout, "{}", serde_json::to_string(resource)?)?;
            }
        }
    }
    Ok(())
}

fn summary(ok: usize, failed: usize) {
    if color_enabled() {
        eprintln!("{} {ok} ok  {} {failed} failed", "✓".green(), "✗".red());
    } else {
        eprintln!("✓ {ok} ok  ✗ {failed} failed");
    }
}

fn domains(config: Option<&Path>, from: &[Source]) -> Result<()> {
    let config = load_config(config)?;
    let router = DomainRouter::new(&config);
    let mut stdout = io::stdout().lock();
    for path in files(from)? {
        let articles = Article::from_path(&path).with_context(|| format!("reading {}", path.display()))?;
        for article in &articles {
            let parser = match router.route(article) {
                Ok(parser) => parser.name().to_string(),
                Err(e) => format!("error: {e}"),
            };
            writeln!(
                stdout,
                "{}\t{}\t{parser}",
                article.id,
                router.domains(article).join(",")
            )?;
        }
    }
    Ok(())
}

fn merge_files(left: &Path, right: &Path) -> Result<()> {
    let read = |path: &Path| -> Result<Resource> {
        let doc = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Resource::from_json(&doc).with_context(|| format!("parsing {}", path.display()))
    };
    let (left, right) = (read(left)?, read(right)?);
    let merged = merge(&left, &right)?;
    println!("{}", merged.resource.to_json()?);
    eprintln!("modified: {}", merged.modified_fields.join(", "));
    Ok(())
}
