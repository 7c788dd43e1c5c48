//! pslident 命令行入口
//!
//! 用法：
//!   pslident prepare --snapshots psl_history --output prepared_psl.json
//!   pslident identify --corpus prepared_psl.json --verify

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use pslident::{
    init_global_corpus, new_global_session, CorpusCacheManager, CorpusConfig, CorpusFormat,
    CorpusLoader, CustomConfigBuilder, CorpusOrigin, IdentificationEngine, MatchMode, Step,
};

#[derive(Parser)]
#[command(name = "pslident", version)]
#[command(about = "Identify the Public Suffix List version of a client")]
struct Cli {
    /// 提高日志级别（-v 为 debug，-vv 为 trace）
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare a corpus from a directory of `<epochMillis>_<hash>` snapshots
    Prepare {
        #[arg(long)]
        snapshots: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Defaults to the output file extension
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Interactively identify a version by answering y/n per sample rule
    Identify {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        /// Disable lenient wildcard matching
        #[arg(long)]
        strict: bool,
        /// Confirm every entry of the result afterwards
        #[arg(long)]
        verify: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Msgpack,
}

impl FormatArg {
    fn resolve(format: Option<Self>, path: &Path) -> CorpusFormat {
        match format {
            Some(FormatArg::Json) => CorpusFormat::Json,
            Some(FormatArg::Msgpack) => CorpusFormat::MsgPack,
            None => CorpusFormat::from_path(path),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Prepare {
            snapshots,
            output,
            format,
        } => prepare(&snapshots, &output, FormatArg::resolve(format, &output)).await,
        Commands::Identify {
            corpus,
            format,
            strict,
            verify,
        } => {
            let match_mode = if strict {
                MatchMode::Strict
            } else {
                MatchMode::Lenient
            };
            let config = CustomConfigBuilder::new()
                .origin(CorpusOrigin::PreparedFile(corpus.clone()))
                .format(FormatArg::resolve(format, &corpus))
                .match_mode(match_mode)
                .build();
            identify(config, verify).await
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // 日志写到 stderr，避免干扰交互输出
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn prepare(snapshots: &Path, output: &Path, format: CorpusFormat) -> Result<()> {
    let corpus = CorpusLoader::new()
        .prepare_dir(snapshots)
        .await
        .with_context(|| format!("failed to prepare snapshots in {}", snapshots.display()))?;
    CorpusCacheManager::save(output, format, &corpus)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Prepared {} versions into {} ({:?})",
        corpus.len(),
        output.display(),
        format
    );
    Ok(())
}

async fn identify(config: CorpusConfig, verify: bool) -> Result<()> {
    init_global_corpus(config).await?;
    let mut session = new_global_session()?;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    // 1. 搜索阶段
    let convergence = loop {
        match session.next_query()? {
            Step::Query(query) => {
                let present = ask(&mut lines, session.remaining(), &query.rule)?;
                session.report_answer(&query.rule, present);
            }
            Step::Converged(convergence) => break convergence,
        }
    };

    // 2. 输出结果
    if convergence.exact {
        println!("Identified version:");
    } else {
        println!(
            "Converged on {} observably equivalent versions:",
            convergence.candidates
        );
    }
    print_result(&session)?;

    // 3. 可选的校验阶段
    if verify {
        session.begin_verification()?;
        while let Step::Query(query) = session.next_query()? {
            let remaining = session.verification_remaining();
            let present = ask(&mut lines, remaining, &query.rule)?;
            session.report_answer(&query.rule, present);
        }
        let mismatches = session.verification_mismatches();
        if mismatches.is_empty() {
            println!("Verification passed");
        } else {
            println!("Verification found {} mismatching entries:", mismatches.len());
            for entry in mismatches {
                println!("  {entry}");
            }
        }
    }
    Ok(())
}

fn print_result(session: &IdentificationEngine) -> Result<()> {
    for version in session.result()? {
        println!(
            "  {} {}",
            format_timestamp(version.commit_timestamp()),
            version.commit_hash()
        );
    }
    Ok(())
}

/// 读取一次 y/n 回答，无法识别的输入重新询问
fn ask(lines: &mut impl Iterator<Item = io::Result<String>>, remaining: usize, rule: &str) -> Result<bool> {
    loop {
        print!("[{remaining}] sample: {rule} (y/n) ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            bail!("input closed before identification finished");
        };
        match line?.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("please answer y or n"),
        }
    }
}

/// 提交时间（epoch 毫秒）格式化为 `dd.mm.yyyy HH:MM:SS`（UTC）
fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|time| time.format("%d.%m.%Y %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}
