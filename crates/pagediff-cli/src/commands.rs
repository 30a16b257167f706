use anyhow::Context;
use colored::Colorize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use pagediff_engine::{
    load_pair, CancelFlag, Comparator, ComparisonRequest, ComparisonResult, EngineConfig,
    UnitProgress,
};
use pagediff_snapshot::{AnalyticsSnapshot, BatchSummary, DirSnapshotStore, SnapshotStore};
use pagediff_types::{DiffLine, LineTag, SideStatus, WordEstimate};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli { command, format, .. } = cli;
    match command {
        Command::Compare(args) => cmd_compare(args, format).await,
        Command::Summarize(args) => cmd_summarize(args, format),
    }
}

async fn cmd_compare(args: CompareArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm;
    }

    let cancel = CancelFlag::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing in-flight units");
            interrupt.cancel();
        }
    });

    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(report_progress(progress_rx, format == OutputFormat::Text));

    let pair = load_pair(args.kind, &args.dev, &args.prod)
        .await
        .with_context(|| format!("extracting {} and {}", args.dev.display(), args.prod.display()))?;
    let mut request = ComparisonRequest::new(pair).with_cancel(cancel);
    if let Some(n) = args.unit_lines {
        request = request.with_unit_lines(n);
    }
    if let Some(n) = args.workers {
        request = request.with_workers(n);
    }

    let comparator = Comparator::new(config)
        .context("invalid engine configuration")?
        .with_progress(progress_tx);
    let outcome = comparator.compare(request).await;
    // Dropping the comparator closes the progress channel.
    drop(comparator);
    reporter.await.context("progress reporter failed")?;
    let result = outcome.context("comparison failed")?;

    for failure in &result.failures {
        warn!(unit = failure.index, reason = %failure.reason, "unit failed");
    }

    match format {
        OutputFormat::Json => print_compare_json(&result, args.show_diff)?,
        OutputFormat::Text => print_compare_text(&result, args.show_diff),
    }

    if let Some(out) = &args.out {
        let store = DirSnapshotStore::create(out)
            .with_context(|| format!("creating snapshot directory {}", out.display()))?;
        let name = store
            .save(&AnalyticsSnapshot::capture(&result))
            .context("saving snapshot")?;
        if format == OutputFormat::Text {
            println!("{} Snapshot saved to {}", "✓".green(), out.join(name).display());
        }
    }
    Ok(())
}

async fn report_progress(mut rx: mpsc::UnboundedReceiver<UnitProgress>, show: bool) {
    let mut printed = false;
    while let Some(p) = rx.recv().await {
        debug!(unit = p.index, completed = p.completed, total = p.total, "unit done");
        if show {
            eprint!("\r  {} {}/{}", "diffing units".dimmed(), p.completed, p.total);
            printed = true;
        }
    }
    if printed {
        eprintln!();
    }
}

fn print_compare_json(result: &ComparisonResult, show_diff: bool) -> anyhow::Result<()> {
    let json = if show_diff {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string_pretty(&serde_json::json!({
            "kind": result.kind,
            "dev": result.dev,
            "prod": result.prod,
            "analytics": result.analytics,
            "failures": result.failures,
        }))?
    };
    println!("{json}");
    Ok(())
}

fn print_compare_text(result: &ComparisonResult, show_diff: bool) {
    let a = &result.analytics;
    let percent = a.similarity_percent();
    let mark = if result.is_partial() { "!".yellow().bold() } else { "✓".green().bold() };
    println!(
        "{} Compared {} with {} ({}, {} units)",
        mark,
        result.dev.name.bold(),
        result.prod.name.bold(),
        result.kind.as_str().cyan(),
        a.layout.units,
    );
    for side in [&result.dev, &result.prod] {
        if let SideStatus::Unavailable { reason } = &side.status {
            println!("  {} {} unavailable: {}", "warning:".yellow(), side.name, reason);
        }
    }
    println!(
        "  Similarity: {} ({:.4}), difference {}%",
        colored_percent(percent),
        a.overall_similarity,
        a.difference_percent(),
    );
    println!(
        "  Changes: {} {} {} ({} unchanged)",
        format!("+{}", a.changes.added).green(),
        format!("-{}", a.changes.removed).red(),
        format!("~{}", a.changes.modified).yellow(),
        a.changes.unchanged,
    );
    println!(
        "  Units: dev {} / prod {}",
        a.layout.dev_units, a.layout.prod_units
    );
    println!("  Lines: dev {} / prod {}", a.layout.dev_lines, a.layout.prod_lines);
    println!(
        "  Characters: dev {} / prod {} (diff {})",
        a.chars.dev,
        a.chars.prod,
        a.chars.diff()
    );
    if let Some(cells) = a.cells {
        println!(
            "  Cells: dev {} / prod {} (diff {})",
            cells.dev,
            cells.prod,
            cells.diff()
        );
    }
    let estimate = match a.words.estimate {
        WordEstimate::Exact => String::new(),
        WordEstimate::Sampled { every, sampled_units } => {
            format!(" (estimated from {sampled_units} units, every {every})")
        }
    };
    println!(
        "  Words: dev {} / prod {}{}",
        a.words.dev,
        a.words.prod,
        estimate.dimmed()
    );
    if !result.failures.is_empty() {
        println!(
            "  {} {} of {} units failed",
            "Partial:".yellow().bold(),
            result.failures.len(),
            a.layout.units
        );
        for failure in &result.failures {
            println!("    unit {}: {}", failure.index, failure.reason);
        }
    }

    if show_diff {
        for unit in result.changed_units() {
            println!("\n{}", format!("@@ unit {} @@", unit.index).cyan());
            for line in &unit.diff {
                println!("{}", colored_line(line));
            }
        }
    }
}

fn colored_percent(percent: u32) -> colored::ColoredString {
    let text = format!("{percent}%");
    match percent {
        90.. => text.green().bold(),
        70..=89 => text.yellow().bold(),
        _ => text.red().bold(),
    }
}

fn colored_line(line: &DiffLine) -> colored::ColoredString {
    let text = line.to_string();
    match line.tag {
        LineTag::Added => text.green(),
        LineTag::Removed => text.red(),
        LineTag::ChangeMarker => text.yellow(),
        LineTag::Unchanged => text.normal(),
    }
}

fn cmd_summarize(args: SummarizeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = DirSnapshotStore::open(&args.dir)
        .with_context(|| format!("opening snapshot directory {}", args.dir.display()))?;
    let snapshots = store.load_all().context("loading snapshots")?;
    let summary = BatchSummary::from_snapshots(&snapshots);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.total_files == 0 {
        println!("No snapshots in {}.", args.dir.display());
        return Ok(());
    }
    println!(
        "{} Summary of {} comparisons in {}",
        "✓".green().bold(),
        summary.total_files.to_string().bold(),
        args.dir.display()
    );
    println!(
        "  Average similarity: {} ({:.4})",
        colored_percent(summary.average_percent),
        summary.average_similarity
    );
    println!(
        "  Changes: {} {} {} ({} total, {} unchanged)",
        format!("+{}", summary.changes.added).green(),
        format!("-{}", summary.changes.removed).red(),
        format!("~{}", summary.changes.modified).yellow(),
        summary.total_changes,
        summary.changes.unchanged,
    );
    let b = &summary.buckets;
    println!(
        "  Identical: {}  High (90-99%): {}  Medium (70-89%): {}  Low (<70%): {}",
        b.identical, b.high, b.medium, b.low
    );
    println!("  Lines: dev {} / prod {}", summary.lines.dev, summary.lines.prod);
    println!("  Characters: dev {} / prod {}", summary.chars.dev, summary.chars.prod);

    println!("\n{}", "Most changed:".bold());
    for s in &summary.most_changed {
        println!(
            "  {} {} vs {} ({} changes)",
            s.timestamp.dimmed(),
            s.dev_file,
            s.prod_file,
            s.total_changes().to_string().yellow()
        );
    }
    println!("\n{}", "Least similar:".bold());
    for s in &summary.least_similar {
        println!(
            "  {} {} vs {} ({})",
            s.timestamp.dimmed(),
            s.dev_file,
            s.prod_file,
            colored_percent(s.similarity_percent)
        );
    }
    Ok(())
}
