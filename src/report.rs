//! Terminal rendering of analysis results.

use colored::Colorize;
use serde::Serialize;

use internal_link::{ApplyReport, CorpusStats, Suggestion};

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_suggestions(suggestions: &[Suggestion], details: bool) {
    if suggestions.is_empty() {
        println!("{}", "No link suggestions found.".yellow());
        return;
    }

    println!(
        "{} link suggestions\n",
        suggestions.len().to_string().green().bold()
    );

    for s in suggestions {
        println!("{} {}", "File:".bold(), s.source.cyan());
        println!("{} {}", "Suggested link to:".bold(), s.target.cyan());
        println!("{} {:.2}", "Score:".bold(), s.score);
        if details {
            println!("{} {}", "Context:".bold(), s.context.replace('\n', " ").dimmed());
            println!(
                "{} {} {}",
                "Phrase to link:".bold(),
                s.surface.yellow(),
                format!("(byte {})", s.position).dimmed()
            );
        }
        println!();
    }
}

pub fn print_apply(report: &ApplyReport) {
    println!(
        "{} {} links in {} files",
        "Inserted".green().bold(),
        report.applied.to_string().cyan(),
        report.files_written.to_string().cyan()
    );

    if report.skipped.is_empty() {
        return;
    }
    println!(
        "{} {} suggestions",
        "Skipped".yellow().bold(),
        report.skipped.len()
    );
    for skip in &report.skipped {
        println!(
            "  {} {}:{} {}",
            "~".dimmed(),
            skip.source,
            skip.position,
            skip.reason.dimmed()
        );
    }
}

pub fn print_stats(stats: &CorpusStats) {
    println!("{}", "Corpus Statistics".green().bold());
    println!("  Documents:           {}", stats.documents.to_string().cyan());
    println!("  Distinct terms:      {}", stats.distinct_terms.to_string().cyan());
    println!("  Avg terms per doc:   {}", format!("{:.1}", stats.avg_distinct_terms).cyan());

    if stats.top_terms.is_empty() {
        return;
    }
    println!();
    println!("{}", "Most Widespread Terms".green().bold());
    for (term, df) in &stats.top_terms {
        println!("  {:30} {} docs", term, df.to_string().yellow());
    }
}
