//! Terminal tables for the search results and the fitted pipeline

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::metrics::Metric;
use crate::pipeline::orchestrator::PipelineArtifact;
use crate::pipeline::search::TrialResult;

fn print_section(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

/// Build the ranked trial table, showing at most `limit` rows
pub fn trials_table(trials: &[TrialResult], metric: Metric, limit: usize) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Rank").add_attribute(Attribute::Bold),
        Cell::new("Configuration").add_attribute(Attribute::Bold),
        Cell::new(format!("Mean {}", metric)).add_attribute(Attribute::Bold),
        Cell::new("Std").add_attribute(Attribute::Bold),
        Cell::new("Fold range").add_attribute(Attribute::Bold),
    ]);

    for trial in trials.iter().take(limit) {
        let (lo, hi) = trial
            .fold_scores
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));

        let rank = Cell::new(trial.rank);
        let rank = if trial.rank == 1 {
            rank.fg(Color::Green).add_attribute(Attribute::Bold)
        } else {
            rank
        };

        table.add_row(vec![
            rank,
            Cell::new(trial.configuration.to_string()),
            Cell::new(format!("{:.4}", trial.mean)),
            Cell::new(format!("{:.4}", trial.variance.sqrt())),
            Cell::new(format!("{:.3} – {:.3}", lo, hi)).fg(Color::DarkGrey),
        ]);
    }

    table
}

/// Print the ranked trials
pub fn display_trials(trials: &[TrialResult], metric: Metric, limit: usize) {
    print_section("🏁", "SEARCH RESULTS");
    if trials.is_empty() {
        println!("      {}", style("No configurations were evaluated").yellow());
        return;
    }
    print_indented(&trials_table(trials, metric, limit));
    if trials.len() > limit {
        println!(
            "      {}",
            style(format!("... {} more configuration(s)", trials.len() - limit)).dim()
        );
    }
}

/// Summary of a fitted run
#[derive(Debug, Default)]
pub struct FitSummary {
    pub initial_features: usize,
    pub rows: usize,
    pub skipped_rows: usize,
    pub load_time: Option<Duration>,
    pub fit_time: Option<Duration>,
    pub save_time: Option<Duration>,
}

impl FitSummary {
    pub fn new(initial_features: usize, rows: usize, skipped_rows: usize) -> Self {
        Self {
            initial_features,
            rows,
            skipped_rows,
            ..Default::default()
        }
    }

    pub fn set_load_time(&mut self, elapsed: Duration) {
        self.load_time = Some(elapsed);
    }

    pub fn set_fit_time(&mut self, elapsed: Duration) {
        self.fit_time = Some(elapsed);
    }

    pub fn set_save_time(&mut self, elapsed: Duration) {
        self.save_time = Some(elapsed);
    }

    /// Build the key/value table describing the artifact
    pub fn table(&self, artifact: &PipelineArtifact) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        let dropped = artifact.transforms.drop_list.len();
        table.add_row(vec![Cell::new("📁 Rows"), Cell::new(self.rows)]);
        if self.skipped_rows > 0 {
            table.add_row(vec![
                Cell::new("🚫 Rows without target"),
                Cell::new(self.skipped_rows).fg(Color::Yellow),
            ]);
        }
        table.add_row(vec![
            Cell::new("📁 Input Features"),
            Cell::new(self.initial_features),
        ]);
        table.add_row(vec![
            Cell::new("🔗 Dropped (Correlation)"),
            Cell::new(dropped).fg(if dropped == 0 { Color::White } else { Color::Red }),
        ]);
        table.add_row(vec![
            Cell::new("🔤 Encoded Columns"),
            Cell::new(artifact.transforms.encoding.len()),
        ]);
        table.add_row(vec![
            Cell::new("🏷️  Classes"),
            Cell::new(artifact.classes.join(", ")),
        ]);
        table.add_row(vec![
            Cell::new("🧠 Learner"),
            Cell::new(&artifact.learner).add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("✅ Best Configuration"),
            Cell::new(artifact.configuration.to_string())
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        if let Some(best) = artifact.best_trial() {
            table.add_row(vec![
                Cell::new(format!("📈 Mean {}", artifact.metric)),
                Cell::new(format!("{:.4}", best.mean)).fg(Color::Green),
            ]);
        }
        table.add_row(vec![
            Cell::new("🧮 Final Training Rows"),
            Cell::new(artifact.training_rows),
        ]);

        for (label, time) in [
            ("⏱  Load", self.load_time),
            ("⏱  Fit", self.fit_time),
            ("⏱  Save", self.save_time),
        ] {
            if let Some(t) = time {
                table.add_row(vec![
                    Cell::new(label),
                    Cell::new(format!("{:.2}s", t.as_secs_f64())).fg(Color::DarkGrey),
                ]);
            }
        }

        table
    }

    pub fn display(&self, artifact: &PipelineArtifact) {
        print_section("📋", "PIPELINE SUMMARY");
        print_indented(&self.table(artifact));

        let drop_list = &artifact.transforms.drop_list;
        if !drop_list.is_empty() {
            print_section("📝", "DROPPED FEATURES");
            // A column can be marked by several pairs; show the first
            for column in &drop_list.columns {
                let Some(pair) = drop_list.pairs.iter().find(|p| &p.feature2 == column) else {
                    continue;
                };
                println!(
                    "      {} {} {}",
                    style("•").dim(),
                    pair.feature2,
                    style(format!("(|r| = {:.3} with {})", pair.correlation.abs(), pair.feature1)).dim()
                );
            }
        }

        let encoding = &artifact.transforms.encoding;
        if !encoding.is_empty() {
            print_section("🔤", "ENCODED COLUMNS");
            for column in &encoding.columns {
                println!(
                    "      {} {} {}",
                    style("•").dim(),
                    column.column,
                    style(format!(
                        "({} categories, {})",
                        column.cardinality,
                        column.encoding.strategy()
                    ))
                    .dim()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::space::Configuration;

    fn trial(rank: usize, mean: f64) -> TrialResult {
        TrialResult {
            rank,
            position: rank - 1,
            configuration: Configuration::new().with("k", rank),
            mean,
            variance: 0.0004,
            fold_scores: vec![mean - 0.02, mean + 0.02],
        }
    }

    #[test]
    fn test_trials_table_respects_limit() {
        let trials = vec![trial(1, 0.9), trial(2, 0.8), trial(3, 0.7)];
        let rendered = trials_table(&trials, Metric::Accuracy, 2).to_string();
        assert!(rendered.contains("k=1"));
        assert!(rendered.contains("k=2"));
        assert!(!rendered.contains("k=3"));
        assert!(rendered.contains("0.0200"));
    }
}
