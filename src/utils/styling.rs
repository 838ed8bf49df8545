//! Terminal styling for the command-line run

use console::{style, Emoji};
use std::path::Path;
use std::time::Duration;

use crate::pipeline::config::PipelineConfig;
use crate::pipeline::space::SearchSpace;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static LINK: Emoji<'_, '_> = Emoji("🔗 ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
    ████████╗ █████╗ ██████╗ ███████╗███████╗██╗
    ╚══██╔══╝██╔══██╗██╔══██╗██╔════╝██╔════╝██║
       ██║   ███████║██████╔╝███████╗█████╗  ██║
       ██║   ██╔══██║██╔══██╗╚════██║██╔══╝  ██║
       ██║   ██║  ██║██████╔╝███████║███████╗███████╗
       ╚═╝   ╚═╝  ╚═╝╚═════╝ ╚══════╝╚══════╝╚══════╝
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {}",
        style("Prune, encode, resample, search").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

fn describe_space(space: &SearchSpace) -> String {
    match space {
        SearchSpace::List { configurations } => format!("list of {}", configurations.len()),
        SearchSpace::Grid { parameters } => {
            let size: usize = parameters.values().map(Vec::len).product();
            format!("grid of {}", if parameters.is_empty() { 0 } else { size })
        }
        SearchSpace::Random { n_samples, .. } => format!("{} random samples", n_samples),
    }
}

/// Print the run configuration card
pub fn print_config(input: &Path, target: &str, output: &Path, learner: &str, config: &PipelineConfig) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!("    │  {} Input:  {:<39}│", FOLDER, truncate_path(input, 38));
    println!("    │  {} Target: {:<39}│", TARGET, truncate_string(target, 38));
    println!("    │  {} Output: {:<39}│", SAVE, truncate_path(output, 38));
    println!("    ├{}┤", line);
    println!(
        "    │  {} Correlation threshold: {:<24}│",
        LINK,
        style(format!("{:.2}", config.correlation_threshold)).yellow()
    );
    println!(
        "    │  {} Resampling:            {:<24}│",
        CHART,
        style(config.resampling.name()).yellow()
    );
    println!(
        "    │  {} Learner:               {:<24}│",
        GEAR,
        style(truncate_string(learner, 22)).yellow()
    );
    println!(
        "    │  {} Search:                {:<24}│",
        GEAR,
        style(truncate_string(
            &format!("{}, {}-fold, {}", describe_space(&config.search_space), config.k_folds, config.metric),
            22
        ))
        .yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print how long a step took
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {} {}",
        style("⏱").dim(),
        style(format!("{:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("tabsel run complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    match detail {
        Some(info) => println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        ),
        None => println!("      Found {} {}", style(count).yellow().bold(), description),
    }
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}
