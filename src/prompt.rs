use colored::Colorize;
use inquire::{
    CustomUserError, InquireError, Text,
    autocompletion::{Autocomplete, Replacement},
    validator::Validation,
};
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled, settings::Style};
use tracing::error;

use crate::{
    executor::RenameReport,
    history::{Field, HistoryStore},
    plan::{RenamePlanEntry, RenameRecord, parse_number},
    session::Prompter,
    video::{MediaFile, episode_id},
};

/// Suggests previously entered values that contain the current input.
#[derive(Debug, Clone)]
struct HistoryCompleter {
    values: Vec<String>,
}

impl HistoryCompleter {
    fn new(history: &HistoryStore, field: Field) -> Self {
        // Most recent first.
        let values = history.values(field).iter().rev().cloned().collect();
        Self { values }
    }
}

impl Autocomplete for HistoryCompleter {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        let input = input.to_lowercase();
        Ok(self
            .values
            .iter()
            .filter(|value| value.to_lowercase().contains(&input))
            .cloned()
            .collect())
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion)
    }
}

#[derive(Tabled)]
struct FileRow<'a> {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "File Name")]
    name: &'a str,
}

#[derive(Tabled)]
struct PlanRow<'a> {
    #[tabled(rename = "Episode")]
    episode: String,
    #[tabled(rename = "Current Name")]
    source: &'a str,
    #[tabled(rename = "New Name")]
    target: &'a str,
}

/// Prompts on the terminal. A folder given up front is processed once.
pub struct TerminalPrompter {
    initial_folder: Option<PathBuf>,
    interactive_folder: bool,
}

impl TerminalPrompter {
    pub fn new(folder: Option<PathBuf>) -> Self {
        Self {
            interactive_folder: folder.is_none(),
            initial_folder: folder,
        }
    }

    fn ask(
        &self,
        label: &str,
        history: &HistoryStore,
        field: Field,
    ) -> Result<String, InquireError> {
        let numeric = matches!(field, Field::Season | Field::Episode);
        let mut prompt = Text::new(label)
            .with_default(history.default_for(field))
            .with_autocomplete(HistoryCompleter::new(history, field));

        if field == Field::Title {
            prompt = prompt.with_validator(|input: &str| {
                Ok(if input.trim().is_empty() {
                    Validation::Invalid("A title is required".into())
                } else {
                    Validation::Valid
                })
            });
        }
        if numeric {
            prompt = prompt
                .with_help_message("Whole number, blank means 1")
                .with_validator(move |input: &str| {
                    Ok(match parse_number(field, input) {
                        Ok(_) => Validation::Valid,
                        Err(e) => Validation::Invalid(e.to_string().into()),
                    })
                });
        }

        prompt.prompt()
    }
}

/// Esc and Ctrl-C are plain cancellations; anything else is worth a log line.
fn log_prompt_error(e: InquireError) {
    if !matches!(
        e,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    ) {
        error!(error = %e, "Prompt failed");
    }
}

impl Prompter for TerminalPrompter {
    fn choose_folder(&mut self) -> Option<PathBuf> {
        if let Some(folder) = self.initial_folder.take() {
            return Some(folder);
        }
        if !self.interactive_folder {
            return None;
        }

        match Text::new("Folder to rename (Esc to quit):").prompt() {
            Ok(folder) if !folder.trim().is_empty() => Some(PathBuf::from(folder.trim())),
            Ok(_) => None,
            Err(e) => {
                log_prompt_error(e);
                None
            }
        }
    }

    fn collect_rename_record(&mut self, history: &HistoryStore) -> Option<RenameRecord> {
        let mut answers = Vec::with_capacity(Field::ALL.len());
        for (field, label) in Field::ALL
            .into_iter()
            .zip(["Show Title:", "Year:", "Start Season:", "Start Episode:"])
        {
            match self.ask(label, history, field) {
                Ok(answer) => answers.push(answer),
                Err(e) => {
                    log_prompt_error(e);
                    return None;
                }
            }
        }

        match RenameRecord::parse(&answers[0], &answers[1], &answers[2], &answers[3]) {
            Ok(record) => Some(record),
            Err(e) => {
                self.warn("Input error", &e.to_string());
                None
            }
        }
    }

    fn show_files(&mut self, folder: &Path, files: &[MediaFile]) {
        let rows = files.iter().enumerate().map(|(i, file)| FileRow {
            index: i + 1,
            name: &file.name,
        });
        println!("{}", folder.display().to_string().bold());
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    fn show_plan(&mut self, plan: &[RenamePlanEntry]) {
        let rows = plan.iter().map(|entry| PlanRow {
            episode: episode_id(entry.season, entry.episode),
            source: &entry.source,
            target: &entry.target,
        });
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    fn warn(&mut self, title: &str, message: &str) {
        eprintln!("{} {}", format!("{title}:").yellow().bold(), message);
    }

    fn show_report(&mut self, folder: &Path, report: &RenameReport) {
        if report.is_success() {
            println!(
                "{} Renamed {} file(s) in {}",
                "Done.".green().bold(),
                report.renamed.len(),
                folder.display()
            );
            return;
        }

        eprintln!(
            "{} {} of {} file(s) could not be renamed:",
            "Errors.".red().bold(),
            report.failures.len(),
            report.failures.len() + report.renamed.len()
        );
        let width = textwrap::termwidth().saturating_sub(4).max(20);
        for failure in &report.failures {
            let line = format!("{}: {}", failure.source, failure.reason);
            let wrapped = textwrap::fill(
                &line,
                textwrap::Options::new(width).subsequent_indent("    "),
            );
            eprintln!("  {}", wrapped);
        }
    }
}
