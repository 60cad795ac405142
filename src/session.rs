use anyhow::Context;
use std::path::{Path, PathBuf};
use tokio::task::JoinError;
use tracing::{debug, error, info};

use crate::{
    discovery,
    error::Error,
    executor::{self, RenameReport, Reveal},
    history::HistoryStore,
    plan::{self, RenamePlanEntry, RenameRecord},
    video::MediaFile,
};

/// The user-facing side of a session: prompts and notices.
pub trait Prompter {
    /// Asks for the folder to process; `None` ends the session.
    fn choose_folder(&mut self) -> Option<PathBuf>;

    /// Asks for the batch fields, offering `history` as defaults.
    /// `None` means the user cancelled.
    fn collect_rename_record(&mut self, history: &HistoryStore) -> Option<RenameRecord>;

    fn show_files(&mut self, folder: &Path, files: &[MediaFile]);

    fn show_plan(&mut self, plan: &[RenamePlanEntry]);

    fn warn(&mut self, title: &str, message: &str);

    fn show_report(&mut self, folder: &Path, report: &RenameReport);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    FolderChosen,
    InputCollected,
    Renaming,
    Done,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub history_path: PathBuf,
    pub dry_run: bool,
    pub reveal: Reveal,
}

pub struct Session<P> {
    prompter: P,
    options: SessionOptions,
    history: HistoryStore,
    state: SessionState,
    folder: Option<PathBuf>,
    files: Vec<MediaFile>,
    plan: Vec<RenamePlanEntry>,
}

impl<P: Prompter> Session<P> {
    pub fn new(prompter: P, options: SessionOptions) -> Self {
        let history = HistoryStore::load(&options.history_path);
        Self {
            prompter,
            options,
            history,
            state: SessionState::Idle,
            folder: None,
            files: Vec::new(),
            plan: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn files(&self) -> &[MediaFile] {
        &self.files
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Scans `folder` and makes it current. Returns `false`, after telling
    /// the user why, when the folder is unreadable or holds no media files.
    pub fn open_folder(&mut self, folder: &Path) -> bool {
        let files = match discovery::scan(folder) {
            Ok(files) => files,
            Err(e) => {
                self.prompter.warn("Cannot read folder", &e.to_string());
                return false;
            }
        };

        if files.is_empty() {
            self.prompter.warn(
                "No media files",
                &format!("No media files found in {}.", folder.display()),
            );
            return false;
        }

        info!(folder = %folder.display(), count = files.len(), "Folder chosen");
        self.prompter.show_files(folder, &files);
        self.folder = Some(folder.to_path_buf());
        self.files = files;
        self.plan.clear();
        self.state = SessionState::FolderChosen;
        true
    }

    /// Collects and validates the batch fields. Only a confirmed, valid
    /// submission is written to history.
    pub fn collect_input(&mut self) -> Option<RenameRecord> {
        if self.state != SessionState::FolderChosen {
            self.prompter.warn("No files", "Please select a folder first.");
            return None;
        }

        let Some(record) = self.prompter.collect_rename_record(&self.history) else {
            debug!("Rename cancelled by user");
            return None;
        };

        let plan = match plan::plan(&self.files, &record) {
            Ok(plan) => plan,
            Err(e) => {
                self.prompter.warn("Input error", &e.to_string());
                return None;
            }
        };

        self.history.record_submission(&record);
        if let Err(e) = self.history.save(&self.options.history_path) {
            error!(error = %e, "Failed saving history");
        }

        self.plan = plan;
        self.state = SessionState::InputCollected;
        Some(record)
    }

    /// Runs the collected batch on a worker and waits for its report.
    pub async fn rename(&mut self) -> anyhow::Result<RenameReport> {
        if self.state != SessionState::InputCollected {
            return Err(Error::InvalidState(format!(
                "cannot rename from {:?}",
                self.state
            ))
            .into());
        }
        let folder = self
            .folder
            .clone()
            .context("No folder selected for renaming")?;

        self.prompter.show_plan(&self.plan);
        let plan = std::mem::take(&mut self.plan);

        self.state = SessionState::Renaming;
        let outcome = if self.options.dry_run {
            info!(count = plan.len(), "Dry run, leaving files untouched");
            Ok(RenameReport::default())
        } else {
            executor::spawn_apply(folder.clone(), plan, self.options.reveal).await
        };
        self.finish(&folder, outcome)
    }

    /// Ends the batch whatever the worker's outcome, then hands back control
    /// for the next one.
    fn finish(
        &mut self,
        folder: &Path,
        outcome: Result<RenameReport, JoinError>,
    ) -> anyhow::Result<RenameReport> {
        self.state = SessionState::Done;

        let report = match outcome {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Rename worker failed");
                self.rescan(folder);
                return Err(anyhow::Error::new(e).context("Rename worker failed"));
            }
        };

        self.prompter.show_report(folder, &report);
        self.rescan(folder);
        Ok(report)
    }

    fn rescan(&mut self, folder: &Path) {
        match discovery::scan(folder) {
            Ok(files) if !files.is_empty() => {
                self.files = files;
                self.state = SessionState::FolderChosen;
            }
            _ => {
                self.files.clear();
                self.folder = None;
                self.state = SessionState::Idle;
            }
        }
    }

    /// Processes folders until the prompter stops offering one.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        while let Some(folder) = self.prompter.choose_folder() {
            if !self.open_folder(&folder) {
                continue;
            }
            if self.collect_input().is_none() {
                continue;
            }
            self.rename().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Field;
    use std::{collections::VecDeque, fs};
    use tempfile::TempDir;

    #[derive(Default)]
    struct ScriptedPrompter {
        folders: VecDeque<PathBuf>,
        records: VecDeque<Option<RenameRecord>>,
        warnings: Vec<String>,
        plans: Vec<Vec<RenamePlanEntry>>,
        reports: Vec<RenameReport>,
        seen_defaults: Vec<String>,
    }

    impl Prompter for ScriptedPrompter {
        fn choose_folder(&mut self) -> Option<PathBuf> {
            self.folders.pop_front()
        }

        fn collect_rename_record(&mut self, history: &HistoryStore) -> Option<RenameRecord> {
            self.seen_defaults
                .push(history.default_for(Field::Title).to_string());
            self.records.pop_front().flatten()
        }

        fn show_files(&mut self, _folder: &Path, _files: &[MediaFile]) {}

        fn show_plan(&mut self, plan: &[RenamePlanEntry]) {
            self.plans.push(plan.to_vec());
        }

        fn warn(&mut self, title: &str, _message: &str) {
            self.warnings.push(title.to_string());
        }

        fn show_report(&mut self, _folder: &Path, report: &RenameReport) {
            self.reports.push(report.clone());
        }
    }

    fn show_record() -> RenameRecord {
        RenameRecord {
            title: "Show".to_string(),
            year: "2020".to_string(),
            season: 1,
            episode: 3,
        }
    }

    fn create_test_files(base_dir: &Path, files: &[&str]) {
        for file_name in files {
            fs::write(base_dir.join(file_name), file_name).unwrap();
        }
    }

    fn listing(folder: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(folder)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    struct Fixture {
        _temp_dir: TempDir,
        media: PathBuf,
        history_path: PathBuf,
    }

    fn fixture(files: &[&str]) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let media = temp_dir.path().join("media");
        fs::create_dir(&media).unwrap();
        create_test_files(&media, files);
        let history_path = temp_dir.path().join("history.json");
        Fixture {
            _temp_dir: temp_dir,
            media,
            history_path,
        }
    }

    fn session(
        fixture: &Fixture,
        prompter: ScriptedPrompter,
        dry_run: bool,
    ) -> Session<ScriptedPrompter> {
        Session::new(
            prompter,
            SessionOptions {
                history_path: fixture.history_path.clone(),
                dry_run,
                reveal: Reveal::Skip,
            },
        )
    }

    #[tokio::test]
    async fn test_end_to_end_rename() {
        let fixture = fixture(&["a.mkv", "B.MP4", "c.txt"]);
        let prompter = ScriptedPrompter {
            folders: VecDeque::from([fixture.media.clone()]),
            records: VecDeque::from([Some(show_record())]),
            ..Default::default()
        };
        let mut session = session(&fixture, prompter, false);

        session.run().await.unwrap();

        assert_eq!(
            listing(&fixture.media),
            vec![
                "Show (2020) - S01E03.mp4".to_string(),
                "Show (2020) - S01E04.mkv".to_string(),
                "c.txt".to_string(),
            ]
        );
        let prompter = session.prompter();
        assert_eq!(prompter.reports.len(), 1);
        assert!(prompter.reports[0].is_success());
        assert_eq!(prompter.plans[0][0].source, "B.MP4");
        assert_eq!(prompter.plans[0][1].source, "a.mkv");

        let saved = HistoryStore::load(&fixture.history_path);
        assert_eq!(saved.default_for(Field::Title), "Show");
        assert_eq!(saved.default_for(Field::Episode), "3");
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let fixture = fixture(&["a.mkv", "b.mkv"]);
        let prompter = ScriptedPrompter {
            records: VecDeque::from([Some(show_record())]),
            ..Default::default()
        };
        let mut session = session(&fixture, prompter, false);
        assert_eq!(session.state(), SessionState::Idle);

        assert!(session.open_folder(&fixture.media));
        assert_eq!(session.state(), SessionState::FolderChosen);

        assert!(session.collect_input().is_some());
        assert_eq!(session.state(), SessionState::InputCollected);
        assert_eq!(session.history().default_for(Field::Year), "2020");

        let report = session.rename().await.unwrap();
        assert!(report.is_success());
        assert_eq!(session.state(), SessionState::FolderChosen);
        assert_eq!(session.files().len(), 2);
        assert_eq!(session.files()[0].name, "Show (2020) - S01E03.mkv");
    }

    #[tokio::test]
    async fn test_cancel_leaves_history_and_files_untouched() {
        let fixture = fixture(&["a.mkv", "b.mkv"]);
        fs::write(&fixture.history_path, r#"{"title": ["Old"]}"#).unwrap();
        let before = fs::read_to_string(&fixture.history_path).unwrap();

        let prompter = ScriptedPrompter {
            folders: VecDeque::from([fixture.media.clone()]),
            records: VecDeque::from([None]),
            ..Default::default()
        };
        let mut session = session(&fixture, prompter, false);

        assert!(session.open_folder(&fixture.media));
        assert!(session.collect_input().is_none());
        assert_eq!(session.state(), SessionState::FolderChosen);
        assert_eq!(session.prompter().seen_defaults, vec!["Old".to_string()]);

        session.run().await.unwrap();

        assert_eq!(fs::read_to_string(&fixture.history_path).unwrap(), before);
        assert_eq!(
            listing(&fixture.media),
            vec!["a.mkv".to_string(), "b.mkv".to_string()]
        );
        assert!(session.prompter().reports.is_empty());
    }

    #[tokio::test]
    async fn test_rename_requires_collected_input() {
        let fixture = fixture(&["a.mkv"]);
        let mut session = session(&fixture, ScriptedPrompter::default(), false);

        assert!(session.rename().await.is_err());
        assert!(session.open_folder(&fixture.media));
        assert!(session.rename().await.is_err());
        assert_eq!(listing(&fixture.media), vec!["a.mkv".to_string()]);
    }

    #[tokio::test]
    async fn test_collect_input_without_folder_warns() {
        let fixture = fixture(&["a.mkv"]);
        let prompter = ScriptedPrompter {
            records: VecDeque::from([Some(show_record())]),
            ..Default::default()
        };
        let mut session = session(&fixture, prompter, false);

        assert!(session.collect_input().is_none());
        assert_eq!(session.prompter().warnings, vec!["No files".to_string()]);
        assert!(!fixture.history_path.exists());
    }

    #[tokio::test]
    async fn test_empty_and_missing_folders_are_refused() {
        let fixture = fixture(&["notes.txt"]);
        let mut session = session(&fixture, ScriptedPrompter::default(), false);

        assert!(!session.open_folder(&fixture.media));
        assert!(!session.open_folder(&fixture.media.join("missing")));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(
            session.prompter().warnings,
            vec!["No media files".to_string(), "Cannot read folder".to_string()]
        );
    }

    #[tokio::test]
    async fn test_invalid_input_saves_nothing() {
        let fixture = fixture(&["a.mkv", "b.mkv"]);
        let record = RenameRecord {
            episode: u32::MAX,
            ..show_record()
        };
        let prompter = ScriptedPrompter {
            records: VecDeque::from([Some(record)]),
            ..Default::default()
        };
        let mut session = session(&fixture, prompter, false);

        assert!(session.open_folder(&fixture.media));
        assert!(session.collect_input().is_none());
        assert_eq!(session.state(), SessionState::FolderChosen);
        assert_eq!(session.prompter().warnings, vec!["Input error".to_string()]);
        assert!(!fixture.history_path.exists());
    }

    #[tokio::test]
    async fn test_dry_run_keeps_files() {
        let fixture = fixture(&["a.mkv", "b.mkv"]);
        let prompter = ScriptedPrompter {
            folders: VecDeque::from([fixture.media.clone()]),
            records: VecDeque::from([Some(show_record())]),
            ..Default::default()
        };
        let mut session = session(&fixture, prompter, true);

        session.run().await.unwrap();

        assert_eq!(
            listing(&fixture.media),
            vec!["a.mkv".to_string(), "b.mkv".to_string()]
        );
        let prompter = session.prompter();
        assert_eq!(prompter.plans[0].len(), 2);
        assert_eq!(prompter.plans[0][1].target, "Show (2020) - S01E04.mkv");
        assert!(prompter.reports[0].renamed.is_empty());
        assert!(fixture.history_path.exists());
    }

    #[tokio::test]
    async fn test_worker_failure_still_ends_batch() {
        let fixture = fixture(&["a.mkv", "b.mkv"]);
        let mut session = session(&fixture, ScriptedPrompter::default(), false);
        assert!(session.open_folder(&fixture.media));
        session.state = SessionState::Renaming;

        let outcome = tokio::task::spawn_blocking(|| -> RenameReport { panic!("worker died") }).await;
        assert!(outcome.is_err());

        assert!(session.finish(&fixture.media, outcome).is_err());
        assert_eq!(session.state(), SessionState::FolderChosen);
        assert!(session.prompter().reports.is_empty());
        assert_eq!(session.files().len(), 2);
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported() {
        let fixture = fixture(&["a.mkv", "b.mkv", "c.mkv"]);
        fs::create_dir(fixture.media.join("Show (2020) - S01E04.mkv")).unwrap();
        let prompter = ScriptedPrompter {
            folders: VecDeque::from([fixture.media.clone()]),
            records: VecDeque::from([Some(show_record())]),
            ..Default::default()
        };
        let mut session = session(&fixture, prompter, false);

        session.run().await.unwrap();

        let report = &session.prompter().reports[0];
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, "b.mkv");
        assert_eq!(report.renamed.len(), 2);
        assert!(fixture.media.join("Show (2020) - S01E05.mkv").is_file());
    }
}
