//! Application state and logic.

use crate::config::Config;
use crossterm::event::{KeyCode, KeyEvent};
use idiom_core::{
    by_frequency_bucket, clamp_day, day_count, missed_set, Bucket, Dataset, Idiom, Progress,
    ProgressService, ProgressStore, ProgressSummary, QuizGenerator, QuizMode, QuizSession,
    Selection, Status, StoreResult,
};
use std::fmt::Display;

pub struct App {
    pub config: Config,
    pub dataset: Dataset,
    store: ProgressStore,
    pub view: View,
    pub bucket: Bucket,
    pub day: usize,
    pub summary: ProgressSummary,
    pub study: Option<StudySession>,
    pub quiz: Option<QuizScreen>,
    pub missed: Vec<(Idiom, Progress)>,
    pub missed_selected: usize,
    pub auto_reveal: bool,
    pub message: Option<String>,
    pub show_help: bool,
    pub should_quit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Study,
    Quiz,
    Missed,
}

/// Flashcards being worked through.
#[derive(Debug, Clone)]
pub struct StudySession {
    pub selection: Selection,
    pub idioms: Vec<Idiom>,
    pub current: usize,
    pub revealed: bool,
    pub mastered: bool,
    pub return_to: View,
}

impl StudySession {
    pub fn current_idiom(&self) -> Option<&Idiom> {
        self.idioms.get(self.current)
    }
}

/// A quiz and where it was started from.
#[derive(Debug, Clone)]
pub struct QuizScreen {
    pub selection: Selection,
    pub session: QuizSession,
    pub return_to: View,
}

impl App {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let dataset = match &config.data.dataset_path {
            Some(path) => Dataset::load(path)?,
            None => Dataset::bundled()?,
        };
        let store = ProgressStore::open(&config.db_path())?;
        Ok(Self::with_parts(config, dataset, store)?)
    }

    pub fn with_parts(config: Config, dataset: Dataset, store: ProgressStore) -> StoreResult<Self> {
        let auto_reveal = config.study.auto_reveal;
        let bucket = config.study.default_bucket;
        let mut app = Self {
            config,
            dataset,
            store,
            view: View::Home,
            bucket,
            day: 1,
            summary: ProgressSummary::default(),
            study: None,
            quiz: None,
            missed: Vec::new(),
            missed_selected: 0,
            auto_reveal,
            message: None,
            show_help: false,
            should_quit: false,
        };
        app.summary = app.progress().summary()?;
        Ok(app)
    }

    pub fn progress(&self) -> ProgressService<'_> {
        ProgressService::new(&self.store)
    }

    /// Close the progress store.
    pub fn shutdown(self) -> StoreResult<()> {
        self.store.close()
    }

    /// Configured page size, at least one.
    pub fn page_size(&self) -> usize {
        self.config.study.page_size.max(1)
    }

    /// Size of the current bucket.
    pub fn bucket_len(&self) -> usize {
        by_frequency_bucket(self.dataset.idioms(), self.bucket).len()
    }

    pub fn day_total(&self) -> usize {
        day_count(self.bucket_len(), self.page_size())
    }

    fn day_selection(&self) -> Selection {
        Selection::Day {
            bucket: self.bucket,
            day: self.day,
        }
    }

    fn report(&mut self, action: &str, err: impl Display) {
        tracing::warn!(action, error = %err, "operation failed");
        self.message = Some(format!("Could not {}: {}", action, err));
    }

    fn refresh_summary(&mut self) {
        match self.progress().summary() {
            Ok(summary) => self.summary = summary,
            Err(err) => self.report("load progress", err),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.message = None;

        if self.show_help {
            self.show_help = false;
            return;
        }
        if key.code == KeyCode::Char('?') {
            self.show_help = true;
            return;
        }

        match self.view {
            View::Home => self.handle_home_key(key),
            View::Study => self.handle_study_key(key),
            View::Quiz => self.handle_quiz_key(key),
            View::Missed => self.handle_missed_key(key),
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => {
                self.bucket = self.bucket.prev();
                self.day = 1;
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.bucket = self.bucket.next();
                self.day = 1;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.day = clamp_day(self.day + 1, self.bucket_len(), self.page_size());
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.day = clamp_day(self.day.saturating_sub(1), self.bucket_len(), self.page_size());
            }
            KeyCode::Char('s') | KeyCode::Enter => self.start_study(self.day_selection(), View::Home),
            KeyCode::Char('1') => self.start_quiz(self.day_selection(), QuizMode::IdiomToDefinition, View::Home),
            KeyCode::Char('2') => self.start_quiz(self.day_selection(), QuizMode::DefinitionToIdiom, View::Home),
            KeyCode::Char('z') => {
                let mode = self.config.quiz.default_mode;
                self.start_quiz(self.day_selection(), mode, View::Home);
            }
            KeyCode::Char('w') => self.open_missed(),
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_study_key(&mut self, key: KeyEvent) {
        if self.study.is_none() {
            self.view = View::Home;
            return;
        }
        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_definition(),
            KeyCode::Char('n') | KeyCode::Char('l') | KeyCode::Right => self.move_card(1),
            KeyCode::Char('p') | KeyCode::Char('h') | KeyCode::Left => self.move_card(-1),
            KeyCode::Char('m') => self.toggle_mastered(),
            KeyCode::Char('a') => {
                self.auto_reveal = !self.auto_reveal;
                if self.auto_reveal {
                    self.reveal();
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => self.leave_study(),
            _ => {}
        }
    }

    fn handle_quiz_key(&mut self, key: KeyEvent) {
        let Some(quiz) = &mut self.quiz else {
            self.view = View::Home;
            return;
        };
        match key.code {
            KeyCode::Char(c @ '1'..='9') => {
                let idx = c as usize - '1' as usize;
                self.answer(idx);
            }
            KeyCode::Char('n') | KeyCode::Char('l') | KeyCode::Right => {
                quiz.session.next();
            }
            KeyCode::Char('p') | KeyCode::Char('h') | KeyCode::Left => {
                quiz.session.prev();
            }
            KeyCode::Char('u') => match quiz.session.next_unanswered() {
                Some(idx) => quiz.session.jump(idx),
                None => self.message = Some("All questions answered".to_string()),
            },
            KeyCode::Char('r') => {
                if quiz.session.retry() {
                    self.message = Some("Answer hidden, pick again".to_string());
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => self.leave_quiz(),
            _ => {}
        }
    }

    fn handle_missed_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.missed.is_empty() {
                    self.missed_selected = (self.missed_selected + 1).min(self.missed.len() - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.missed_selected = self.missed_selected.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char('s') => {
                if let Some((idiom, _)) = self.missed.get(self.missed_selected) {
                    let selection = Selection::Single(idiom.id);
                    self.start_study(selection, View::Missed);
                }
            }
            KeyCode::Char('1') => self.start_quiz(Selection::Missed, QuizMode::IdiomToDefinition, View::Missed),
            KeyCode::Char('2') => self.start_quiz(Selection::Missed, QuizMode::DefinitionToIdiom, View::Missed),
            KeyCode::Char('q') | KeyCode::Esc => {
                self.view = View::Home;
                self.refresh_summary();
            }
            _ => {}
        }
    }

    fn resolve(&mut self, selection: Selection) -> Option<Vec<Idiom>> {
        let progress = if selection.needs_progress() {
            match self.progress().get_all() {
                Ok(progress) => progress,
                Err(err) => {
                    self.report("load progress", err);
                    return None;
                }
            }
        } else {
            Vec::new()
        };
        Some(selection.resolve(&self.dataset, &progress, self.page_size()))
    }

    pub fn start_study(&mut self, selection: Selection, return_to: View) {
        let Some(idioms) = self.resolve(selection) else { return };
        if idioms.is_empty() {
            self.message = Some("Nothing to study here.".to_string());
            return;
        }

        tracing::info!(selection = %selection.describe(), count = idioms.len(), "starting study");
        self.study = Some(StudySession {
            selection,
            idioms,
            current: 0,
            revealed: false,
            mastered: false,
            return_to,
        });
        self.view = View::Study;
        self.show_card();
    }

    fn show_card(&mut self) {
        let Some(id) = self.study.as_ref().and_then(|s| s.current_idiom()).map(|i| i.id) else {
            return;
        };
        let mastered = match self.progress().get_by_id(id) {
            Ok(p) => p.status == Status::Mastered,
            Err(err) => {
                self.report("load progress", err);
                false
            }
        };
        if let Some(study) = &mut self.study {
            study.mastered = mastered;
            study.revealed = false;
        }
        if self.auto_reveal {
            self.reveal();
        }
    }

    /// Hide a shown definition, or show it and count a study.
    fn toggle_definition(&mut self) {
        let Some(study) = &mut self.study else { return };
        if study.revealed {
            study.revealed = false;
        } else {
            self.reveal();
        }
    }

    /// Show the definition and count it as a study.
    fn reveal(&mut self) {
        let Some(study) = &mut self.study else { return };
        if study.revealed {
            return;
        }
        let Some(id) = study.current_idiom().map(|i| i.id) else { return };
        study.revealed = true;

        if let Err(err) = self.progress().record_study(id) {
            self.report("record study", err);
        }
    }

    fn move_card(&mut self, delta: isize) {
        let Some(study) = &mut self.study else { return };
        let Some(next) = study.current.checked_add_signed(delta) else { return };
        if next >= study.idioms.len() {
            return;
        }
        study.current = next;
        self.show_card();
    }

    fn toggle_mastered(&mut self) {
        let Some(id) = self.study.as_ref().and_then(|s| s.current_idiom()).map(|i| i.id) else {
            return;
        };
        match self.progress().toggle_mastered(id) {
            Ok(mastered) => {
                if let Some(study) = &mut self.study {
                    study.mastered = mastered;
                }
                self.message = Some(if mastered { "Marked as mastered" } else { "Back to learning" }.to_string());
            }
            Err(err) => self.report("update mastery", err),
        }
    }

    fn leave_study(&mut self) {
        let return_to = self.study.take().map_or(View::Home, |s| s.return_to);
        self.enter(return_to);
    }

    pub fn start_quiz(&mut self, selection: Selection, mode: QuizMode, return_to: View) {
        let Some(idioms) = self.resolve(selection) else { return };
        if idioms.is_empty() {
            self.message = Some(match selection {
                Selection::Missed => "No missed idioms. Keep it up!".to_string(),
                _ => "No questions for this selection.".to_string(),
            });
            return;
        }

        let questions = QuizGenerator::new(&self.dataset).generate(&idioms, mode);
        let ids: Vec<_> = idioms.iter().map(|i| i.id).collect();
        let history = match self.progress().get_batch(&ids) {
            Ok(history) => history,
            Err(err) => {
                self.report("load quiz history", err);
                return;
            }
        };

        tracing::info!(selection = %selection.describe(), ?mode, count = questions.len(), "starting quiz");
        self.quiz = Some(QuizScreen {
            selection,
            session: QuizSession::restore(mode, questions, &history),
            return_to,
        });
        self.view = View::Quiz;
    }

    fn answer(&mut self, idx: usize) {
        let Some(quiz) = &mut self.quiz else { return };
        let Some(id) = quiz.session.current().map(|q| q.idiom.id) else { return };
        let Some(correct) = quiz.session.answer(idx) else { return };

        self.message = Some(if correct { "Correct!" } else { "Wrong" }.to_string());
        if let Err(err) = self.progress().record_quiz_result(id, correct, idx) {
            self.report("save answer", err);
        }
    }

    fn leave_quiz(&mut self) {
        let return_to = self.quiz.take().map_or(View::Home, |q| q.return_to);
        self.enter(return_to);
    }

    fn enter(&mut self, view: View) {
        match view {
            View::Missed => self.open_missed(),
            _ => {
                self.view = View::Home;
                self.refresh_summary();
            }
        }
    }

    pub fn open_missed(&mut self) {
        let progress = match self.progress().get_all() {
            Ok(progress) => progress,
            Err(err) => {
                self.report("load progress", err);
                return;
            }
        };
        let missed: Vec<(Idiom, Progress)> = missed_set(self.dataset.idioms(), &progress)
            .into_iter()
            .filter_map(|idiom| {
                progress
                    .iter()
                    .find(|p| p.idiom_id == idiom.id)
                    .map(|p| (idiom.clone(), p.clone()))
            })
            .collect();

        self.missed = missed;
        self.missed_selected = self.missed_selected.min(self.missed.len().saturating_sub(1));
        self.summary = ProgressSummary::from_records(&progress);
        self.view = View::Missed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use idiom_core::AnswerState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        let idioms = (1..=40)
            .map(|i| Idiom::new(i, format!("w{i}"), if i <= 10 { 15 } else { 3 }, format!("d{i}")))
            .collect();
        App::with_parts(
            Config::default(),
            Dataset::from_idioms(idioms).unwrap(),
            ProgressStore::in_memory().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_day_navigation_is_clamped() {
        let mut app = app();
        assert_eq!(app.day_total(), 2);
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.day, 2);
        app.handle_key(key(KeyCode::Char('l')));
        assert_eq!(app.bucket, Bucket::High);
        assert_eq!(app.day, 1);
        assert_eq!(app.day_total(), 1);
    }

    #[test]
    fn test_space_toggles_definition_and_counts_each_reveal() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('s')));
        assert_eq!(app.view, View::Study);

        app.handle_key(key(KeyCode::Char(' ')));
        assert!(app.study.as_ref().unwrap().revealed);
        app.handle_key(key(KeyCode::Char(' ')));
        assert!(!app.study.as_ref().unwrap().revealed);
        assert_eq!(app.progress().get_by_id(1).unwrap().study_count, 1);

        app.handle_key(key(KeyCode::Char(' ')));
        let p = app.progress().get_by_id(1).unwrap();
        assert_eq!(p.study_count, 2);
        assert_eq!(p.status, Status::Learning);
    }

    #[test]
    fn test_zero_page_size_reads_as_one() {
        let mut config = Config::default();
        config.study.page_size = 0;
        let app = App::with_parts(
            config,
            Dataset::from_idioms(vec![Idiom::new(1, "w1", 1, "d1"), Idiom::new(2, "w2", 1, "d2")]).unwrap(),
            ProgressStore::in_memory().unwrap(),
        )
        .unwrap();
        assert_eq!(app.page_size(), 1);
        assert_eq!(app.day_total(), 2);
    }

    #[test]
    fn test_toggle_mastered_from_study() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('m')));
        assert!(app.study.as_ref().unwrap().mastered);
        assert_eq!(app.progress().get_by_id(1).unwrap().status, Status::Mastered);

        app.handle_key(key(KeyCode::Char('q')));
        assert_eq!(app.view, View::Home);
        assert_eq!(app.summary.mastered, 1);
    }

    #[test]
    fn test_quiz_answer_is_persisted_once() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('2')));
        assert_eq!(app.view, View::Quiz);

        let question = app.quiz.as_ref().unwrap().session.current().unwrap().clone();
        let wrong = (question.correct_index().unwrap() + 1) % question.options.len();
        app.handle_key(key(KeyCode::Char(char::from(b'1' + wrong as u8))));
        app.handle_key(key(KeyCode::Char('1')));

        let p = app.progress().get_by_id(question.idiom.id).unwrap();
        assert_eq!(p.quiz_wrong_count, 1);
        assert_eq!(p.quiz_correct_count, 0);
        assert_eq!(p.last_selected_option_idx, Some(wrong));
    }

    #[test]
    fn test_missed_flow() {
        let mut app = app();
        app.progress().record_quiz_result(12, false, 0).unwrap();
        app.progress().record_quiz_result(5, false, 0).unwrap();
        app.progress().record_quiz_result(5, false, 2).unwrap();

        app.handle_key(key(KeyCode::Char('w')));
        assert_eq!(app.view, View::Missed);
        let ids: Vec<_> = app.missed.iter().map(|(i, _)| i.id).collect();
        assert_eq!(ids, vec![5, 12]);

        app.handle_key(key(KeyCode::Char('1')));
        assert_eq!(app.view, View::Quiz);
        let quiz = app.quiz.as_ref().unwrap();
        assert_eq!(quiz.session.len(), 2);
        // Earlier wrong answers show as already answered.
        assert!(matches!(quiz.session.states()[0], AnswerState::Answered { correct: false, .. }));

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.view, View::Missed);
    }

    #[test]
    fn test_missed_idiom_leaves_after_correct_retry() {
        let mut app = app();
        app.progress().record_quiz_result(5, false, 0).unwrap();

        app.handle_key(key(KeyCode::Char('w')));
        app.handle_key(key(KeyCode::Char('1')));
        let question = app.quiz.as_ref().unwrap().session.current().unwrap().clone();
        let correct = question.correct_index().unwrap();
        let correct_key = key(KeyCode::Char(char::from(b'1' + correct as u8)));

        // Restored answers ignore option keys until hidden.
        app.handle_key(correct_key);
        assert_eq!(app.progress().get_by_id(5).unwrap().last_quiz_result, Some(false));

        app.handle_key(key(KeyCode::Char('r')));
        app.handle_key(correct_key);
        let p = app.progress().get_by_id(5).unwrap();
        assert_eq!(p.last_quiz_result, Some(true));
        assert_eq!(p.quiz_correct_count, 1);
        assert_eq!(p.quiz_wrong_count, 1);

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.view, View::Missed);
        assert!(app.missed.is_empty());
        assert_eq!(app.summary.missed, 0);
    }

    #[test]
    fn test_jump_to_next_unanswered_question() {
        let mut app = app();
        app.progress().record_quiz_result(2, true, 0).unwrap();
        app.handle_key(key(KeyCode::Char('1')));
        assert_eq!(app.quiz.as_ref().unwrap().session.position(), 0);

        // Question two was answered in an earlier session.
        app.handle_key(key(KeyCode::Char('u')));
        assert_eq!(app.quiz.as_ref().unwrap().session.position(), 2);
    }

    #[test]
    fn test_empty_missed_quiz_shows_message() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('w')));
        app.handle_key(key(KeyCode::Char('2')));
        assert_eq!(app.view, View::Missed);
        assert!(app.message.is_some());
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_progress_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data.db_path = Some(dir.path().join("progress.db"));

        let mut app = App::new(config.clone()).unwrap();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('m')));
        let first = app.study.as_ref().unwrap().current_idiom().unwrap().id;
        app.shutdown().unwrap();

        let app = App::new(config).unwrap();
        assert_eq!(app.summary.mastered, 1);
        assert_eq!(app.progress().get_by_id(first).unwrap().status, Status::Mastered);
    }
}
