//! Multiple-choice quiz generation and per-session answer state.

use crate::dataset::Dataset;
use crate::models::{Idiom, IdiomId, Progress};
use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Wrong options drawn per generated question.
const DISTRACTORS: usize = 3;

/// Quiz direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    /// Show the idiom, pick its definition.
    #[default]
    IdiomToDefinition,
    /// Show the definition, pick the idiom.
    DefinitionToIdiom,
}

impl QuizMode {
    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::IdiomToDefinition => "Idiom -> Definition",
            Self::DefinitionToIdiom => "Definition -> Idiom",
        }
    }
}

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizOption {
    /// A definition, correct when it equals the target's definition.
    Definition(String),
    /// An idiom, correct when its id is the target's id.
    Idiom { id: IdiomId, word: String },
}

impl QuizOption {
    fn for_idiom(idiom: &Idiom) -> Self {
        Self::Idiom {
            id: idiom.id,
            word: idiom.word.clone(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Definition(text) => text,
            Self::Idiom { word, .. } => word,
        }
    }

    pub fn is_correct_for(&self, target: &Idiom) -> bool {
        match self {
            Self::Definition(text) => *text == target.definition,
            Self::Idiom { id, .. } => *id == target.id,
        }
    }
}

/// A target idiom and its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub idiom: Idiom,
    pub mode: QuizMode,
    pub options: Vec<QuizOption>,
}

impl Question {
    /// Text shown above the options.
    pub fn prompt(&self) -> &str {
        match self.mode {
            QuizMode::IdiomToDefinition => &self.idiom.word,
            QuizMode::DefinitionToIdiom => &self.idiom.definition,
        }
    }

    /// Whether option `idx` is correct. Out-of-range indices are not.
    pub fn is_correct(&self, idx: usize) -> bool {
        self.options
            .get(idx)
            .is_some_and(|opt| opt.is_correct_for(&self.idiom))
    }

    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|opt| opt.is_correct_for(&self.idiom))
    }
}

/// Builds questions from a dataset with a pluggable random source.
pub struct QuizGenerator<'a, R = ThreadRng> {
    dataset: &'a Dataset,
    rng: R,
}

impl<'a> QuizGenerator<'a, ThreadRng> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self::with_rng(dataset, rand::thread_rng())
    }
}

impl<'a, R: Rng> QuizGenerator<'a, R> {
    pub fn with_rng(dataset: &'a Dataset, rng: R) -> Self {
        Self { dataset, rng }
    }

    /// One question per target, in target order.
    pub fn generate(&mut self, targets: &[Idiom], mode: QuizMode) -> Vec<Question> {
        let questions: Vec<Question> = targets.iter().map(|t| self.question(t, mode)).collect();
        tracing::debug!(count = questions.len(), ?mode, "generated quiz");
        questions
    }

    pub fn question(&mut self, target: &Idiom, mode: QuizMode) -> Question {
        let options = match mode {
            QuizMode::IdiomToDefinition => match target.precomputed_options() {
                Some(precomputed) => precomputed
                    .iter()
                    .cloned()
                    .map(QuizOption::Definition)
                    .collect(),
                None => self.definition_options(target),
            },
            QuizMode::DefinitionToIdiom => self.idiom_options(target),
        };
        Question {
            idiom: target.clone(),
            mode,
            options,
        }
    }

    fn definition_options(&mut self, target: &Idiom) -> Vec<QuizOption> {
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(target.definition.as_str());
        let pool: Vec<&str> = self
            .dataset
            .iter()
            .filter(|idiom| idiom.id != target.id)
            .map(|idiom| idiom.definition.as_str())
            .filter(|def| seen.insert(*def))
            .collect();

        let mut options: Vec<QuizOption> = pool
            .choose_multiple(&mut self.rng, DISTRACTORS)
            .map(|def| QuizOption::Definition((*def).to_string()))
            .collect();
        options.push(QuizOption::Definition(target.definition.clone()));
        options.shuffle(&mut self.rng);
        options
    }

    fn idiom_options(&mut self, target: &Idiom) -> Vec<QuizOption> {
        let others: Vec<&Idiom> = self
            .dataset
            .iter()
            .filter(|idiom| idiom.id != target.id)
            .collect();

        let mut options: Vec<QuizOption> = others
            .choose_multiple(&mut self.rng, DISTRACTORS)
            .map(|idiom| QuizOption::for_idiom(idiom))
            .collect();
        options.push(QuizOption::for_idiom(target));
        options.shuffle(&mut self.rng);
        options
    }
}

/// Answer state of one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerState {
    #[default]
    Unanswered,
    Answered { selected: usize, correct: bool },
}

impl AnswerState {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered { .. })
    }
}

/// A loaded quiz: questions, a cursor and one answer state per question.
#[derive(Debug, Clone)]
pub struct QuizSession {
    mode: QuizMode,
    questions: Vec<Question>,
    states: Vec<AnswerState>,
    current: usize,
}

impl QuizSession {
    pub fn new(mode: QuizMode, questions: Vec<Question>) -> Self {
        let states = vec![AnswerState::Unanswered; questions.len()];
        Self {
            mode,
            questions,
            states,
            current: 0,
        }
    }

    /// Start with prior answers taken from stored progress, so questions
    /// answered in an earlier session show as answered.
    pub fn restore(
        mode: QuizMode,
        questions: Vec<Question>,
        progress: &HashMap<IdiomId, Progress>,
    ) -> Self {
        let mut session = Self::new(mode, questions);
        for (question, state) in session.questions.iter().zip(session.states.iter_mut()) {
            let Some(p) = progress.get(&question.idiom.id) else {
                continue;
            };
            if let (Some(correct), Some(selected)) = (p.last_quiz_result, p.last_selected_option_idx) {
                *state = AnswerState::Answered { selected, correct };
            }
        }
        session
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn position(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn current_state(&self) -> AnswerState {
        self.states.get(self.current).copied().unwrap_or_default()
    }

    pub fn states(&self) -> &[AnswerState] {
        &self.states
    }

    /// Answer the current question. Fires once per question; returns
    /// `Some(correct)` on the transition and `None` when already answered
    /// or `idx` is not an option.
    pub fn answer(&mut self, idx: usize) -> Option<bool> {
        let question = self.questions.get(self.current)?;
        let state = &mut self.states[self.current];
        if state.is_answered() || idx >= question.options.len() {
            return None;
        }
        let correct = question.is_correct(idx);
        *state = AnswerState::Answered {
            selected: idx,
            correct,
        };
        Some(correct)
    }

    /// Hide the current answer so the question can be attempted again.
    /// Returns `false` when it was not answered.
    pub fn retry(&mut self) -> bool {
        match self.states.get_mut(self.current) {
            Some(state) if state.is_answered() => {
                *state = AnswerState::Unanswered;
                true
            }
            _ => false,
        }
    }

    /// First unanswered question after the cursor, wrapping around.
    pub fn next_unanswered(&self) -> Option<usize> {
        let len = self.states.len();
        (1..len)
            .map(|offset| (self.current + offset) % len)
            .find(|&idx| !self.states[idx].is_answered())
    }

    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn jump(&mut self, idx: usize) {
        if idx < self.questions.len() {
            self.current = idx;
        }
    }

    pub fn answered_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_answered()).count()
    }

    pub fn correct_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| matches!(s, AnswerState::Answered { correct: true, .. }))
            .count()
    }
}
