// src/exam/mod.rs

//! The assessment-taking core: gate, loader, session state machine,
//! scorer and result persister.

pub mod error;
pub mod gate;
pub mod loader;
pub mod persister;
pub mod scorer;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use crate::{
    models::{score::PassRatio, test_reference::TestReference},
    repository::{AuthorizationRegistry, HistoryRepository, QuestionRepository},
};

use self::{
    gate::SessionGate, loader::QuestionBankLoader, persister::ResultPersister, scorer::Scorer,
    session::ExamSession,
};

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct ExamEngine {
    pub gate: SessionGate,
    pub loader: QuestionBankLoader,
    pub persister: ResultPersister,
    pub scorer: Scorer,
}

impl ExamEngine {
    /// Wires the three stores into the core. `deadline` bounds every store call.
    pub fn new(
        registry: Arc<dyn AuthorizationRegistry>,
        questions: Arc<dyn QuestionRepository>,
        history: Arc<dyn HistoryRepository>,
        pass_ratio: PassRatio,
        deadline: Option<Duration>,
    ) -> Self {
        Self {
            gate: SessionGate::new(registry, deadline),
            loader: QuestionBankLoader::new(questions, deadline),
            persister: ResultPersister::new(history, deadline),
            scorer: Scorer::new(pass_ratio),
        }
    }

    /// Opens a fresh, not yet started session for `reference`.
    pub fn open_session(self: &Arc<Self>, reference: TestReference) -> ExamSession {
        ExamSession::new(Arc::clone(self), reference)
    }
}
