// Session module
// A ready-to-query document index together with the clients that answer from it


use std::fmt;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::completion::AnswerClient;
use crate::config::Config;
use crate::embeddings::EmbeddingClient;
use crate::indexer::{Indexer, IngestionReport};
use crate::progress::ProgressReporter;
use crate::search::context::assemble_context;
use crate::search::index::DocumentIndex;
use crate::search::ranking::find_most_relevant_chunks;

/// Reply given when no chunk clears the similarity threshold
pub const NO_RELEVANT_INFORMATION: &str =
    "I couldn't find relevant information to answer your question.";

/// Result of asking a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// The model's reply, grounded in `relevant_chunks` retrieved chunks
    Generated { text: String, relevant_chunks: usize },
    /// Nothing in the index was relevant; the model was not consulted
    NoRelevantContent,
}

impl Answer {
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            Answer::Generated { text, .. } => text,
            Answer::NoRelevantContent => NO_RELEVANT_INFORMATION,
        }
    }
}

impl fmt::Display for Answer {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Question answering over one document index
pub struct QaSession {
    index: DocumentIndex,
    embeddings: EmbeddingClient,
    answers: AnswerClient,
    max_context_length: usize,
    report: Option<IngestionReport>,
}

impl QaSession {
    /// Load the index from cache, or ingest the documents when there is none
    #[inline]
    pub async fn open(
        config: &Config,
        indexer: &Indexer,
        answers: AnswerClient,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let (index, report) = indexer.load_or_build(false, progress, cancel).await?;
        info!(
            "Session ready with {} chunks ({})",
            report.chunk_count, report.origin
        );

        Ok(Self {
            index,
            embeddings: indexer.embeddings().clone(),
            answers,
            max_context_length: config.retrieval.max_context_length,
            report: Some(report),
        })
    }

    /// A session over an index that is already in memory
    #[inline]
    pub fn from_index(
        index: DocumentIndex,
        embeddings: EmbeddingClient,
        answers: AnswerClient,
        max_context_length: usize,
    ) -> Self {
        Self {
            index,
            embeddings,
            answers,
            max_context_length,
            report: None,
        }
    }

    #[inline]
    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// How the index was obtained, when the session opened it itself
    #[inline]
    pub fn report(&self) -> Option<&IngestionReport> {
        self.report.as_ref()
    }

    /// Answer `question` from the indexed documents.
    ///
    /// When no chunk is relevant the fixed [`NO_RELEVANT_INFORMATION`] reply
    /// is returned without calling the completion service.
    #[inline]
    pub async fn ask(&self, question: &str, cancel: &CancellationToken) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            anyhow::bail!("Question is empty");
        }

        let query = self.embeddings.embed_query(question, cancel).await?;
        let relevant = find_most_relevant_chunks(&query, &self.index);

        if relevant.is_empty() {
            debug!("No chunks relevant to the question");
            return Ok(Answer::NoRelevantContent);
        }

        let context = assemble_context(&relevant, self.max_context_length);
        debug!(
            "Answering from {} relevant chunks ({} context chars)",
            relevant.len(),
            context.chars().count()
        );

        let text = self.answers.answer(question, &context, cancel).await?;

        Ok(Answer::Generated {
            text,
            relevant_chunks: relevant.len(),
        })
    }
}

/// Who wrote a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Role::User => write!(f, "You"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

/// Display log of a chat; never sent to the model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.messages.push(Message {
            role,
            text: text.into(),
        });
    }

    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
