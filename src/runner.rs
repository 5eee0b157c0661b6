//! Runs the root agent inside a session and streams events.

use crate::agent::{Agent, AgentEvent, ToolContext};
use crate::error::{BirdingError, Result};
use crate::session::InMemorySessionService;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Something that happened during an invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: String,
    pub invocation_id: String,
    /// `user` or the name of the agent that produced the event.
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    UserMessage(String),
    ToolCall { name: String, arguments: String },
    ToolResult { name: String, result: String },
    PartialText(String),
    FinalText(String),
}

impl Event {
    pub fn new(invocation_id: &str, author: &str, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            invocation_id: invocation_id.to_string(),
            author: author.to_string(),
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Text of a final-output fragment, if this is one.
    pub fn final_text(&self) -> Option<&str> {
        match &self.kind {
            EventKind::FinalText(text) => Some(text),
            _ => None,
        }
    }

    fn from_agent(invocation_id: &str, event: AgentEvent) -> Self {
        match event {
            AgentEvent::ToolCall {
                author,
                name,
                arguments,
            } => Self::new(invocation_id, &author, EventKind::ToolCall { name, arguments }),
            AgentEvent::ToolResult {
                author,
                name,
                result,
            } => Self::new(invocation_id, &author, EventKind::ToolResult { name, result }),
            AgentEvent::PartialText { author, text } => {
                Self::new(invocation_id, &author, EventKind::PartialText(text))
            }
            AgentEvent::FinalText { author, text } => {
                Self::new(invocation_id, &author, EventKind::FinalText(text))
            }
        }
    }
}

/// Stream of events for one invocation.
///
/// Dropping the stream cancels the invocation.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Result<Event>>,
    task: JoinHandle<()>,
}

impl Stream for EventStream {
    type Item = Result<Event>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Binds the root agent to a session store.
pub struct Runner {
    app_name: String,
    agent: Arc<Agent>,
    sessions: Arc<InMemorySessionService>,
}

impl Runner {
    pub fn new(app_name: &str, agent: Arc<Agent>, sessions: Arc<InMemorySessionService>) -> Self {
        Self {
            app_name: app_name.to_string(),
            agent,
            sessions,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Submit one user message to the root agent within an existing session.
    pub fn run(&self, user_id: &str, session_id: &str, message: &str) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let agent = self.agent.clone();
        let sessions = self.sessions.clone();
        let app_name = self.app_name.clone();
        let user_id = user_id.to_string();
        let session_id = session_id.to_string();
        let message = message.to_string();

        let task = tokio::spawn(async move {
            if sessions
                .get_session(&app_name, &user_id, &session_id)
                .await
                .is_none()
            {
                let _ = tx.send(Err(BirdingError::Session(format!(
                    "Session not found: {}",
                    session_id
                ))));
                return;
            }

            let invocation_id = format!("e-{}", Uuid::new_v4());
            debug!("Invocation {} in session {}", invocation_id, session_id);

            let user_event = Event::new(
                &invocation_id,
                "user",
                EventKind::UserMessage(message.clone()),
            );
            if let Err(e) = forward(&sessions, &session_id, &tx, user_event).await {
                let _ = tx.send(Err(e));
                return;
            }

            let (agent_tx, mut agent_rx) = mpsc::unbounded_channel();
            let ctx = ToolContext::new(session_id.clone(), invocation_id.clone());

            let outcome = {
                let run = agent.run_with_events(&message, &ctx, Some(&agent_tx));
                tokio::pin!(run);

                loop {
                    tokio::select! {
                        Some(agent_event) = agent_rx.recv() => {
                            let event = Event::from_agent(&invocation_id, agent_event);
                            if let Err(e) = forward(&sessions, &session_id, &tx, event).await {
                                break Err(e);
                            }
                        }
                        result = &mut run => break result.map(|_| ()),
                    }
                }
            };

            // Flush whatever the agent emitted right before finishing.
            drop(agent_tx);
            while let Ok(agent_event) = agent_rx.try_recv() {
                let event = Event::from_agent(&invocation_id, agent_event);
                if let Err(e) = forward(&sessions, &session_id, &tx, event).await {
                    warn!("Dropping event: {}", e);
                }
            }

            if let Err(e) = outcome {
                let _ = tx.send(Err(e));
            }
        });

        EventStream { rx, task }
    }
}

async fn forward(
    sessions: &InMemorySessionService,
    session_id: &str,
    tx: &mpsc::UnboundedSender<Result<Event>>,
    event: Event,
) -> Result<()> {
    sessions.append_event(session_id, event.clone()).await?;
    let _ = tx.send(Ok(event));
    Ok(())
}
