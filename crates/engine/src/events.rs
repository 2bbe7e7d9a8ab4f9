//! Queue intake.
//!
//! Inbound messages arrive on an `mpsc` channel (fed by the HTTP event
//! ingress or any other producer). Every message is handled on its own
//! detached task so the intake loop goes straight back to the channel.
//! Failures are logged and dropped: there is no retry, no dead letter and no
//! deduplication.

use std::{fmt, str::FromStr, sync::Arc};

use tokio::sync::mpsc;

use crate::{BudgetUpdate, Engine, EngineError, NewTransaction, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topic {
    /// Payload: [`NewTransaction`].
    CreateTransaction,
    /// Payload: [`BudgetUpdate`].
    UpdateBudget,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::CreateTransaction, Topic::UpdateBudget];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::CreateTransaction => "transaction.create",
            Topic::UpdateBudget => "budget.update",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| EngineError::InvalidRequest(format!("unknown topic '{s}'")))
    }
}

/// A raw message as read from the queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// A decoded message, ready to be applied.
#[derive(Clone, Debug)]
pub enum Command {
    CreateTransaction(NewTransaction),
    UpdateBudget(BudgetUpdate),
}

impl Command {
    /// Resolves the topic and decodes the payload. Nothing is touched yet.
    pub fn decode(message: &InboundMessage) -> ResultEngine<Self> {
        Ok(match message.topic.parse::<Topic>()? {
            Topic::CreateTransaction => {
                Command::CreateTransaction(serde_json::from_slice(&message.payload)?)
            }
            Topic::UpdateBudget => Command::UpdateBudget(serde_json::from_slice(&message.payload)?),
        })
    }

    /// Runs the command. Returns the id of the touched record.
    pub async fn apply(self, engine: &Engine) -> ResultEngine<String> {
        match self {
            Command::CreateTransaction(new) => engine.create_transaction(new).await,
            Command::UpdateBudget(update) => {
                let id = update.id.clone();
                engine.update_budget(update).await?;
                Ok(id)
            }
        }
    }
}

/// Decodes and applies one message. Returns the id of the touched record.
pub async fn dispatch(engine: &Engine, message: &InboundMessage) -> ResultEngine<String> {
    Command::decode(message)?.apply(engine).await
}

/// Handles one message, logging the outcome. Never fails.
pub async fn handle_message(engine: &Engine, message: InboundMessage) {
    let command = match Command::decode(&message) {
        Ok(command) => command,
        Err(err) => {
            tracing::warn!(topic = %message.topic, "dropping undecodable message: {err}");
            return;
        }
    };
    match command.apply(engine).await {
        Ok(id) => tracing::info!(topic = %message.topic, id = %id, "message handled"),
        Err(err) => tracing::error!(topic = %message.topic, "message handling failed: {err}"),
    }
}

/// Reads messages until every sender is dropped, spawning one detached task
/// per message.
pub async fn run_intake(engine: Arc<Engine>, mut receiver: mpsc::Receiver<InboundMessage>) {
    tracing::info!("event intake started");
    while let Some(message) = receiver.recv().await {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            handle_message(&engine, message).await;
        });
    }
    tracing::info!("event intake stopped");
}
