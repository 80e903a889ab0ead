//! Entity directory and mailbox plumbing.
//!
//! The directory maps ids to live mailbox handles. Resolving an id for the
//! first time spawns a worker task that owns the entity state and drains the
//! id's bounded FIFO mailbox, which is what serializes all commands against
//! one id. Handles are cheap to clone and can be messaged from any task.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Bound on each entity's command mailbox.
const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Errors surfaced when messaging an entity.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryError {
    /// The entity's worker task has stopped and its mailbox is gone.
    #[error("entity mailbox closed")]
    MailboxClosed,

    /// The entity dropped the reply channel without answering.
    #[error("entity dropped the reply channel")]
    ReplyDropped,
}

/// A state machine managed by an [`EntityDirectory`].
///
/// Handlers are synchronous: every command is a state mutation plus a reply
/// send, so the worker task never awaits while holding entity state.
pub trait Entity: Default + Send + 'static {
    /// Identifier type for this entity kind.
    type Id: Copy + Ord + Hash + Display + Send + Sync + 'static;

    /// The command alphabet this entity understands.
    type Command: Send + 'static;

    /// Kind name used in worker spans.
    const KIND: &'static str;

    /// Applies a single command to the entity state.
    fn handle(&mut self, cmd: Self::Command);
}

/// Cheap-to-clone handle to one entity's mailbox.
pub struct EntityRef<E: Entity> {
    id: E::Id,
    sender: mpsc::Sender<E::Command>,
}

impl<E: Entity> Clone for EntityRef<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            sender: self.sender.clone(),
        }
    }
}

impl<E: Entity> EntityRef<E> {
    /// Returns the id this handle points at.
    pub fn id(&self) -> E::Id {
        self.id
    }

    /// Queues a command without waiting for a reply.
    ///
    /// Returns once the command is admitted to the mailbox; commands queued
    /// afterwards through any handle to the same id are handled later.
    pub async fn send(&self, cmd: E::Command) -> Result<(), DirectoryError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| DirectoryError::MailboxClosed)
    }

    /// Sends a command carrying a fresh reply channel and awaits the answer.
    ///
    /// `make_cmd` receives the reply sender to embed in the command, which is
    /// what pairs the eventual answer with this call.
    pub async fn ask<R>(
        &self,
        make_cmd: impl FnOnce(oneshot::Sender<R>) -> E::Command,
    ) -> Result<R, DirectoryError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(make_cmd(reply))
            .await
            .map_err(|_| DirectoryError::MailboxClosed)?;
        response.await.map_err(|_| DirectoryError::ReplyDropped)
    }
}

/// Resolves entity ids to live mailbox handles, creating workers lazily.
pub struct EntityDirectory<E: Entity> {
    entities: Arc<RwLock<HashMap<E::Id, EntityRef<E>>>>,
    mailbox_capacity: usize,
}

impl<E: Entity> Clone for EntityDirectory<E> {
    fn clone(&self) -> Self {
        Self {
            entities: Arc::clone(&self.entities),
            mailbox_capacity: self.mailbox_capacity,
        }
    }
}

impl<E: Entity> Default for EntityDirectory<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityDirectory<E> {
    /// Creates a directory with the default mailbox capacity.
    pub fn new() -> Self {
        Self::with_mailbox_capacity(DEFAULT_MAILBOX_CAPACITY)
    }

    /// Creates a directory whose mailboxes hold up to `capacity` commands.
    pub fn with_mailbox_capacity(capacity: usize) -> Self {
        Self {
            entities: Arc::new(RwLock::new(HashMap::new())),
            mailbox_capacity: capacity.max(1),
        }
    }

    /// Returns the handle for `id`, spawning its worker on first reference.
    ///
    /// Must be called from within a tokio runtime.
    pub fn resolve(&self, id: E::Id) -> EntityRef<E> {
        if let Some(handle) = self.entities.read().unwrap().get(&id) {
            return handle.clone();
        }

        let mut entities = self.entities.write().unwrap();
        // Racing resolvers settle here: only the first inserts and spawns.
        if let Some(handle) = entities.get(&id) {
            return handle.clone();
        }

        let (sender, mailbox) = mpsc::channel(self.mailbox_capacity);
        let handle = EntityRef { id, sender };
        entities.insert(id, handle.clone());
        tokio::spawn(run_entity::<E>(id, mailbox));
        handle
    }

    /// Lists every id resolved so far, in ascending order.
    pub fn known_ids(&self) -> Vec<E::Id> {
        let mut ids: Vec<E::Id> = self.entities.read().unwrap().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of live entities.
    pub fn len(&self) -> usize {
        self.entities.read().unwrap().len()
    }

    /// Returns true if no entity has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.entities.read().unwrap().is_empty()
    }
}

/// Drains one entity's mailbox until every handle to it is dropped.
#[tracing::instrument(skip_all, fields(kind = E::KIND, %id))]
async fn run_entity<E: Entity>(id: E::Id, mut mailbox: mpsc::Receiver<E::Command>) {
    let mut entity = E::default();
    tracing::debug!("entity started");
    while let Some(cmd) = mailbox.recv().await {
        entity.handle(cmd);
    }
    tracing::debug!("entity stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::join_all;

    #[derive(Default)]
    struct Counter {
        value: u64,
    }

    enum CounterCommand {
        Add {
            amount: u64,
            reply: oneshot::Sender<u64>,
        },
        Get {
            reply: oneshot::Sender<u64>,
        },
    }

    impl Entity for Counter {
        type Id = i64;
        type Command = CounterCommand;
        const KIND: &'static str = "counter";

        fn handle(&mut self, cmd: CounterCommand) {
            match cmd {
                CounterCommand::Add { amount, reply } => {
                    self.value += amount;
                    let _ = reply.send(self.value);
                }
                CounterCommand::Get { reply } => {
                    let _ = reply.send(self.value);
                }
            }
        }
    }

    #[tokio::test]
    async fn resolve_creates_entity_lazily() {
        let directory: EntityDirectory<Counter> = EntityDirectory::new();
        assert!(directory.is_empty());

        let handle = directory.resolve(1);
        assert_eq!(directory.len(), 1);

        let value = handle.ask(|reply| CounterCommand::Get { reply }).await.unwrap();
        assert_eq!(value, 0);
    }

    #[tokio::test]
    async fn resolve_returns_same_entity_for_same_id() {
        let directory: EntityDirectory<Counter> = EntityDirectory::new();

        let first = directory.resolve(7);
        first
            .ask(|reply| CounterCommand::Add { amount: 5, reply })
            .await
            .unwrap();

        let second = directory.resolve(7);
        let value = second.ask(|reply| CounterCommand::Get { reply }).await.unwrap();
        assert_eq!(value, 5);
        assert_eq!(directory.len(), 1);
    }

    #[tokio::test]
    async fn distinct_ids_are_independent() {
        let directory: EntityDirectory<Counter> = EntityDirectory::new();

        directory
            .resolve(1)
            .ask(|reply| CounterCommand::Add { amount: 3, reply })
            .await
            .unwrap();

        let other = directory
            .resolve(2)
            .ask(|reply| CounterCommand::Get { reply })
            .await
            .unwrap();
        assert_eq!(other, 0);
        assert_eq!(directory.known_ids(), vec![1, 2]);
    }

    #[tokio::test]
    async fn same_id_commands_are_serialized() {
        let directory: EntityDirectory<Counter> = EntityDirectory::new();

        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let handle = directory.resolve(42);
                tokio::spawn(async move {
                    handle
                        .ask(|reply| CounterCommand::Add { amount: 1, reply })
                        .await
                        .unwrap()
                })
            })
            .collect();
        join_all(tasks).await;

        let value = directory
            .resolve(42)
            .ask(|reply| CounterCommand::Get { reply })
            .await
            .unwrap();
        assert_eq!(value, 100);
    }

    #[tokio::test]
    async fn send_is_handled_before_later_ask() {
        let directory: EntityDirectory<Counter> = EntityDirectory::new();
        let handle = directory.resolve(9);

        let (reply, _ignored) = oneshot::channel();
        handle
            .send(CounterCommand::Add { amount: 2, reply })
            .await
            .unwrap();

        // The mailbox is FIFO, so the queued add lands before this read.
        let value = handle.ask(|reply| CounterCommand::Get { reply }).await.unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn known_ids_are_sorted() {
        let directory: EntityDirectory<Counter> = EntityDirectory::new();
        for id in [30, 10, 20] {
            directory.resolve(id);
        }
        assert_eq!(directory.known_ids(), vec![10, 20, 30]);
    }
}
