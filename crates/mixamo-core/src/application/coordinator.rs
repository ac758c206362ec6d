use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{oneshot, RwLock};

use crate::application::command::SessionCommand;
use crate::application::eventbus::SharedEventBus;
use crate::application::service::{
    plan_tasks, RunControl, SessionActor, SessionHandle, SharedTaskQueue, TaskQueue,
};
use crate::domain::event::DomainEvent;
use crate::domain::model::{
    Animation, Character, Credentials, DownloadTask, SelectionMode, SessionInfo, SessionState,
};
use crate::infrastructure::browser::BrowserDriver;
use crate::infrastructure::config::{AppConfig, UserSettings};

/// Builds the browser driver for a new session.
pub type DriverFactory = Arc<dyn Fn() -> Arc<dyn BrowserDriver> + Send + Sync>;

/// Coordinator owns the single session, the task queue and the run control,
/// and is the only entry point the shell talks to.
pub struct Coordinator {
    session: RwLock<Option<SessionHandle>>,
    queue: SharedTaskQueue,
    control: RunControl,
    characters: RwLock<Vec<Character>>,
    animations: RwLock<HashMap<String, Vec<Animation>>>,
    event_bus: SharedEventBus,
    config: AppConfig,
    driver_factory: DriverFactory,
}

impl Coordinator {
    pub fn new(
        event_bus: SharedEventBus,
        config: AppConfig,
        driver_factory: DriverFactory,
    ) -> Self {
        Self {
            session: RwLock::new(None),
            queue: TaskQueue::shared(),
            control: RunControl::new(),
            characters: RwLock::new(Vec::new()),
            animations: RwLock::new(HashMap::new()),
            event_bus,
            config,
            driver_factory,
        }
    }

    /// Launch the browser and begin signing in. Progress arrives as events.
    pub async fn start_session(
        &self,
        credentials: Option<Credentials>,
    ) -> anyhow::Result<SessionInfo> {
        let mut session = self.session.write().await;
        if let Some(handle) = session.as_ref() {
            if handle.state() != SessionState::Stopped {
                anyhow::bail!("A session is already running");
            }
        }

        let handle = SessionActor::spawn(
            (self.driver_factory)(),
            self.config.clone(),
            self.queue.clone(),
            self.control.clone(),
            self.event_bus.clone(),
        )?;
        handle
            .cmd_tx
            .send(SessionCommand::Start { credentials })
            .await
            .map_err(|_| anyhow::anyhow!("Failed to send start command"))?;

        let info = handle.info();
        tracing::info!("Created session {}", info.id);
        *session = Some(handle);
        Ok(info)
    }

    /// Stop the session. A run in progress stops after its current task.
    pub async fn stop_session(&self) -> anyhow::Result<()> {
        let handle = self.session.write().await.take();

        if let Some(handle) = handle {
            self.control.cancel();
            let _ = handle.cmd_tx.send(SessionCommand::Stop).await;
            tracing::info!("Stopped session {}", handle.id);
        }

        Ok(())
    }

    pub async fn session_info(&self) -> Option<SessionInfo> {
        self.session.read().await.as_ref().map(|h| h.info())
    }

    /// Scrape the character listing.
    pub async fn list_characters(&self) -> anyhow::Result<Vec<Character>> {
        let (reply, rx) = oneshot::channel();
        self.send_when_ready(SessionCommand::ListCharacters { reply })
            .await?;
        let characters = rx
            .await
            .map_err(|_| anyhow::anyhow!("Session closed"))??;

        *self.characters.write().await = characters.clone();
        Ok(characters)
    }

    /// Scrape the animations available for a character.
    pub async fn list_animations(&self, character_id: &str) -> anyhow::Result<Vec<Animation>> {
        let character = self.character(character_id).await?;

        let (reply, rx) = oneshot::channel();
        self.send_when_ready(SessionCommand::ListAnimations { character, reply })
            .await?;
        let animations = rx
            .await
            .map_err(|_| anyhow::anyhow!("Session closed"))??;

        self.animations
            .write()
            .await
            .insert(character_id.to_string(), animations.clone());
        Ok(animations)
    }

    /// Plan tasks for a selection and append them to the queue.
    pub async fn queue_downloads(
        &self,
        character_id: &str,
        selection: SelectionMode,
        include_model: bool,
        settings: &UserSettings,
    ) -> anyhow::Result<usize> {
        self.ensure_not_downloading().await?;
        let character = self.character(character_id).await?;

        let animations = match selection {
            SelectionMode::CharacterModel => Vec::new(),
            _ => self
                .animations
                .read()
                .await
                .get(character_id)
                .cloned()
                .ok_or_else(|| {
                    anyhow::anyhow!("Load the animations of {} first", character.name)
                })?,
        };

        let tasks = plan_tasks(&character, &animations, &selection, include_model, settings)?;
        if tasks.is_empty() {
            anyhow::bail!("No animations match the selection");
        }

        let count = self.queue.write().await.push_all(tasks);
        tracing::info!("Queued {} tasks for {}", count, character.name);
        self.event_bus.publish(DomainEvent::TasksQueued { count });
        Ok(count)
    }

    pub async fn tasks(&self) -> Vec<DownloadTask> {
        self.queue.read().await.snapshot()
    }

    pub async fn clear_tasks(&self) -> anyhow::Result<usize> {
        self.ensure_not_downloading().await?;
        Ok(self.queue.write().await.clear())
    }

    pub async fn requeue_failed(&self) -> anyhow::Result<usize> {
        self.ensure_not_downloading().await?;
        Ok(self.queue.write().await.requeue_failed())
    }

    /// Start a run over the pending tasks. Returns once the run is handed to
    /// the session; progress arrives as events.
    pub async fn start_download(&self, settings: UserSettings) -> anyhow::Result<usize> {
        settings.validate()?;

        let pending = self.queue.read().await.pending_count();
        if pending == 0 {
            anyhow::bail!("Nothing to download");
        }

        let session = self.session.read().await;
        let handle = ready_handle(session.as_ref())?;

        // A paused or cancelled signal belongs to the previous run
        self.control.reset();
        handle
            .cmd_tx
            .send(SessionCommand::Download {
                settings,
                reply: None,
            })
            .await
            .map_err(|_| anyhow::anyhow!("Failed to send download command"))?;
        Ok(pending)
    }

    /// Takes effect before the next task. Returns false when no run is in progress.
    pub async fn pause_download(&self) -> bool {
        self.is_downloading().await && self.control.pause()
    }

    pub fn resume_download(&self) -> bool {
        self.control.resume()
    }

    pub fn cancel_download(&self) {
        self.control.cancel();
    }

    async fn character(&self, character_id: &str) -> anyhow::Result<Character> {
        self.characters
            .read()
            .await
            .iter()
            .find(|c| c.id == character_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Character not found: {}", character_id))
    }

    async fn send_when_ready(&self, cmd: SessionCommand) -> anyhow::Result<()> {
        let name = cmd.name();
        let session = self.session.read().await;
        ready_handle(session.as_ref())?
            .cmd_tx
            .send(cmd)
            .await
            .map_err(|_| anyhow::anyhow!("Failed to send {} command", name))?;
        Ok(())
    }

    async fn is_downloading(&self) -> bool {
        self.session
            .read()
            .await
            .as_ref()
            .is_some_and(|h| h.state() == SessionState::Downloading)
    }

    async fn ensure_not_downloading(&self) -> anyhow::Result<()> {
        if self.is_downloading().await {
            anyhow::bail!("A download is in progress");
        }
        Ok(())
    }
}

/// The session, if it can take a new command right now.
fn ready_handle(session: Option<&SessionHandle>) -> anyhow::Result<&SessionHandle> {
    let handle = session.ok_or_else(|| anyhow::anyhow!("No session; start one first"))?;
    match handle.state() {
        SessionState::Ready => Ok(handle),
        SessionState::Downloading => anyhow::bail!("A download is in progress"),
        state => anyhow::bail!("Session is not ready ({:?})", state),
    }
}
