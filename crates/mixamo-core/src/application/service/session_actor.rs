use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use ulid::Ulid;

use super::orchestrator::{DownloadOrchestrator, RunContext, RunPolicy};
use super::run_control::RunControl;
use super::task_queue::SharedTaskQueue;
use crate::application::command::SessionCommand;
use crate::application::eventbus::SharedEventBus;
use crate::domain::error::{DomainError, DownloadError, DownloadResult};
use crate::domain::event::DomainEvent;
use crate::domain::model::{
    Animation, Character, Credentials, DownloadMethod, RunSummary, SessionInfo, SessionState,
};
use crate::infrastructure::browser::{BrowserDriver, DownloadWatcher};
use crate::infrastructure::config::{AppConfig, UserSettings};
use crate::infrastructure::fetch::{ApiFetcher, BrowserFetcher, SharedFetcher};
use crate::infrastructure::scrape::PageScraper;

/// Handle to communicate with a SessionActor
pub struct SessionHandle {
    pub id: String,
    pub cmd_tx: mpsc::Sender<SessionCommand>,
    state_rx: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            state: self.state(),
        }
    }

    /// Receiver that follows the actor's state transitions.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }
}

/// SessionActor owns the browser and serializes everything done with it:
/// sign-in, catalog scraping and download runs.
pub struct SessionActor {
    id: String,
    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    event_bus: SharedEventBus,
    driver: Arc<dyn BrowserDriver>,
    config: AppConfig,
    scraper: PageScraper,
    queue: SharedTaskQueue,
    control: RunControl,
}

impl SessionActor {
    /// Create a new session and return a handle
    pub fn spawn(
        driver: Arc<dyn BrowserDriver>,
        config: AppConfig,
        queue: SharedTaskQueue,
        control: RunControl,
        event_bus: SharedEventBus,
    ) -> Result<SessionHandle, DomainError> {
        let scraper = PageScraper::from_config(&config.selectors)?;
        let id = Ulid::new().to_string();
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);

        let actor = Self {
            id: id.clone(),
            state: SessionState::Idle,
            state_tx,
            cmd_rx,
            event_bus,
            driver,
            config,
            scraper,
            queue,
            control,
        };
        tokio::spawn(actor.run());

        Ok(SessionHandle {
            id,
            cmd_tx,
            state_rx,
        })
    }

    /// Main run loop
    pub async fn run(mut self) {
        tracing::info!("Session {} created", self.id);

        // Wait for Start command
        loop {
            match self.cmd_rx.recv().await {
                Some(SessionCommand::Start { credentials }) => {
                    if self.start_session(credentials).await {
                        break;
                    }
                    self.cleanup().await;
                    return;
                }
                Some(SessionCommand::Stop) | None => {
                    self.transition_to(SessionState::Stopped);
                    return;
                }
                Some(cmd) => reject(cmd, "Session not started"),
            }
        }

        // Main command loop
        while let Some(cmd) = self.cmd_rx.recv().await {
            if !self.handle_command(cmd).await {
                break;
            }
        }

        self.cleanup().await;
    }

    /// Launch the browser and sign in. Returns false when the session is over.
    async fn start_session(&mut self, credentials: Option<Credentials>) -> bool {
        self.transition_to(SessionState::Starting);

        if let Err(e) = self.driver.start().await {
            tracing::error!("Failed to start browser: {}", e);
            self.event_bus.publish(DomainEvent::FatalError {
                reason: format!("Could not start the browser: {}", e),
            });
            return false;
        }

        let staging = self.config.browser.effective_staging_dir();
        if let Err(e) = tokio::fs::create_dir_all(&staging).await {
            tracing::warn!("Failed to create staging dir {:?}: {}", staging, e);
        }
        if let Err(e) = self.driver.set_download_dir(&staging).await {
            tracing::warn!("Failed to set download dir: {}", e);
        }

        self.transition_to(SessionState::LoggingIn);

        // Keep listening for Stop while the user signs in by hand
        let result = {
            let login = login(self.driver.as_ref(), &self.config, credentials.as_ref());
            tokio::pin!(login);
            loop {
                tokio::select! {
                    result = &mut login => break Some(result),
                    cmd = self.cmd_rx.recv() => match cmd {
                        Some(SessionCommand::Stop) | None => break None,
                        Some(other) => reject(other, "Session is signing in"),
                    },
                }
            }
        };

        match result {
            Some(Ok(())) => {
                self.transition_to(SessionState::Ready);
                self.event_bus.publish(DomainEvent::LoginSucceeded {
                    session_id: self.id.clone(),
                });
                true
            }
            Some(Err(e)) => {
                tracing::error!("Login failed: {}", e);
                self.event_bus.publish(DomainEvent::LoginFailed {
                    session_id: self.id.clone(),
                    reason: e.to_string(),
                });
                if e.is_fatal() {
                    self.event_bus.publish(DomainEvent::FatalError {
                        reason: e.to_string(),
                    });
                }
                false
            }
            None => {
                tracing::info!("Session {} stopped during sign-in", self.id);
                false
            }
        }
    }

    /// Returns false when the session should end.
    async fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Stop => return false,
            SessionCommand::Start { .. } => {
                tracing::warn!("Session already started");
            }
            SessionCommand::ListCharacters { reply } => {
                let result = self.list_characters().await;
                if let Ok(characters) = &result {
                    self.event_bus.publish(DomainEvent::CharactersLoaded {
                        characters: characters.clone(),
                    });
                }
                return self.reply(reply, result);
            }
            SessionCommand::ListAnimations { character, reply } => {
                let result = self.list_animations(&character).await;
                if let Ok(animations) = &result {
                    self.event_bus.publish(DomainEvent::AnimationsLoaded {
                        character_id: character.id.clone(),
                        animations: animations.clone(),
                    });
                }
                return self.reply(reply, result);
            }
            SessionCommand::Download { settings, reply } => {
                let summary = self.download(settings).await;
                let halted = summary.halted.is_some();
                if let Some(reply) = reply {
                    let _ = reply.send(summary);
                }
                return !halted;
            }
        }
        true
    }

    /// Send a catalog result back; a dead browser ends the session.
    fn reply<T>(
        &self,
        reply: tokio::sync::oneshot::Sender<DownloadResult<T>>,
        result: DownloadResult<T>,
    ) -> bool {
        let fatal = match &result {
            Err(e) if e.is_fatal() => {
                self.event_bus.publish(DomainEvent::FatalError {
                    reason: e.to_string(),
                });
                true
            }
            _ => false,
        };
        let _ = reply.send(result);
        !fatal
    }

    async fn list_characters(&self) -> DownloadResult<Vec<Character>> {
        let characters = self
            .walk_listing(
                &self.config.site.characters_url,
                &self.config.selectors.character_card,
                |scraper, html, url| scraper.characters(html, url),
                |character: &Character| character.id.clone(),
            )
            .await?;
        tracing::info!("Found {} characters", characters.len());
        Ok(characters)
    }

    async fn list_animations(&self, character: &Character) -> DownloadResult<Vec<Animation>> {
        let s = &self.config.selectors;
        let page_load = self.config.timeouts.page_load;

        // Animations are listed for the character in use
        self.driver.navigate(&character.page_url).await?;
        self.driver.wait_visible(&s.select_character, page_load).await?;
        self.driver.click_element(&s.select_character).await?;

        let animations = self
            .walk_listing(
                &self.config.site.animations_url,
                &s.animation_card,
                |scraper, html, url| scraper.animations(html, url),
                |animation: &Animation| animation.id.clone(),
            )
            .await?;
        tracing::info!("Found {} animations for {}", animations.len(), character.name);
        Ok(animations)
    }

    /// Scrape a paginated listing, following the pager up to `listing.max_pages`.
    async fn walk_listing<T>(
        &self,
        start_url: &str,
        card_selector: &str,
        extract: impl Fn(&PageScraper, &str, &str) -> Vec<T>,
        key: impl Fn(&T) -> String,
    ) -> DownloadResult<Vec<T>> {
        let page_load = self.config.timeouts.page_load;
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut url = start_url.to_string();

        for page in 1..=self.config.listing.max_pages.max(1) {
            self.driver.navigate(&url).await?;
            self.driver.wait_visible(card_selector, page_load).await?;

            let html = self.driver.page_html().await?;
            let page_url = self.driver.current_url().await?.unwrap_or_else(|| url.clone());
            for item in extract(&self.scraper, &html, &page_url) {
                if seen.insert(key(&item)) {
                    items.push(item);
                }
            }

            match self.scraper.next_page(&html, &page_url) {
                Some(next) if next != url => {
                    tracing::debug!(page, "Following next page {}", next);
                    url = next;
                }
                _ => break,
            }
        }

        Ok(items)
    }

    async fn download(&mut self, settings: UserSettings) -> RunSummary {
        self.transition_to(SessionState::Downloading);

        let summary = match self.build_fetcher(&settings) {
            Ok(fetcher) => {
                let ctx = RunContext {
                    fetcher,
                    control: self.control.clone(),
                    event_bus: self.event_bus.clone(),
                    policy: RunPolicy::new(&self.config.run, settings.skip_existing),
                };
                DownloadOrchestrator::new(self.queue.clone(), ctx).run().await
            }
            Err(e) => {
                tracing::error!("Cannot start run: {}", e);
                let pending = self.queue.read().await.pending_count();
                let summary = RunSummary {
                    total: pending,
                    remaining: pending,
                    halted: Some(e.to_string()),
                    ..Default::default()
                };
                self.event_bus.publish(DomainEvent::FatalError {
                    reason: e.to_string(),
                });
                self.event_bus.publish(DomainEvent::RunFinished {
                    summary: summary.clone(),
                });
                summary
            }
        };

        if summary.halted.is_none() {
            self.transition_to(SessionState::Ready);
        }
        summary
    }

    fn build_fetcher(&self, settings: &UserSettings) -> DownloadResult<SharedFetcher> {
        let staging = self.config.browser.effective_staging_dir();
        let timeouts = &self.config.timeouts;

        let fetcher: SharedFetcher = match settings.download_method {
            DownloadMethod::Browser => Arc::new(BrowserFetcher::new(
                self.driver.clone(),
                DownloadWatcher::new(staging, timeouts.poll_interval),
                self.config.selectors.clone(),
                timeouts.clone(),
            )),
            DownloadMethod::Api => Arc::new(ApiFetcher::new(
                self.driver.clone(),
                &self.config.api,
                timeouts.download,
                staging,
            )?),
        };
        Ok(fetcher)
    }

    fn transition_to(&mut self, new_state: SessionState) {
        let old_state = self.state;
        if old_state == new_state {
            return;
        }

        tracing::debug!(
            "Session {} state: {:?} -> {:?}",
            self.id,
            old_state,
            new_state
        );

        self.state = new_state;
        self.state_tx.send_replace(new_state);

        self.event_bus.publish(DomainEvent::SessionStateChanged {
            session_id: self.id.clone(),
            old_state,
            new_state,
        });
    }

    async fn cleanup(&mut self) {
        tracing::info!("Session {} cleaning up", self.id);

        if let Err(e) = self.driver.stop().await {
            tracing::warn!("Failed to stop browser: {}", e);
        }

        self.transition_to(SessionState::Stopped);
    }
}

/// Wait until the site shows the signed-in marker, filling the sign-in form
/// first when credentials are given.
async fn login(
    driver: &dyn BrowserDriver,
    config: &AppConfig,
    credentials: Option<&Credentials>,
) -> DownloadResult<()> {
    let s = &config.selectors;
    let timeouts = &config.timeouts;

    // The persistent profile may still hold a valid sign-in
    driver.navigate(&config.site.base_url).await?;
    match driver.wait_visible(&s.logged_in_marker, timeouts.page_load).await {
        Ok(()) => {
            tracing::info!("Already signed in");
            return Ok(());
        }
        Err(e) if e.is_fatal() => return Err(e),
        Err(_) => {}
    }

    driver.navigate(&config.site.login_url).await?;
    match credentials {
        Some(credentials) => {
            tracing::info!("Signing in as {}", credentials.username);
            fill_sign_in_form(driver, config, credentials)
                .await
                .map_err(|e| match e {
                    DownloadError::ElementNotFound { selector } => {
                        DownloadError::AuthenticationFailed(format!(
                            "Sign-in form element {} not found",
                            selector
                        ))
                    }
                    other => other,
                })?;
        }
        None => tracing::info!("Waiting for manual sign-in in the browser window"),
    }

    driver
        .wait_visible(&s.logged_in_marker, timeouts.login)
        .await
        .map_err(|e| match e {
            DownloadError::ElementNotFound { .. } => DownloadError::AuthenticationFailed(format!(
                "Not signed in within {}",
                humantime::format_duration(timeouts.login)
            )),
            other => other,
        })
}

async fn fill_sign_in_form(
    driver: &dyn BrowserDriver,
    config: &AppConfig,
    credentials: &Credentials,
) -> DownloadResult<()> {
    let s = &config.selectors;
    let page_load = config.timeouts.page_load;

    driver.wait_visible(&s.email_field, page_load).await?;
    driver.input_text(&s.email_field, &credentials.username).await?;
    driver.click_element(&s.email_submit).await?;

    driver.wait_visible(&s.password_field, page_load).await?;
    driver.input_text(&s.password_field, &credentials.password).await?;
    driver.click_element(&s.password_submit).await?;
    Ok(())
}

fn reject(cmd: SessionCommand, reason: &str) {
    tracing::warn!("Ignoring {} command: {}", cmd.name(), reason);
    match cmd {
        SessionCommand::ListCharacters { reply } => {
            let _ = reply.send(Err(DownloadError::Browser(reason.to_string())));
        }
        SessionCommand::ListAnimations { reply, .. } => {
            let _ = reply.send(Err(DownloadError::Browser(reason.to_string())));
        }
        _ => {}
    }
}
