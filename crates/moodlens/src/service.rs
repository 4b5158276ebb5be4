//! Periodic capture and fusion loops around a [`MoodlensSession`]
//!
//! Each modality runs as its own tokio task on its own cadence and writes
//! only its own buffer slot. Fusion runs as a separate task, ticking on its
//! interval and whenever a slot changes. Any loop can be stopped while the
//! others keep running.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use moodlens_core::{
    AudioFrame, CaptureSource, Modality, MoodlensError, PixelFrame, Result, TextSample,
};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::session::MoodlensSession;

/// Pending text samples buffered before the debounce loop drops input
const TEXT_CHANNEL_CAPACITY: usize = 64;

/// Background loop kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceTask {
    /// Camera capture and facial analysis
    Facial,
    /// Microphone capture and voice analysis
    Voice,
    /// Debounced text analysis
    Text,
    /// Fusion ticks
    Fusion,
}

impl From<Modality> for ServiceTask {
    fn from(modality: Modality) -> Self {
        match modality {
            Modality::Facial => ServiceTask::Facial,
            Modality::Voice => ServiceTask::Voice,
            Modality::Text => ServiceTask::Text,
        }
    }
}

impl fmt::Display for ServiceTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceTask::Facial => "facial",
            ServiceTask::Voice => "voice",
            ServiceTask::Text => "text",
            ServiceTask::Fusion => "fusion",
        };
        f.write_str(name)
    }
}

struct RunningTask {
    stop: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

/// Scheduler owning the background loops of one session
pub struct MoodlensService {
    session: Arc<MoodlensSession>,
    tasks: Mutex<HashMap<ServiceTask, RunningTask>>,
}

impl MoodlensService {
    /// Service driving `session`
    pub fn new(session: Arc<MoodlensSession>) -> Self {
        Self {
            session,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Session being driven
    pub fn session(&self) -> &Arc<MoodlensSession> {
        &self.session
    }

    /// Whether a loop is running
    pub fn is_running(&self, task: ServiceTask) -> bool {
        self.tasks
            .lock()
            .get(&task)
            .map(|t| !t.handle.is_finished())
            .unwrap_or(false)
    }

    fn spawn_task<F, Fut>(&self, task: ServiceTask, body: F) -> Result<()>
    where
        F: FnOnce(broadcast::Receiver<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock();
        if let Some(running) = tasks.get(&task) {
            if !running.handle.is_finished() {
                return Err(MoodlensError::runtime(format!("{} loop already running", task)));
            }
        }
        let (stop, rx) = broadcast::channel(1);
        let handle = tokio::spawn(body(rx));
        tasks.insert(task, RunningTask { stop, handle });
        drop(tasks);

        info!(session = %self.session.id(), task = %task, "Loop started");
        Ok(())
    }

    /// Start the camera loop, capturing every `scheduler.facial_interval`
    pub fn start_facial<S>(&self, mut source: S) -> Result<()>
    where
        S: CaptureSource<Frame = PixelFrame> + 'static,
    {
        let session = self.session.clone();
        let period = session.config().scheduler.facial_interval();

        self.spawn_task(ServiceTask::Facial, move |mut stop| async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = stop.recv() => break,
                    _ = ticker.tick() => {
                        if let Some(frame) = source.capture().await {
                            session.submit_frame(&frame).await;
                        }
                    }
                }
            }
            debug!(session = %session.id(), "Facial loop exited");
        })
    }

    /// Start the microphone loop, capturing every `scheduler.voice_interval`
    pub fn start_voice<S>(&self, mut source: S) -> Result<()>
    where
        S: CaptureSource<Frame = AudioFrame> + 'static,
    {
        let session = self.session.clone();
        let period = session.config().scheduler.voice_interval();

        self.spawn_task(ServiceTask::Voice, move |mut stop| async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = stop.recv() => break,
                    _ = ticker.tick() => {
                        if let Some(frame) = source.capture().await {
                            session.submit_audio(&frame).await;
                        }
                    }
                }
            }
            debug!(session = %session.id(), "Voice loop exited");
        })
    }

    /// Start the text loop and return the sender for keystroke updates
    ///
    /// Text is analyzed once no new sample has arrived for
    /// `scheduler.text_debounce`; only the latest sample counts. Dropping
    /// every sender flushes the pending sample and ends the loop.
    pub fn start_text(&self) -> Result<mpsc::Sender<TextSample>> {
        let session = self.session.clone();
        let debounce = session.config().scheduler.text_debounce();
        let (tx, mut rx) = mpsc::channel::<TextSample>(TEXT_CHANNEL_CAPACITY);

        self.spawn_task(ServiceTask::Text, move |mut stop| async move {
            let mut pending: Option<TextSample> = None;
            let deadline = tokio::time::sleep(debounce);
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    _ = stop.recv() => break,
                    received = rx.recv() => match received {
                        Some(sample) => {
                            pending = Some(sample);
                            deadline.as_mut().reset(Instant::now() + debounce);
                        }
                        None => {
                            if let Some(sample) = pending.take() {
                                session.submit_text(&sample).await;
                            }
                            break;
                        }
                    },
                    _ = &mut deadline, if pending.is_some() => {
                        if let Some(sample) = pending.take() {
                            session.submit_text(&sample).await;
                        }
                    }
                }
            }
            debug!(session = %session.id(), "Text loop exited");
        })?;
        Ok(tx)
    }

    /// Start the fusion loop
    ///
    /// Ticks every `scheduler.fusion_interval` and right after any slot
    /// update.
    pub fn start_fusion(&self) -> Result<()> {
        let session = self.session.clone();
        let period = session.config().scheduler.fusion_interval();

        self.spawn_task(ServiceTask::Fusion, move |mut stop| async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = stop.recv() => break,
                    _ = ticker.tick() => {}
                    _ = session.buffers().updated() => {}
                }
                session.tick(Utc::now()).await;
            }
            debug!(session = %session.id(), "Fusion loop exited");
        })
    }

    /// Stop one loop and wait for it to exit
    ///
    /// Stopping a modality loop also clears that modality's slot and
    /// analyzer state. Stopping a loop that is not running is a no-op.
    pub async fn stop(&self, task: ServiceTask) -> Result<()> {
        let Some(running) = self.tasks.lock().remove(&task) else {
            debug!(task = %task, "Loop not running");
            return Ok(());
        };
        let _ = running.stop.send(());
        running
            .handle
            .await
            .map_err(|e| MoodlensError::runtime(format!("{} loop failed: {}", task, e)))?;

        let modality = match task {
            ServiceTask::Facial => Some(Modality::Facial),
            ServiceTask::Voice => Some(Modality::Voice),
            ServiceTask::Text => Some(Modality::Text),
            ServiceTask::Fusion => None,
        };
        if let Some(modality) = modality {
            self.session.stop_modality(modality).await;
        }
        info!(session = %self.session.id(), task = %task, "Loop stopped");
        Ok(())
    }

    /// Stop one modality loop; the other loops keep running
    pub async fn stop_modality(&self, modality: Modality) -> Result<()> {
        self.stop(modality.into()).await
    }

    /// Stop every loop, fusion last
    pub async fn shutdown(&self) -> Result<()> {
        info!(session = %self.session.id(), "Shutting down MoodLens service");
        let mut first_error = None;
        for task in [
            ServiceTask::Facial,
            ServiceTask::Voice,
            ServiceTask::Text,
            ServiceTask::Fusion,
        ] {
            if let Err(e) = self.stop(task).await {
                warn!(task = %task, error = %e, "Loop did not stop cleanly");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for MoodlensService {
    fn drop(&mut self) {
        for (_, running) in self.tasks.get_mut().drain() {
            running.handle.abort();
        }
    }
}

impl fmt::Debug for MoodlensService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let running: Vec<ServiceTask> = self.tasks.lock().keys().copied().collect();
        f.debug_struct("MoodlensService")
            .field("session", &self.session.id())
            .field("running", &running)
            .finish()
    }
}
