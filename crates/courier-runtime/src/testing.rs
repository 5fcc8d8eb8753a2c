//! Scripted collaborators for the runtime's unit tests.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use courier_core::{
    ChatId, ChatTransport, JobInfo, JobSpec, Message, ParseMode, Scheduler, SchedulerError,
    SchedulerResult, StoreResult, StoredUser, TransportError, TransportResult, Update, User,
    UserFilter, UserId, UserStore,
};

pub fn text_update(update_id: i64, user_id: UserId, text: &str) -> Update {
    Update::from_message(update_id, Message::text(update_id, User::new(user_id, "tester"), text))
}

/// Transport serving queued fetch results and recording sends.
#[derive(Default)]
pub struct ScriptedTransport {
    batches: Mutex<VecDeque<TransportResult<Vec<Update>>>>,
    offsets: Mutex<Vec<Option<i64>>>,
    sent: Mutex<Vec<(ChatId, String, ParseMode)>>,
    failing_chats: Mutex<HashSet<ChatId>>,
    panic_on_fetch: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
}

impl ScriptedTransport {
    pub fn push_updates(&self, updates: Vec<Update>) {
        self.batches.lock().push_back(Ok(updates));
    }

    pub fn push_error(&self, error: TransportError) {
        self.batches.lock().push_back(Err(error));
    }

    pub fn panic_on_fetch(&self) {
        self.panic_on_fetch.store(true, Ordering::SeqCst);
    }

    /// Makes every fetch wait `delay` before answering.
    pub fn delay_fetches(&self, delay: Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    pub fn fail_sends_to(&self, chat_id: ChatId) {
        self.failing_chats.lock().insert(chat_id);
    }

    pub fn fetch_offsets(&self) -> Vec<Option<i64>> {
        self.offsets.lock().clone()
    }

    pub fn sent(&self) -> Vec<(ChatId, String, ParseMode)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        _timeout: Duration,
    ) -> TransportResult<Vec<Update>> {
        if self.panic_on_fetch.load(Ordering::SeqCst) {
            panic!("transport exploded");
        }
        self.offsets.lock().push(offset);
        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.batches.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: ParseMode,
    ) -> TransportResult<i64> {
        if self.failing_chats.lock().contains(&chat_id) {
            return Err(TransportError::Api {
                code: 403,
                description: "bot was blocked by the user".into(),
            });
        }
        let mut sent = self.sent.lock();
        sent.push((chat_id, text.to_string(), parse_mode));
        Ok(sent.len() as i64)
    }
}

/// User store over a fixed list.
#[derive(Default)]
pub struct MemoryStore {
    users: Vec<StoredUser>,
}

impl MemoryStore {
    pub fn with_banned(ids: impl IntoIterator<Item = UserId>) -> Self {
        let mut store = Self::default();
        for id in ids {
            store.users.push(user(id, "user", true));
        }
        store
    }

    pub fn with_user(mut self, id: UserId, role: &str) -> Self {
        self.users.push(user(id, role, false));
        self
    }
}

fn user(id: UserId, role: &str, banned: bool) -> StoredUser {
    StoredUser {
        id,
        username: None,
        role: role.to_string(),
        banned,
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_ids(&self, filter: UserFilter) -> StoreResult<Vec<UserId>> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.matches(&filter))
            .map(|u| u.id)
            .collect())
    }

    async fn list_users(&self, filter: UserFilter) -> StoreResult<Vec<StoredUser>> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.matches(&filter))
            .cloned()
            .collect())
    }
}

/// Scheduler that only keeps job records.
#[derive(Default)]
pub struct RecordingScheduler {
    jobs: Mutex<BTreeMap<String, JobInfo>>,
}

#[async_trait]
impl Scheduler for RecordingScheduler {
    async fn add_job(&self, job: JobSpec) -> SchedulerResult<JobInfo> {
        let mut jobs = self.jobs.lock();
        if jobs.contains_key(&job.id) {
            return Err(SchedulerError::JobExists(job.id));
        }
        let info = JobInfo {
            id: job.id.clone(),
            trigger: job.trigger.clone(),
            paused: false,
        };
        jobs.insert(job.id, info.clone());
        Ok(info)
    }

    async fn pause_job(&self, id: &str) -> SchedulerResult<()> {
        self.set_paused(id, true)
    }

    async fn resume_job(&self, id: &str) -> SchedulerResult<()> {
        self.set_paused(id, false)
    }

    async fn remove_job(&self, id: &str) -> SchedulerResult<()> {
        self.jobs
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SchedulerError::JobNotFound(id.to_string()))
    }

    async fn get_job(&self, id: &str) -> SchedulerResult<Option<JobInfo>> {
        Ok(self.jobs.lock().get(id).cloned())
    }

    async fn get_jobs(&self) -> SchedulerResult<Vec<JobInfo>> {
        Ok(self.jobs.lock().values().cloned().collect())
    }
}

impl RecordingScheduler {
    fn set_paused(&self, id: &str, paused: bool) -> SchedulerResult<()> {
        let mut jobs = self.jobs.lock();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| SchedulerError::JobNotFound(id.to_string()))?;
        job.paused = paused;
        Ok(())
    }
}
