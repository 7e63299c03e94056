//! Asynchronous per-channel monitoring.
//!
//! A [`MonitorTask`] watches one channel over a date range and delivers
//! message and membership events through listener callbacks. Each listener
//! slot holds at most one callback: setting a slot replaces whatever was
//! there. The [`MonitorRegistry`] owns the running watchers, one per channel
//! name, and is drained unconditionally during session shutdown.
//!
//! Listener callbacks run on watcher tasks, concurrently with the foreground
//! prompt. They are display-only: they read and print, and never touch
//! session state. Interleaved terminal output is acceptable.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::client::HubClient;
use crate::dates::DateRange;
use crate::error::{Error, Result};
use crate::observability;
use crate::types::{Member, Message, PageConfig};

const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Callback for message events; receives the channel name and the message.
pub type MessageListener = Box<dyn Fn(&str, &Message) + Send + Sync>;

/// Callback for membership events; receives the channel name and the member.
pub type MemberListener = Box<dyn Fn(&str, &Member) + Send + Sync>;

/// One channel's monitoring registration: the watched range and up to one
/// callback per listener slot.
pub struct MonitorTask {
    channel_name: String,
    range: DateRange,
    on_message_received: Option<MessageListener>,
    on_message_updated: Option<MessageListener>,
    on_member_added: Option<MemberListener>,
}

impl MonitorTask {
    /// Create a registration with empty listener slots.
    pub fn new(channel_name: impl Into<String>, range: DateRange) -> Self {
        Self {
            channel_name: channel_name.into(),
            range,
            on_message_received: None,
            on_message_updated: None,
            on_member_added: None,
        }
    }

    /// The channel this registration watches.
    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    /// Set the message-received listener, discarding any previous one.
    pub fn set_on_message_received(&mut self, listener: MessageListener) {
        self.on_message_received = Some(listener);
    }

    /// Set the message-updated listener, discarding any previous one.
    pub fn set_on_message_updated(&mut self, listener: MessageListener) {
        self.on_message_updated = Some(listener);
    }

    /// Set the member-added listener, discarding any previous one.
    pub fn set_on_member_added(&mut self, listener: MemberListener) {
        self.on_member_added = Some(listener);
    }

    fn notify_message_received(&self, message: &Message) {
        if let Some(listener) = &self.on_message_received {
            observability::MONITOR_EVENTS.click();
            listener(&self.channel_name, message);
        }
    }

    fn notify_message_updated(&self, message: &Message) {
        if let Some(listener) = &self.on_message_updated {
            observability::MONITOR_EVENTS.click();
            listener(&self.channel_name, message);
        }
    }

    fn notify_member_added(&self, member: &Member) {
        if let Some(listener) = &self.on_member_added {
            observability::MONITOR_EVENTS.click();
            listener(&self.channel_name, member);
        }
    }

    /// Watch the channel until the task is stopped.
    ///
    /// Plain polling: each tick re-reads the ranged history and the member
    /// list and diffs against what was seen before. The first successful
    /// pass primes the baseline without firing events; transient remote
    /// failures skip the tick and keep watching.
    async fn run(self, client: HubClient) {
        let mut seen_messages: HashMap<String, String> = HashMap::new();
        let mut seen_members: HashSet<String> = HashSet::new();
        let mut primed = false;

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let history = client.history(&self.channel_name, &self.range).await;
            if !history.is_success_or_refreshed() {
                continue;
            }
            for message in history.items() {
                match seen_messages.get(&message.id) {
                    None => {
                        if primed {
                            self.notify_message_received(message);
                        }
                        seen_messages.insert(message.id.clone(), message.message.clone());
                    }
                    Some(previous) if *previous != message.message => {
                        if primed {
                            self.notify_message_updated(message);
                        }
                        seen_messages.insert(message.id.clone(), message.message.clone());
                    }
                    Some(_) => {}
                }
            }

            let channel = client.find_channel(&self.channel_name).await;
            if let Some(channel) = channel.into_item() {
                let members = client.list_members(&channel.id, PageConfig::max()).await;
                if members.is_success_or_refreshed() {
                    for member in members.items() {
                        if seen_members.insert(member.id.clone()) && primed {
                            self.notify_member_added(member);
                        }
                    }
                }
            }

            primed = true;
        }
    }
}

/// Registry of running channel watchers, keyed by channel name.
#[derive(Clone, Default)]
pub struct MonitorRegistry {
    tasks: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl MonitorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start watching a channel.
    ///
    /// # Errors
    ///
    /// Starting a channel name that is already registered is rejected with a
    /// monitor error; an existing watcher is never silently replaced.
    pub fn start(&self, task: MonitorTask, client: &HubClient) -> Result<()> {
        let mut tasks = self
            .tasks
            .lock()
            .map_err(|_| Error::monitor("monitor registry lock poisoned", None))?;
        let name = task.channel_name().to_string();
        if tasks.contains_key(&name) {
            return Err(Error::monitor(
                "already monitoring this channel; stop it first",
                Some(name),
            ));
        }
        let handle = tokio::spawn(task.run(client.clone()));
        tasks.insert(name, handle);
        Ok(())
    }

    /// Names of the channels currently being watched, sorted.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tasks
            .lock()
            .map(|tasks| tasks.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Stop one watcher. Returns false when the name was not registered,
    /// which makes repeated stops no-ops.
    pub fn stop(&self, channel_name: &str) -> bool {
        let handle = self
            .tasks
            .lock()
            .ok()
            .and_then(|mut tasks| tasks.remove(channel_name));
        match handle {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Stop every watcher. Invoked unconditionally during session shutdown,
    /// before the process exits.
    pub fn stop_all(&self) {
        let drained: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .map(|mut tasks| tasks.drain().map(|(_, handle)| handle).collect())
            .unwrap_or_default();
        for handle in drained {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn range() -> DateRange {
        DateRange::single(date!(2020 - 04 - 25))
    }

    fn client() -> HubClient {
        HubClient::with_base_url("id", "secret", "https://r", "http://127.0.0.1:9/").unwrap()
    }

    #[test]
    fn listener_slot_replacement() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let mut task = MonitorTask::new("general", range());

        let first = Arc::clone(&fired);
        task.set_on_message_received(Box::new(move |_, _| first.lock().unwrap().push("first")));
        let second = Arc::clone(&fired);
        task.set_on_message_received(Box::new(move |_, _| second.lock().unwrap().push("second")));

        task.notify_message_received(&Message::new("m1", "hello"));
        assert_eq!(*fired.lock().unwrap(), vec!["second"]);
    }

    #[test]
    fn empty_slot_fires_nothing() {
        let task = MonitorTask::new("general", range());
        task.notify_message_received(&Message::new("m1", "hello"));
        task.notify_message_updated(&Message::new("m1", "hello"));
        task.notify_member_added(&Member::new("u1", "ada@example.com"));
    }

    #[test]
    fn slots_are_independent() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let mut task = MonitorTask::new("general", range());

        let received = Arc::clone(&fired);
        task.set_on_message_received(Box::new(move |_, _| {
            received.lock().unwrap().push("received")
        }));
        let added = Arc::clone(&fired);
        task.set_on_member_added(Box::new(move |_, _| added.lock().unwrap().push("added")));

        task.notify_message_updated(&Message::new("m1", "x"));
        task.notify_message_received(&Message::new("m1", "x"));
        task.notify_member_added(&Member::new("u1", "a@example.com"));
        assert_eq!(*fired.lock().unwrap(), vec!["received", "added"]);
    }

    #[tokio::test]
    async fn duplicate_start_is_rejected() {
        let registry = MonitorRegistry::new();
        let client = client();
        registry
            .start(MonitorTask::new("general", range()), &client)
            .unwrap();
        let err = registry
            .start(MonitorTask::new("general", range()), &client)
            .unwrap_err();
        assert!(err.is_monitor());
        assert_eq!(registry.channel_names(), vec!["general".to_string()]);
        registry.stop_all();
    }

    #[tokio::test]
    async fn stop_removes_one_registration() {
        let registry = MonitorRegistry::new();
        let client = client();
        registry
            .start(MonitorTask::new("alpha", range()), &client)
            .unwrap();
        registry
            .start(MonitorTask::new("beta", range()), &client)
            .unwrap();
        assert_eq!(registry.channel_names().len(), 2);

        assert!(registry.stop("alpha"));
        assert!(!registry.stop("alpha"));
        assert_eq!(registry.channel_names(), vec!["beta".to_string()]);
        registry.stop_all();
    }

    #[tokio::test]
    async fn stop_all_then_stop_is_noop() {
        let registry = MonitorRegistry::new();
        let client = client();
        registry
            .start(MonitorTask::new("alpha", range()), &client)
            .unwrap();
        registry
            .start(MonitorTask::new("beta", range()), &client)
            .unwrap();

        registry.stop_all();
        assert!(registry.channel_names().is_empty());
        assert!(!registry.stop("alpha"));
        assert!(!registry.stop("beta"));
    }

    #[tokio::test]
    async fn restart_after_stop_is_allowed() {
        let registry = MonitorRegistry::new();
        let client = client();
        registry
            .start(MonitorTask::new("general", range()), &client)
            .unwrap();
        assert!(registry.stop("general"));
        registry
            .start(MonitorTask::new("general", range()), &client)
            .unwrap();
        registry.stop_all();
    }
}
