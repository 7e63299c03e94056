//! The interactive session: one command table, one dispatch loop.
//!
//! The table is an ordered list of `(id, label, action)` rows built once;
//! the menu renderer and the dispatcher both walk it, so labels and behavior
//! cannot drift apart. Unknown non-exit ids print a single notice and
//! re-loop; the only way out of the running state is the exit command, which
//! releases every monitor registration before the session terminates.

use crate::client::HubClient;
use crate::dates::resolve_date_range;
use crate::error::{Error, Result};
use crate::input::{COMMAND_EXIT, COMMAND_QUIT, MAX_EMAIL_COUNT, Prompter};
use crate::monitor::{MonitorRegistry, MonitorTask};
use crate::observability;
use crate::render::Presenter;
use crate::types::{Channel, Identity, Message, PageConfig};

/// What a menu entry does.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// List the caller's channels.
    ListChannels,
    /// Create a channel and invite members.
    CreateChannel,
    /// Show one channel by id.
    ShowChannel,
    /// Rename a channel.
    RenameChannel,
    /// Delete a channel.
    DeleteChannel,
    /// Join a channel.
    JoinChannel,
    /// Leave a channel.
    LeaveChannel,
    /// List a channel's members.
    ListMembers,
    /// Invite members to a channel by email.
    InviteMembers,
    /// Remove a member from a channel.
    RemoveMember,
    /// Send a message to a channel.
    SendMessage,
    /// List message history over a date range.
    ListHistory,
    /// Search messages by content over a date range.
    SearchByContent,
    /// Search messages by sender over a date range.
    SearchBySender,
    /// Replace a message's body.
    EditMessage,
    /// Delete a message.
    DeleteMessage,
    /// Start monitoring a channel.
    StartMonitor,
    /// Show the monitored channel names.
    ShowMonitors,
    /// Stop monitoring one channel.
    StopMonitor,
    /// Stop monitoring every channel.
    StopAllMonitors,
    /// List the caller's external contacts.
    ListContacts,
    /// Multi-step create/get/rename/delete exercise on a throwaway channel.
    ChannelSmokeTest,
    /// Toggle request tracing.
    ToggleDebug,
}

/// One row of the command table.
#[derive(Debug, Copy, Clone)]
pub struct MenuEntry {
    /// Integer the user types to invoke the action.
    pub id: i32,
    /// Label printed in the menu.
    pub label: &'static str,
    /// The action dispatched for the id.
    pub action: MenuAction,
}

const fn entry(id: i32, label: &'static str, action: MenuAction) -> MenuEntry {
    MenuEntry { id, label, action }
}

/// The command table. Ordered; rendered and dispatched from the same rows.
pub const MENU: &[MenuEntry] = &[
    entry(1, "List channels", MenuAction::ListChannels),
    entry(2, "Create a channel", MenuAction::CreateChannel),
    entry(3, "Show a channel", MenuAction::ShowChannel),
    entry(4, "Rename a channel", MenuAction::RenameChannel),
    entry(5, "Delete a channel", MenuAction::DeleteChannel),
    entry(6, "Join a channel", MenuAction::JoinChannel),
    entry(7, "Leave a channel", MenuAction::LeaveChannel),
    entry(8, "List channel members", MenuAction::ListMembers),
    entry(9, "Invite channel members", MenuAction::InviteMembers),
    entry(10, "Remove a channel member", MenuAction::RemoveMember),
    entry(11, "Send a message", MenuAction::SendMessage),
    entry(12, "List message history", MenuAction::ListHistory),
    entry(13, "Search messages by content", MenuAction::SearchByContent),
    entry(14, "Search messages by sender", MenuAction::SearchBySender),
    entry(15, "Edit a message", MenuAction::EditMessage),
    entry(16, "Delete a message", MenuAction::DeleteMessage),
    entry(17, "Start monitoring a channel", MenuAction::StartMonitor),
    entry(18, "Show monitored channels", MenuAction::ShowMonitors),
    entry(19, "Stop monitoring a channel", MenuAction::StopMonitor),
    entry(20, "Stop monitoring all channels", MenuAction::StopAllMonitors),
    entry(21, "List external contacts", MenuAction::ListContacts),
    entry(22, "Run the channel smoke test", MenuAction::ChannelSmokeTest),
    entry(98, "Toggle debug output", MenuAction::ToggleDebug),
];

/// Find the action for an id, if the table has one.
pub fn lookup(table: &[MenuEntry], id: i32) -> Option<MenuAction> {
    table.iter().find(|e| e.id == id).map(|e| e.action)
}

/// Session lifecycle states.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Reading and dispatching commands.
    Running,
    /// Exit received; monitor resources not yet released.
    ExitRequested,
    /// Resources released; the loop has returned.
    Terminated,
}

/// Outcome of dispatching one command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A table action ran (successfully or not).
    Handled,
    /// The id is not in the table and is not the exit command.
    Unsupported,
    /// The exit command was received.
    Exit,
}

/// The interactive session over one authenticated client.
pub struct Session {
    client: HubClient,
    identity: Identity,
    prompter: Prompter,
    presenter: Presenter,
    registry: MonitorRegistry,
    state: SessionState,
}

impl Session {
    /// Create a session in the running state.
    pub fn new(
        client: HubClient,
        identity: Identity,
        prompter: Prompter,
        presenter: Presenter,
        registry: MonitorRegistry,
    ) -> Self {
        Self {
            client,
            identity,
            prompter,
            presenter,
            registry,
            state: SessionState::Running,
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The monitor registry this session shuts down on exit.
    pub fn registry(&self) -> &MonitorRegistry {
        &self.registry
    }

    /// Drive the session until the exit command, then release monitors.
    pub async fn run(&mut self) {
        while self.state == SessionState::Running {
            self.print_menu();
            let command = self.prompter.get_command("");
            match self.dispatch(command).await {
                Dispatch::Exit => self.state = SessionState::ExitRequested,
                Dispatch::Unsupported => {
                    observability::SESSION_UNSUPPORTED.click();
                    println!(
                        "Command '{command}' is not supported, please enter a valid command!\n"
                    );
                }
                Dispatch::Handled => {}
            }
        }
        // The sole terminal transition: watchers released, then done.
        self.registry.stop_all();
        self.state = SessionState::Terminated;
    }

    /// Dispatch one command id against the table. Never panics; action
    /// failures are reported and the session keeps running.
    pub async fn dispatch(&mut self, command: i32) -> Dispatch {
        if command == COMMAND_EXIT {
            return Dispatch::Exit;
        }
        let Some(action) = lookup(MENU, command) else {
            return Dispatch::Unsupported;
        };
        observability::SESSION_COMMANDS.click();
        if let Err(err) = self.perform(action).await {
            // The action boundary: anything a handler could not recover
            // from ends here, and the loop re-prompts.
            self.presenter.error(&err.to_string());
        }
        Dispatch::Handled
    }

    fn print_menu(&self) {
        println!("# Main Menu # user={}", self.identity.email);
        for entry in MENU {
            if entry.action == MenuAction::ToggleDebug {
                let state = if self.client.debug() { "on" } else { "off" };
                println!("[{}] {} (current: {});", entry.id, entry.label, state);
            } else {
                println!("[{}] {};", entry.id, entry.label);
            }
        }
        println!("[{COMMAND_EXIT}] Exit;");
    }

    async fn perform(&mut self, action: MenuAction) -> Result<()> {
        match action {
            MenuAction::ListChannels => {
                self.list_channels().await?;
            }
            MenuAction::CreateChannel => self.create_channel().await?,
            MenuAction::ShowChannel => self.show_channel().await?,
            MenuAction::RenameChannel => self.rename_channel().await?,
            MenuAction::DeleteChannel => self.delete_channel().await?,
            MenuAction::JoinChannel => self.join_channel().await?,
            MenuAction::LeaveChannel => self.leave_channel().await?,
            MenuAction::ListMembers => self.list_members().await?,
            MenuAction::InviteMembers => self.invite_members().await?,
            MenuAction::RemoveMember => self.remove_member().await?,
            MenuAction::SendMessage => self.send_message().await?,
            MenuAction::ListHistory => self.list_history().await?,
            MenuAction::SearchByContent => self.search_by_content().await?,
            MenuAction::SearchBySender => self.search_by_sender().await?,
            MenuAction::EditMessage => self.edit_message().await?,
            MenuAction::DeleteMessage => self.delete_message().await?,
            MenuAction::StartMonitor => self.start_monitor().await?,
            MenuAction::ShowMonitors => self.show_monitors(),
            MenuAction::StopMonitor => self.stop_monitor()?,
            MenuAction::StopAllMonitors => self.stop_all_monitors(),
            MenuAction::ListContacts => self.list_contacts().await?,
            MenuAction::ChannelSmokeTest => self.channel_smoke_test().await?,
            MenuAction::ToggleDebug => self.toggle_debug(),
        }
        Ok(())
    }

    //////////////////////////////////////// Channels ////////////////////////////////////////

    async fn list_channels(&mut self) -> Result<Vec<Channel>> {
        self.presenter.title("List your channels");
        let result = self.client.list_channels().await;
        if result.is_success_or_refreshed() {
            let channels = result.into_items();
            self.presenter.channels("Your channels", &channels);
            Ok(channels)
        } else {
            self.presenter.framed(&format!(
                "Failed to list channels.\nReason: {}",
                result.error_message()
            ));
            Ok(Vec::new())
        }
    }

    /// List channels, then read a 1-based selection. `0` cancels.
    async fn select_channel(&mut self) -> Result<Channel> {
        let channels = self.list_channels().await?;
        if channels.is_empty() {
            return Err(Error::validation(
                "please join at least one channel first",
                None,
            ));
        }
        loop {
            let i = self.prompter.get_command(&format!(
                "Select a channel [1, {}] (0 to cancel): ",
                channels.len()
            ));
            if i == COMMAND_EXIT {
                return Err(Error::validation("channel selection cancelled", None));
            }
            if i >= 1 && (i as usize) <= channels.len() {
                let channel = channels[(i - 1) as usize].clone();
                println!("You selected channel {}", channel.name);
                return Ok(channel);
            }
            println!("Input should be within [1, {}]", channels.len());
        }
    }

    async fn create_channel(&mut self) -> Result<()> {
        self.presenter.title("Create a channel");
        let name = self.prompter.get_line("Channel name (ex. test): ")?;
        let emails = self.prompter.get_email_list(MAX_EMAIL_COUNT)?;
        let result = self.client.create_channel(&name, &emails).await;
        if result.is_success_or_refreshed() {
            match result.into_item() {
                Some(channel) => self
                    .presenter
                    .framed(&format!("Created channel\n{channel}")),
                None => self.presenter.info("Created channel."),
            }
        } else {
            self.presenter.framed(&format!(
                "Failed to create the channel.\nReason: {}",
                result.error_message()
            ));
        }
        Ok(())
    }

    async fn show_channel(&mut self) -> Result<()> {
        self.presenter.title("Show a channel");
        let channel_id = self.prompter.get_line("Channel id: ")?;
        let result = self.client.get_channel(&channel_id).await;
        if result.is_success_or_refreshed() {
            if let Some(channel) = result.into_item() {
                self.presenter.framed(&channel.to_string());
            }
        } else {
            self.presenter.framed(&format!(
                "Failed to get the channel.\nReason: {}",
                result.error_message()
            ));
        }
        Ok(())
    }

    async fn rename_channel(&mut self) -> Result<()> {
        self.presenter.title("Rename a channel");
        let channel_id = self.prompter.get_line("Channel id: ")?;
        let name = self.prompter.get_line("New channel name: ")?;
        let result = self.client.rename_channel(&channel_id, &name).await;
        self.report_outcome("rename the channel", &result);
        Ok(())
    }

    async fn delete_channel(&mut self) -> Result<()> {
        self.presenter.title("Delete a channel");
        let channel_id = self.prompter.get_line("Channel id: ")?;
        if !self.prompter.get_yes_no("Really delete this channel?")? {
            self.presenter.info("Nothing deleted.");
            return Ok(());
        }
        let result = self.client.delete_channel(&channel_id).await;
        self.report_outcome("delete the channel", &result);
        Ok(())
    }

    async fn join_channel(&mut self) -> Result<()> {
        self.presenter.title("Join a channel");
        let channel_id = self.prompter.get_line("Channel id: ")?;
        let result = self.client.join_channel(&channel_id).await;
        self.report_outcome("join the channel", &result);
        Ok(())
    }

    async fn leave_channel(&mut self) -> Result<()> {
        self.presenter.title("Leave a channel");
        let channel_id = self.prompter.get_line("Channel id: ")?;
        let result = self.client.leave_channel(&channel_id).await;
        self.report_outcome("leave the channel", &result);
        Ok(())
    }

    //////////////////////////////////////// Members ////////////////////////////////////////

    async fn list_members(&mut self) -> Result<()> {
        let channel = self.select_channel().await?;
        let result = self
            .client
            .list_members(&channel.id, PageConfig::max())
            .await;
        if result.is_success_or_refreshed() {
            self.presenter
                .members(&format!("Members of {}", channel.name), result.items());
        } else {
            self.presenter.framed(&format!(
                "Failed to list members.\nReason: {}",
                result.error_message()
            ));
        }
        Ok(())
    }

    async fn invite_members(&mut self) -> Result<()> {
        self.presenter.title("Invite channel members");
        self.list_contacts().await?;
        let channel_id = self.prompter.get_line("Channel id: ")?;
        let emails = self.prompter.get_email_list(MAX_EMAIL_COUNT)?;
        if emails.is_empty() {
            self.presenter.info("No emails entered; nothing to do.");
            return Ok(());
        }
        let result = self.client.invite_members(&channel_id, &emails).await;
        self.report_outcome("invite the members", &result);
        Ok(())
    }

    async fn remove_member(&mut self) -> Result<()> {
        self.presenter.title("Remove a channel member");
        let channel_id = self.prompter.get_line("Channel id: ")?;
        let member_id = self.prompter.get_line("Member id (not email): ")?;
        let result = self.client.remove_member(&channel_id, &member_id).await;
        self.report_outcome("remove the member", &result);
        Ok(())
    }

    //////////////////////////////////////// Messages ////////////////////////////////////////

    async fn send_message(&mut self) -> Result<()> {
        let channel = self.select_channel().await?;
        loop {
            let text = self
                .prompter
                .get_line(&format!("Message ('{COMMAND_QUIT}' to stop): "))?;
            if text == COMMAND_QUIT {
                break;
            }
            let result = self.client.send_message(&channel.id, &text).await;
            if result.is_success_or_refreshed() {
                match result.item() {
                    Some(id) => self.presenter.info(&format!("Message sent. ID={id}")),
                    None => self.presenter.info("Message sent."),
                }
            } else {
                self.presenter.framed(&format!(
                    "Failed to send the message.\nReason: {}",
                    result.error_message()
                ));
            }
        }
        Ok(())
    }

    async fn list_history(&mut self) -> Result<()> {
        let channel = self.select_channel().await?;
        let range = resolve_date_range(&mut self.prompter)?;
        let title = format!("Message history in {}", channel.name);
        self.presenter.title(&title);
        let result = self.client.history(&channel.name, &range).await;
        if result.is_success_or_refreshed() {
            self.presenter
                .messages_for_period(&title, &range, result.items());
        } else {
            self.presenter.framed(&format!(
                "Failed to {title}\nReason: {}",
                result.error_message()
            ));
        }
        Ok(())
    }

    async fn search_by_content(&mut self) -> Result<()> {
        let channel = self.select_channel().await?;
        let query = self.prompter.get_line("Keywords for message contents: ")?;
        let range = resolve_date_range(&mut self.prompter)?;
        let title = format!(
            "Messages containing '{query}' in {}",
            channel.name
        );
        self.presenter.title(&title);
        let result = self
            .client
            .search(&channel.name, &range, |m| m.message.contains(&query))
            .await;
        if result.is_success_or_refreshed() {
            self.presenter
                .messages_for_period(&title, &range, result.items());
        } else {
            self.presenter.framed(&format!(
                "Failed to {title}\nReason: {}",
                result.error_message()
            ));
        }
        Ok(())
    }

    async fn search_by_sender(&mut self) -> Result<()> {
        let channel = self.select_channel().await?;
        let query = self.prompter.get_line("Keywords for message senders: ")?;
        let range = resolve_date_range(&mut self.prompter)?;
        let title = format!(
            "Messages whose sender contains '{query}' in {}",
            channel.name
        );
        self.presenter.title(&title);
        let result = self
            .client
            .search(&channel.name, &range, |m| {
                m.sender_or_empty().contains(&query)
            })
            .await;
        if result.is_success_or_refreshed() {
            self.presenter
                .messages_for_period(&title, &range, result.items());
        } else {
            self.presenter.framed(&format!(
                "Failed to {title}\nReason: {}",
                result.error_message()
            ));
        }
        Ok(())
    }

    /// List a channel's messages with ids, then read a 1-based selection.
    async fn select_message(&mut self, channel: &Channel) -> Result<Option<Message>> {
        let result = self.client.list_messages(&channel.id, None).await;
        if !result.is_success_or_refreshed() {
            self.presenter.framed(&format!(
                "Failed to list messages.\nReason: {}",
                result.error_message()
            ));
            return Ok(None);
        }
        let messages = result.into_items();
        if messages.is_empty() {
            println!("No messages here yet. Send one first or switch channels.");
            return Ok(None);
        }
        self.presenter
            .messages(&format!("Messages in {}", channel.name), &messages, true);
        loop {
            let i = self.prompter.get_command(&format!(
                "Select a message [1, {}] (0 to cancel): ",
                messages.len()
            ));
            if i == COMMAND_EXIT {
                return Ok(None);
            }
            if i >= 1 && (i as usize) <= messages.len() {
                return Ok(Some(messages[(i - 1) as usize].clone()));
            }
            println!("Input should be within [1, {}]", messages.len());
        }
    }

    async fn edit_message(&mut self) -> Result<()> {
        let channel = self.select_channel().await?;
        let Some(message) = self.select_message(&channel).await? else {
            return Ok(());
        };
        let text = self.prompter.get_line("New message body: ")?;
        let result = self
            .client
            .edit_message(&channel.id, &message.id, &text)
            .await;
        self.report_outcome("edit the message", &result);
        Ok(())
    }

    async fn delete_message(&mut self) -> Result<()> {
        let channel = self.select_channel().await?;
        let Some(message) = self.select_message(&channel).await? else {
            return Ok(());
        };
        if !self.prompter.get_yes_no("Really delete this message?")? {
            self.presenter.info("Nothing deleted.");
            return Ok(());
        }
        let result = self.client.delete_message(&channel.id, &message.id).await;
        self.report_outcome("delete the message", &result);
        Ok(())
    }

    //////////////////////////////////////// Monitors ////////////////////////////////////////

    async fn start_monitor(&mut self) -> Result<()> {
        let channel = self.select_channel().await?;
        let range = resolve_date_range(&mut self.prompter)?;

        let mut task = MonitorTask::new(&channel.name, range);
        let presenter = self.presenter.clone();
        task.set_on_message_received(Box::new(move |channel_name, message| {
            presenter.messages(
                &format!("Message received at channel '{channel_name}'"),
                std::slice::from_ref(message),
                true,
            );
        }));
        let presenter = self.presenter.clone();
        task.set_on_message_updated(Box::new(move |channel_name, message| {
            presenter.messages(
                &format!("Message updated at channel '{channel_name}'"),
                std::slice::from_ref(message),
                true,
            );
        }));
        let presenter = self.presenter.clone();
        task.set_on_member_added(Box::new(move |channel_name, member| {
            presenter.members(
                &format!("Member added at channel '{channel_name}'"),
                std::slice::from_ref(member),
            );
        }));

        self.registry.start(task, &self.client)?;
        self.presenter
            .info(&format!("Monitoring channel '{}'.", channel.name));
        Ok(())
    }

    fn show_monitors(&self) {
        self.presenter.monitored(&self.registry.channel_names());
    }

    fn stop_monitor(&mut self) -> Result<()> {
        self.show_monitors();
        let name = self.prompter.get_line("Channel name to stop (ex. test): ")?;
        if self.registry.stop(&name) {
            self.presenter
                .info(&format!("Stopped monitoring '{name}'."));
        } else {
            self.presenter
                .info(&format!("'{name}' was not being monitored."));
        }
        Ok(())
    }

    fn stop_all_monitors(&self) {
        self.registry.stop_all();
        self.presenter.info("Stopped monitoring all channels.");
    }

    //////////////////////////////////////// Others ////////////////////////////////////////

    async fn list_contacts(&mut self) -> Result<()> {
        let result = self.client.list_external_contacts().await;
        if result.is_success_or_refreshed() {
            self.presenter
                .members("Your external contacts", result.items());
        } else {
            self.presenter.framed(&format!(
                "Failed to list contacts.\nReason: {}",
                result.error_message()
            ));
        }
        Ok(())
    }

    /// Create, fetch, rename, and delete a throwaway channel, pausing for
    /// Enter between steps. Every step failure aborts the rest of the
    /// exercise without touching the session loop.
    async fn channel_smoke_test(&mut self) -> Result<()> {
        self.presenter.title("Channel smoke test");
        let name = self
            .prompter
            .get_line("Name for the throwaway channel: ")?;

        self.prompter
            .get_line("# Step 1: create the channel (press Enter) ")?;
        let created = self.client.create_channel(&name, &[]).await;
        if !created.is_success_or_refreshed() {
            self.presenter.framed(&format!(
                "Failed to create the channel.\nReason: {}",
                created.error_message()
            ));
            return Ok(());
        }
        let Some(channel) = created.into_item() else {
            self.presenter.error("create returned no channel");
            return Ok(());
        };
        self.presenter.framed(&format!("Created channel\n{channel}"));

        self.prompter
            .get_line("# Step 2: fetch it back (press Enter) ")?;
        let fetched = self.client.get_channel(&channel.id).await;
        if !fetched.is_success_or_refreshed() {
            self.presenter.framed(&format!(
                "Failed to fetch the channel.\nReason: {}",
                fetched.error_message()
            ));
            return Ok(());
        }

        self.prompter
            .get_line("# Step 3: rename it (press Enter) ")?;
        let new_name = self.prompter.get_line("New name: ")?;
        let renamed = self.client.rename_channel(&channel.id, &new_name).await;
        if !renamed.is_success_or_refreshed() {
            self.presenter.framed(&format!(
                "Failed to rename the channel.\nReason: {}",
                renamed.error_message()
            ));
            return Ok(());
        }

        self.prompter
            .get_line("# Step 4: delete it (press Enter) ")?;
        let deleted = self.client.delete_channel(&channel.id).await;
        self.report_outcome("delete the channel", &deleted);
        Ok(())
    }

    fn toggle_debug(&self) {
        let now = !self.client.debug();
        self.client.set_debug(now);
        self.presenter.info(&format!(
            "Debug output is now {}.",
            if now { "on" } else { "off" }
        ));
    }

    fn report_outcome<T>(&self, what: &str, result: &crate::types::ApiResult<T>) {
        if result.is_success_or_refreshed() {
            self.presenter.info(&format!("Succeeded to {what}."));
        } else {
            self.presenter.framed(&format!(
                "Failed to {what}.\nReason: {}",
                result.error_message()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ScriptedInput;
    use time::macros::date;

    fn test_client() -> HubClient {
        HubClient::with_base_url("id", "secret", "https://r", "http://127.0.0.1:9/").unwrap()
    }

    fn session_with_script(lines: &[&str]) -> Session {
        Session::new(
            test_client(),
            Identity::new("u1", "me@example.com"),
            Prompter::new(Box::new(ScriptedInput::new(lines.iter().copied()))),
            Presenter::with_color(false),
            MonitorRegistry::new(),
        )
    }

    #[test]
    fn table_ids_are_unique_and_exclude_exit() {
        let mut ids: Vec<i32> = MENU.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        let before = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), before);
        assert!(!ids.contains(&COMMAND_EXIT));
    }

    #[test]
    fn lookup_resolves_every_entry() {
        for entry in MENU {
            assert_eq!(lookup(MENU, entry.id), Some(entry.action));
        }
        assert_eq!(lookup(MENU, 1234), None);
        assert_eq!(lookup(MENU, -1), None);
    }

    #[tokio::test]
    async fn dispatch_exit_is_exit() {
        let mut session = session_with_script(&[]);
        assert_eq!(session.dispatch(COMMAND_EXIT).await, Dispatch::Exit);
    }

    #[tokio::test]
    async fn dispatch_unknown_is_unsupported_not_a_panic() {
        let mut session = session_with_script(&[]);
        assert_eq!(session.dispatch(1234).await, Dispatch::Unsupported);
        assert_eq!(session.dispatch(-1).await, Dispatch::Unsupported);
        assert_eq!(session.dispatch(i32::MAX).await, Dispatch::Unsupported);
    }

    #[tokio::test]
    async fn dispatch_handles_table_actions() {
        // ShowMonitors touches no network.
        let mut session = session_with_script(&[]);
        assert_eq!(session.dispatch(18).await, Dispatch::Handled);
    }

    #[tokio::test]
    async fn run_survives_garbage_and_exits_cleanly() {
        let mut session = session_with_script(&["banana", "1234", "0"]);
        session.run().await;
        assert_eq!(session.state(), SessionState::Terminated);
    }

    #[tokio::test]
    async fn run_treats_closed_input_as_exit() {
        let mut session = session_with_script(&[]);
        session.run().await;
        assert_eq!(session.state(), SessionState::Terminated);
    }

    #[tokio::test]
    async fn run_releases_monitor_registrations_on_exit() {
        let mut session = session_with_script(&["0"]);
        let range = crate::dates::DateRange::single(date!(2020 - 04 - 25));
        session
            .registry
            .start(MonitorTask::new("general", range), &session.client)
            .unwrap();
        session
            .registry
            .start(MonitorTask::new("random", range), &session.client)
            .unwrap();
        session.run().await;
        assert_eq!(session.state(), SessionState::Terminated);
        assert!(session.registry().channel_names().is_empty());
        assert!(!session.registry().stop("general"));
    }

    #[tokio::test]
    async fn toggle_debug_round_trips() {
        let mut session = session_with_script(&["98", "98", "0"]);
        assert!(!session.client.debug());
        session.run().await;
        assert!(!session.client.debug());
    }

    #[tokio::test]
    async fn business_failure_does_not_end_the_loop() {
        // Command 1 hits an unreachable service; the loop must reach the
        // exit command afterwards.
        let mut session = session_with_script(&["1", "0"]);
        session.run().await;
        assert_eq!(session.state(), SessionState::Terminated);
    }
}
