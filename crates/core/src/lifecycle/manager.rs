//! The ticket lifecycle manager.
//!
//! Creation passes three gates in order: the per-user rate limit, the
//! in-process creating set, and the cross-process creation lock. Close and
//! member changes only go through the index queue, so they are serialized
//! within a process but not across processes.

use std::collections::HashSet;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::access::AccessPolicy;
use crate::audit::{EventHandle, TicketEvent};
use crate::gateway::{
    Attachment, ChannelGateway, ChannelInfo, ChannelKind, ChannelMessage, CreateChannelRequest,
    Embed, GatewayError, OutgoingMessage, PermissionOverwrite, Permissions,
};
use crate::index::{IndexHandle, MutationError, TicketRecord};
use crate::lock::{CreationLock, LockError};
use crate::metrics;
use crate::panel::TicketPreset;
use crate::rate_limiter::RateLimiter;
use crate::transcript::{CloseInfo, TranscriptMessage, TranscriptStore};

use super::naming::{archived_channel_name, ticket_channel_name};
use super::{
    CloseRequest, ClosedTicket, CreatedTicket, LifecycleSettings, TicketError, UserRef,
};

const HISTORY_PAGE_SIZE: u8 = 100;
const CLOSED_COLOR: u32 = 0xff6666;
const ARCHIVE_NOTICE_COLOR: u32 = 0xffcc66;

/// Membership in an in-flight set, released on drop.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    key: String,
}

impl<'a> InFlight<'a> {
    fn claim(set: &'a Mutex<HashSet<String>>, key: &str) -> Option<Self> {
        let mut guard = set.lock().unwrap_or_else(|e| e.into_inner());
        if !guard.insert(key.to_string()) {
            return None;
        }
        Some(Self {
            set,
            key: key.to_string(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

/// Owns every gate and collaborator of the ticket lifecycle.
///
/// Construct one per process and share it behind an `Arc`.
pub struct TicketManager {
    settings: LifecycleSettings,
    index: IndexHandle,
    gateway: Arc<dyn ChannelGateway>,
    transcripts: TranscriptStore,
    lock: CreationLock,
    access: Arc<AccessPolicy>,
    events: Option<EventHandle>,
    rate_limiter: RateLimiter,
    creating: Mutex<HashSet<String>>,
    closing: Mutex<HashSet<String>>,
}

impl TicketManager {
    pub fn new(
        settings: LifecycleSettings,
        index: IndexHandle,
        gateway: Arc<dyn ChannelGateway>,
        transcripts: TranscriptStore,
        lock: CreationLock,
        access: Arc<AccessPolicy>,
        events: Option<EventHandle>,
    ) -> Self {
        let rate_limiter = RateLimiter::new(settings.rate_limit);
        Self {
            settings,
            index,
            gateway,
            transcripts,
            lock,
            access,
            events,
            rate_limiter,
            creating: Mutex::new(HashSet::new()),
            closing: Mutex::new(HashSet::new()),
        }
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    pub fn access(&self) -> &AccessPolicy {
        &self.access
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn index(&self) -> &IndexHandle {
        &self.index
    }

    pub fn transcripts(&self) -> &TranscriptStore {
        &self.transcripts
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Open a ticket for `opener`, optionally from a panel preset.
    pub async fn create_ticket(
        &self,
        opener: &UserRef,
        preset: Option<&TicketPreset>,
    ) -> Result<CreatedTicket, TicketError> {
        let result = self.gated_create(opener, preset).await;
        match &result {
            Ok(created) => {
                metrics::TICKETS_CREATED.inc();
                info!(
                    channel_id = %created.channel_id,
                    opener_id = %opener.id,
                    "Ticket created"
                );
            }
            Err(e) => {
                metrics::CREATE_REJECTIONS
                    .with_label_values(&[e.reason_label()])
                    .inc();
                debug!(opener_id = %opener.id, "Ticket creation rejected: {}", e);
            }
        }
        result
    }

    async fn gated_create(
        &self,
        opener: &UserRef,
        preset: Option<&TicketPreset>,
    ) -> Result<CreatedTicket, TicketError> {
        if let Some(remaining_minutes) = self.rate_limiter.is_limited(&opener.id).await {
            return Err(TicketError::RateLimited { remaining_minutes });
        }

        let _creating =
            InFlight::claim(&self.creating, &opener.id).ok_or(TicketError::AlreadyCreating)?;

        let owner = format!("{}@{}", opener.id, self.settings.instance_id);
        let token = match self.lock.acquire(&owner).await {
            Ok(token) => token,
            Err(LockError::Busy { .. }) => return Err(TicketError::LockBusy),
            Err(LockError::Io(e)) => {
                error!(opener_id = %opener.id, "Creation lock IO error: {}", e);
                return Err(TicketError::PersistenceFailure(e.to_string()));
            }
        };

        let result = self.create_locked(opener, preset).await;

        if let Err(e) = self.lock.release(&token).await {
            warn!(opener_id = %opener.id, "Failed to release creation lock: {}", e);
        }
        result
    }

    /// Creation steps that run while the cross-process lock is held.
    async fn create_locked(
        &self,
        opener: &UserRef,
        preset: Option<&TicketPreset>,
    ) -> Result<CreatedTicket, TicketError> {
        if let Some(existing) = self.index.find_by_opener(&opener.id).await? {
            self.check_existing(&existing).await?;
        }

        let target = preset
            .and_then(|p| p.target_id.as_deref())
            .or(self.settings.ticket_category_id.as_deref());
        let parent_id = self.resolve_parent(target).await;

        let channel_name = ticket_channel_name(preset, &opener.name);
        if let Some(clash) = self.gateway.find_text_channel_by_name(&channel_name).await? {
            return Err(TicketError::ChannelNameCollision {
                channel_id: clash.id,
            });
        }

        let channel = self
            .gateway
            .create_text_channel(CreateChannelRequest {
                name: channel_name.clone(),
                parent_id,
                overwrites: self.ticket_overwrites(&opener.id),
            })
            .await?;
        self.rate_limiter.record(&opener.id).await;

        let welcome = self.welcome_message(opener, preset);
        let welcome_message_id = match self.gateway.send_message(&channel.id, welcome).await {
            Ok(id) => id,
            Err(e) => {
                self.report_orphan(&channel.id, &opener.id, &e).await;
                return Err(e.into());
            }
        };

        let record = TicketRecord::new(&channel.id, &opener.id, Utc::now())
            .with_welcome_message(&welcome_message_id);
        let appended = self
            .index
            .submit(move |records| {
                if let Some(dup) = records.iter().find(|r| r.channel_id == record.channel_id) {
                    return Err(MutationError::DuplicateChannel(dup.channel_id.clone()));
                }
                if let Some(dup) = records.iter().find(|r| r.opener_id == record.opener_id) {
                    return Err(MutationError::DuplicateOpener {
                        opener_id: dup.opener_id.clone(),
                        channel_id: dup.channel_id.clone(),
                    });
                }
                records.push(record);
                Ok(())
            })
            .await;
        if let Err(e) = appended {
            self.report_orphan(&channel.id, &opener.id, &e).await;
            return Err(TicketError::PersistenceFailure(e.to_string()));
        }

        self.emit(TicketEvent::TicketOpened {
            channel_id: channel.id.clone(),
            opener_id: opener.id.clone(),
            opener_tag: opener.name.clone(),
            preset_id: preset.map(|p| p.id.clone()),
        })
        .await;

        Ok(CreatedTicket {
            channel_id: channel.id,
            channel_name,
            welcome_message_id,
        })
    }

    /// Decide what an existing record for the opener means.
    ///
    /// A record whose channel is gone is dropped so the opener is not locked
    /// out forever.
    async fn check_existing(&self, existing: &TicketRecord) -> Result<(), TicketError> {
        if self.gateway.get_channel(&existing.channel_id).await?.is_some() {
            return Err(TicketError::AlreadyOpen {
                channel_id: existing.channel_id.clone(),
            });
        }

        let channel_id = existing.channel_id.clone();
        self.index
            .submit(move |records| {
                records.retain(|r| r.channel_id != channel_id);
                Ok(())
            })
            .await?;

        warn!(
            channel_id = %existing.channel_id,
            opener_id = %existing.opener_id,
            "Purged index record for a channel that no longer exists"
        );
        self.emit(TicketEvent::StaleRecordPurged {
            channel_id: existing.channel_id.clone(),
            opener_id: existing.opener_id.clone(),
        })
        .await;
        Ok(())
    }

    fn ticket_overwrites(&self, opener_id: &str) -> Vec<PermissionOverwrite> {
        let participant =
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY;

        let mut overwrites = vec![
            PermissionOverwrite::role(
                &self.settings.guild_id,
                Permissions::NONE,
                Permissions::VIEW_CHANNEL,
            ),
            PermissionOverwrite::member(opener_id, participant, Permissions::NONE),
        ];
        overwrites.extend(self.access.staff_roles().into_iter().map(|role_id| {
            PermissionOverwrite::role(
                role_id,
                participant | Permissions::MANAGE_MESSAGES,
                Permissions::NONE,
            )
        }));
        overwrites
    }

    fn welcome_message(&self, opener: &UserRef, preset: Option<&TicketPreset>) -> OutgoingMessage {
        let description = preset
            .and_then(|p| p.welcome_message.clone())
            .unwrap_or_else(|| self.settings.welcome_message.clone());

        OutgoingMessage::embed(self.embed("Ticket opened", description, self.settings.embed_color))
            .with_content(format!("<@{}>", opener.id))
            .with_close_button(&self.settings.close_button_label)
    }

    async fn report_orphan(
        &self,
        channel_id: &str,
        opener_id: &str,
        cause: &(dyn Display + Sync),
    ) {
        error!(
            channel_id = %channel_id,
            opener_id = %opener_id,
            "Ticket channel exists without an index record: {}",
            cause
        );
        self.emit(TicketEvent::OrphanChannel {
            channel_id: channel_id.to_string(),
            opener_id: opener_id.to_string(),
            error: cause.to_string(),
        })
        .await;
    }

    // =========================================================================
    // Close
    // =========================================================================

    /// Close and archive a ticket.
    ///
    /// Every step before the index removal is best effort; failures are
    /// logged, recorded as events and listed in the result.
    pub async fn close_ticket(
        &self,
        channel_id: &str,
        request: CloseRequest,
    ) -> Result<ClosedTicket, TicketError> {
        let _closing = InFlight::claim(&self.closing, channel_id)
            .ok_or_else(|| TicketError::AlreadyClosing(channel_id.to_string()))?;

        let record = self
            .index
            .find_by_channel(channel_id)
            .await?
            .ok_or_else(|| TicketError::NotATicket(channel_id.to_string()))?;

        // checked under the closing guard, against the record as it is now
        if let Some(idle) = request.only_if_idle {
            if !record.is_idle(idle.now, idle.timeout) {
                return Err(TicketError::StillActive(channel_id.to_string()));
            }
        }

        let started = Instant::now();
        let mut failed_steps = Vec::new();

        let channel = match self.gateway.get_channel(channel_id).await {
            Ok(Some(channel)) => Some(channel),
            Ok(None) => {
                warn!(channel_id = %channel_id, "Ticket channel is gone; closing record only");
                None
            }
            Err(e) => {
                self.step_failed(channel_id, "fetch_channel", &e, &mut failed_steps)
                    .await;
                None
            }
        };

        if channel.is_some() {
            if let Some(message_id) = &record.welcome_message_id {
                if let Err(e) = self.gateway.clear_components(channel_id, message_id).await {
                    self.step_failed(channel_id, "clear_components", &e, &mut failed_steps)
                        .await;
                }
            }
        }

        let messages = self
            .snapshot_history(channel_id, channel.is_some(), &mut failed_steps)
            .await;

        let close_info = CloseInfo {
            stated_closer: request.stated_closer.clone(),
            actual_closer_id: Some(request.executor.id.clone()),
            actual_closer_tag: Some(request.executor.name.clone()),
        };
        let transcript_path = match self
            .transcripts
            .write_transcript(channel_id, &messages, Some(&close_info))
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                self.step_failed(channel_id, "write_transcript", &e, &mut failed_steps)
                    .await;
                None
            }
        };

        if let Some(channel) = &channel {
            let summary = self.closing_summary(&request);
            if let Err(e) = self.gateway.send_message(channel_id, summary).await {
                self.step_failed(channel_id, "send_summary", &e, &mut failed_steps)
                    .await;
            }
            self.archive_channel(channel, &record, &mut failed_steps)
                .await;
        }

        if transcript_path.is_some() {
            self.notify_archive(&record, &mut failed_steps).await;
        }

        let target = channel_id.to_string();
        self.index
            .submit(move |records| {
                records.retain(|r| r.channel_id != target);
                Ok(())
            })
            .await?;

        metrics::TICKETS_CLOSED
            .with_label_values(&[request.trigger.as_str()])
            .inc();
        metrics::CLOSE_DURATION
            .with_label_values(&[request.trigger.as_str()])
            .observe(started.elapsed().as_secs_f64());

        info!(
            channel_id = %channel_id,
            closed_by = %request.executor.id,
            trigger = request.trigger.as_str(),
            failed_steps = failed_steps.len(),
            "Ticket closed"
        );
        self.emit(TicketEvent::TicketClosed {
            channel_id: channel_id.to_string(),
            closed_by: request.executor.id.clone(),
            closer_tag: request.executor.name.clone(),
            reason: request.reason.clone(),
        })
        .await;

        Ok(ClosedTicket {
            channel_id: channel_id.to_string(),
            opener_id: record.opener_id,
            transcript_path,
            failed_steps,
        })
    }

    /// Full channel history, oldest first.
    ///
    /// Falls back to the per-ticket message log when the platform history
    /// is unavailable.
    async fn snapshot_history(
        &self,
        channel_id: &str,
        channel_exists: bool,
        failed_steps: &mut Vec<String>,
    ) -> Vec<TranscriptMessage> {
        if channel_exists {
            match self.fetch_history(channel_id).await {
                Ok(messages) => return messages,
                Err(e) => {
                    self.step_failed(channel_id, "fetch_history", &e, failed_steps)
                        .await
                }
            }
        }

        match self.transcripts.read_message_log(channel_id).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(channel_id = %channel_id, "Message log unreadable: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_history(&self, channel_id: &str) -> Result<Vec<TranscriptMessage>, GatewayError> {
        let mut messages: Vec<TranscriptMessage> = Vec::new();
        let mut before: Option<String> = None;

        loop {
            let page = self
                .gateway
                .fetch_messages(channel_id, before.as_deref(), HISTORY_PAGE_SIZE)
                .await?;
            let Some(oldest) = page.last() else {
                break;
            };
            before = Some(oldest.id.clone());
            let full_page = page.len() >= HISTORY_PAGE_SIZE as usize;
            messages.extend(page.iter().map(TranscriptMessage::from));
            if !full_page {
                break;
            }
        }

        messages.reverse();
        Ok(messages)
    }

    fn closing_summary(&self, request: &CloseRequest) -> OutgoingMessage {
        let mut description = self.settings.closed_message.clone();
        let mut details = Vec::new();
        if let Some(closer) = &request.stated_closer {
            details.push(format!("Closed by: **{}**", closer));
        }
        if let Some(reason) = &request.reason {
            details.push(format!("Reason: {}", reason));
        }
        if !details.is_empty() {
            description.push_str("\n\n");
            description.push_str(&details.join("\n"));
        }
        OutgoingMessage::embed(self.embed("Ticket closed", description, CLOSED_COLOR))
    }

    /// Move the channel to the archive and make it read-only for staff.
    async fn archive_channel(
        &self,
        channel: &ChannelInfo,
        record: &TicketRecord,
        failed_steps: &mut Vec<String>,
    ) {
        let channel_id = channel.id.as_str();

        if let Some(parent_id) = self.resolve_parent(self.settings.archive_target_id.as_deref()).await {
            if let Err(e) = self.gateway.set_parent(channel_id, &parent_id).await {
                self.step_failed(channel_id, "set_parent", &e, failed_steps)
                    .await;
            }
        }

        let hide_everyone = PermissionOverwrite::role(
            &self.settings.guild_id,
            Permissions::NONE,
            Permissions::VIEW_CHANNEL,
        );
        if let Err(e) = self.gateway.edit_permission(channel_id, hide_everyone).await {
            self.step_failed(channel_id, "hide_everyone", &e, failed_steps)
                .await;
        }

        for member_id in &record.members {
            if let Err(e) = self.gateway.delete_permission(channel_id, member_id).await {
                self.step_failed(channel_id, "revoke_member", &e, failed_steps)
                    .await;
            }
        }

        for role_id in self.access.staff_roles() {
            let read_only = PermissionOverwrite::role(
                role_id,
                Permissions::VIEW_CHANNEL | Permissions::READ_MESSAGE_HISTORY,
                Permissions::SEND_MESSAGES,
            );
            if let Err(e) = self.gateway.edit_permission(channel_id, read_only).await {
                self.step_failed(channel_id, "staff_read_only", &e, failed_steps)
                    .await;
            }
        }

        if let Some(name) = archived_channel_name(&channel.name) {
            if let Err(e) = self.gateway.rename_channel(channel_id, &name).await {
                self.step_failed(channel_id, "rename", &e, failed_steps).await;
            }
        }
    }

    /// Post the transcript to the archive target when it is a text channel.
    async fn notify_archive(&self, record: &TicketRecord, failed_steps: &mut Vec<String>) {
        let Some(target_id) = self.settings.archive_target_id.as_deref() else {
            return;
        };
        let channel_id = record.channel_id.as_str();

        let target = match self.gateway.get_channel(target_id).await {
            Ok(Some(target)) if target.kind == ChannelKind::Text => target,
            Ok(_) => return,
            Err(e) => {
                self.step_failed(channel_id, "resolve_archive_target", &e, failed_steps)
                    .await;
                return;
            }
        };

        let notice = self.embed(
            "Ticket archived",
            format!("Channel: <#{}>\nOpener: <@{}>", channel_id, record.opener_id),
            ARCHIVE_NOTICE_COLOR,
        );
        let mut message = OutgoingMessage::embed(notice);
        match self.transcripts.read(channel_id).await {
            Ok(data) => {
                message = message.with_attachment(Attachment {
                    filename: format!("transcript-{}.html", channel_id),
                    content_type: "text/html".to_string(),
                    data,
                });
            }
            Err(e) => warn!(channel_id = %channel_id, "Transcript not attachable: {}", e),
        }

        if let Err(e) = self.gateway.send_message(&target.id, message).await {
            self.step_failed(channel_id, "notify_archive", &e, failed_steps)
                .await;
        }
    }

    async fn step_failed(
        &self,
        channel_id: &str,
        step: &str,
        cause: &(dyn Display + Sync),
        failed_steps: &mut Vec<String>,
    ) {
        warn!(channel_id = %channel_id, step = step, "Close step failed: {}", cause);
        failed_steps.push(step.to_string());
        self.emit(TicketEvent::ArchiveStepFailed {
            channel_id: channel_id.to_string(),
            step: step.to_string(),
            error: cause.to_string(),
        })
        .await;
    }

    // =========================================================================
    // Members and activity
    // =========================================================================

    /// Give `user` access to the ticket. Returns whether the member set changed.
    pub async fn add_member(
        &self,
        channel_id: &str,
        user: &UserRef,
        actor: &UserRef,
    ) -> Result<bool, TicketError> {
        self.require_ticket(channel_id).await?;

        let access = PermissionOverwrite::member(
            &user.id,
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY,
            Permissions::NONE,
        );
        self.gateway.edit_permission(channel_id, access).await?;

        let target = channel_id.to_string();
        let user_id = user.id.clone();
        let changed = self
            .index
            .submit(move |records| {
                let record = find_mut(records, &target)?;
                Ok(record.add_member(&user_id))
            })
            .await?;

        if changed {
            self.emit(TicketEvent::MemberAdded {
                channel_id: channel_id.to_string(),
                user_id: user.id.clone(),
                added_by: actor.id.clone(),
            })
            .await;
        }
        Ok(changed)
    }

    /// Revoke `user`'s access. The opener cannot be removed.
    pub async fn remove_member(
        &self,
        channel_id: &str,
        user: &UserRef,
        actor: &UserRef,
    ) -> Result<bool, TicketError> {
        let record = self.require_ticket(channel_id).await?;
        if record.opener_id == user.id {
            return Err(TicketError::CannotRemoveOpener);
        }

        if let Err(e) = self.gateway.delete_permission(channel_id, &user.id).await {
            warn!(
                channel_id = %channel_id,
                user_id = %user.id,
                "Failed to revoke member overwrite: {}",
                e
            );
        }

        let target = channel_id.to_string();
        let user_id = user.id.clone();
        let changed = self
            .index
            .submit(move |records| {
                let record = find_mut(records, &target)?;
                Ok(record.remove_member(&user_id))
            })
            .await?;

        if changed {
            self.emit(TicketEvent::MemberRemoved {
                channel_id: channel_id.to_string(),
                user_id: user.id.clone(),
                removed_by: actor.id.clone(),
            })
            .await;
        }
        Ok(changed)
    }

    /// Record a message posted in `channel_id`.
    ///
    /// Returns `false` when the channel is not a ticket.
    pub async fn track_activity(
        &self,
        channel_id: &str,
        message: &ChannelMessage,
    ) -> Result<bool, TicketError> {
        if self.index.find_by_channel(channel_id).await?.is_none() {
            return Ok(false);
        }

        let target = channel_id.to_string();
        let now = Utc::now();
        let touched = self
            .index
            .submit(move |records| {
                find_mut(records, &target)?.touch(now);
                Ok(())
            })
            .await;
        match touched.map_err(TicketError::from) {
            Ok(()) => {}
            // closed in between
            Err(TicketError::NotATicket(_)) => return Ok(false),
            Err(e) => return Err(e),
        }

        if let Err(e) = self
            .transcripts
            .append_message(channel_id, &TranscriptMessage::from(message))
            .await
        {
            warn!(channel_id = %channel_id, "Failed to append to message log: {}", e);
        }
        Ok(true)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn ticket(&self, channel_id: &str) -> Result<Option<TicketRecord>, TicketError> {
        Ok(self.index.find_by_channel(channel_id).await?)
    }

    pub async fn tickets(&self) -> Result<Vec<TicketRecord>, TicketError> {
        Ok(self.index.snapshot().await?)
    }

    pub async fn rate_limit_remaining(&self, user_id: &str) -> Option<u64> {
        self.rate_limiter.is_limited(user_id).await
    }

    /// Where a staff-facing transcript for `channel_id` lives.
    pub fn transcript_path(&self, channel_id: &str) -> PathBuf {
        self.transcripts.transcript_path(channel_id)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn require_ticket(&self, channel_id: &str) -> Result<TicketRecord, TicketError> {
        self.index
            .find_by_channel(channel_id)
            .await?
            .ok_or_else(|| TicketError::NotATicket(channel_id.to_string()))
    }

    /// Resolve a configured target to a category id.
    ///
    /// A category resolves to itself; a text, voice or announcement channel
    /// to its parent.
    async fn resolve_parent(&self, target_id: Option<&str>) -> Option<String> {
        let target_id = target_id?;
        match self.gateway.get_channel(target_id).await {
            Ok(Some(target)) => match target.kind {
                ChannelKind::Category => Some(target.id),
                ChannelKind::Text | ChannelKind::Voice | ChannelKind::Announcement => {
                    target.parent_id
                }
                ChannelKind::Other => None,
            },
            Ok(None) => {
                warn!(target_id = %target_id, "Configured parent target does not exist");
                None
            }
            Err(e) => {
                warn!(target_id = %target_id, "Failed to resolve parent target: {}", e);
                None
            }
        }
    }

    fn embed(&self, title: &str, description: String, color: u32) -> Embed {
        Embed {
            title: title.to_string(),
            description,
            color,
            footer: Some(self.settings.footer_text.clone()).filter(|f| !f.is_empty()),
        }
    }

    pub(crate) async fn emit(&self, event: TicketEvent) {
        if let Some(ref events) = self.events {
            events.emit(event).await;
        }
    }
}

fn find_mut<'a>(
    records: &'a mut [TicketRecord],
    channel_id: &str,
) -> Result<&'a mut TicketRecord, MutationError> {
    records
        .iter_mut()
        .find(|r| r.channel_id == channel_id)
        .ok_or_else(|| MutationError::NotFound(channel_id.to_string()))
}
