//! Task/meeting workflow
//!
//! CREATE MEETING → SUMMARIZE → NOTIFY
//!
//! Voice failure aborts the workflow. Email is best-effort and never
//! changes what the caller gets back.

use crate::activity::ActivityLog;
use crate::email::{notify_best_effort, Delivery, EmailSender};
use crate::models::{
    EmailMessage, Meeting, MeetingContext, MeetingNotes, MeetingStyle, Summary, Task, TaskResult,
};
use crate::summary::{SummaryContext, SummaryGenerator};
use crate::voice::{VoiceAgent, VoiceContext};
use crate::Result;
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub const MEETING_ID_LEN: usize = 9;
pub const MEETING_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const COMPLETED_MEETING_TITLE: &str = "Completed Meeting";

/// Random base-36 meeting id; uniqueness is probabilistic only
pub fn generate_meeting_id() -> String {
    let mut rng = rand::rng();
    (0..MEETING_ID_LEN)
        .map(|_| MEETING_ID_ALPHABET[rng.random_range(0..MEETING_ID_ALPHABET.len())] as char)
        .collect()
}

pub fn meeting_url(meeting_id: &str) -> String {
    format!("/meet/{}", meeting_id)
}

/// Creates meeting references with their intro audio
#[derive(Clone)]
pub struct MeetingAgent {
    voice: VoiceAgent,
}

impl MeetingAgent {
    pub fn new(voice: VoiceAgent) -> Self {
        Self { voice }
    }

    pub async fn create_meeting(&self, context: &MeetingContext) -> Result<Meeting> {
        let meeting_id = generate_meeting_id();
        let meeting_url = meeting_url(&meeting_id);

        let clip = self
            .voice
            .generate_script_and_audio(&VoiceContext {
                task_title: context.task_title.clone(),
                task_description: context.task_description.clone(),
                style: MeetingStyle::Finance,
            })
            .await?;

        info!(meeting_id = %meeting_id, meeting_url = %meeting_url, "Meeting created");

        Ok(Meeting {
            meeting_url,
            meeting_id,
            audio_url: clip.audio_url,
            script: clip.script,
        })
    }
}

/// Coordinates meeting, summary and notification agents
pub struct Orchestrator {
    meeting: MeetingAgent,
    summary: SummaryGenerator,
    mailer: Arc<dyn EmailSender>,
    activity: Arc<ActivityLog>,
}

impl Orchestrator {
    pub fn new(
        meeting: MeetingAgent,
        mailer: Arc<dyn EmailSender>,
        activity: Arc<ActivityLog>,
    ) -> Self {
        Self {
            meeting,
            summary: SummaryGenerator,
            mailer,
            activity,
        }
    }

    /// Run the full workflow for one task
    pub async fn create_task(&self, workspace_id: &str, task: Task) -> Result<TaskResult> {
        let started = Instant::now();
        info!(title = %task.title, "Orchestrator: starting task workflow");

        // === CREATE MEETING ===
        let meeting = self.meeting.create_meeting(&MeetingContext::from(&task)).await?;

        // === SUMMARIZE ===
        let notes = MeetingNotes::default();
        let summary = self.summary.generate(&SummaryContext {
            meeting_id: &meeting.meeting_id,
            task_title: &task.title,
            notes: &notes,
        });

        // === NOTIFY ===
        let message = EmailMessage::new(
            task.email.clone(),
            format!("Meeting Ready: {}", task.title),
            format!("Your meeting is ready! Join here: {}", meeting.meeting_url),
        );
        if let Delivery::Failed(reason) = notify_best_effort(self.mailer.as_ref(), &message).await
        {
            warn!(meeting_id = %meeting.meeting_id, %reason, "Meeting email not delivered");
        }

        self.activity
            .record("meeting_create_task", workspace_id, &task, started.elapsed())
            .await?;

        Ok(TaskResult {
            meeting_url: meeting.meeting_url,
            meeting_id: meeting.meeting_id,
            audio_url: meeting.audio_url,
            script: meeting.script,
            summary: summary.summary,
        })
    }

    /// Produce the final summary for a finished meeting
    pub async fn complete_meeting(
        &self,
        workspace_id: &str,
        meeting_id: &str,
        notes: MeetingNotes,
    ) -> Result<Summary> {
        let started = Instant::now();
        info!(meeting_id, "Orchestrator: completing meeting");

        let summary = self.summary.generate(&SummaryContext {
            meeting_id,
            task_title: COMPLETED_MEETING_TITLE,
            notes: &notes,
        });

        self.activity
            .record("meeting_complete", workspace_id, &notes, started.elapsed())
            .await?;

        Ok(summary)
    }
}
