//! Voice script generation and synthesis collaborators
//!
//! The generator renders a fixed intro monologue for a task and hands it to a
//! [`VoiceSynthesizer`]. Whatever the synthesizer returns is passed back
//! untouched; nothing is cached between calls.

use crate::error::FinnyError;
use crate::models::{AudioChunk, ChunkedAudio, MeetingStyle, VoiceClip, VoiceRequest};
use crate::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

pub mod lava;
pub use lava::LavaSynthesizer;

pub const PERSONA_VOICE: &str = "professional-female";
pub const DEFAULT_VOICE: &str = "alloy";
pub const CHUNK_MAX_CHARS: usize = 200;
pub const MP3_DATA_URL_PREFIX: &str = "data:audio/mp3;base64,";

const MIN_SPEED: f32 = 0.25;
const MAX_SPEED: f32 = 4.0;

/// Text-to-speech collaborator
#[async_trait]
pub trait VoiceSynthesizer: Send + Sync {
    fn name(&self) -> &'static str;
    async fn synthesize(&self, request: &VoiceRequest) -> Result<VoiceClip>;

    /// Raw MP3 bytes; by default decoded from the clip's inline data URL
    async fn synthesize_audio(&self, request: &VoiceRequest) -> Result<Vec<u8>> {
        let clip = self.synthesize(request).await?;
        decode_data_url(&clip.audio_url).ok_or_else(|| {
            FinnyError::VoiceError(format!(
                "{} synthesizer returned no inline audio",
                self.name()
            ))
        })
    }
}

/// Payload of a `data:<mime>;base64,<payload>` URL
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let (_, payload) = url.strip_prefix("data:")?.split_once(";base64,")?;
    STANDARD.decode(payload).ok()
}

/// Demo synthesizer: no audio is produced, only a plausible reference
pub struct DemoSynthesizer;

#[async_trait]
impl VoiceSynthesizer for DemoSynthesizer {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn synthesize(&self, request: &VoiceRequest) -> Result<VoiceClip> {
        let voice = if request.voice.is_empty() {
            "default"
        } else {
            request.voice.as_str()
        };

        Ok(VoiceClip {
            audio_url: format!(
                "https://demo-audio.finny.ai/{}/{}.mp3",
                voice,
                Utc::now().timestamp_millis()
            ),
            // ~60ms per character
            duration: request.text.chars().count() as f64 * 0.06,
            script: split_sentences(&request.text),
        })
    }
}

/// What the meeting wants spoken
#[derive(Debug, Clone)]
pub struct VoiceContext {
    pub task_title: String,
    pub task_description: String,
    pub style: MeetingStyle,
}

/// Renders the FINNY intro and forwards it for synthesis
#[derive(Clone)]
pub struct VoiceAgent {
    synthesizer: Arc<dyn VoiceSynthesizer>,
}

impl VoiceAgent {
    pub fn new(synthesizer: Arc<dyn VoiceSynthesizer>) -> Self {
        Self { synthesizer }
    }

    pub async fn generate_script_and_audio(&self, context: &VoiceContext) -> Result<VoiceClip> {
        let text = render_intro(context);

        debug!(
            synthesizer = self.synthesizer.name(),
            style = %context.style,
            chars = text.len(),
            "Requesting intro audio"
        );

        let clip = self
            .synthesizer
            .synthesize(&VoiceRequest {
                text,
                voice: PERSONA_VOICE.to_string(),
                speed: 1.0,
            })
            .await?;

        info!(
            audio_url = %clip.audio_url,
            sentences = clip.script.len(),
            "Intro audio ready"
        );

        Ok(clip)
    }
}

/// Fill the style's template with the task title and description
pub fn render_intro(context: &VoiceContext) -> String {
    let title = &context.task_title;
    let description = &context.task_description;

    match context.style {
        MeetingStyle::Finance => format!(
            "Hello! I'm FINNY, your AI CFO assistant. \
             We're discussing {title}. {description}. \
             Let me walk you through the key insights and recommendations. \
             First, let's review your financial position and burn rate. \
             Next, I'll share optimization opportunities. \
             Finally, I'll provide actionable next steps."
        ),
        MeetingStyle::General => format!(
            "Hi there! I'm FINNY. We're here to discuss {title}. \
             {description}. Let's dive right in."
        ),
    }
}

/// Split on runs of sentence terminators, dropping blank pieces
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Group sentences into chunks of roughly `max_length` characters
pub fn split_into_chunks(text: &str, max_length: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_length = 0usize;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();

        if current_length + sentence_len > max_length && !current.is_empty() {
            chunks.push(current.join(" "));
            current = vec![sentence];
            current_length = sentence_len;
        } else {
            current.push(sentence);
            current_length += sentence_len + 1;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

/// Synthesize `text` chunk by chunk, in order, with running start times
pub async fn synthesize_chunks(
    synthesizer: &dyn VoiceSynthesizer,
    text: &str,
    voice: &str,
    speed: f32,
    max_length: usize,
) -> Result<ChunkedAudio> {
    let mut chunks: Vec<AudioChunk> = Vec::new();
    let mut elapsed = 0.0;

    for (index, chunk) in split_into_chunks(text, max_length).into_iter().enumerate() {
        let clip = synthesizer
            .synthesize(&VoiceRequest {
                text: chunk.clone(),
                voice: voice.to_string(),
                speed,
            })
            .await?;

        chunks.push(AudioChunk {
            index,
            text: chunk,
            audio_url: clip.audio_url,
            duration: clip.duration,
            start_time: elapsed,
        });
        elapsed += clip.duration;
    }

    Ok(ChunkedAudio {
        total_chunks: chunks.len(),
        total_duration: elapsed,
        chunks,
    })
}

/// Reject requests the TTS provider would refuse anyway
pub fn validate_request(request: &VoiceRequest) -> Result<()> {
    if request.text.trim().is_empty() {
        return Err(FinnyError::InvalidInput("text must not be empty".to_string()));
    }
    if !(MIN_SPEED..=MAX_SPEED).contains(&request.speed) {
        return Err(FinnyError::InvalidInput(format!(
            "speed must be between {} and {}",
            MIN_SPEED, MAX_SPEED
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the last request and echoes a fixed clip
    struct RecordingSynthesizer {
        last: Mutex<Option<VoiceRequest>>,
    }

    #[async_trait]
    impl VoiceSynthesizer for RecordingSynthesizer {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn synthesize(&self, request: &VoiceRequest) -> Result<VoiceClip> {
            *self.last.lock().unwrap() = Some(request.clone());
            Ok(VoiceClip {
                audio_url: "mem://clip".to_string(),
                duration: 1.5,
                script: vec!["fixed".to_string()],
            })
        }
    }

    fn context(style: MeetingStyle) -> VoiceContext {
        VoiceContext {
            task_title: "Cut SaaS Subscriptions".to_string(),
            task_description: "Review and cancel unused subscriptions".to_string(),
            style,
        }
    }

    #[test]
    fn test_render_finance_intro() {
        let text = render_intro(&context(MeetingStyle::Finance));
        assert!(text.starts_with("Hello! I'm FINNY, your AI CFO assistant."));
        assert!(text.contains("We're discussing Cut SaaS Subscriptions."));
        assert!(text.contains("Review and cancel unused subscriptions."));
        assert!(text.ends_with("Finally, I'll provide actionable next steps."));
    }

    #[test]
    fn test_render_general_intro() {
        let text = render_intro(&context(MeetingStyle::General));
        assert_eq!(
            text,
            "Hi there! I'm FINNY. We're here to discuss Cut SaaS Subscriptions. \
             Review and cancel unused subscriptions. Let's dive right in."
        );
    }

    #[test]
    fn test_split_sentences() {
        let parts = split_sentences("Hello! I'm FINNY... Ready?  ");
        assert_eq!(parts, vec!["Hello", "I'm FINNY", "Ready"]);
        assert!(split_sentences("  ...!? ").is_empty());
    }

    #[test]
    fn test_split_into_chunks_respects_limit() {
        let text = "Alpha beta. Gamma delta. Epsilon zeta.";
        assert_eq!(split_into_chunks(text, 200), vec!["Alpha beta Gamma delta Epsilon zeta"]);

        let chunks = split_into_chunks(text, 15);
        assert_eq!(chunks, vec!["Alpha beta", "Gamma delta", "Epsilon zeta"]);
    }

    #[tokio::test]
    async fn test_agent_returns_synthesizer_output_verbatim() {
        let synth = Arc::new(RecordingSynthesizer { last: Mutex::new(None) });
        let agent = VoiceAgent::new(synth.clone());

        let clip = agent
            .generate_script_and_audio(&context(MeetingStyle::Finance))
            .await
            .unwrap();

        assert_eq!(clip.audio_url, "mem://clip");
        assert_eq!(clip.duration, 1.5);
        assert_eq!(clip.script, vec!["fixed"]);

        let sent = synth.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.voice, PERSONA_VOICE);
        assert_eq!(sent.speed, 1.0);
        assert_eq!(sent.text, render_intro(&context(MeetingStyle::Finance)));
    }

    #[tokio::test]
    async fn test_demo_synthesizer() {
        let clip = DemoSynthesizer
            .synthesize(&VoiceRequest {
                text: "One. Two!".to_string(),
                voice: "nova".to_string(),
                speed: 1.0,
            })
            .await
            .unwrap();

        assert!(clip.audio_url.starts_with("https://demo-audio.finny.ai/nova/"));
        assert!(clip.audio_url.ends_with(".mp3"));
        assert!((clip.duration - 9.0 * 0.06).abs() < 1e-9);
        assert_eq!(clip.script, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn test_synthesize_chunks_accumulates_start_times() {
        let text = "First sentence here. Second sentence here. Third one.";

        let audio = synthesize_chunks(&DemoSynthesizer, text, DEFAULT_VOICE, 1.0, 5)
            .await
            .unwrap();

        assert_eq!(audio.total_chunks, 3);
        assert_eq!(audio.chunks[0].start_time, 0.0);
        assert_eq!(audio.chunks[1].start_time, audio.chunks[0].duration);
        assert_eq!(
            audio.chunks[2].start_time,
            audio.chunks[0].duration + audio.chunks[1].duration
        );
        assert_eq!(audio.chunks[2].text, "Third one");

        let summed: f64 = audio.chunks.iter().map(|c| c.duration).sum();
        assert!((audio.total_duration - summed).abs() < 1e-9);
    }

    #[test]
    fn test_decode_data_url() {
        let url = format!("{}{}", MP3_DATA_URL_PREFIX, STANDARD.encode(b"ID3mp3"));
        assert_eq!(decode_data_url(&url), Some(b"ID3mp3".to_vec()));
        assert_eq!(decode_data_url("https://demo-audio.finny.ai/a.mp3"), None);
        assert_eq!(decode_data_url("data:audio/mp3;base64,@@@"), None);
    }

    #[tokio::test]
    async fn test_raw_audio_needs_inline_clip() {
        let request = VoiceRequest {
            text: "Hello.".to_string(),
            voice: DEFAULT_VOICE.to_string(),
            speed: 1.0,
        };
        let err = DemoSynthesizer.synthesize_audio(&request).await.unwrap_err();
        assert!(matches!(err, FinnyError::VoiceError(_)));
    }

    #[test]
    fn test_validate_request() {
        let ok = VoiceRequest {
            text: "hi".to_string(),
            voice: DEFAULT_VOICE.to_string(),
            speed: 1.0,
        };
        assert!(validate_request(&ok).is_ok());

        let too_fast = VoiceRequest { speed: 5.0, ..ok.clone() };
        assert!(matches!(validate_request(&too_fast), Err(FinnyError::InvalidInput(_))));

        let blank = VoiceRequest { text: "  ".to_string(), ..ok };
        assert!(validate_request(&blank).is_err());
    }
}
