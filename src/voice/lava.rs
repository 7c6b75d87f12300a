//! OpenAI text-to-speech, reached through the Lava forwarding proxy
//!
//! Uses a long-lived reqwest::Client for connection pooling.

use super::{split_sentences, VoiceSynthesizer, MP3_DATA_URL_PREFIX};
use crate::config::LavaConfig;
use crate::error::FinnyError;
use crate::models::{VoiceClip, VoiceRequest};
use crate::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

const TTS_MODEL: &str = "tts-1";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
}

pub struct LavaSynthesizer {
    client: Client,
    config: LavaConfig,
}

impl LavaSynthesizer {
    pub fn new(config: LavaConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self { client, config })
    }

    /// MP3 bytes straight from the TTS provider
    async fn fetch_audio(&self, request: &VoiceRequest) -> Result<Vec<u8>> {
        if self.config.api_key.is_empty() {
            return Err(FinnyError::VoiceError(
                "Lava API key not configured".to_string(),
            ));
        }

        let body = SpeechRequest {
            model: TTS_MODEL,
            input: &request.text,
            voice: &request.voice,
            speed: request.speed,
        };

        info!(voice = %request.voice, chars = request.text.len(), "Calling Lava TTS");

        let response = self
            .client
            .post(self.config.tts_url())
            .bearer_auth(self.config.token())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("TTS request failed: {}", e);
                FinnyError::VoiceError(format!("TTS generation failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "TTS error response: {}", error_text);
            return Err(FinnyError::VoiceError(format!("TTS error: {}", error_text)));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| FinnyError::VoiceError(format!("TTS body read failed: {}", e)))?;

        Ok(audio.to_vec())
    }
}

#[async_trait]
impl VoiceSynthesizer for LavaSynthesizer {
    fn name(&self) -> &'static str {
        "lava"
    }

    async fn synthesize(&self, request: &VoiceRequest) -> Result<VoiceClip> {
        let audio = self.fetch_audio(request).await?;

        Ok(VoiceClip {
            audio_url: format!("{}{}", MP3_DATA_URL_PREFIX, STANDARD.encode(&audio)),
            duration: estimate_duration(&request.text, request.speed),
            script: split_sentences(&request.text),
        })
    }

    async fn synthesize_audio(&self, request: &VoiceRequest) -> Result<Vec<u8>> {
        self.fetch_audio(request).await
    }
}

/// Rough estimate: four characters per second at normal speed
fn estimate_duration(text: &str, speed: f32) -> f64 {
    let speed = if speed > 0.0 { speed as f64 } else { 1.0 };
    text.chars().count() as f64 / (4.0 * speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_request_serialization() {
        let body = SpeechRequest {
            model: TTS_MODEL,
            input: "Hello there",
            voice: "alloy",
            speed: 1.0,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "tts-1");
        assert_eq!(json["input"], "Hello there");
        assert_eq!(json["voice"], "alloy");
    }

    #[test]
    fn test_estimate_duration() {
        assert_eq!(estimate_duration("abcdefgh", 1.0), 2.0);
        assert_eq!(estimate_duration("abcdefgh", 2.0), 1.0);
        assert_eq!(estimate_duration("abcd", 0.0), 1.0);
    }

    #[tokio::test]
    async fn test_missing_key_is_voice_error() {
        let synth = LavaSynthesizer::new(LavaConfig {
            api_key: String::new(),
            connection_secret: String::new(),
            product_secret: String::new(),
            forward_url: String::new(),
            chat_url: None,
        })
        .unwrap();

        let err = synth
            .synthesize(&VoiceRequest {
                text: "hi".to_string(),
                voice: "alloy".to_string(),
                speed: 1.0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FinnyError::VoiceError(_)));
    }
}
