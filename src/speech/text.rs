//! Typed-utterance recognizer (terminal input, scripted sessions)

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::Mutex;

use super::{CancelToken, RecognitionSettings, SpeechRecognizer, Transcript};
use crate::{Error, Result};

/// Treats each non-blank input line as one recognized utterance
pub struct TextRecognizer<R> {
    lines: Mutex<Lines<R>>,
}

impl<R> TextRecognizer<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }
}

impl TextRecognizer<tokio::io::BufReader<tokio::io::Stdin>> {
    /// Read utterances from standard input
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(tokio::io::BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R> SpeechRecognizer for TextRecognizer<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    fn name(&self) -> &'static str {
        "text"
    }

    async fn recognize(
        &self,
        _settings: &RecognitionSettings,
        _cancel: &CancelToken,
    ) -> Result<Transcript> {
        let mut lines = self.lines.lock().await;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if !line.is_empty() {
                return Ok(Transcript {
                    text: line.to_string(),
                    confidence: Some(1.0),
                });
            }
        }

        Err(Error::SpeechUnavailable("input closed".to_string()))
    }
}
