use std::io::Write;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use base64::Engine as _;
use jobrelay_core::ClipboardReply;
use jobrelay_logging::{relay_debug, relay_warn};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("no clipboard command available on this platform")]
    Unavailable,
    #[error("clipboard command `{program}` failed: {message}")]
    Command { program: String, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Pipes text into the platform's clipboard utility.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Picks the conventional clipboard command for the running platform.
    pub fn detect() -> Option<Self> {
        if cfg!(target_os = "macos") {
            Some(Self::new("pbcopy", Vec::new()))
        } else if cfg!(target_os = "windows") {
            Some(Self::new("clip", Vec::new()))
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Some(Self::new("wl-copy", Vec::new()))
        } else if std::env::var_os("DISPLAY").is_some() {
            Some(Self::new(
                "xclip",
                vec!["-selection".to_string(), "clipboard".to_string()],
            ))
        } else {
            None
        }
    }
}

#[async_trait::async_trait]
impl Clipboard for CommandClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }
        let output = child.wait_with_output().await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ClipboardError::Command {
                program: self.program.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Stand-in for environments without any clipboard command.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableClipboard;

#[async_trait::async_trait]
impl Clipboard for UnavailableClipboard {
    async fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

/// Legacy selection copy through the terminal's OSC 52 escape sequence.
pub struct Osc52Clipboard {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Osc52Clipboard {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

#[async_trait::async_trait]
impl Clipboard for Osc52Clipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let payload = base64::engine::general_purpose::STANDARD.encode(text);
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| std::io::Error::other("clipboard sink poisoned"))?;
        write!(sink, "\x1b]52;c;{payload}\x07")?;
        sink.flush()?;
        Ok(())
    }
}

/// Platform clipboard first, legacy mechanism when that fails.
#[derive(Clone)]
pub struct ClipboardChain {
    primary: Arc<dyn Clipboard>,
    fallback: Arc<dyn Clipboard>,
}

impl ClipboardChain {
    pub fn new(primary: Arc<dyn Clipboard>, fallback: Arc<dyn Clipboard>) -> Self {
        Self { primary, fallback }
    }

    /// The chain used by default: detected command, then OSC 52 on stdout.
    pub fn system() -> Self {
        let primary: Arc<dyn Clipboard> = match CommandClipboard::detect() {
            Some(command) => Arc::new(command),
            None => Arc::new(UnavailableClipboard),
        };
        Self::new(primary, Arc::new(Osc52Clipboard::stdout()))
    }

    pub async fn copy(&self, text: &str) -> ClipboardReply {
        let primary_err = match self.primary.write_text(text).await {
            Ok(()) => {
                return ClipboardReply {
                    success: true,
                    error: None,
                }
            }
            Err(err) => err,
        };
        relay_debug!("Primary clipboard failed ({}), trying fallback", primary_err);
        match self.fallback.write_text(text).await {
            Ok(()) => ClipboardReply {
                success: true,
                error: None,
            },
            Err(err) => {
                relay_warn!("Clipboard fallback failed: {}", err);
                ClipboardReply {
                    success: false,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn falls_back_to_osc52_when_primary_fails() {
        let buf = SharedBuf::default();
        let chain = ClipboardChain::new(
            Arc::new(UnavailableClipboard),
            Arc::new(Osc52Clipboard::new(Box::new(buf.clone()))),
        );

        let reply = chain.copy("hi").await;

        assert!(reply.success);
        let written = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(written, "\x1b]52;c;aGk=\x07");
    }

    #[tokio::test]
    async fn reports_failure_when_both_fail() {
        let chain = ClipboardChain::new(Arc::new(UnavailableClipboard), Arc::new(UnavailableClipboard));
        let reply = chain.copy("hi").await;
        assert!(!reply.success);
        assert_eq!(
            reply.error.as_deref(),
            Some("no clipboard command available on this platform")
        );
    }
}
