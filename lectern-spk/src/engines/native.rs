//! Native platform TTS engine
//!
//! Each platform's speech tool is driven as a subprocess:
//! - Linux: `espeak-ng`, text on stdin, WAV on stdout
//! - macOS: `say`, text from a file, AIFF to a file
//! - Windows: SAPI through a PowerShell script, WAV to a file

use crate::engines::{sanitize_text, TtsEngine};
use crate::error::SpeechError;
use crate::voices::VoiceDescriptor;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{info, warn};

#[cfg(target_os = "linux")]
use linux::Backend;
#[cfg(target_os = "macos")]
use macos::Backend;
#[cfg(target_os = "windows")]
use windows::Backend;
#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
use unsupported::Backend;

/// Rate, volume and pitch as configured in `SpeechConfig`
#[derive(Debug, Clone, Copy)]
pub struct Prosody {
    pub rate: u32,
    pub volume: f32,
    pub pitch: f32,
}

/// Native TTS engine (platform-specific)
pub struct NativeTtsEngine {
    backend: Option<Backend>,
    prosody: Prosody,
}

impl NativeTtsEngine {
    pub fn new() -> Self {
        Self::new_with_config(175, 1.0, 0.0)
    }

    pub fn new_with_config(rate: u32, volume: f32, pitch: f32) -> Self {
        let backend = Backend::probe();
        match backend {
            Some(_) => info!("Native TTS engine initialized ({})", Backend::NAME),
            None => warn!("Native TTS engine not available ({} not found)", Backend::NAME),
        }
        Self {
            backend,
            prosody: Prosody { rate, volume, pitch },
        }
    }

    fn backend(&self) -> Result<&Backend, SpeechError> {
        self.backend
            .as_ref()
            .ok_or_else(|| SpeechError::Engine(format!("{} not available", Backend::NAME)))
    }
}

impl Default for NativeTtsEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TtsEngine for NativeTtsEngine {
    async fn synthesize(&self, text: &str, voice: &VoiceDescriptor) -> Result<Bytes, SpeechError> {
        let backend = self.backend()?;
        backend.synthesize(&sanitize_text(text), voice, self.prosody).await
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
        let mut voices = self.backend()?.list_voices().await?;
        // Some tools list a voice once per language it supports
        let mut seen = std::collections::HashSet::new();
        voices.retain(|voice| seen.insert(voice.id.clone()));
        Ok(voices)
    }

    fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    fn name(&self) -> &str {
        "native"
    }
}

/// Command for a speech tool. The child is killed if its future is dropped
/// before it exits, e.g. when a synthesis timeout fires.
#[cfg(any(target_os = "macos", target_os = "linux", target_os = "windows"))]
fn tool_command(program: &str) -> tokio::process::Command {
    let mut command = tokio::process::Command::new(program);
    command.kill_on_drop(true);
    command
}

fn command_failed(tool: &str, stderr: &[u8]) -> SpeechError {
    SpeechError::Engine(format!("{} failed: {}", tool, String::from_utf8_lossy(stderr).trim()))
}

#[cfg(target_os = "linux")]
mod linux {
    use super::*;
    use std::process::Stdio;
    use tokio::io::AsyncWriteExt;

    pub struct Backend;

    impl Backend {
        pub const NAME: &'static str = "espeak-ng";

        pub fn probe() -> Option<Self> {
            std::process::Command::new("espeak-ng")
                .arg("--version")
                .output()
                .ok()
                .filter(|output| output.status.success())
                .map(|_| Backend)
        }

        pub async fn synthesize(
            &self,
            text: &str,
            voice: &VoiceDescriptor,
            prosody: Prosody,
        ) -> Result<Bytes, SpeechError> {
            // espeak-ng: speed in WPM, amplitude 0-200 (100 normal), pitch 0-99 (50 normal)
            let amplitude = ((prosody.volume * 100.0).round() as u32).min(200);
            let pitch = ((50.0 + (prosody.pitch * 49.0)).round() as u32).min(99);

            let mut child = tool_command("espeak-ng")
                .arg("-v")
                .arg(&voice.id)
                .arg("-s")
                .arg(prosody.rate.to_string())
                .arg("-a")
                .arg(amplitude.to_string())
                .arg("-p")
                .arg(pitch.to_string())
                .arg("--stdin")
                .arg("--stdout")
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .map_err(|e| SpeechError::Engine(format!("Failed to run espeak-ng: {}", e)))?;

            // Feed stdin from its own task so a full stdout pipe cannot deadlock us
            let writer = child.stdin.take().map(|mut stdin| {
                let text = text.to_string();
                tokio::spawn(async move {
                    let result = stdin.write_all(text.as_bytes()).await;
                    drop(stdin);
                    result
                })
            });

            let output = child
                .wait_with_output()
                .await
                .map_err(|e| SpeechError::Engine(format!("Failed to wait for espeak-ng: {}", e)))?;

            if let Some(writer) = writer {
                match writer.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!("Failed to write text to espeak-ng: {}", e),
                    Err(e) => warn!("espeak-ng writer task failed: {}", e),
                }
            }

            if !output.status.success() {
                return Err(command_failed("espeak-ng", &output.stderr));
            }

            Ok(Bytes::from(output.stdout))
        }

        pub async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
            let output = tool_command("espeak-ng")
                .arg("--voices")
                .output()
                .await
                .map_err(|e| SpeechError::Engine(format!("Failed to list voices: {}", e)))?;

            if !output.status.success() {
                return Err(command_failed("espeak-ng --voices", &output.stderr));
            }

            Ok(parse_voices(&String::from_utf8_lossy(&output.stdout)))
        }
    }

    /// Parse `espeak-ng --voices`:
    /// `Pty Language Age/Gender VoiceName File Other Languages`
    pub(super) fn parse_voices(listing: &str) -> Vec<VoiceDescriptor> {
        listing
            .lines()
            .skip(1)
            .filter_map(|line| {
                let mut columns = line.split_whitespace();
                let language = columns.nth(1)?;
                let name = columns.nth(1)?;
                if language.chars().any(|c| c.is_control()) {
                    warn!("Voice name contains invalid characters, skipping: {}", language);
                    return None;
                }
                Some(VoiceDescriptor::new(language, name.replace('_', " ")))
            })
            .collect()
    }

}

#[cfg(target_os = "macos")]
mod macos {
    use super::*;
    use std::io::Write;

    pub struct Backend;

    impl Backend {
        pub const NAME: &'static str = "say";

        pub fn probe() -> Option<Self> {
            std::process::Command::new("say")
                .arg("-v")
                .arg("?")
                .output()
                .ok()
                .filter(|output| output.status.success())
                .map(|_| Backend)
        }

        pub async fn synthesize(
            &self,
            text: &str,
            voice: &VoiceDescriptor,
            prosody: Prosody,
        ) -> Result<Bytes, SpeechError> {
            let mut input = tempfile::Builder::new().suffix(".txt").tempfile()?;
            input.write_all(text.as_bytes())?;
            input.flush()?;
            let output_file = tempfile::Builder::new().suffix(".aiff").tempfile()?;

            // `say` has no volume or pitch flags
            let output = tool_command("say")
                .arg("-v")
                .arg(&voice.id)
                .arg("-r")
                .arg(prosody.rate.to_string())
                .arg("-o")
                .arg(output_file.path())
                .arg("-f")
                .arg(input.path())
                .output()
                .await
                .map_err(|e| SpeechError::Engine(format!("Failed to execute say command: {}", e)))?;

            if !output.status.success() {
                return Err(command_failed("say", &output.stderr));
            }

            let audio = tokio::fs::read(output_file.path()).await?;
            Ok(Bytes::from(audio))
        }

        pub async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
            let output = tool_command("say")
                .arg("-v")
                .arg("?")
                .output()
                .await
                .map_err(|e| SpeechError::Engine(format!("Failed to execute say command: {}", e)))?;

            if !output.status.success() {
                return Err(command_failed("say -v ?", &output.stderr));
            }

            Ok(parse_voices(&String::from_utf8_lossy(&output.stdout)))
        }
    }

    /// Parse `say -v ?`: `Name  locale  # sample sentence`. Names may contain spaces.
    pub(super) fn parse_voices(listing: &str) -> Vec<VoiceDescriptor> {
        listing
            .lines()
            .filter_map(|line| {
                let head = line.split('#').next()?.trim();
                let (name, locale) = head.rsplit_once(char::is_whitespace)?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some(VoiceDescriptor::new(name, format!("{} ({})", name, locale.trim())))
            })
            .collect()
    }

}

#[cfg(target_os = "windows")]
mod windows {
    use super::*;
    use std::io::Write;

    pub struct Backend;

    /// Quote a value as a PowerShell single-quoted string literal.
    fn ps_quote(value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    async fn powershell(script: &str) -> Result<std::process::Output, SpeechError> {
        tool_command("powershell")
            .arg("-NoProfile")
            .arg("-NonInteractive")
            .arg("-ExecutionPolicy")
            .arg("Bypass") // Needed for Add-Type
            .arg("-Command")
            .arg(script)
            .output()
            .await
            .map_err(|e| SpeechError::Engine(format!("Failed to execute PowerShell: {}", e)))
    }

    impl Backend {
        pub const NAME: &'static str = "SAPI";

        pub fn probe() -> Option<Self> {
            // SAPI ships with every supported Windows version
            Some(Backend)
        }

        pub async fn synthesize(
            &self,
            text: &str,
            voice: &VoiceDescriptor,
            prosody: Prosody,
        ) -> Result<Bytes, SpeechError> {
            let mut input = tempfile::Builder::new().suffix(".txt").tempfile()?;
            input.write_all(text.as_bytes())?;
            input.flush()?;
            let output_file = tempfile::Builder::new().suffix(".wav").tempfile()?;

            // SpeechSynthesizer.Rate is -10..10 around 0 = ~175 WPM, Volume 0..100
            let synth_rate = ((prosody.rate as f32 - 175.0) / 32.5).round().clamp(-10.0, 10.0) as i32;
            let synth_volume = ((prosody.volume * 100.0).round() as u32).min(100);

            let script = format!(
                r#"
                Add-Type -AssemblyName System.Speech
                $synth = New-Object System.Speech.Synthesis.SpeechSynthesizer
                $synth.SelectVoice({voice})
                $synth.Rate = {rate}
                $synth.Volume = {volume}
                $synth.SetOutputToWaveFile({output})
                $synth.Speak([System.IO.File]::ReadAllText({input}, [System.Text.Encoding]::UTF8))
                $synth.Dispose()
                "#,
                voice = ps_quote(&voice.id),
                rate = synth_rate,
                volume = synth_volume,
                output = ps_quote(&output_file.path().to_string_lossy()),
                input = ps_quote(&input.path().to_string_lossy()),
            );

            let output = powershell(&script).await?;
            if !output.status.success() {
                return Err(command_failed("PowerShell SAPI synthesis", &output.stderr));
            }

            let audio = tokio::fs::read(output_file.path()).await?;
            Ok(Bytes::from(audio))
        }

        pub async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
            let script = r#"
                Add-Type -AssemblyName System.Speech
                $synth = New-Object System.Speech.Synthesis.SpeechSynthesizer
                $synth.GetInstalledVoices() | Where-Object { $_.Enabled } | ForEach-Object { $_.VoiceInfo.Name }
                $synth.Dispose()
            "#;
            let output = powershell(script).await?;
            if !output.status.success() {
                return Err(command_failed("PowerShell voice listing", &output.stderr));
            }

            Ok(String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| VoiceDescriptor::new(name, name))
                .collect())
        }
    }
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
mod unsupported {
    use super::*;

    pub struct Backend;

    impl Backend {
        pub const NAME: &'static str = "native speech";

        pub fn probe() -> Option<Self> {
            None
        }

        pub async fn synthesize(
            &self,
            _text: &str,
            _voice: &VoiceDescriptor,
            _prosody: Prosody,
        ) -> Result<Bytes, SpeechError> {
            Err(SpeechError::Engine("Native TTS not supported on this platform".to_string()))
        }

        pub async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
            Ok(vec![])
        }
    }
}
