use crate::config::AdbConfig;
use anyhow::{bail, Context, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Startup connection retry policy: bounded attempts with a fixed delay.
const CONNECT_ATTEMPTS: u32 = 3;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct AdbResult {
    pub exit_code: i32,
    pub output: String,
    pub error: String,
}

impl AdbResult {
    /// adb sometimes exits 0 while printing `error:` on stderr, so both
    /// are checked.
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.error.to_lowercase().contains("error:")
    }
}

/// Thin wrapper around the adb binary. Every call spawns a fresh process
/// with captured output and a hard timeout; the child is killed when the
/// timeout fires or the future is dropped.
#[derive(Debug, Clone)]
pub struct AdbClient {
    path: String,
    serial: Option<String>,
}

impl AdbClient {
    pub fn new(path: &str, serial: Option<String>) -> Self {
        AdbClient {
            path: path.to_string(),
            serial,
        }
    }

    pub async fn execute(&self, args: &[&str], timeout_ms: u64) -> Result<AdbResult> {
        let mut command = Command::new(&self.path);
        if let Some(serial) = &self.serial {
            command.arg("-s").arg(serial);
        }
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        log::debug!("adb {}", args.join(" "));

        let output = tokio::time::timeout(Duration::from_millis(timeout_ms), command.output())
            .await
            .map_err(|_| {
                anyhow::anyhow!("adb command timed out after {timeout_ms}ms: adb {}", args.join(" "))
            })?
            .with_context(|| format!("failed to run adb at '{}'", self.path))?;

        Ok(AdbResult {
            exit_code: output.status.code().unwrap_or(-1),
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
            error: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Establishes and checks reachability of the wireless-debugging device.
/// Owns the bounded startup retry; the pipeline itself never retries
/// connections.
pub struct AdbConnectionManager {
    settings: AdbConfig,
    device_address: String,
}

impl AdbConnectionManager {
    pub fn new(settings: AdbConfig) -> Self {
        let device_address = format!("{}:{}", settings.device_ip, settings.port);
        AdbConnectionManager {
            settings,
            device_address,
        }
    }

    pub fn device_address(&self) -> &str {
        &self.device_address
    }

    /// Connect with the fixed retry policy. Still unreachable after the
    /// last attempt is a fatal startup condition for the caller.
    pub async fn connect_with_retry(&self) -> Result<()> {
        for attempt in 1..=CONNECT_ATTEMPTS {
            match self.ensure_connected().await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < CONNECT_ATTEMPTS => {
                    log::warn!(
                        "connect attempt {attempt}/{CONNECT_ATTEMPTS} failed: {e}; retrying"
                    );
                    tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!(
                            "device {} unreachable after {CONNECT_ATTEMPTS} attempts",
                            self.device_address
                        )
                    });
                }
            }
        }
        unreachable!("retry loop always returns");
    }

    async fn ensure_connected(&self) -> Result<()> {
        if self.is_device_online().await {
            return Ok(());
        }

        log::info!("connecting to {}", self.device_address);

        // `adb connect` must not carry the -s flag.
        let client = AdbClient::new(&self.settings.path, None);
        let result = client
            .execute(
                &["connect", self.device_address.as_str()],
                self.settings.command_timeout_ms,
            )
            .await?;

        if result.output.to_lowercase().contains("connected") {
            log::info!("connected to {}", self.device_address);
            return Ok(());
        }

        bail!(
            "failed to connect to {}: {} {}",
            self.device_address,
            result.output.trim(),
            result.error.trim()
        );
    }

    async fn is_device_online(&self) -> bool {
        let client = AdbClient::new(&self.settings.path, None);
        let result = match client
            .execute(&["devices"], self.settings.command_timeout_ms)
            .await
        {
            Ok(result) if result.success() => result,
            _ => return false,
        };

        result
            .output
            .lines()
            .any(|line| line.contains(&self.device_address) && line.contains("device"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_success_requires_clean_stderr() {
        let ok = AdbResult {
            exit_code: 0,
            output: "Row: 0".to_string(),
            error: String::new(),
        };
        assert!(ok.success());

        let stderr_error = AdbResult {
            exit_code: 0,
            output: String::new(),
            error: "error: device offline".to_string(),
        };
        assert!(!stderr_error.success());

        let nonzero = AdbResult {
            exit_code: 1,
            output: String::new(),
            error: String::new(),
        };
        assert!(!nonzero.success());
    }

    #[test]
    fn test_device_address_format() {
        let manager = AdbConnectionManager::new(AdbConfig {
            device_ip: "192.168.1.50".to_string(),
            port: 5555,
            ..Default::default()
        });
        assert_eq!(manager.device_address(), "192.168.1.50:5555");
    }
}
