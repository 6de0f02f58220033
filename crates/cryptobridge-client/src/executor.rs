//! Cryptotool executor -- one async method per tool operation.
//!
//! Every call validates its parameters, runs the tool once, rejects a
//! non-zero exit, surfaces stderr, and decodes stdout. Parameter errors are
//! returned before any process is spawned.

use std::sync::Arc;

use tracing::{debug, warn};

use cryptobridge_exec::ProcessInvoker;
use cryptobridge_protocol::{
    AccessCommandV0, AccessCommandV1, AccessGrant, DeviceCommand, HmacCommand, HmacVerifyCommand,
    KeysCommand, SignCommand, ToolCommand, VerifyCommand, VersionCommand,
};
use cryptobridge_types::{
    AccessCertificate, BridgeConfig, BridgeError, DeviceCertificate, Hmac, Keys, ProcessResult,
    Signature, Validity, Version,
};

/// Handle to the cryptotool.
///
/// Cloning is cheap and clones share the same immutable invoker, so a single
/// `Cryptotool` can be handed to any number of concurrent tasks. Each call
/// owns its own process.
#[derive(Debug, Clone)]
pub struct Cryptotool {
    invoker: Arc<ProcessInvoker>,
}

impl Cryptotool {
    /// Validate `config` and build an executor from it.
    pub fn new(config: &BridgeConfig) -> Result<Self, BridgeError> {
        config.validate()?;
        Ok(Self::from_invoker(ProcessInvoker::new(config)))
    }

    /// Wrap an already configured invoker without validating it.
    pub fn from_invoker(invoker: ProcessInvoker) -> Self {
        Self {
            invoker: Arc::new(invoker),
        }
    }

    pub fn invoker(&self) -> &ProcessInvoker {
        &self.invoker
    }

    /// Run any command and decode its answer.
    ///
    /// A non-zero exit fails with [`BridgeError::NonZeroExit`] even when the
    /// expected success line was printed.
    pub async fn execute<C: ToolCommand>(&self, command: &C) -> Result<C::Output, BridgeError> {
        let argv = command.argv();
        let result = self.invoker.run(&argv).await?;
        check_status(command.name(), &result)?;

        if result.has_errors() {
            warn!(
                command = command.name(),
                stderr = %result.stderr.join(" | "),
                "cryptotool wrote to stderr"
            );
        }

        let output = command.decode(&result)?;
        debug!(command = command.name(), "cryptotool output decoded");
        Ok(output)
    }

    pub async fn version(&self) -> Result<Version, BridgeError> {
        self.execute(&VersionCommand).await
    }

    pub async fn generate_keys(&self) -> Result<Keys, BridgeError> {
        self.execute(&KeysCommand).await
    }

    pub async fn generate_signature(
        &self,
        message: &str,
        private_key: &str,
    ) -> Result<Signature, BridgeError> {
        self.execute(&SignCommand::new(message, private_key)?).await
    }

    /// A signature that does not match yields [`Validity::Invalid`], not an error.
    pub async fn verify_signature(
        &self,
        message: &str,
        signature: &str,
        public_key: &str,
    ) -> Result<Validity, BridgeError> {
        self.execute(&VerifyCommand::new(message, signature, public_key)?)
            .await
    }

    pub async fn generate_hmac(&self, message: &str, key: &str) -> Result<Hmac, BridgeError> {
        self.execute(&HmacCommand::new(message, key)?).await
    }

    pub async fn verify_hmac(
        &self,
        message: &str,
        key: &str,
        hmac: &str,
    ) -> Result<Validity, BridgeError> {
        self.execute(&HmacVerifyCommand::new(message, key, hmac)?)
            .await
    }

    /// Issue a certificate in the legacy layout, which carries no issuer.
    pub async fn create_access_certificate_v0(
        &self,
        grant: AccessGrant,
    ) -> Result<AccessCertificate, BridgeError> {
        self.execute(&AccessCommandV0::new(grant)).await
    }

    /// Issue a certificate signed on behalf of `issuer` (the issuer name in hex).
    pub async fn create_access_certificate_v1(
        &self,
        issuer: &str,
        grant: AccessGrant,
    ) -> Result<AccessCertificate, BridgeError> {
        self.execute(&AccessCommandV1::new(issuer, grant)?).await
    }

    pub async fn create_device_certificate(
        &self,
        issuer: &str,
        app_id: &str,
        serial: &str,
        public_key: &str,
    ) -> Result<DeviceCertificate, BridgeError> {
        self.execute(&DeviceCommand::new(issuer, app_id, serial, public_key)?)
            .await
    }
}

fn check_status(command: &str, result: &ProcessResult) -> Result<(), BridgeError> {
    if result.success() {
        return Ok(());
    }
    warn!(
        command,
        status = result.status,
        stderr_lines = result.stderr.len(),
        "cryptotool exited with failure"
    );
    Err(BridgeError::NonZeroExit {
        command: command.to_string(),
        status: result.status,
        stderr: result.stderr.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use tracing_subscriber::fmt::MakeWriter;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("cryptotool");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        path
    }

    fn tool(body: &str) -> (tempfile::TempDir, Cryptotool) {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), body);
        let tool = Cryptotool::new(&BridgeConfig::new(exe, dir.path())).unwrap();
        (dir, tool)
    }

    #[test]
    fn new_rejects_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::new(dir.path().join("absent"), dir.path());
        let err = Cryptotool::new(&config).unwrap_err();
        assert!(matches!(err, BridgeError::ConfigError(_)));
    }

    #[tokio::test]
    async fn nonzero_exit_wins_over_success_line() {
        let (_dir, tool) = tool("echo 'SIGNATURE: abc'\necho 'key rejected' >&2\nexit 3");
        let err = tool.generate_signature("msg", "priv").await.unwrap_err();
        match &err {
            BridgeError::NonZeroExit {
                command, status, ..
            } => {
                assert_eq!(command, "sign");
                assert_eq!(*status, 3);
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
        assert_eq!(err.stderr(), ["key rejected".to_string()]);
    }

    /// Log sink shared between a test and its tracing subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn stderr_on_success_is_logged_as_warning() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (_dir, tool) = tool("echo 'deprecated curve' >&2\necho 'HMAC: 00ff'");
        let hmac = tool.generate_hmac("msg", "key").await.unwrap();
        assert_eq!(hmac.as_str(), "00ff");

        let logged = logs.contents();
        assert!(logged.contains("WARN"), "{logged}");
        assert!(logged.contains("cryptotool wrote to stderr"), "{logged}");
        assert!(logged.contains("deprecated curve"), "{logged}");
        assert!(logged.contains("hmac"), "{logged}");
    }

    #[tokio::test]
    async fn quiet_success_logs_no_warning() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (_dir, tool) = tool("echo 'HMAC: 00ff'");
        tool.generate_hmac("msg", "key").await.unwrap();

        assert!(logs.contents().is_empty(), "{}", logs.contents());
    }

    #[tokio::test]
    async fn invalid_arguments_spawn_nothing() {
        let (dir, tool) = tool("touch \"$(dirname \"$0\")/spawned\"\necho 'SIGNATURE: x'");
        let err = tool.generate_signature("msg", "").await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(!dir.path().join("spawned").exists());
    }

    #[tokio::test]
    async fn clones_share_the_invoker() {
        let (_dir, tool) = tool("echo 'Cryptotool version 1.4'");
        let clone = tool.clone();
        assert!(Arc::ptr_eq(&tool.invoker, &clone.invoker));
        assert_eq!(clone.version().await.unwrap().full_version(), "1.4.0");
    }

    #[tokio::test]
    async fn mismatched_verification_is_not_an_error() {
        let (_dir, tool) = tool("echo 'VERIFY: FALSE'");
        let validity = tool.verify_signature("msg", "sig", "pub").await.unwrap();
        assert_eq!(validity, Validity::Invalid);
    }
}
