use crate::scenario::CommandSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

/// 실행 불가나 시간 초과 시 기록하는 종료 코드이다.
pub const FAILED_TO_RUN_EXIT_CODE: i32 = -1;
/// dry-run 모드에서 반환하는 표준 출력이다.
pub const DRY_RUN_STDOUT: &str = "[DRY RUN] simulated";

/// 명령 한 번의 실행 결과이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// 프로세스 종료 코드. 실행 자체가 실패하면 -1이다.
    pub exit_code: i32,
    /// 버퍼링된 표준 출력 전체.
    pub stdout: String,
    /// 버퍼링된 표준 에러 전체.
    pub stderr: String,
}

impl CommandOutcome {
    /// 종료 코드 0 여부를 반환한다.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// 프로세스를 띄우지 못했거나 기다리지 못한 경우의 결과를 만든다.
    pub fn failed_to_run(message: impl Into<String>) -> Self {
        Self {
            exit_code: FAILED_TO_RUN_EXIT_CODE,
            stdout: String::new(),
            stderr: message.into(),
        }
    }

    /// dry-run 모드의 합성 결과를 만든다.
    pub fn simulated() -> Self {
        Self {
            exit_code: 0,
            stdout: DRY_RUN_STDOUT.to_string(),
            stderr: String::new(),
        }
    }
}

/// CommandRunner는 외부 명령 실행을 위한 추상 계층을 정의한다.
///
/// 구현체는 어떤 경우에도 오류를 반환하지 않는다. 실행 실패는
/// `CommandOutcome`의 종료 코드와 stderr로 표현된다.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// 명령을 실행하고 종료될 때까지 기다린다.
    async fn run(
        &self,
        command: &CommandSpec,
        working_dir: Option<&Path>,
        timeout_duration: Duration,
    ) -> CommandOutcome;

    /// 실제 프로세스를 띄우지 않는 구현인지 여부.
    fn simulated(&self) -> bool {
        false
    }
}

/// CommandRunner를 공유하기 위한 Arc 타입 별칭이다.
pub type SharedRunner = Arc<dyn CommandRunner>;

/// 실제 OS 프로세스를 띄우는 기본 구현이다.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        command: &CommandSpec,
        working_dir: Option<&Path>,
        timeout_duration: Duration,
    ) -> CommandOutcome {
        let shown = command.display();
        debug!("실행: {shown}");
        let mut process = Command::new(command.program());
        process
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // 시간 초과로 future가 버려지면 자식 프로세스도 종료된다.
            .kill_on_drop(true);
        if let Some(dir) = working_dir {
            process.current_dir(dir);
        }
        let child = match process.spawn() {
            Ok(child) => child,
            Err(err) => {
                return CommandOutcome::failed_to_run(format!("명령 실행 실패: {shown}: {err}"));
            }
        };
        match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let outcome = CommandOutcome {
                    exit_code: output.status.code().unwrap_or(FAILED_TO_RUN_EXIT_CODE),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                };
                debug!("종료 코드 {}: {shown}", outcome.exit_code);
                if !outcome.stdout.is_empty() {
                    debug!("STDOUT: {}", outcome.stdout.trim_end());
                }
                if !outcome.stderr.is_empty() {
                    debug!("STDERR: {}", outcome.stderr.trim_end());
                }
                outcome
            }
            Ok(Err(err)) => {
                CommandOutcome::failed_to_run(format!("명령 대기 실패: {shown}: {err}"))
            }
            Err(_) => CommandOutcome::failed_to_run(format!(
                "timeout: {}ms 안에 종료되지 않았습니다: {shown}",
                timeout_duration.as_millis()
            )),
        }
    }
}

/// 프로세스를 띄우지 않고 항상 성공을 반환하는 dry-run 구현이다.
#[derive(Debug, Default, Clone)]
pub struct DryRunRunner;

#[async_trait]
impl CommandRunner for DryRunRunner {
    async fn run(
        &self,
        command: &CommandSpec,
        _working_dir: Option<&Path>,
        _timeout_duration: Duration,
    ) -> CommandOutcome {
        info!("[DRY RUN] 명령: {}", command.display());
        CommandOutcome::simulated()
    }

    fn simulated(&self) -> bool {
        true
    }
}

/// 실행 모드에 맞는 runner를 고른다. dry-run이면 `real`은 호출되지 않는다.
pub fn select_runner(dry_run: bool, real: SharedRunner) -> SharedRunner {
    if dry_run {
        Arc::new(DryRunRunner)
    } else {
        real
    }
}
