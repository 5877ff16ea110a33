use crate::command::SharedRunner;
use crate::scenario::{CommandSpec, Prerequisite, PrerequisiteKind};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

/// 모듈 import 검사에 사용하는 인터프리터이다.
const PYTHON_PROGRAM: &str = "python3";

/// 실행 전 환경이 시나리오 전제 조건을 만족하는지 검사한다.
pub struct PrerequisiteChecker {
    runner: SharedRunner,
    probe_timeout: Duration,
}

impl PrerequisiteChecker {
    /// 모듈 검사에 사용할 runner와 제한 시간으로 검사기를 만든다.
    pub fn new(runner: SharedRunner, probe_timeout: Duration) -> Self {
        Self {
            runner,
            probe_timeout,
        }
    }

    /// 모든 전제 조건이 충족되면 `true`를 반환한다.
    pub async fn check_all(&self, prerequisites: &[Prerequisite]) -> bool {
        self.failures(prerequisites).await.is_empty()
    }

    /// 충족되지 않은 조건마다 사유를 한 줄씩 기록하고 모아서 반환한다.
    ///
    /// 하나가 실패해도 나머지 조건을 계속 검사한다.
    pub async fn failures(&self, prerequisites: &[Prerequisite]) -> Vec<String> {
        info!("시나리오 전제 조건 확인 중...");
        if prerequisites.is_empty() {
            info!("지정된 전제 조건이 없습니다.");
            return Vec::new();
        }
        let mut failures = Vec::new();
        for prereq in prerequisites {
            debug!("전제 조건 확인: {:?} - {}", prereq.kind, prereq.value);
            if let Err(reason) = self.check(prereq).await {
                error!("전제 조건 미충족: {reason}");
                failures.push(reason);
            }
        }
        if failures.is_empty() {
            info!("모든 전제 조건이 충족되었습니다.");
        } else {
            error!("전제 조건 {}개가 충족되지 않았습니다.", failures.len());
        }
        failures
    }

    /// 단일 조건을 검사하고 실패 사유를 반환한다.
    pub async fn check(&self, prereq: &Prerequisite) -> Result<(), String> {
        let value = prereq.value.trim();
        match prereq.kind {
            PrerequisiteKind::Command => match which::which(value) {
                Ok(path) => {
                    debug!("명령 '{value}' 위치: {}", path.display());
                    Ok(())
                }
                Err(err) => Err(format!("명령 '{value}'을(를) 찾을 수 없습니다: {err}")),
            },
            PrerequisiteKind::File => {
                if Path::new(value).exists() {
                    Ok(())
                } else {
                    Err(format!("파일 '{value}'이(가) 존재하지 않습니다."))
                }
            }
            PrerequisiteKind::Directory => {
                if Path::new(value).is_dir() {
                    Ok(())
                } else {
                    Err(format!("디렉터리 '{value}'이(가) 존재하지 않습니다."))
                }
            }
            PrerequisiteKind::EnvironmentVariable => {
                if std::env::var_os(value).is_some() {
                    Ok(())
                } else {
                    Err(format!("환경 변수 '{value}'이(가) 정의되지 않았습니다."))
                }
            }
            PrerequisiteKind::ImportableModule => self.check_module(value).await,
        }
    }

    async fn check_module(&self, module: &str) -> Result<(), String> {
        if !is_valid_module_name(module) {
            return Err(format!("모듈 이름 '{module}'이(가) 올바르지 않습니다."));
        }
        if self.runner.simulated() {
            debug!("[DRY RUN] 모듈 '{module}' 검사를 건너뜁니다.");
            return Ok(());
        }
        let probe = CommandSpec::new([
            PYTHON_PROGRAM.to_string(),
            "-c".to_string(),
            format!("import {module}"),
        ])
        .ok_or_else(|| "모듈 검사 명령을 만들 수 없습니다.".to_string())?;
        let outcome = self.runner.run(&probe, None, self.probe_timeout).await;
        if outcome.success() {
            Ok(())
        } else {
            Err(format!("Python 모듈 '{module}'을(를) import할 수 없습니다."))
        }
    }
}

/// 점으로 구분된 식별자만 허용한다.
fn is_valid_module_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
                && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        })
}
