use crate::command::SharedRunner;
use crate::scenario::{CommandSpec, Target, TargetKind};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 대상 호스트/컨테이너/VM의 준비 상태를 점검한다.
///
/// 점검 결과는 경고로만 남긴다. 간헐적으로 닿지 않는 대상도 실행은 계속된다.
pub struct EnvironmentPreparer {
    runner: SharedRunner,
    probe_timeout: Duration,
}

impl EnvironmentPreparer {
    pub fn new(runner: SharedRunner, probe_timeout: Duration) -> Self {
        Self {
            runner,
            probe_timeout,
        }
    }

    /// 모든 대상을 점검한다. 현재 설계에서는 항상 `true`를 반환한다.
    pub async fn prepare(&self, targets: &[Target]) -> bool {
        info!("시나리오 실행 환경 준비 중...");
        if targets.is_empty() {
            warn!("지정된 대상이 없습니다.");
            return true;
        }
        if self.runner.simulated() {
            debug!("[DRY RUN] 대상 점검을 건너뜁니다.");
            return true;
        }
        let mut unready = 0usize;
        for target in targets {
            info!("대상 점검: {:?} - {}", target.kind, target.value);
            if let Some(warning) = self.probe(target).await {
                warn!("{warning}");
                unready += 1;
            }
        }
        if unready == 0 {
            info!("환경 준비 완료");
        } else {
            warn!("대상 {unready}개가 준비되지 않았지만 실행을 계속합니다.");
        }
        true
    }

    /// 대상이 준비되지 않았으면 경고 메시지를 반환한다.
    async fn probe(&self, target: &Target) -> Option<String> {
        let value = target.value.trim();
        let Some(command) = probe_command(target.kind, value) else {
            return Some(format!("대상 '{value}' 점검 명령을 만들 수 없습니다."));
        };
        let outcome = self.runner.run(&command, None, self.probe_timeout).await;
        match target.kind {
            TargetKind::Ip if !outcome.success() => {
                Some(format!("대상에 도달할 수 없습니다: {value}"))
            }
            TargetKind::Container if outcome.stdout.trim().is_empty() => {
                Some(format!("Docker 컨테이너 '{value}'이(가) 실행 중이 아닙니다."))
            }
            TargetKind::VirtualMachine if !outcome.stdout.to_lowercase().contains("running") => {
                Some(format!("가상 머신 '{value}'이(가) 실행 중이 아닙니다."))
            }
            _ => None,
        }
    }
}

/// 대상 종류별 점검 명령을 만든다.
fn probe_command(kind: TargetKind, value: &str) -> Option<CommandSpec> {
    match kind {
        TargetKind::Ip => CommandSpec::new(["ping", "-c", "1", value]),
        TargetKind::Container => CommandSpec::new([
            "docker".to_string(),
            "ps".to_string(),
            "-q".to_string(),
            "-f".to_string(),
            format!("name={value}"),
        ]),
        TargetKind::VirtualMachine => CommandSpec::new(["vagrant", "status", value]),
    }
}
