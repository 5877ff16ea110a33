use crate::engine::{EngineEvent, OutcomeStatus, ScenarioStatus};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

/// 엔진 이벤트를 모두 소비하여 로그 스트림으로 출력한다.
///
/// 송신 측이 모두 닫히면 종료된다.
pub async fn drain_events(mut rx: UnboundedReceiver<EngineEvent>) {
    while let Some(event) = rx.recv().await {
        log_event(&event);
    }
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::ScenarioStarted { name, steps } => {
            info!("시나리오 실행 시작: {name} (단계 {steps}개)");
        }
        EngineEvent::StepStarted { index, name } => {
            info!("단계 {} 실행: {name}", index + 1);
        }
        EngineEvent::TechniqueStarted { id, name } => {
            info!("기법 실행: {name} ({id})");
        }
        EngineEvent::CommandFinished {
            technique_id,
            command,
            exit_code,
        } => {
            if *exit_code == 0 {
                debug!("[{technique_id}] {command} -> {exit_code}");
            } else {
                warn!("[{technique_id}] {command} -> 종료 코드 {exit_code}");
            }
        }
        EngineEvent::TechniqueFinished {
            id,
            name,
            status,
            error,
        } => match (status, error) {
            (OutcomeStatus::Success, _) => info!("기법 성공: {name} ({id})"),
            (OutcomeStatus::Failed, Some(reason)) => warn!("기법 실패: {name} ({id}): {reason}"),
            (OutcomeStatus::Failed, None) => warn!("기법 실패: {name} ({id})"),
        },
        EngineEvent::StepFinished {
            name,
            status,
            stop_on_failure,
        } => {
            if status.is_success() {
                info!("단계 성공: {name}");
            } else if *stop_on_failure {
                error!("단계 실패: {name} (stop_on_failure)");
            } else {
                warn!("단계 실패: {name}");
            }
        }
        EngineEvent::ScenarioFinished { status, error } => match (status, error) {
            (ScenarioStatus::Completed, _) => info!("시나리오 실행 완료: completed"),
            (_, Some(reason)) => error!("시나리오 실행 실패: {reason}"),
            _ => error!("시나리오 실행 실패: failed"),
        },
    }
}
