use super::state::{OutcomeStatus, ScenarioStatus};
use tokio::sync::mpsc::UnboundedSender;

/// 엔진에서 리포터로 전달되는 주요 이벤트 모델이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// 시나리오 실행 시작.
    ScenarioStarted { name: String, steps: usize },
    /// 단계 시작 알림.
    StepStarted { index: usize, name: String },
    /// 기법 시작 알림.
    TechniqueStarted { id: String, name: String },
    /// 기법 안의 명령 하나가 끝남.
    CommandFinished {
        technique_id: String,
        command: String,
        exit_code: i32,
    },
    /// 기법 종료 알림.
    TechniqueFinished {
        id: String,
        name: String,
        status: OutcomeStatus,
        error: Option<String>,
    },
    /// 단계 종료 알림.
    StepFinished {
        name: String,
        status: OutcomeStatus,
        stop_on_failure: bool,
    },
    /// 전체 시나리오 종료.
    ScenarioFinished {
        status: ScenarioStatus,
        error: Option<String>,
    },
}

/// 이벤트 송신 채널 별칭이다.
pub type EventSender = UnboundedSender<EngineEvent>;

/// 수신 측이 닫혀 있어도 실행은 계속한다.
pub(super) fn emit(sender: &EventSender, event: EngineEvent) {
    let _ = sender.send(event);
}
