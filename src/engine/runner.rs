use super::events::{EngineEvent, EventSender, emit};
use super::state::{Clock, OutcomeStatus, ScenarioResult, ScenarioStatus, StepResult};
use super::technique::{TechniqueContext, execute_technique};
use crate::command::SharedRunner;
use crate::config::EngineSettings;
use crate::environment::EnvironmentPreparer;
use crate::error::SimError;
use crate::prereq::PrerequisiteChecker;
use crate::scenario::{Scenario, Step};
use crate::store;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// 취소로 중단된 실행에 기록하는 사유이다.
pub const CANCELLED_ERROR: &str = "cancelled";

/// 단계 실행 결과와 취소 여부이다.
struct StepRun {
    result: StepResult,
    cancelled: bool,
}

/// 시나리오를 순차 실행하고 결과를 기록하는 엔진이다.
///
/// 단계와 기법은 절대 병렬로 실행하지 않는다.
pub struct ScenarioEngine {
    runner: SharedRunner,
    settings: EngineSettings,
    output_dir: PathBuf,
    sender: EventSender,
    cancel: CancellationToken,
}

impl ScenarioEngine {
    pub fn new(
        runner: SharedRunner,
        settings: EngineSettings,
        output_dir: impl Into<PathBuf>,
        sender: EventSender,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            runner,
            settings,
            output_dir: output_dir.into(),
            sender,
            cancel,
        }
    }

    /// 시나리오 전체를 실행하고 결과를 저장한 뒤 반환한다.
    ///
    /// 정상 종료, 조기 중단, 전제 조건 실패, 취소 어느 경로든
    /// 결과는 정확히 한 번 저장된다.
    pub async fn run(&self, scenario: &Scenario) -> ScenarioResult {
        let mut clock = Clock::default();
        let mut result = ScenarioResult::new(&scenario.name);
        result.begin(clock.now());
        emit(
            &self.sender,
            EngineEvent::ScenarioStarted {
                name: scenario.name.clone(),
                steps: scenario.steps.len(),
            },
        );

        let checker = PrerequisiteChecker::new(self.runner.clone(), self.settings.command_timeout);
        if !checker.check_all(&scenario.prerequisites).await {
            let reason = SimError::PrerequisiteNotMet.to_string();
            return self
                .finish(result, ScenarioStatus::Failed, Some(reason), &mut clock)
                .await;
        }

        let preparer = EnvironmentPreparer::new(self.runner.clone(), self.settings.command_timeout);
        if !preparer.prepare(&scenario.targets).await {
            return self
                .finish(
                    result,
                    ScenarioStatus::Failed,
                    Some("환경 준비 실패".to_string()),
                    &mut clock,
                )
                .await;
        }

        if scenario.steps.is_empty() {
            warn!("지정된 단계가 없습니다.");
            return self
                .finish(result, ScenarioStatus::Completed, None, &mut clock)
                .await;
        }

        let mut all_ok = true;
        let mut abort_reason = None;
        for (index, step) in scenario.steps.iter().enumerate() {
            if index > 0 && !self.pause(self.settings.step_delay).await {
                abort_reason = Some(CANCELLED_ERROR.to_string());
                break;
            }
            if self.cancel.is_cancelled() {
                abort_reason = Some(CANCELLED_ERROR.to_string());
                break;
            }
            let run = self.execute_step(step, index, &mut clock).await;
            let step_ok = run.result.status.is_success();
            result.push_step(run.result);
            if run.cancelled {
                abort_reason = Some(CANCELLED_ERROR.to_string());
                break;
            }
            if !step_ok {
                all_ok = false;
                if step.stop_on_failure {
                    error!(
                        "단계 {}({})이(가) 실패했고 stop_on_failure가 설정되어 실행을 중단합니다.",
                        index + 1,
                        step.name
                    );
                    break;
                }
            }
        }
        if abort_reason.is_none() && self.cancel.is_cancelled() {
            abort_reason = Some(CANCELLED_ERROR.to_string());
        }

        let status = if all_ok && abort_reason.is_none() {
            ScenarioStatus::Completed
        } else {
            ScenarioStatus::Failed
        };
        self.finish(result, status, abort_reason, &mut clock).await
    }

    /// 단계 하나를 실행한다. 기법 경계마다 취소 여부를 확인한다.
    async fn execute_step(&self, step: &Step, index: usize, clock: &mut Clock) -> StepRun {
        let start_time = clock.now();
        emit(
            &self.sender,
            EngineEvent::StepStarted {
                index,
                name: step.name.clone(),
            },
        );
        if step.techniques.is_empty() {
            warn!("단계 {}에 지정된 기법이 없습니다.", step.name);
        }

        let ctx = TechniqueContext {
            runner: &self.runner,
            settings: &self.settings,
            sender: &self.sender,
        };
        let mut techniques = Vec::with_capacity(step.techniques.len());
        let mut cancelled = false;
        for (tech_index, technique) in step.techniques.iter().enumerate() {
            if tech_index > 0 && !self.pause(self.settings.technique_delay).await {
                cancelled = true;
                break;
            }
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            techniques.push(execute_technique(technique, &ctx, clock).await);
        }

        let success = !cancelled && techniques.iter().all(|t| t.status.is_success());
        let status = OutcomeStatus::from_success(success);
        let end_time = clock.now();
        emit(
            &self.sender,
            EngineEvent::StepFinished {
                name: step.name.clone(),
                status,
                stop_on_failure: step.stop_on_failure,
            },
        );
        StepRun {
            result: StepResult {
                name: step.name.clone(),
                status,
                start_time,
                end_time,
                techniques,
            },
            cancelled,
        }
    }

    /// 지정 시간만큼 대기한다. 대기 중 취소되면 `false`를 반환한다.
    async fn pause(&self, delay: Duration) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        if delay.is_zero() {
            return true;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = sleep(delay) => true,
        }
    }

    /// 종료 상태를 확정하고 결과를 저장한다. 저장 실패는 기록만 한다.
    async fn finish(
        &self,
        mut result: ScenarioResult,
        status: ScenarioStatus,
        error: Option<String>,
        clock: &mut Clock,
    ) -> ScenarioResult {
        result.finish(status, clock.now(), error.clone());
        match store::save(&result, &self.output_dir).await {
            Ok(path) => debug!("결과 저장: {}", path.display()),
            Err(err) => error!("결과 저장 실패: {err}"),
        }
        emit(
            &self.sender,
            EngineEvent::ScenarioFinished { status, error },
        );
        result
    }
}
