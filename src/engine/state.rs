use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 시나리오 전체의 상태 머신 값이다.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// 아직 실행 전.
    NotStarted,
    /// 실행 중.
    Running,
    /// 시도한 모든 단계가 성공.
    Completed,
    /// 실패, 조기 중단, 전제 조건 미충족 또는 취소.
    Failed,
}

/// 기법과 단계의 결과 값이다.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

impl OutcomeStatus {
    pub fn from_success(success: bool) -> Self {
        if success {
            OutcomeStatus::Success
        } else {
            OutcomeStatus::Failed
        }
    }

    pub fn is_success(self) -> bool {
        self == OutcomeStatus::Success
    }
}

/// 명령 한 개의 실행 기록이다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandRecord {
    /// 표시용 명령 문자열.
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// 기법 한 개의 실행 결과이다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechniqueResult {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ATT&CK 전술 이름.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tactic: Option<String>,
    /// 모든 명령이 0으로 종료된 경우에만 성공이다.
    pub status: OutcomeStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// 명령 없이 실패 처리된 경우 등의 합성 오류 메시지.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 선언 순서대로의 명령 기록.
    pub command_outputs: Vec<CommandRecord>,
}

/// 단계 한 개의 실행 결과이다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    /// 포함된 모든 기법이 성공한 경우에만 성공이다.
    pub status: OutcomeStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub techniques: Vec<TechniqueResult>,
}

/// 한 번의 실행 전체를 기록하는 결과 문서이다.
///
/// `techniques`는 `steps` 안의 기법 결과를 순서대로 펼친 사본이다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: ScenarioStatus,
    /// 실행이 중단된 사유.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub steps: Vec<StepResult>,
    pub techniques: Vec<TechniqueResult>,
}

impl ScenarioResult {
    /// 실행 전 상태의 결과를 만든다.
    pub fn new(scenario_name: impl Into<String>) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            start_time: None,
            end_time: None,
            status: ScenarioStatus::NotStarted,
            error: None,
            steps: Vec::new(),
            techniques: Vec::new(),
        }
    }

    /// NOT_STARTED → RUNNING 전이를 기록한다.
    pub fn begin(&mut self, at: DateTime<Utc>) {
        self.start_time = Some(at);
        self.status = ScenarioStatus::Running;
    }

    /// 완료된 단계를 추가하고 펼친 기법 목록도 갱신한다.
    pub fn push_step(&mut self, step: StepResult) {
        self.techniques.extend(step.techniques.iter().cloned());
        self.steps.push(step);
    }

    /// 종료 상태와 시각을 확정한다.
    pub fn finish(&mut self, status: ScenarioStatus, at: DateTime<Utc>, error: Option<String>) {
        self.status = status;
        self.end_time = Some(at);
        self.error = error;
    }
}

/// 역행하지 않는 타임스탬프를 발급한다.
///
/// 시스템 시계가 뒤로 가더라도 직전 값보다 작은 시각은 발급하지 않는다.
#[derive(Debug, Default)]
pub struct Clock {
    last: Option<DateTime<Utc>>,
}

impl Clock {
    pub fn now(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamped = match self.last {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last = Some(stamped);
        stamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn technique(id: &str, at: DateTime<Utc>) -> TechniqueResult {
        TechniqueResult {
            id: id.into(),
            name: id.into(),
            description: None,
            tactic: None,
            status: OutcomeStatus::Success,
            start_time: at,
            end_time: at,
            error: None,
            command_outputs: Vec::new(),
        }
    }

    #[test]
    fn push_step_keeps_flat_technique_order() {
        let mut clock = Clock::default();
        let mut result = ScenarioResult::new("s");
        result.begin(clock.now());
        for (name, ids) in [("a", vec!["T1", "T2"]), ("b", vec!["T3"])] {
            let at = clock.now();
            result.push_step(StepResult {
                name: name.into(),
                status: OutcomeStatus::Success,
                start_time: at,
                end_time: at,
                techniques: ids.into_iter().map(|id| technique(id, at)).collect(),
            });
        }
        let flat: Vec<&str> = result.techniques.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(flat, ["T1", "T2", "T3"]);
        assert_eq!(result.status, ScenarioStatus::Running);
    }

    #[test]
    fn clock_never_goes_backwards() {
        let mut clock = Clock::default();
        let mut previous = clock.now();
        for _ in 0..100 {
            let next = clock.now();
            assert!(next >= previous);
            previous = next;
        }
    }

    #[test]
    fn serializes_status_in_snake_case() {
        let mut result = ScenarioResult::new("s");
        let json = serde_json::to_value(&result).expect("직렬화 실패");
        assert_eq!(json["status"], "not_started");
        assert!(json.get("error").is_none());

        result.finish(ScenarioStatus::Completed, Utc::now(), None);
        let json = serde_json::to_value(&result).expect("직렬화 실패");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["scenario_name"], "s");
    }
}
