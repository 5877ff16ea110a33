use std::path::PathBuf;

/// 시나리오 실행을 중단시키는 치명적 오류를 표현한다.
///
/// 명령 단위 실패(종료 코드, 실행 불가, 시간 초과)는 여기에 포함되지 않는다.
/// 그런 실패는 `CommandOutcome`의 데이터로 흘러간다.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// 시나리오 파일을 읽을 수 없는 경우이다.
    #[error("시나리오 파일을 읽을 수 없습니다: {}", .path.display())]
    ScenarioRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 시나리오 정의가 비어 있거나 필드 형식이 잘못된 경우이다.
    #[error("잘못된 시나리오 정의: {0}")]
    MalformedScenario(String),
    /// 하나 이상의 전제 조건이 충족되지 않은 경우이다.
    #[error("전제 조건이 충족되지 않았습니다.")]
    PrerequisiteNotMet,
    /// 결과 파일 저장에 실패한 경우이다.
    #[error("결과 저장 실패: {}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 결과 직렬화에 실패한 경우이다.
    #[error("결과 직렬화 실패")]
    Serialize(#[from] serde_json::Error),
}

impl From<serde_yaml::Error> for SimError {
    fn from(err: serde_yaml::Error) -> Self {
        SimError::MalformedScenario(err.to_string())
    }
}
