use std::path::PathBuf;
use std::time::Duration;

/// 명령 기본 제한 시간(초)이다.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;
/// 기법 사이 기본 대기 시간(밀리초)이다.
pub const DEFAULT_TECHNIQUE_DELAY_MS: u64 = 1_000;
/// 단계 사이 기본 대기 시간(밀리초)이다.
pub const DEFAULT_STEP_DELAY_MS: u64 = 2_000;

/// 한 번의 실행에 필요한 모든 설정을 모은다.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// 시나리오 정의 파일 경로.
    pub scenario_path: PathBuf,
    /// debug 레벨 로그 출력 여부.
    pub verbose: bool,
    /// 실제 프로세스를 띄우지 않는 모드 여부.
    pub dry_run: bool,
    /// results.json을 쓸 디렉터리.
    pub output_dir: PathBuf,
    /// 엔진에 전달할 실행 파라미터.
    pub engine: EngineSettings,
}

/// 엔진이 사용하는 실행 파라미터이다.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// 기법 사이 대기 시간.
    pub technique_delay: Duration,
    /// 단계 사이 대기 시간.
    pub step_delay: Duration,
    /// 기법에 값이 없을 때 사용하는 명령 제한 시간.
    pub command_timeout: Duration,
    /// 기법에 값이 없을 때 사용하는 작업 디렉터리.
    pub working_dir: Option<PathBuf>,
}

impl EngineSettings {
    /// 대기 없이 즉시 진행하는 설정을 만든다.
    #[cfg(test)]
    pub fn without_delays(mut self) -> Self {
        self.technique_delay = Duration::ZERO;
        self.step_delay = Duration::ZERO;
        self
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            technique_delay: Duration::from_millis(DEFAULT_TECHNIQUE_DELAY_MS),
            step_delay: Duration::from_millis(DEFAULT_STEP_DELAY_MS),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            working_dir: None,
        }
    }
}

/// `--output`이 없을 때 사용하는 타임스탬프 기반 디렉터리 이름이다.
pub fn default_output_dir() -> PathBuf {
    PathBuf::from(format!(
        "results_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}
