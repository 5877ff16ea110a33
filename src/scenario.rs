use crate::error::SimError;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// 실행 전에 확인해야 하는 전제 조건 종류이다.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrerequisiteKind {
    /// PATH에서 찾을 수 있어야 하는 실행 파일.
    Command,
    /// 존재해야 하는 파일 경로.
    File,
    /// 존재해야 하는 디렉터리 경로.
    Directory,
    /// 정의되어 있어야 하는 환경 변수.
    #[serde(alias = "environment")]
    EnvironmentVariable,
    /// import 가능해야 하는 Python 모듈.
    #[serde(alias = "python_module")]
    ImportableModule,
}

/// 단일 전제 조건 선언이다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prerequisite {
    /// 조건 종류.
    #[serde(rename = "type")]
    pub kind: PrerequisiteKind,
    /// 종류별 검사 대상 값.
    pub value: String,
}

/// 공격 대상 종류이다.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// IP 주소로 지정한 호스트.
    Ip,
    /// 이름으로 지정한 Docker 컨테이너.
    #[serde(alias = "docker")]
    Container,
    /// Vagrant로 관리되는 가상 머신.
    #[serde(alias = "vm")]
    VirtualMachine,
}

/// 준비 상태를 점검할 대상 선언이다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// 대상 종류.
    #[serde(rename = "type")]
    pub kind: TargetKind,
    /// 주소 또는 이름.
    pub value: String,
}

/// 실행할 명령의 인자 목록이다.
///
/// 문자열로 선언된 명령은 로드 시점에 공백 기준으로 분리된다.
/// 실행 시 셸 문자열로 다시 조립하지 않는다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    argv: Vec<String>,
}

impl CommandSpec {
    /// 인자 목록으로 명령을 생성한다. 빈 목록이면 `None`을 반환한다.
    pub fn new<I, S>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = args.into_iter().map(Into::into).collect();
        if argv.is_empty() || argv[0].trim().is_empty() {
            None
        } else {
            Some(Self { argv })
        }
    }

    /// 한 줄짜리 명령 문자열을 공백 기준으로 분리한다.
    pub fn from_line(line: &str) -> Option<Self> {
        Self::new(line.split_whitespace())
    }

    /// 실행 파일 이름이다.
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// 실행 파일 뒤에 붙는 인자들이다.
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    /// 전체 인자 목록이다.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// 로그와 결과 기록용 표시 문자열이다.
    pub fn display(&self) -> String {
        self.argv().join(" ")
    }
}

impl Serialize for CommandSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.argv.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CommandSpec {
    /// 문자열과 인자 배열 형태를 모두 지원하도록 역직렬화한다.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Line(String),
            Args(Vec<String>),
        }

        match Helper::deserialize(deserializer)? {
            Helper::Line(line) => CommandSpec::from_line(&line)
                .ok_or_else(|| de::Error::custom("빈 명령 문자열은 허용되지 않습니다.")),
            Helper::Args(args) => CommandSpec::new(args)
                .ok_or_else(|| de::Error::custom("빈 명령 인자 목록은 허용되지 않습니다.")),
        }
    }
}

/// 하나의 공격 기법 정의이다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technique {
    /// ATT&CK 스타일 식별자.
    pub id: String,
    /// 표시 이름. 비어 있으면 로드 시 `id`로 채운다.
    #[serde(default)]
    pub name: String,
    /// 부가 설명.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 소속 전술 이름.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tactic: Option<String>,
    /// 순서대로 실행할 명령 목록.
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
    /// 명령 실행 디렉터리. 없으면 실행 설정의 기본값을 사용한다.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// 명령별 제한 시간(초). 없으면 실행 설정의 기본값을 사용한다.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// 공격 체인의 한 단계이다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// 단계 이름. 비어 있으면 로드 시 `Step <n>`으로 채운다.
    #[serde(default)]
    pub name: String,
    /// 실패 시 이후 단계를 모두 건너뛸지 여부.
    #[serde(default)]
    pub stop_on_failure: bool,
    /// 순서대로 실행할 기법 목록.
    #[serde(default)]
    pub techniques: Vec<Technique>,
}

/// Scenario는 한 번의 모의 공격 실행 전체를 정의한다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// 시나리오 이름.
    pub name: String,
    /// 실행 전 반드시 충족되어야 하는 조건 목록.
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
    /// 준비 상태를 점검할 대상 목록.
    #[serde(default)]
    pub targets: Vec<Target>,
    /// 순서가 고정된 단계 목록.
    pub steps: Vec<Step>,
}

impl Scenario {
    /// 선언된 전체 기법 수를 반환한다.
    pub fn technique_count(&self) -> usize {
        self.steps.iter().map(|s| s.techniques.len()).sum()
    }

    /// 필수 값을 검증하고 생략된 이름을 채운다.
    fn normalize(mut self) -> Result<Self, SimError> {
        if self.name.trim().is_empty() {
            return Err(SimError::MalformedScenario(
                "name 필드가 비어 있습니다.".into(),
            ));
        }
        for (idx, prereq) in self.prerequisites.iter().enumerate() {
            if prereq.value.trim().is_empty() {
                return Err(SimError::MalformedScenario(format!(
                    "prerequisites[{idx}].value 필드가 비어 있습니다."
                )));
            }
        }
        for (idx, target) in self.targets.iter().enumerate() {
            if target.value.trim().is_empty() {
                return Err(SimError::MalformedScenario(format!(
                    "targets[{idx}].value 필드가 비어 있습니다."
                )));
            }
        }
        for (step_idx, step) in self.steps.iter_mut().enumerate() {
            if step.name.trim().is_empty() {
                step.name = format!("Step {}", step_idx + 1);
            }
            for (tech_idx, technique) in step.techniques.iter_mut().enumerate() {
                if technique.id.trim().is_empty() {
                    return Err(SimError::MalformedScenario(format!(
                        "steps[{step_idx}].techniques[{tech_idx}].id 필드가 비어 있습니다."
                    )));
                }
                if technique.name.trim().is_empty() {
                    technique.name = technique.id.clone();
                }
            }
        }
        Ok(self)
    }
}

/// YAML 파일을 읽어 Scenario로 역직렬화한다.
pub fn load_scenario_from_file(path: &Path) -> Result<Scenario, SimError> {
    let mut file = File::open(path).map_err(|source| SimError::ScenarioRead {
        path: path.to_path_buf(),
        source,
    })?;
    load_scenario_from_reader(&mut file).map_err(|err| match err {
        SimError::ScenarioRead { source, .. } => SimError::ScenarioRead {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Reader에서 YAML을 읽어 Scenario 구조체로 파싱한다.
pub fn load_scenario_from_reader<R: Read>(reader: &mut R) -> Result<Scenario, SimError> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .map_err(|source| SimError::ScenarioRead {
            path: PathBuf::new(),
            source,
        })?;
    load_scenario_from_str(&buf)
}

/// YAML(또는 JSON) 문자열을 Scenario로 파싱하고 검증한다.
pub fn load_scenario_from_str(text: &str) -> Result<Scenario, SimError> {
    let scenario: Scenario = serde_yaml::from_str(text)?;
    scenario.normalize()
}
