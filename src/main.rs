mod command;
mod config;
mod engine;
mod environment;
mod error;
mod prereq;
mod reporter;
mod scenario;
mod store;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use command::{ProcessRunner, select_runner};
use config::{
    DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_STEP_DELAY_MS, DEFAULT_TECHNIQUE_DELAY_MS,
    EngineSettings, RunConfig, default_output_dir,
};
use engine::{ScenarioEngine, ScenarioStatus};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, error, info, warn};

/// 시나리오 로드 실패 시 종료 코드이다.
const LOAD_ERROR_EXIT_CODE: u8 = 2;

#[derive(Parser)]
#[command(name = "attack-sim")]
#[command(about = "통제된 사이버 공격 시나리오 실행기", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 시나리오 정의를 실행한다
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// 시나리오 정의 파일 (YAML 또는 JSON)
    #[arg(long)]
    scenario: PathBuf,

    /// debug 레벨 로그를 출력한다
    #[arg(short, long)]
    verbose: bool,

    /// 명령을 실행하지 않고 출력만 한다
    #[arg(long)]
    dry_run: bool,

    /// results.json을 저장할 디렉터리
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 명령별 기본 제한 시간(초)
    #[arg(long, default_value_t = DEFAULT_COMMAND_TIMEOUT_SECS)]
    timeout: u64,

    /// 기법 사이 대기 시간(밀리초)
    #[arg(long, default_value_t = DEFAULT_TECHNIQUE_DELAY_MS)]
    technique_delay_ms: u64,

    /// 단계 사이 대기 시간(밀리초)
    #[arg(long, default_value_t = DEFAULT_STEP_DELAY_MS)]
    step_delay_ms: u64,

    /// 명령의 기본 작업 디렉터리
    #[arg(long)]
    workdir: Option<PathBuf>,
}

impl RunArgs {
    fn into_config(self) -> RunConfig {
        RunConfig {
            scenario_path: self.scenario,
            verbose: self.verbose,
            dry_run: self.dry_run,
            output_dir: self.output.unwrap_or_else(default_output_dir),
            engine: EngineSettings {
                technique_delay: Duration::from_millis(self.technique_delay_ms),
                step_delay: Duration::from_millis(self.step_delay_ms),
                command_timeout: Duration::from_secs(self.timeout.max(1)),
                working_dir: self.workdir,
            },
        }
    }
}

/// CLI 인자를 파싱하고 시나리오를 실행하는 진입점입니다.
fn main() -> ExitCode {
    let cli = Cli::parse();
    let Commands::Run(args) = cli.command;
    let config = args.into_config();
    init_tracing(config.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Tokio 런타임 생성 실패: {err}");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(execute(config)) {
        Ok(ScenarioStatus::Completed) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(LOAD_ERROR_EXIT_CODE)
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// 시나리오를 로드하고 엔진을 한 번 실행한 뒤 최종 상태를 반환한다.
async fn execute(config: RunConfig) -> anyhow::Result<ScenarioStatus> {
    let scenario = scenario::load_scenario_from_file(&config.scenario_path)
        .with_context(|| format!("시나리오 로드 실패: {}", config.scenario_path.display()))?;
    debug!(
        "시나리오 로드: {} (단계 {}개, 기법 {}개)",
        config.scenario_path.display(),
        scenario.steps.len(),
        scenario.technique_count()
    );
    if config.dry_run {
        info!("[DRY RUN] 명령을 실제로 실행하지 않습니다.");
    }

    let (tx, rx) = unbounded_channel();
    let reporter_task = tokio::spawn(reporter::drain_events(rx));

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("중단 신호 수신, 현재 기법이 끝나면 실행을 중단합니다.");
            signal_token.cancel();
        }
    });

    let runner = select_runner(config.dry_run, Arc::new(ProcessRunner));
    let engine = ScenarioEngine::new(
        runner,
        config.engine,
        config.output_dir.clone(),
        tx,
        cancel,
    );
    let result = engine.run(&scenario).await;
    drop(engine);
    if let Err(err) = reporter_task.await {
        warn!("리포터 작업 종료 실패: {err}");
    }
    info!("결과 디렉터리: {}", config.output_dir.display());
    Ok(result.status)
}
