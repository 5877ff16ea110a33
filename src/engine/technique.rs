use super::events::{EngineEvent, EventSender, emit};
use super::state::{Clock, CommandRecord, OutcomeStatus, TechniqueResult};
use crate::command::SharedRunner;
use crate::config::EngineSettings;
use crate::scenario::Technique;
use std::time::Duration;
use tracing::warn;

/// 명령이 하나도 없는 기법에 기록하는 오류 메시지이다.
pub const NO_COMMANDS_ERROR: &str = "no commands specified";

/// 기법 실행에 필요한 공용 핸들 묶음이다.
pub(super) struct TechniqueContext<'a> {
    pub runner: &'a SharedRunner,
    pub settings: &'a EngineSettings,
    pub sender: &'a EventSender,
}

/// 기법 하나를 실행하고 결과를 반환한다.
///
/// 중간 명령이 실패해도 나머지 명령을 모두 실행한다.
pub(super) async fn execute_technique(
    technique: &Technique,
    ctx: &TechniqueContext<'_>,
    clock: &mut Clock,
) -> TechniqueResult {
    let start_time = clock.now();
    emit(
        ctx.sender,
        EngineEvent::TechniqueStarted {
            id: technique.id.clone(),
            name: technique.name.clone(),
        },
    );

    let mut command_outputs = Vec::with_capacity(technique.commands.len());
    let mut error = None;
    let success = if technique.commands.is_empty() {
        warn!("기법 {}에 지정된 명령이 없습니다.", technique.id);
        error = Some(NO_COMMANDS_ERROR.to_string());
        false
    } else {
        let working_dir = technique
            .working_dir
            .as_deref()
            .or(ctx.settings.working_dir.as_deref());
        let timeout_duration = technique
            .timeout_secs
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or(ctx.settings.command_timeout);
        let mut all_ok = true;
        for command in &technique.commands {
            let outcome = ctx.runner.run(command, working_dir, timeout_duration).await;
            let shown = command.display();
            emit(
                ctx.sender,
                EngineEvent::CommandFinished {
                    technique_id: technique.id.clone(),
                    command: shown.clone(),
                    exit_code: outcome.exit_code,
                },
            );
            all_ok &= outcome.success();
            command_outputs.push(CommandRecord {
                command: shown,
                exit_code: outcome.exit_code,
                stdout: outcome.stdout,
                stderr: outcome.stderr,
            });
        }
        all_ok
    };

    let status = OutcomeStatus::from_success(success);
    let end_time = clock.now();
    emit(
        ctx.sender,
        EngineEvent::TechniqueFinished {
            id: technique.id.clone(),
            name: technique.name.clone(),
            status,
            error: error.clone(),
        },
    );
    TechniqueResult {
        id: technique.id.clone(),
        name: technique.name.clone(),
        description: technique.description.clone(),
        tactic: technique.tactic.clone(),
        status,
        start_time,
        end_time,
        error,
        command_outputs,
    }
}
