use crate::engine::ScenarioResult;
use crate::error::SimError;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 출력 디렉터리 안의 결과 파일 이름이다.
pub const RESULTS_FILE_NAME: &str = "results.json";
const TEMP_FILE_NAME: &str = ".results.json.tmp";

/// 결과를 `<output_dir>/results.json`에 저장하고 경로를 반환한다.
///
/// 디렉터리가 없으면 먼저 만든다. 같은 결과로 여러 번 호출해도 파일 내용은
/// 한 번 호출한 것과 같다.
pub async fn save(result: &ScenarioResult, output_dir: &Path) -> Result<PathBuf, SimError> {
    fs::create_dir_all(output_dir)
        .await
        .map_err(|source| SimError::Persistence {
            path: output_dir.to_path_buf(),
            source,
        })?;
    let body = serde_json::to_string_pretty(result)?;
    let temp_path = output_dir.join(TEMP_FILE_NAME);
    let path = output_dir.join(RESULTS_FILE_NAME);
    fs::write(&temp_path, body)
        .await
        .map_err(|source| SimError::Persistence {
            path: temp_path.clone(),
            source,
        })?;
    fs::rename(&temp_path, &path)
        .await
        .map_err(|source| SimError::Persistence {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// 저장된 결과 파일을 다시 읽는다.
#[cfg(test)]
pub async fn load(path: &Path) -> Result<ScenarioResult, SimError> {
    let body = fs::read_to_string(path)
        .await
        .map_err(|source| SimError::Persistence {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(serde_json::from_str(&body)?)
}
