// ==========================================
// 生产计划工作流 - 命令行向导
// ==========================================
// 用法: planning-wizard <上期结果.xml> [输出.xml]
// 流程: 导入 XML -> 逐阶段装载并校验前进 -> 完成 -> 导出 XML
// ==========================================

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use xml_planning_editor::app::AppState;
use xml_planning_editor::config::default_config_db_path;
use xml_planning_editor::engine::Transition;
use xml_planning_editor::logging;

/// 默认输出文件名
const DEFAULT_OUTPUT: &str = "updated_data.xml";

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", xml_planning_editor::APP_NAME);
    tracing::info!("系统版本: {}", xml_planning_editor::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next().map(PathBuf::from) else {
        eprintln!("用法: planning-wizard <上期结果.xml> [输出.xml]");
        return ExitCode::from(2);
    };
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    match run(&input, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("向导执行失败: {:#}", e);
            eprintln!("错误: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(input: &Path, output: &Path) -> anyhow::Result<()> {
    let db_path = default_config_db_path()?;
    tracing::info!("使用配置库: {}", db_path);

    let state = AppState::new(&db_path).map_err(anyhow::Error::msg)?;
    state.import_file(input)?;

    loop {
        let stage = state
            .engine
            .current_stage()
            .ok_or_else(|| anyhow::anyhow!("当前步骤超出阶段范围"))?;

        if state.enter_current_stage().await.is_none() {
            for notice in state.notices() {
                eprintln!("提示: {}", notice.message);
            }
            anyhow::bail!("阶段 {} 数据装载失败", stage.label());
        }
        println!(
            "[{}/{}] {}",
            state.engine.step() + 1,
            state.engine.stage_count(),
            stage.label()
        );

        match state.next()? {
            Transition::Advanced { .. } => continue,
            _ => break,
        }
    }

    if let Transition::Finished { .. } = state.finish() {
        let snapshot = state.store.snapshot();
        tracing::debug!(
            "会话快照: {}",
            serde_json::to_string(&snapshot).unwrap_or_default()
        );
    }

    state.export_file(output)?;
    println!("已导出: {}", output.display());
    Ok(())
}
