// ==========================================
// 医院周排班系统 - 命令行入口
// ==========================================
// 轻量运维/调试入口,不含 UI:
//   clinic-weekplan preview <year> <week> [db_path]
//   clinic-weekplan apply <year> <week> [db_path]
//   clinic-weekplan status <year> <week> <DRAFT|PREVIEW|RELEASED> [db_path]
// ==========================================

use clinic_weekplan::app::{get_default_db_path, AppState};
use clinic_weekplan::domain::types::PlanStatus;
use clinic_weekplan::logging;
use std::error::Error;

fn usage() -> ! {
    eprintln!("用法:");
    eprintln!("  clinic-weekplan preview <year> <week> [db_path]");
    eprintln!("  clinic-weekplan apply <year> <week> [db_path]");
    eprintln!("  clinic-weekplan status <year> <week> <DRAFT|PREVIEW|RELEASED> [db_path]");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 排班决策支持", clinic_weekplan::APP_NAME);
    tracing::info!("系统版本: {}", clinic_weekplan::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        usage();
    }

    let command = args[0].as_str();
    let year: i32 = args[1].parse().unwrap_or_else(|_| usage());
    let week: u32 = args[2].parse().unwrap_or_else(|_| usage());

    match command {
        "preview" => {
            let db_path = args.get(3).cloned().unwrap_or_else(get_default_db_path);
            let state = AppState::new(db_path)?;
            let result = state.plan_api.preview_week(year, week, None).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "apply" => {
            let db_path = args.get(3).cloned().unwrap_or_else(get_default_db_path);
            let state = AppState::new(db_path)?;
            let outcome = state.plan_api.apply_week(year, week, None).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        "status" => {
            let target_raw = args.get(3).map(String::as_str).unwrap_or_else(|| usage());
            let target = PlanStatus::parse(target_raw).unwrap_or_else(|| usage());
            let db_path = args.get(4).cloned().unwrap_or_else(get_default_db_path);
            let state = AppState::new(db_path)?;
            let plan = state.plan_api.set_plan_status(year, week, target)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        _ => usage(),
    }

    Ok(())
}
