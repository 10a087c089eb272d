use anyhow::{bail, Context};
use chrono::NaiveDate;
use dotenvy::dotenv;
use inventory_console::config::get_configuration;
use inventory_console::reports::export::write_dashboard_csv;
use inventory_console::reports::ReportFilters;
use inventory_console::session::AppContext;
use inventory_console::workflow::InvoiceImage;
use inventory_console::Console;
use secrecy::Secret;
use std::path::{Path, PathBuf};
use tracing::info;

const SERVICE_NAME: &str = "inventory-console";
const LOGIN_PASSWORD_VAR: &str = "APP_LOGIN_PASSWORD";
const USAGE: &str = "usage: inventory-console <reports [start end] [--csv <dir>] | units | ocr <image> | login <correo> | logout>";

enum Command {
    Reports {
        filters: ReportFilters,
        csv_dir: Option<PathBuf>,
    },
    Units,
    Ocr(PathBuf),
    Login(String),
    Logout,
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

fn parse_reports(args: &[&str]) -> anyhow::Result<Command> {
    let (range, csv_dir) = match args {
        [range @ .., "--csv", dir] => (range, Some(PathBuf::from(*dir))),
        _ => (args, None),
    };
    let filters = match range {
        [] => ReportFilters::default(),
        [start, end] => ReportFilters::between(parse_date(start)?, parse_date(end)?),
        _ => bail!(USAGE),
    };
    Ok(Command::Reports { filters, csv_dir })
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    Ok(match args.as_slice() {
        ["reports", rest @ ..] => parse_reports(rest)?,
        ["units"] => Command::Units,
        ["ocr", path] => Command::Ocr(PathBuf::from(path)),
        ["login", correo] => Command::Login(correo.to_string()),
        ["logout"] => Command::Logout,
        _ => bail!(USAGE),
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(console: &Console, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Reports { filters, csv_dir } => {
            let dashboard = console.reports.dashboard(&filters).await;
            print_json(&dashboard)?;
            if let Some(dir) = csv_dir {
                let today = chrono::Local::now().date_naive();
                for path in write_dashboard_csv(&dashboard, &dir, today)? {
                    eprintln!("CSV exportado: {}", path.display());
                }
            }
        }
        Command::Units => {
            let units = console.units.get(false).await;
            if !units.success {
                bail!("Could not load unit measures: {}", units.message);
            }
            print_json(&units.data)?;
        }
        Command::Ocr(path) => {
            let mut flow = console.reconciliation();
            flow.start_capture()?;
            flow.accept_image(InvoiceImage::from_path(&path)?)?;
            flow.process().await?;
            let review = flow.request_review()?.clone();
            print_json(&serde_json::json!({
                "draft": flow.draft(),
                "review": review,
            }))?;
        }
        Command::Login(correo) => {
            let password = std::env::var(LOGIN_PASSWORD_VAR)
                .with_context(|| format!("{} must be set to log in", LOGIN_PASSWORD_VAR))?;
            let user = console
                .auth
                .login(&correo, &Secret::new(password))
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            info!(user_id = user.id, "Logged in");
            println!("Sesión iniciada como {}", user.nombre_usuario);
        }
        Command::Logout => {
            let message = console.auth.logout().await?;
            println!("{}", message);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    console_core::observability::init_tracing(
        SERVICE_NAME,
        &configuration.telemetry.level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    )?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;

    let session_path = Path::new(&configuration.session.path).to_path_buf();
    let session = AppContext::load(&session_path)
        .with_context(|| format!("Failed to read session from {}", session_path.display()))?
        .shared();

    let console = Console::new(configuration, session.clone())?;
    console.restore_cookies().await?;
    let outcome = run(&console, command).await;

    // persist even after a failed command; a 401 has already cleared the context
    console.persist_cookies().await?;
    session.read().await.save(&session_path)?;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_reports_with_range() {
        match parse_command(&args(&["reports", "2024-01-01", "2024-01-31"])).unwrap() {
            Command::Reports { filters, csv_dir } => {
                assert_eq!(filters.period(), "2024-01-01 - 2024-01-31");
                assert!(csv_dir.is_none());
            }
            _ => panic!("expected reports"),
        }
    }

    #[test]
    fn test_parse_reports_with_csv_dir() {
        match parse_command(&args(&["reports", "--csv", "out"])).unwrap() {
            Command::Reports { filters, csv_dir } => {
                assert_eq!(filters, ReportFilters::default());
                assert_eq!(csv_dir, Some(PathBuf::from("out")));
            }
            _ => panic!("expected reports"),
        }
        assert!(parse_command(&args(&["reports", "2024-01-01", "--csv"])).is_err());
        assert!(parse_command(&args(&["reports", "2024-01-01", "2024-01-31", "--csv", "out"])).is_ok());
    }

    #[test]
    fn test_parse_rejects_unknown_and_bad_dates() {
        assert!(parse_command(&args(&["export"])).is_err());
        assert!(parse_command(&args(&["reports", "01-01-2024", "2024-01-31"])).is_err());
        assert!(parse_command(&args(&[])).is_err());
    }
}
