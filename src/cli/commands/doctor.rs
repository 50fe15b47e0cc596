//! Doctor command - verify API keys and configuration.

use crate::cli::Output;
use crate::config::{EmbeddingProvider, Settings};
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<&str>) -> anyhow::Result<()> {
    Output::header("Colloquy Doctor");
    println!();
    println!("Checking API keys and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Keys").bold());
    let mut key_checks = vec![check_key(&settings.llm.api_key_env, std::env::var(&settings.llm.api_key_env).ok(), true)];
    match settings.embedding.provider {
        EmbeddingProvider::Local => key_checks.push(CheckResult::ok(
            "Embeddings",
            "local all-MiniLM-L6-v2, no key needed",
        )),
        EmbeddingProvider::Openai => key_checks.push(check_key(
            &settings.embedding.api_key_env,
            std::env::var(&settings.embedding.api_key_env).ok(),
            true,
        )),
        EmbeddingProvider::Hashing => key_checks.push(CheckResult::ok(
            "Embeddings",
            "hashing stub embedder, no key needed",
        )),
    }
    key_checks.push(check_key(
        &settings.tools.news_api_key_env,
        std::env::var(&settings.tools.news_api_key_env).ok(),
        false,
    ));
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

    println!();

    println!("{}", style("Storage").bold());
    let dir_checks = check_storage(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(config_path), check_settings(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Colloquy.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Colloquy is ready to use.");
    }

    Ok(())
}

/// Check an API key read from `var`. Optional keys only warn.
fn check_key(var: &str, value: Option<String>, required: bool) -> CheckResult {
    let hint = format!("Set {} in your environment or in a .env file", var);
    match value {
        Some(key) if !key.trim().is_empty() => {
            CheckResult::ok(var, &format!("configured ({})", mask_key(&key)))
        }
        Some(_) if required => CheckResult::error(var, "empty", &hint),
        None if required => CheckResult::error(var, "not set", &hint),
        Some(_) => CheckResult::warning(var, "empty (news search disabled)", &hint),
        None => CheckResult::warning(var, "not set (news search disabled)", &hint),
    }
}

/// Show only the ends of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check the data directory and database file.
fn check_storage(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok("Data directory", &format!("{}", data_dir.display())));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let db_path = settings.sqlite_path();
    if db_path.exists() {
        let size = std::fs::metadata(&db_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok(
            "Vector store",
            &format!("{} ({})", db_path.display(), size),
        ));
    } else {
        results.push(CheckResult::warning(
            "Vector store",
            &format!("{} (not created yet)", db_path.display()),
            "Database will be created on first ingest",
        ));
    }

    results
}

/// Check if the config file exists.
fn check_config_file(config_path: Option<&str>) -> CheckResult {
    let config_path = config_path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: colloquy config init",
        )
    }
}

/// Check that the loaded settings are usable.
fn check_settings(settings: &Settings) -> CheckResult {
    match settings.validate() {
        Ok(()) => CheckResult::ok(
            "Settings",
            &format!(
                "chunks of {} chars with {} overlap, top {} results",
                settings.chunking.chunk_size, settings.chunking.chunk_overlap, settings.rag.top_k
            ),
        ),
        Err(e) => CheckResult::error("Settings", &e.to_string(), "Fix the value in your config file"),
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_key_missing_is_error() {
        let result = check_key("OPENROUTER_API_KEY", None, true);
        assert_eq!(result.status, CheckStatus::Error);
        assert!(result.hint.unwrap().contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn test_optional_key_missing_is_warning() {
        let result = check_key("NEWSAPI_KEY", Some("  ".to_string()), false);
        assert_eq!(result.status, CheckStatus::Warning);
    }

    #[test]
    fn test_configured_key_is_masked() {
        let result = check_key("OPENAI_API_KEY", Some("sk-abcdefghijklmnop1234".to_string()), true);
        assert_eq!(result.status, CheckStatus::Ok);
        assert_eq!(result.message, "configured (sk-abcd...1234)");
        assert_eq!(mask_key("short"), "****");
    }

    #[test]
    fn test_invalid_settings_are_reported() {
        let mut settings = Settings::default();
        settings.chunking.chunk_overlap = settings.chunking.chunk_size;
        assert_eq!(check_settings(&settings).status, CheckStatus::Error);
        assert_eq!(check_settings(&Settings::default()).status, CheckStatus::Ok);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }
}
