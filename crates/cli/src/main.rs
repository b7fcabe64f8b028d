// Ledgerline CLI - config-driven merge runs (headless)

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_INVALID_CONFIG, EXIT_IO};
use ledgerline_merge::{MergeConfig, MergeOutput, PipelineInput};

#[derive(Parser)]
#[command(name = "ledgerline")]
#[command(about = "Reconcile customer registries and activity ledgers into analytics tables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a merge from a TOML config file
    #[command(after_help = "\
Examples:
  ledgerline run merge.toml
  ledgerline run merge.toml --json")]
    Run {
        /// Path to the merge config file
        config: PathBuf,

        /// Print a JSON summary to stdout instead of human output
        #[arg(long)]
        json: bool,
    },

    /// Validate a merge config without running
    Validate {
        /// Path to the merge config file
        config: PathBuf,
    },
}

#[derive(Debug)]
struct CliError {
    code: u8,
    message: String,
}

fn cli_err(code: u8, message: impl Into<String>) -> CliError {
    CliError {
        code,
        message: message.into(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, json } => cmd_run(&config, json),
        Commands::Validate { config } => cmd_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.message);
            ExitCode::from(e.code)
        }
    }
}

fn load_config(path: &Path) -> Result<MergeConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| cli_err(EXIT_IO, format!("cannot read config: {e}")))?;
    MergeConfig::from_toml(&text).map_err(|e| cli_err(EXIT_INVALID_CONFIG, e.to_string()))
}

fn cmd_validate(config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    println!("OK: {}", config.name);
    Ok(())
}

fn cmd_run(config_path: &Path, json: bool) -> Result<(), CliError> {
    let config = load_config(config_path)?;

    // Dataset paths resolve relative to the config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let read = |file: &str| {
        ledgerline_io::read_table(&base_dir.join(file)).map_err(|e| cli_err(EXIT_IO, e))
    };

    let input = PipelineInput {
        people_primary: read(&config.inputs.people_primary)?,
        people_secondary: read(&config.inputs.people_secondary)?,
        promotions: read(&config.inputs.promotions)?,
        transfers: read(&config.inputs.transfers)?,
        transactions: match &config.inputs.transactions {
            Some(file) => Some(read(file)?),
            None => None,
        },
    };

    let output = ledgerline_merge::run(&input);

    let out_dir = base_dir.join(&config.output.dir);
    std::fs::create_dir_all(&out_dir)
        .map_err(|e| cli_err(EXIT_IO, format!("cannot create {}: {e}", out_dir.display())))?;
    for (name, table) in &output.tables {
        let path = out_dir.join(format!("{name}.csv"));
        ledgerline_io::csv::write_table(&path, table).map_err(|e| cli_err(EXIT_IO, e))?;
    }

    if json {
        let summary = summarize(&config.name, &output);
        println!(
            "{}",
            serde_json::to_string_pretty(&summary)
                .map_err(|e| cli_err(EXIT_IO, e.to_string()))?
        );
    } else {
        println!(
            "{}: wrote {} tables to {}",
            config.name,
            output.tables.len(),
            out_dir.display()
        );
        for (name, table) in &output.tables {
            println!("  {name}: {} rows", table.row_count());
        }
        if !output.warnings.is_empty() {
            eprintln!("{} warning(s):", output.warnings.len());
            for warning in &output.warnings {
                eprintln!("  - {warning}");
            }
        }
    }

    Ok(())
}

fn summarize(name: &str, output: &MergeOutput) -> serde_json::Value {
    let tables: serde_json::Map<String, serde_json::Value> = output
        .tables
        .iter()
        .map(|(name, table)| (name.clone(), table.row_count().into()))
        .collect();

    serde_json::json!({
        "name": name,
        "engine_version": output.meta.engine_version,
        "run_at": output.meta.run_at,
        "tables": tables,
        "warnings": output.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn seed_datasets(dir: &Path) {
        write(
            dir,
            "people.json",
            r#"[
                {"user_id": 1, "first_name": "Eve", "last_name": "Adams",
                 "email": "eve@example.com", "phone": "555-0001",
                 "city": "Boston", "country": "US", "devices": ["android"]},
                {"user_id": 2, "first_name": "Nina", "last_name": "Brook",
                 "email": "nina@example.com", "phone": "555-0002",
                 "city": "Chicago", "country": "US", "devices": ["iphone"]}
            ]"#,
        );
        write(
            dir,
            "people.yml",
            "\
- user_id: 2
  first_name: Nina
  last_name: Brook
  email: nina@example.com
  phone: 555-0002
  city: Denver
  country: US
  devices:
    - iphone
- user_id: 3
  first_name: Ada
  last_name: Cole
  email: ada@example.com
  phone: 555-0003
  city: Austin
  country: US
  devices:
    - desktop
",
        );
        write(
            dir,
            "promotions.csv",
            "\
promotion,client_email,telephone
spring_sale,eve@example.com,
welcome,,555-0003
lost,nobody@example.com,
",
        );
        write(
            dir,
            "transfers.csv",
            "\
transfer_id,sender_id,recipient_id,amount
1,1,2,50.0
2,2,1,20.0
",
        );
        write(
            dir,
            "transactions.csv",
            "\
transaction_id,phone,item,store,price,quantity
100,555-0001,coffee,North,5.0,2
100,555-0001,bagel,North,3.0,1
101,555-0002,coffee,South,5.0,1
",
        );
        write(
            dir,
            "merge.toml",
            r#"
name = "Test merge"

[inputs]
people_primary   = "people.json"
people_secondary = "people.yml"
promotions       = "promotions.csv"
transfers        = "transfers.csv"
transactions     = "transactions.csv"

[output]
dir = "processed"
"#,
        );
    }

    #[test]
    fn run_writes_all_output_tables() {
        let dir = tempdir().unwrap();
        seed_datasets(dir.path());

        cmd_run(&dir.path().join("merge.toml"), false).unwrap();

        let processed = dir.path().join("processed");
        for name in [
            "people",
            "promotions",
            "transactions",
            "user_transactions",
            "user_transfers",
            "item_summary",
            "store_summary",
        ] {
            assert!(
                processed.join(format!("{name}.csv")).exists(),
                "missing {name}.csv"
            );
        }

        // Primary registry wins the user 2 conflict
        let people = ledgerline_io::read_table(&processed.join("people.csv")).unwrap();
        assert_eq!(people.row_count(), 3);
        assert_eq!(
            people.value(1, "city"),
            Some(&ledgerline_merge::Value::str("Chicago"))
        );

        let ut = ledgerline_io::read_table(&processed.join("user_transactions.csv")).unwrap();
        assert_eq!(ut.row_count(), 3);
    }

    #[test]
    fn validate_rejects_broken_config() {
        let dir = tempdir().unwrap();
        write(dir.path(), "merge.toml", "name = [");

        let err = cmd_validate(&dir.path().join("merge.toml")).unwrap_err();
        assert_eq!(err.code, EXIT_INVALID_CONFIG);
    }
}
