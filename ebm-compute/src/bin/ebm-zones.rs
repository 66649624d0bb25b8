//! ebm-zones: diagnóstico das zonas de kernel ligadas ao binário

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use ebm_compute::{
    cross_zone_check, linked_zones, ComputeConfig, Objective, ZoneInfo, ZoneSelector, METRIC_TOLERANCE,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ebm-zones")]
#[command(version)]
#[command(about = "Lista e verifica as zonas de kernel da ponte EBM", long_about = None)]
struct Cli {
    /// Arquivo de configuração (TOML)
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Zonas conhecidas, disponibilidade e símbolos exportados
    List {
        /// Saída em JSON
        #[arg(long)]
        json: bool,
    },

    /// Roda todas as zonas disponíveis num problema sintético e compara com a baseline
    Check {
        /// Número de samples
        #[arg(short, long, default_value_t = 10_000)]
        samples: usize,

        /// Objetivo (padrão: o da configuração)
        #[arg(short, long)]
        objective: Option<Objective>,

        /// Saída em JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuração efetiva e zona selecionada
    Config,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ebm_compute=info,ebm_bridge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ComputeConfig::load(cli.config.as_deref()).context("falha ao carregar configuração")?;
    match cli.command {
        Commands::List { json } => list_command(json),
        Commands::Check { samples, objective, json } => {
            let objective = match objective {
                Some(o) => o,
                None => config.objective()?,
            };
            check_command(objective, samples, json)
        }
        Commands::Config => config_command(&config),
    }
}

fn list_command(json: bool) -> Result<()> {
    let table = linked_zones()?;
    let infos = ZoneInfo::collect(table);
    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    println!("{}", "Zonas".bold());
    for info in &infos {
        let status = match (info.linked, info.available) {
            (false, _) => "não ligada".dimmed(),
            (true, false) => "indisponível".yellow(),
            (true, true) => "disponível".green(),
        };
        let baseline = if info.baseline { " (baseline)" } else { "" };
        println!("  {:<8} {}{}", info.zone.to_string().cyan(), status, baseline);
        for symbol in &info.symbols {
            println!("           {}", symbol);
        }
    }
    Ok(())
}

fn check_command(objective: Objective, samples: usize, json: bool) -> Result<()> {
    let table = linked_zones()?;
    let reports = cross_zone_check(table, objective, samples)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!(
            "{} {} ({} samples, tolerância {:e})",
            "Check".bold(),
            objective.to_string().cyan(),
            samples,
            METRIC_TOLERANCE
        );
        for report in &reports {
            let mark = if report.is_consistent() { "✓".green() } else { "✗".red() };
            println!(
                "  {} {:<8} métrica {:.12e}  Δrel {:.2e}  Δscore {:.2e}  Δgrad {:.2e}",
                mark,
                report.zone.to_string(),
                report.metric_sum,
                report.metric_rel_diff,
                report.max_score_diff,
                report.max_gradient_diff
            );
        }
    }

    let divergent: Vec<String> = reports
        .iter()
        .filter(|r| !r.is_consistent())
        .map(|r| r.zone.to_string())
        .collect();
    if !divergent.is_empty() {
        bail!("zonas divergentes: {}", divergent.join(", "));
    }
    Ok(())
}

fn config_command(config: &ComputeConfig) -> Result<()> {
    print!("{}", config.to_toml_string()?);
    let table = linked_zones()?;
    let zone = ZoneSelector::new(table).select(&config.zone)?;
    println!("\n# zona selecionada: {}", zone);
    Ok(())
}
