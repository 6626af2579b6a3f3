use bf_app::{AppError, AppResult, Scenario, run_batch, run_files};
use bf_core::Severity;
use bf_feedstock::filter_library;
use bf_intake::{DesignOverrides, IntakeRecord};
use bf_results::MassBalanceResults;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bf-cli")]
#[command(about = "BiogasFlow CLI - deterministic biogas, RNG and wastewater process design", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an intake file (and optional override snapshot)
    Validate {
        /// Path to the intake YAML or JSON file
        intake_path: PathBuf,
        /// Design override snapshot
        #[arg(long)]
        overrides: Option<PathBuf>,
    },
    /// Run the mass balance for one intake
    Run {
        /// Path to the intake YAML or JSON file
        intake_path: PathBuf,
        /// Design override snapshot
        #[arg(long)]
        overrides: Option<PathBuf>,
        /// Write results JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run several intakes in parallel
    Batch {
        /// Intake files
        #[arg(required = true)]
        intake_paths: Vec<PathBuf>,
        /// Design override snapshot applied to every intake
        #[arg(long)]
        overrides: Option<PathBuf>,
        /// Directory for one results JSON per intake
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Search the curated feedstock library
    Library {
        /// Name or alias fragment; lists everything when omitted
        query: Option<String>,
        /// Print profiles as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            intake_path,
            overrides,
        } => cmd_validate(&intake_path, overrides.as_deref()),
        Commands::Run {
            intake_path,
            overrides,
            output,
        } => cmd_run(&intake_path, overrides.as_deref(), output.as_deref()),
        Commands::Batch {
            intake_paths,
            overrides,
            output_dir,
        } => cmd_batch(&intake_paths, overrides.as_deref(), output_dir.as_deref()),
        Commands::Library { query, json } => cmd_library(query.as_deref().unwrap_or(""), json),
    }
}

fn load_intake(path: &Path) -> AppResult<IntakeRecord> {
    bf_intake::load_intake(path).map_err(|source| AppError::IntakeLoad {
        path: path.to_path_buf(),
        source,
    })
}

fn load_overrides(path: Option<&Path>) -> AppResult<DesignOverrides> {
    match path {
        Some(p) => bf_intake::load_overrides(p).map_err(|source| AppError::IntakeLoad {
            path: p.to_path_buf(),
            source,
        }),
        None => Ok(DesignOverrides::default()),
    }
}

fn cmd_validate(intake_path: &Path, overrides_path: Option<&Path>) -> AppResult<()> {
    println!("Validating intake: {}", intake_path.display());
    let intake = load_intake(intake_path)?;
    let overrides = load_overrides(overrides_path)?;
    println!("✓ Intake is valid");
    println!("  Project: {}", intake.name);
    println!("  Type: {}", intake.project_type());
    println!("  Feedstocks: {}", intake.feedstocks.len());
    if !overrides.is_empty() {
        println!("✓ Overrides are valid");
    }
    Ok(())
}

fn cmd_run(
    intake_path: &Path,
    overrides_path: Option<&Path>,
    output: Option<&Path>,
) -> AppResult<()> {
    let results = match run_files(intake_path, overrides_path) {
        Ok(r) => r,
        Err(e) if e.is_capacity_exceeded() => {
            eprintln!("✗ {}", e);
            eprintln!("  Outside the tabulated equipment range; an engineering estimate is required.");
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    match output {
        Some(path) => {
            bf_results::save_json(path, &results)?;
            print_summary(&results);
            println!("  Results written to {}", path.display());
        }
        None => println!("{}", bf_results::to_json(&results)?),
    }
    Ok(())
}

fn cmd_batch(
    intake_paths: &[PathBuf],
    overrides_path: Option<&Path>,
    output_dir: Option<&Path>,
) -> AppResult<()> {
    let overrides = load_overrides(overrides_path)?;
    let scenarios = intake_paths
        .iter()
        .map(|p| load_intake(p).map(|i| Scenario::new(i).with_overrides(overrides.clone())))
        .collect::<AppResult<Vec<_>>>()?;

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;
    }

    println!("Running {} scenarios", scenarios.len());
    let mut failures = 0;
    for (path, result) in intake_paths.iter().zip(run_batch(&scenarios)) {
        match result {
            Ok(results) => {
                println!("✓ {}", path.display());
                print_summary(&results);
                if let Some(dir) = output_dir {
                    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
                    bf_results::save_json(&dir.join(format!("{}.json", stem)), &results)?;
                }
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(path = %path.display(), error = %e, "scenario failed");
                println!("✗ {}: {}", path.display(), e);
            }
        }
    }
    println!(
        "{} succeeded, {} failed",
        scenarios.len() - failures,
        failures
    );
    Ok(())
}

fn cmd_library(query: &str, json: bool) -> AppResult<()> {
    let profiles = filter_library(query);
    if json {
        let text = serde_json::to_string_pretty(&profiles)
            .map_err(|e| AppError::Results(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    if profiles.is_empty() {
        println!("No library profiles match '{}'", query);
        return Ok(());
    }
    println!(
        "{:<28} {:>6} {:>7} {:>6} {:>8}",
        "Feedstock", "TS %", "VS/TS %", "BMP", "Packaged"
    );
    for p in profiles {
        println!(
            "{:<28} {:>6.1} {:>7.1} {:>6.2} {:>8}",
            p.name,
            p.ts_pct,
            p.vs_ts_pct,
            p.bmp_m3_per_kg_vs,
            if p.packaged { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn print_summary(results: &MassBalanceResults) {
    println!("  Project: {} [{}]", results.project_name, results.project_type);
    println!("  Run ID: {}", results.run_id);
    println!(
        "  Stages: {} treatment, {} digestion/gas",
        results.stages.len(),
        results.ad_stages.len()
    );
    println!(
        "  Convergence: {} in {} iterations",
        if results.convergence_achieved {
            "reached"
        } else {
            "NOT reached"
        },
        results.convergence_iterations
    );
    for key in ["biogas_scfm", "rng_scfm", "rng_mmbtu_per_day", "total_running_kw"] {
        if let Some(q) = results.summary.get(key) {
            println!("  {}: {:.1} {}", key, q.value, q.unit);
        }
    }
    println!("  Equipment items: {}", results.equipment.len());
    for w in results.warnings.iter().filter(|w| w.severity >= Severity::Warning) {
        println!("  ! {}", w.message);
    }
}
