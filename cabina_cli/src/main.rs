//! # Cabina CLI
//!
//! Terminal front end for `cabina_core`.
//!
//! ```text
//! cabina coordination input.json        # relay / breaker coordination
//! cabina size --load-kw 500             # full substation sizing
//! cabina study study.json               # every item of a study file
//! ```
//!
//! Results print as text, or as JSON with `--json`. Logs go to stderr
//! (`RUST_LOG` overrides `-v`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cabina_core::calculations::cables::CableRun;
use cabina_core::calculations::economics::EconomicRates;
use cabina_core::calculations::harmonics::LoadProfile;
use cabina_core::calculations::neutral::Occupancy;
use cabina_core::calculations::selectivity::{self, CoordinationInput, CoordinationReport};
use cabina_core::calculations::substation::{self, SubstationInput, SubstationResult};
use cabina_core::calculations::transformer::{PowerKind, TransformerInput};
use cabina_core::calculations::CalculationOutput;
use cabina_core::catalog::cables::InstallationMethod;
use cabina_core::study::{ItemRun, Study};
use cabina_core::{CabinaConfig, CalcError};

#[derive(Debug, Parser)]
#[command(name = "cabina", version, about = "MV/LV substation sizing and protection coordination")]
struct Cli {
    /// Network and coordination policy file (.toml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate relay / breaker coordination from a JSON input file
    Coordination { input: PathBuf },
    /// Size a complete substation from the connected load
    Size(SizeArgs),
    /// Run every item of a study file
    Study { input: PathBuf },
}

#[derive(Debug, Args)]
struct SizeArgs {
    /// Connected load (kW, or kVA with --apparent)
    #[arg(long)]
    load_kw: f64,
    /// Load is apparent power (kVA)
    #[arg(long)]
    apparent: bool,
    #[arg(long, default_value_t = 0.7)]
    diversity: f64,
    #[arg(long, default_value_t = 0.85)]
    power_factor: f64,
    #[arg(long, default_value_t = 1.2)]
    margin: f64,
    #[arg(long)]
    mv_length_m: Option<f64>,
    #[arg(long)]
    lv_length_m: Option<f64>,
    #[arg(long)]
    ambient_c: Option<f64>,
    /// air, conduit, buried or cable_tray
    #[arg(long)]
    install: Option<InstallationMethod>,
    /// linear, mixed, non_linear or data_center
    #[arg(long, default_value = "mixed")]
    load_profile: LoadProfile,
    /// industrial or civil
    #[arg(long, default_value = "industrial")]
    occupancy: Occupancy,
    /// Energy price (€/kWh)
    #[arg(long)]
    energy_price: Option<f64>,
    /// Service life for the cost analysis (years)
    #[arg(long)]
    service_life: Option<u32>,
    #[arg(long, default_value = "Cabina")]
    label: String,
}

impl SizeArgs {
    fn to_input(&self) -> SubstationInput {
        let defaults = CableRun::default();
        let rates = EconomicRates::default();
        SubstationInput {
            label: self.label.clone(),
            load: TransformerInput {
                label: self.label.clone(),
                load_kw: self.load_kw,
                diversity_factor: self.diversity,
                power_factor: self.power_factor,
                margin: self.margin,
                power_kind: if self.apparent { PowerKind::Apparent } else { PowerKind::Active },
            },
            cables: CableRun {
                mv_length_m: self.mv_length_m.unwrap_or(defaults.mv_length_m),
                lv_length_m: self.lv_length_m.unwrap_or(defaults.lv_length_m),
                ambient_c: self.ambient_c.unwrap_or(defaults.ambient_c),
                installation: self.install.unwrap_or(defaults.installation),
                ..defaults
            },
            load_profile: self.load_profile,
            occupancy: self.occupancy,
            economics: EconomicRates {
                energy_price_per_kwh: self.energy_price.unwrap_or(rates.energy_price_per_kwh),
                service_life_years: self.service_life.unwrap_or(rates.service_life_years),
                ..rates
            },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            if let Some(calc) = e.downcast_ref::<CalcError>() {
                if let Ok(json) = serde_json::to_string(calc) {
                    eprintln!("{}", json);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match &cli.command {
        Command::Coordination { input } => {
            let input: CoordinationInput = read_json(input)?;
            let report = selectivity::evaluate(&input, &config.coordination).context("coordination failed")?;
            emit(cli.json, &report, || print_coordination(&report))
        }
        Command::Size(args) => {
            let result = substation::calculate(&args.to_input(), &config).context("substation sizing failed")?;
            emit(cli.json, &result, || print_substation(&result))
        }
        Command::Study { input } => {
            let source = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
            let mut study = Study::from_json(&source).with_context(|| format!("loading study {}", input.display()))?;
            if cli.config.is_some() {
                study.settings = config.network.clone();
            }
            let runs = study.run_all(&config.coordination);
            emit(cli.json, &runs, || print_study(&study, &runs))?;
            let failed = runs.iter().filter(|r| r.error.is_some()).count();
            if failed > 0 {
                anyhow::bail!("{} of {} study items failed", failed, runs.len());
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<CabinaConfig> {
    let Some(path) = path else {
        return Ok(CabinaConfig::default());
    };
    let source = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => CabinaConfig::from_json_str(&source),
        _ => CabinaConfig::from_toml_str(&source),
    }
    .with_context(|| format!("invalid config {}", path.display()))?;
    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let source = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&source)
        .map_err(|e| CalcError::SerializationError { reason: e.to_string() })
        .with_context(|| format!("parsing {}", path.display()))
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value).context("serializing output")?);
    } else {
        text();
    }
    Ok(())
}

fn rule(title: &str) {
    println!("═══════════════════════════════════════════════════════════════");
    println!("  {}", title);
    println!("═══════════════════════════════════════════════════════════════");
}

fn print_coordination(report: &CoordinationReport) {
    rule("PROTECTION COORDINATION");
    println!(
        "MV relay:   51 {:.1} A ({}, TMS {}), 50 {:.1} A after {:.0} ms",
        report.relay.overcurrent_pickup_a,
        report.relay.curve,
        report.relay.tms,
        report.relay.instantaneous_pickup_a,
        report.relay.instantaneous_delay_s * 1000.0
    );
    println!(
        "LV breaker: In {:.0} A, thermal {:.0} A, magnetic {:.0} A",
        report.breaker.rated_current_a,
        report.breaker.thermal_threshold_a(),
        report.breaker.magnetic_threshold_a()
    );
    println!("LV fault:   {:.2} kA", report.lv_fault_current_a / 1000.0);
    println!();
    println!(
        "{:>10}  {:>9}  {:>10}  {:>10}  {:>3}  {:>10}  {}",
        "I LV (A)", "I MV (A)", "LV trip", "MV trip", "st", "margin", "result"
    );
    for p in &report.points {
        let margin = p.margin_s.map_or_else(|| "-".to_string(), |m| format!("{:.0} ms", m * 1000.0));
        println!(
            "{:>10.0}  {:>9.1}  {:>10}  {:>10}  {:>3}  {:>10}  {}",
            p.test_current_a,
            p.mv_current_a,
            p.lv_trip.to_string(),
            p.mv_trip.to_string(),
            p.mv_stage.ansi_code(),
            margin,
            p.classification
        );
    }
    println!();
    println!(
        "Satisfactory: {}/{} ({:.0} %), rating {}",
        report.satisfactory_count, report.points_evaluated, report.satisfactory_percent, report.rating
    );
    println!(
        "MV backup at high current: {}",
        if report.mv_backup_available { "yes" } else { "no" }
    );
    for issue in &report.issues {
        println!("  ! {}", issue.description);
    }
    println!();
    println!("Recommendations:");
    for line in report.recommendations() {
        println!("  - {}", line);
    }
}

fn print_substation(result: &SubstationResult) {
    rule(&format!("SUBSTATION {}", result.label));
    let t = &result.transformer;
    println!(
        "Transformer: {} kVA (required {:.1} kVA), uk {} %, efficiency {:.2} %",
        t.selected_kva, t.required_kva, t.impedance_percent, t.efficiency.efficiency_percent
    );
    println!(
        "Currents:    MV {:.2} A, LV {:.1} A",
        t.mv_nominal_current_a, t.lv_nominal_current_a
    );
    let sc = &result.short_circuit;
    println!(
        "Faults:      MV {:.2} kA (peak {:.2}), LV {:.2} kA (peak {:.2})",
        sc.mv.symmetrical_ka.value(),
        sc.mv.peak_ka.value(),
        sc.lv.symmetrical_ka.value(),
        sc.lv.peak_ka.value()
    );
    let p = &result.protection;
    println!(
        "MV devices:  breaker {:.0} A, CT {}, VT {}",
        p.mv.breaker_rating_a, p.mv.ct_designation, p.mv.vt_designation
    );
    println!(
        "LV devices:  main breaker {:.0} A, Icu {:.0} kA, RCD {} mA",
        p.lv.main_breaker_a, p.lv.breaking_capacity_ka, p.lv.residual_sensitivity_ma
    );
    let c = &result.cables;
    for sel in [&c.mv, &c.lv] {
        println!(
            "{} cable:    {} mm², Iz {:.0} A for {:.0} A, drop {:.2} %{}",
            sel.voltage.code(),
            sel.section_mm2,
            sel.derated_ampacity_a,
            sel.design_current_a,
            sel.voltage_drop_percent,
            if sel.is_compliant() { "" } else { "  (NOT COMPLIANT)" }
        );
    }
    println!(
        "DPA:         MV {:.1} m, LV {:.1} m",
        result.emf_mv.dpa_m, result.emf_lv.dpa_m
    );
    let h = &result.harmonics;
    println!(
        "Harmonics:   {} load, THD I {:.1} %, THD V {:.2} %, derating {:.2}",
        h.load_profile, h.current_thd_percent, h.voltage_thd_percent, h.transformer_derating_factor
    );
    println!("Neutral:     {} ({})", result.neutral.system, result.neutral.reason);
    let room = &result.construction.user_room;
    println!(
        "User room:   {} × {} × {} m",
        room.length_m, room.depth_m, room.height_m
    );
    let e = &result.economics;
    println!(
        "Costs:       CAPEX {:.0} €, OPEX {:.0} €/year, TCO {:.0} € over {} years",
        e.capex.total, e.opex.total, e.indicators.total_cost_of_ownership, e.rates.service_life_years
    );
    println!();
    print_coordination(&result.coordination);
}

fn print_study(study: &Study, runs: &[ItemRun]) {
    rule(&format!(
        "STUDY {} - {} ({})",
        study.meta.job_id, study.meta.client, study.meta.engineer
    ));
    for run in runs {
        println!();
        println!("[{}] {}", run.calc_type, run.label);
        match (&run.output, &run.error) {
            (Some(CalculationOutput::Coordination(report)), _) => print_coordination(report),
            (Some(CalculationOutput::Substation(result)), _) => print_substation(result),
            (Some(output), _) => match serde_json::to_string_pretty(output) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("  (unprintable output: {})", e),
            },
            (None, Some(err)) => println!("  error [{}]: {}", err.error_code(), err),
            (None, None) => println!("  no output"),
        }
    }
}
