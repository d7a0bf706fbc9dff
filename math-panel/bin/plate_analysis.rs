//! Flat plate panel analysis
//!
//! Builds a rectangular flat plate with its wake, solves the unit flows and
//! writes one operating point, the stability derivatives and the vorton
//! induced drag to a JSON report.
//!
//! Usage:
//!   cargo run --release --bin plate-analysis -- --alpha 2 --speed 10
//!   cargo run --release --bin plate-analysis -- --config analysis.json --output plate.json

use anyhow::Context;
use clap::{Parser, ValueEnum};
use panel::{
    AnalysisConfig, FlatPlateSpec, Formulation, OperatingPoint, PanelAnalysis, Precision,
    StabDerivatives, VortonDrag, flat_plate,
};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "plate-analysis")]
#[command(about = "Panel-method analysis of a rectangular flat plate", long_about = None)]
struct Args {
    /// Path to a JSON analysis configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON report
    #[arg(short, long, default_value = "plate_analysis.json")]
    output: PathBuf,

    /// Plate chord (m)
    #[arg(long, default_value_t = 1.0)]
    chord: f64,

    /// Plate span (m)
    #[arg(long, default_value_t = 1.0)]
    span: f64,

    /// Chordwise panel rows
    #[arg(long, default_value_t = 4)]
    nx: usize,

    /// Spanwise panel columns
    #[arg(long, default_value_t = 4)]
    ny: usize,

    /// Wake panel pairs per column
    #[arg(long, default_value_t = 10)]
    wake_panels: usize,

    /// Angle of attack (degrees)
    #[arg(short, long, default_value_t = 2.0)]
    alpha: f64,

    /// Sideslip (degrees)
    #[arg(short, long, default_value_t = 0.0)]
    beta: f64,

    /// Freestream speed (m/s)
    #[arg(short, long, default_value_t = 10.0)]
    speed: f64,

    /// Override the doublet formulation
    #[arg(short, long)]
    formulation: Option<FormulationArg>,

    /// Store the matrix in single precision
    #[arg(long)]
    single: bool,

    /// Number of worker threads (default: all cores)
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Also search the zero-moment angle
    #[arg(long)]
    trim: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormulationArg {
    /// Linear doublets, three unknowns per panel
    Linear,
    /// Uniform doublets, one unknown per panel
    Uniform,
}

impl From<FormulationArg> for Formulation {
    fn from(arg: FormulationArg) -> Self {
        match arg {
            FormulationArg::Linear => Formulation::Linear,
            FormulationArg::Uniform => Formulation::Uniform,
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    version: &'static str,
    git_hash: &'static str,
    plate: FlatPlateSpec,
    config: AnalysisConfig,
    operating_point: OperatingPoint,
    stability: StabDerivatives,
    vorton_drag: VortonDrag,
    zero_moment_alpha_deg: Option<f64>,
    elapsed_ms: u128,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    let mut config = match &args.config {
        Some(path) => {
            println!("Loading configuration from: {}", path.display());
            AnalysisConfig::from_file(path)
                .with_context(|| format!("reading {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(formulation) = args.formulation {
        config = config.with_formulation(formulation.into());
    }
    if args.single {
        config = config.with_precision(Precision::Single);
    }
    if let Some(threads) = args.threads {
        config = config.with_threads(threads != 1, threads);
    }
    config.reference.chord = args.chord;
    config.reference.span = args.span;
    config.reference.area = args.chord * args.span;

    let plate = FlatPlateSpec {
        chord: args.chord,
        span: args.span,
        nx: args.nx,
        ny: args.ny,
        wake_panels: args.wake_panels,
        ..Default::default()
    };
    let mesh = flat_plate(&plate).context("building the flat plate mesh")?;

    println!("=== Flat plate {} x {} m ===", plate.chord, plate.span);
    println!(
        "Panels: {}, wake panels: {}, formulation: {:?}, precision: {:?}",
        mesh.n_panels(),
        mesh.n_wake_panels(),
        config.formulation,
        config.precision
    );

    let mut analysis = PanelAnalysis::new(mesh, config.clone())?;
    analysis.run().context("solving the unit flows")?;

    let alpha = args.alpha.to_radians();
    let beta = args.beta.to_radians();
    let operating_point = analysis.solve_operating_point(alpha, beta, args.speed)?;
    let stability = analysis.stability_derivatives(alpha, args.speed)?;
    let vorton_drag = analysis.vorton_drag(alpha, beta, args.speed)?;
    let zero_moment_alpha_deg = if args.trim {
        Some(analysis.zero_moment_angle()?.to_degrees())
    } else {
        None
    };

    let c = &operating_point.coefficients;
    println!("\n=== Results ===");
    println!("CL  = {:10.5}", c.cl);
    println!("CDi = {:10.6}", c.cd);
    println!("Cm  = {:10.5}", c.cm);
    println!("Zw  = {:10.4}", stability.Zw);
    println!("Mq  = {:10.4}", stability.Mq);
    println!("Vorton drag area = {:.6} m²", vorton_drag.drag_area);
    if let Some(a) = zero_moment_alpha_deg {
        println!("Zero-moment alpha = {:.4}°", a);
    }

    let report = Report {
        version: panel::VERSION,
        git_hash: panel::GIT_HASH,
        plate,
        config,
        operating_point,
        stability,
        vorton_drag,
        zero_moment_alpha_deg,
        elapsed_ms: start.elapsed().as_millis(),
    };
    fs::write(&args.output, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("\nReport written to: {}", args.output.display());

    Ok(())
}
