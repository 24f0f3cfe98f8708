//! Offload - políticas de offloading para um UE com recursos limitados
//! Interface de linha de comando para varreduras de alpha e de eta

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::*;
use offload_core::{
    EnvironmentParameters, OffloadingSystemConfig, ParameterRange, UserEquipmentComponentsConfig,
    UserEquipmentConfig, UserEquipmentStateConfig,
};
use offload_lp::OptimalPolicyFinder;
use offload_sim::{RangedAlphaTester, Simulator, SweepResult};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "offload")]
#[command(version)]
#[command(about = "Optimal stochastic offloading policies for a resource-constrained user equipment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep arrival probabilities and compare the LP policy with the baselines
    AlphaSweep {
        #[command(flatten)]
        system: SystemArgs,

        /// Arrival range per queue: VALUE or START:END:COUNT (repeat once per queue)
        #[arg(long = "alpha", value_name = "RANGE", required = true)]
        alpha: Vec<ParameterRange>,

        /// Simulated ticks per policy
        #[arg(long, env = "OFFLOAD_TICKS", default_value_t = 100_000)]
        ticks: u64,

        /// Fail when a baseline beats the stochastic policy
        #[arg(long)]
        validate: bool,

        /// Error window for --validate (stochastic * window < baseline)
        #[arg(long, env = "OFFLOAD_ERROR_WINDOW", default_value_t = offload_sim::DEFAULT_ERROR_WINDOW)]
        error_window: f64,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Sweep the power budget eta and report the optimal policy metrics
    EtaSweep {
        #[command(flatten)]
        system: SystemArgs,

        /// Arrival probability per queue (comma separated)
        #[arg(long, value_name = "ALPHA", value_delimiter = ',', required = true)]
        alpha: Vec<f64>,

        /// Budget range: VALUE or START:END:COUNT
        #[arg(long, value_name = "RANGE")]
        eta: ParameterRange,

        /// Also simulate each policy for this many ticks
        #[arg(long)]
        ticks: Option<u64>,

        #[command(flatten)]
        run: RunArgs,
    },
}

/// Parâmetros do UE e do ambiente
#[derive(Args, Debug, Clone)]
struct SystemArgs {
    /// Task queue capacities (comma separated, one per queue)
    #[arg(long, env = "OFFLOAD_QUEUE_CAPACITIES", value_delimiter = ',', default_value = "5")]
    capacities: Vec<u32>,

    /// Packets per task in the transmission unit
    #[arg(long, env = "OFFLOAD_TU_PACKETS", default_value_t = 4)]
    tu_packets: u32,

    /// Sections per task in the local CPU
    #[arg(long, env = "OFFLOAD_CPU_SECTIONS", default_value_t = 3)]
    cpu_sections: u32,

    /// Packet transmission success probability
    #[arg(long, env = "OFFLOAD_BETA", default_value_t = 0.9)]
    beta: f64,

    /// Local section success probability
    #[arg(long, env = "OFFLOAD_GAMMA", default_value_t = 1.0)]
    gamma: f64,

    /// Average power budget per tick
    #[arg(long, env = "OFFLOAD_ETA", default_value_t = 100.0)]
    budget: f64,

    /// Power drawn by a busy transmission unit
    #[arg(long, env = "OFFLOAD_P_TX", default_value_t = 1.5)]
    p_tx: f64,

    /// Power drawn by a busy CPU
    #[arg(long, env = "OFFLOAD_P_LOCAL", default_value_t = 1.5)]
    p_local: f64,

    /// Instantaneous power cap per tick
    #[arg(long, env = "OFFLOAD_P_MAX", default_value_t = 500.0)]
    p_max: f64,

    /// Optional bound on expected drops per tick
    #[arg(long, env = "OFFLOAD_MAX_DROP_RATE")]
    max_drop_rate: Option<f64>,

    /// Cloud replicas serving offloaded tasks
    #[arg(long, env = "OFFLOAD_N_CLOUD", default_value_t = 1)]
    n_cloud: u32,

    /// Cloud reply latency in ticks
    #[arg(long, env = "OFFLOAD_T_RX", default_value_t = 0.0)]
    t_rx: f64,
}

impl SystemArgs {
    fn to_config(&self, alpha: Vec<f64>) -> Result<OffloadingSystemConfig> {
        let mut components = UserEquipmentComponentsConfig::multi_queue(
            alpha,
            self.beta,
            self.budget,
            self.p_tx,
            self.p_local,
            self.p_max,
        )
        .with_gamma(self.gamma);
        if let Some(rate) = self.max_drop_rate {
            components = components.with_max_drop_rate(rate);
        }

        OffloadingSystemConfig::new(
            UserEquipmentConfig {
                state_config: UserEquipmentStateConfig::multi_queue(
                    self.capacities.clone(),
                    self.tu_packets,
                    self.cpu_sections,
                ),
                components_config: components,
            },
            EnvironmentParameters::new(self.n_cloud, self.t_rx),
        )
        .context("invalid system configuration")
    }
}

/// Opções de execução
#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Decimal digits of the LP tolerance (1-15)
    #[arg(long, env = "OFFLOAD_PRECISION", default_value_t = 6)]
    precision: u32,

    /// Base seed of the simulations
    #[arg(long, env = "OFFLOAD_SEED", default_value_t = offload_sim::DEFAULT_SEED)]
    seed: u64,

    /// Worker threads (defaults to available parallelism)
    #[arg(long, env = "OFFLOAD_WORKERS")]
    workers: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

/// Linha da varredura de eta
#[derive(Debug, Serialize)]
struct EtaRow {
    eta: f64,
    expected_queue_length: f64,
    expected_delay: f64,
    expected_power: f64,
    expected_drop_rate: f64,
    simulated_delay: Option<f64>,
}

fn main() {
    let _ = dotenv::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "offload=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::AlphaSweep {
            system,
            alpha,
            ticks,
            validate,
            error_window,
            run,
        } => alpha_sweep_command(&system, alpha, ticks, validate, error_window, &run),

        Commands::EtaSweep {
            system,
            alpha,
            eta,
            ticks,
            run,
        } => eta_sweep_command(&system, alpha, eta, ticks, &run),
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn alpha_sweep_command(
    system: &SystemArgs,
    alpha: Vec<ParameterRange>,
    ticks: u64,
    validate: bool,
    error_window: f64,
    run: &RunArgs,
) -> Result<()> {
    let first = alpha.iter().map(|range| range.to_vec().first().copied()).collect::<Option<Vec<_>>>();
    let Some(first) = first else {
        bail!("every alpha range needs at least one point");
    };
    let config = system.to_config(first)?;

    let mut tester = RangedAlphaTester::new(&config, alpha, run.precision, ticks, validate)?
        .with_error_window(error_window)?
        .with_seed(run.seed);
    if let Some(workers) = run.workers {
        tester = tester.with_workers(workers);
    }

    info!(points = tester.alpha_combinations().len(), "running alpha sweep");
    let result = tester.run()?;

    if run.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_sweep(&result);
    }
    Ok(())
}

fn eta_sweep_command(
    system: &SystemArgs,
    alpha: Vec<f64>,
    eta: ParameterRange,
    ticks: Option<u64>,
    run: &RunArgs,
) -> Result<()> {
    let config = system.to_config(alpha)?;

    let mut finder = OptimalPolicyFinder::new();
    if let Some(workers) = run.workers {
        finder = finder.with_workers(workers);
    }
    let policies = finder.find_optimal_policies_for_eta_range(&config, &eta, run.precision)?;

    let mut rows = Vec::with_capacity(policies.len());
    for optimal in &policies {
        let simulated_delay = match ticks {
            Some(ticks) => {
                let point = config.with_eta(optimal.eta)?;
                let stats = Simulator::new(&point)?
                    .with_seed(run.seed)
                    .simulate_policy(&optimal.policy, ticks)?;
                Some(stats.average_delay)
            }
            None => None,
        };
        rows.push(EtaRow {
            eta: optimal.eta,
            expected_queue_length: optimal.expected_queue_length,
            expected_delay: optimal.expected_delay,
            expected_power: optimal.expected_power,
            expected_drop_rate: optimal.expected_drop_rate,
            simulated_delay,
        });
    }

    if run.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_eta_rows(&rows);
    }
    Ok(())
}

fn print_sweep(result: &SweepResult) {
    println!(
        "{}",
        format!(
            "{:<20} {:>11} {:>11} {:>11} {:>11} {:>11} {:>11}",
            "alpha", "local", "transmit", "greedy-tx", "greedy-cpu", "stochastic", "lp"
        )
        .bold()
    );
    for point in &result.points {
        let (_, best) = point.best_baseline();
        let stochastic = format!("{:>11.4}", point.stochastic_delay);
        let stochastic = if point.stochastic_delay <= best {
            stochastic.green()
        } else {
            stochastic.yellow()
        };
        println!(
            "{:<20} {:>11.4} {:>11.4} {:>11.4} {:>11.4} {} {:>11.4}",
            format!("{:?}", point.alpha),
            point.local_only_delay,
            point.offload_only_delay,
            point.greedy_offload_first_delay,
            point.greedy_local_first_delay,
            stochastic,
            point.expected_stochastic_delay,
        );
    }
    println!("{}", "    Finished".green().bold());
}

fn print_eta_rows(rows: &[EtaRow]) {
    println!(
        "{}",
        format!(
            "{:>10} {:>12} {:>12} {:>12} {:>12} {:>12}",
            "eta", "E[queue]", "E[delay]", "E[power]", "E[drops]", "sim delay"
        )
        .bold()
    );
    for row in rows {
        let simulated = row
            .simulated_delay
            .map_or_else(|| "-".dimmed().to_string(), |d| format!("{d:.4}"));
        println!(
            "{:>10.4} {:>12.4} {:>12.4} {:>12.4} {:>12.6} {:>12}",
            row.eta, row.expected_queue_length, row.expected_delay, row.expected_power, row.expected_drop_rate, simulated
        );
    }
    println!("{}", "    Finished".green().bold());
}
