//! dagviolations CLI

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use dv_data::{ConfoundInjection, DatasetSpec};
use dv_inference::{ExperimentConfig, ExperimentFamily, ExperimentOverrides};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dagviolations")]
#[command(about = "dagviolations - causal effect estimators under unobserved confounding")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every scenario of an experiment family and write the results table
    Simulate {
        /// Experiment family: backdoor or iv
        #[arg(long, default_value = "backdoor")]
        family: ExperimentFamily,

        /// Experiment file (JSON, or YAML for .yaml/.yml). CLI flags take precedence.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Iterations per scenario
        #[arg(long)]
        times: Option<usize>,

        /// True treatment effect; the default scenarios scale with it
        #[arg(long)]
        beta: Option<f64>,

        /// Base RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Threads (0 = all cores, 1 = sequential). Results do not depend on it.
        #[arg(long)]
        threads: Option<usize>,

        /// Rows per generated dataset
        #[arg(long)]
        samples: Option<usize>,

        /// Output results table (tab separated)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate one synthetic dataset and print its metadata as JSON
    Generate {
        /// True treatment effect
        #[arg(long, default_value = "10")]
        beta: f64,

        /// Number of rows
        #[arg(long, default_value = "10000")]
        samples: usize,

        /// Number of common causes (W)
        #[arg(long, default_value = "5")]
        common_causes: usize,

        /// Number of instruments (Z)
        #[arg(long, default_value = "2")]
        instruments: usize,

        /// Number of effect modifiers (X)
        #[arg(long, default_value = "0")]
        effect_modifiers: usize,

        /// Number of treatments (v)
        #[arg(long, default_value = "1")]
        treatments: usize,

        /// Keep treatments continuous instead of binarizing them
        #[arg(long)]
        continuous_treatment: bool,

        /// Binarize the outcome
        #[arg(long)]
        binary_outcome: bool,

        /// Common causes affected by the unobserved confounder
        #[arg(long, default_value = "0")]
        num_w_affected: usize,

        /// Effect of the confounder on each affected common cause
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        effect_on_w: f64,

        /// Instruments affected by the unobserved confounder
        #[arg(long, default_value = "0")]
        num_z_affected: usize,

        /// Effect of the confounder on each affected instrument
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        effect_on_z: f64,

        /// Treatments affected by the unobserved confounder
        #[arg(long, default_value = "0")]
        num_t_affected: usize,

        /// Effect of the confounder on each affected treatment
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        effect_on_t: f64,

        /// Effect of the confounder on the outcome
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        effect_on_y: f64,

        /// RNG seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Output data table (tab separated)
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the causal graph
        #[arg(long)]
        graph: Option<PathBuf>,

        /// Graph encoding
        #[arg(long, value_enum, default_value = "dot")]
        graph_format: GraphFormat,
    },

    /// Render a results table (or a box-plot artifact JSON) as an SVG box plot
    Render {
        /// Results table (.tsv) or box-plot artifact (.json)
        #[arg(short, long)]
        input: PathBuf,

        /// Output SVG
        #[arg(short, long)]
        output: PathBuf,

        /// True effect, drawn as a horizontal reference line (default: the
        /// artifact's own reference, else 10)
        #[arg(long, allow_hyphen_values = true, conflicts_with = "no_reference")]
        reference: Option<f64>,

        /// Do not draw the reference line
        #[arg(long)]
        no_reference: bool,

        /// Built-in theme (classic, paper, minimal)
        #[arg(long)]
        theme: Option<String>,

        /// YAML styling overrides
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print version
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GraphFormat {
    Dot,
    Gml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Simulate { family, config, times, beta, seed, threads, samples, output } => {
            let cli_overrides = ExperimentOverrides {
                beta,
                times,
                seed,
                threads,
                num_samples: samples,
                ..Default::default()
            };
            cmd_simulate(family, config.as_deref(), cli_overrides, &output)
        }
        Commands::Generate {
            beta,
            samples,
            common_causes,
            instruments,
            effect_modifiers,
            treatments,
            continuous_treatment,
            binary_outcome,
            num_w_affected,
            effect_on_w,
            num_z_affected,
            effect_on_z,
            num_t_affected,
            effect_on_t,
            effect_on_y,
            seed,
            output,
            graph,
            graph_format,
        } => {
            let spec = DatasetSpec {
                beta,
                num_samples: samples,
                num_common_causes: common_causes,
                num_instruments: instruments,
                num_effect_modifiers: effect_modifiers,
                num_treatments: treatments,
                treatment_is_binary: !continuous_treatment,
                outcome_is_binary: binary_outcome,
                confound: ConfoundInjection {
                    num_w_affected,
                    effect_on_w,
                    num_z_affected,
                    effect_on_z,
                    num_t_affected,
                    effect_on_t,
                    effect_on_y,
                },
            };
            cmd_generate(&spec, seed, &output, graph.as_deref(), graph_format)
        }
        Commands::Render { input, output, reference, no_reference, theme, config } => {
            let reference = if no_reference { Reference::Off } else { Reference::from(reference) };
            cmd_render(&input, &output, reference, theme.as_deref(), config.as_deref())
        }
        Commands::Version => {
            println!("dagviolations {}", dv_core::VERSION);
            Ok(())
        }
    }
}

fn has_yaml_extension(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"))
}

fn load_overrides(path: &Path) -> Result<ExperimentOverrides> {
    tracing::info!(path = %path.display(), "loading experiment file");
    let text = std::fs::read_to_string(path)?;
    let overrides = if has_yaml_extension(path) {
        serde_yaml_ng::from_str(&text)?
    } else {
        serde_json::from_str(&text)?
    };
    Ok(overrides)
}

fn cmd_simulate(
    family: ExperimentFamily,
    config_path: Option<&Path>,
    cli_overrides: ExperimentOverrides,
    output: &Path,
) -> Result<()> {
    let mut config = ExperimentConfig::for_family(family);
    let mut file_scenarios = None;
    if let Some(path) = config_path {
        let mut file = load_overrides(path)?;
        file_scenarios = file.scenarios.take();
        config.apply(file)?;
    }
    config.apply(cli_overrides)?;
    // Scenarios listed in the file are kept verbatim even if --beta rescaled the defaults.
    if let Some(scenarios) = file_scenarios {
        config.scenarios = scenarios;
    }
    if config.scenarios.is_empty() {
        anyhow::bail!("experiment has no scenarios");
    }

    let rows = dv_inference::run_experiment(&config)?;
    dv_viz::write_results_path(output, &rows)?;
    tracing::info!(rows = rows.len(), path = %output.display(), "results written");

    let summary = serde_json::json!({
        "family": config.family.name(),
        "beta": config.beta,
        "times": config.times,
        "seed": config.seed,
        "methods": config.methods.iter().map(|m| m.identifier()).collect::<Vec<_>>(),
        "scenarios": config.scenarios.iter().map(|s| s.affected.as_str()).collect::<Vec<_>>(),
        "rows": rows.len(),
        "output": output.display().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_generate(
    spec: &DatasetSpec,
    seed: u64,
    output: &Path,
    graph_path: Option<&Path>,
    graph_format: GraphFormat,
) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let ds = dv_data::generate_dataset(spec, &mut rng)?;

    ds.table.write_delimited(BufWriter::new(File::create(output)?), b'\t')?;
    tracing::info!(rows = ds.table.n_rows(), cols = ds.table.n_cols(), path = %output.display(), "dataset written");

    if let Some(path) = graph_path {
        let encoded = match graph_format {
            GraphFormat::Dot => ds.dot_graph(),
            GraphFormat::Gml => ds.gml_graph(),
        };
        std::fs::write(path, encoded)?;
    }

    let names = |ids: &[dv_core::ColumnId]| ids.iter().map(|id| id.to_string()).collect::<Vec<_>>();
    let summary = serde_json::json!({
        "spec": spec,
        "seed": seed,
        "n_rows": ds.table.n_rows(),
        "columns": ds.table.column_names(),
        "ate": ds.ate,
        "treatments": names(&ds.treatments),
        "outcome": ds.outcome.to_string(),
        "common_causes": names(&ds.common_causes),
        "instruments": names(&ds.instruments),
        "effect_modifiers": names(&ds.effect_modifiers),
        "affected": ds.affected,
        "coefficients": ds.coefficients,
        "dot_graph": ds.dot_graph(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Reference-line choice for `render`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Reference {
    /// Keep an artifact's own reference, else [`dv_inference::DEFAULT_BETA`].
    Default,
    Value(f64),
    Off,
}

impl From<Option<f64>> for Reference {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Reference::Default, Reference::Value)
    }
}

impl Reference {
    fn resolve(self, existing: Option<f64>) -> Option<f64> {
        match self {
            Reference::Default => existing.or(Some(dv_inference::DEFAULT_BETA)),
            Reference::Value(v) => Some(v),
            Reference::Off => None,
        }
    }
}

fn cmd_render(
    input: &Path,
    output: &Path,
    reference: Reference,
    theme: Option<&str>,
    config_path: Option<&Path>,
) -> Result<()> {
    let user_yaml = config_path.map(std::fs::read_to_string).transpose()?;
    let viz_config = dv_viz_render::config::resolve_config(theme, user_yaml.as_deref())?;

    let is_json = matches!(input.extension().and_then(|e| e.to_str()), Some("json"));
    let artifact = if is_json {
        let mut artifact: dv_viz::BoxPlotArtifact = serde_json::from_str(&std::fs::read_to_string(input)?)?;
        artifact.reference = reference.resolve(artifact.reference);
        artifact
    } else {
        let rows = dv_viz::read_results_path(input)?;
        tracing::info!(rows = rows.len(), path = %input.display(), "results loaded");
        dv_viz::BoxPlotArtifact::from_rows(&rows, reference.resolve(None))?
    };

    dv_viz_render::render_boxplot_to_file(&artifact, output, &viz_config)?;
    tracing::info!(
        boxes = artifact.groups.len(),
        theme = %viz_config.theme,
        path = %output.display(),
        "box plot written"
    );
    Ok(())
}
