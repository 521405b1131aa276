//! mk - remote feature automation from the command line
//!
//! Discovers edges of a part studio and builds stepped holes through the
//! Onshape REST API. Results are printed as JSON on stdout; logs go to
//! stderr.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use glam::DVec2;
use mk_core::constants::DEFAULT_TOLERANCE;
use mk_core::{
    BodyReference, EdgeCatalog, EdgePredicate, FeatureDefinition, GeometryType, PlanOptions,
    ServiceClient, TopologyQuery, execute, find_circular_edges, match_edges, plan_with,
};
use mk_onshape::{OnshapeClient, OnshapeConfig};
use serde_json::json;

#[derive(Parser)]
#[command(name = "mk")]
#[command(about = "Edge discovery and stepped features for remote part studios", long_about = None)]
struct Cli {
    /// RON config file (ONSHAPE_* variables still override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    target: Target,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// Document ID
    #[arg(long, short = 'd', global = true)]
    document: Option<String>,
    /// Workspace ID
    #[arg(long, short = 'w', global = true)]
    workspace: Option<String>,
    /// Part studio element ID
    #[arg(long, short = 'e', global = true)]
    element: Option<String>,
    /// Restrict edge queries to one part
    #[arg(long, global = true)]
    part: Option<String>,
}

impl Target {
    fn body(&self) -> Result<BodyReference> {
        let document = self.document.clone().context("--document is required")?;
        let workspace = self.workspace.clone().context("--workspace is required")?;
        let element = self.element.clone().context("--element is required")?;
        let mut body = BodyReference::new(document, workspace, element);
        body.part_id = self.part.clone();
        Ok(body)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List deterministic IDs of edges matching all given filters
    Edges {
        /// Geometry type (line, circle, arc, spline, other)
        #[arg(long)]
        geometry: Option<GeometryType>,
        /// Target radius
        #[arg(long)]
        radius: Option<f64>,
        /// Radius tolerance
        #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,
        /// Only edges created by this feature
        #[arg(long)]
        feature: Option<String>,
    },
    /// Create a counterbore: one sketch + removal per diameter
    Counterbore {
        /// Center point X Y
        #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
        center: Vec<f64>,
        /// Radii, any order
        #[arg(long, num_args = 2.., required = true)]
        radii: Vec<f64>,
        /// Cumulative depths, paired with radii
        #[arg(long, num_args = 2.., required = true)]
        depths: Vec<f64>,
        /// Sketch plane (Top, Front, Right)
        #[arg(long, default_value = "Top")]
        plane: String,
        /// Feature name prefix
        #[arg(long, default_value = "Counterbore")]
        prefix: String,
        /// Reject depths that decrease from one step to the next
        #[arg(long)]
        strict_depths: bool,
    },
    /// Fillet every circular edge of a given radius
    FilletMatching {
        /// Radius of the circular edges to fillet
        #[arg(long)]
        radius: f64,
        /// Radius tolerance
        #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,
        /// Fillet radius
        #[arg(long)]
        fillet_radius: f64,
        /// Feature name
        #[arg(long, default_value = "Fillet")]
        name: String,
    },
}

fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mk_cli=info,mk_core=info,mk_onshape=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let client = OnshapeClient::new(config);
    let body = cli.target.body()?;

    match cli.command {
        Commands::Edges {
            geometry,
            radius,
            tolerance,
            feature,
        } => {
            let ids = list_edges(&client, &body, geometry, radius, tolerance, feature)?;
            println!("{}", serde_json::to_string_pretty(&ids)?);
        }
        Commands::Counterbore {
            center,
            radii,
            depths,
            plane,
            prefix,
            strict_depths,
        } => {
            let center = match center.as_slice() {
                [] => DVec2::ZERO,
                [x, y] => DVec2::new(*x, *y),
                _ => bail!("--center takes exactly two values"),
            };
            let plan = plan_with(
                center,
                &radii,
                &depths,
                &plane,
                &prefix,
                PlanOptions { strict_depths },
            )
            .with_context(|| "invalid counterbore request")?;

            let result = execute(&plan, &client, &body);
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_complete() {
                bail!(
                    "counterbore stopped after {} of {} steps",
                    result.completed_steps(),
                    plan.len()
                );
            }
        }
        Commands::FilletMatching {
            radius,
            tolerance,
            fillet_radius,
            name,
        } => {
            let edges = find_circular_edges(&client, &body, Some(radius), tolerance)?;
            if edges.is_empty() {
                bail!("no circular edges with radius {} ± {}", radius, tolerance);
            }
            tracing::info!("Filleting {} edges", edges.len());
            let fillet = FeatureDefinition::fillet(name, edges.clone(), fillet_radius)?;
            let id = client.create_feature(&body, &fillet)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "featureId": id, "edges": edges }))?
            );
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<OnshapeConfig> {
    let base = match path {
        Some(path) => OnshapeConfig::load(path)?,
        None => OnshapeConfig::default(),
    };
    Ok(base.with_overrides(|key| std::env::var(key).ok())?)
}

fn list_edges(
    client: &dyn ServiceClient,
    body: &BodyReference,
    geometry: Option<GeometryType>,
    radius: Option<f64>,
    tolerance: f64,
    feature: Option<String>,
) -> Result<Vec<String>> {
    let mut terms = Vec::new();
    if let Some(ty) = geometry {
        terms.push(EdgePredicate::GeometryType(ty));
    }
    if let Some(target) = radius {
        terms.push(EdgePredicate::radius_within(target, tolerance));
    }
    let mut query = TopologyQuery::new(body.clone());
    if let Some(feature) = feature {
        query = query.with_origin_features([feature.clone()]);
        terms.push(EdgePredicate::OriginFeature(feature));
    }

    let predicate = EdgePredicate::All(terms);
    predicate.validate()?;

    let catalog = EdgeCatalog::fetch_query(client, &query)?;
    Ok(match_edges(&catalog, &predicate)?)
}
