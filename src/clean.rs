use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{Duration, Local};
use clap::{ArgAction, Parser};
use log::{debug, info};

use crate::duration::parse_duration;
use crate::error::Result;
use crate::helm::{Executor, Helm, ListOptions, DEFAULT_MAX};
use crate::render::{render, OutputFormat};
use crate::selection::{select, Criteria, PatternSet};

const EXAMPLES: &str = "\
Examples:
    # List all releases which were not updated in 240h
    helm clean -A -b 240h

    # List releases created by a chart that matches chart-1
    helm clean -A -b 240h -I chart-1

    # List releases not created by a chart that matches chart-1
    helm clean -A -b 240h -E chart-1

    # Exclude namespaces matching a pattern
    helm clean -A -b 240h -e kube-system

    # Exclude releases matching a pattern
    helm clean -A -b 240h -e ':release-1'

    # Exclude releases and namespaces matching a pattern
    helm clean -A -b 240h -e '.*-namespace:.*-release'

    # Uninstall every release not updated in 30 days
    helm clean -A -b 720h --dry-run=false";

/// A helm plugin to list/clean out of date releases
#[derive(Debug, Parser)]
#[command(
    name = "clean",
    version,
    long_about = "A helm plugin to list/clean out of date releases\n\n\
                  Lists or uninstalls the releases which were not updated within a duration.",
    after_help = EXAMPLES
)]
pub struct CommandArgs {
    /// The last updated time before now, eg: 8h (0 lists every release)
    #[arg(short, long, value_name = "DURATION", default_value = "0", value_parser = parse_duration)]
    before: Duration,

    /// Only print the matching releases, pass --dry-run=false to uninstall them
    #[arg(
        short,
        long,
        action = ArgAction::Set,
        default_value_t = true,
        default_missing_value = "true",
        num_args = 0..=1,
        require_equals = true
    )]
    dry_run: bool,

    /// Check releases across all namespaces
    #[arg(short = 'A', long)]
    all_namespaces: bool,

    /// Prints the output in the specified format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Regular expression, only releases whose chart matches are included (can specify multiple)
    #[arg(short = 'I', long, value_name = "REGEX")]
    include_chart: Vec<String>,

    /// Regular expression, releases whose chart matches are excluded (can specify multiple)
    #[arg(short = 'E', long, value_name = "REGEX")]
    exclude_chart: Vec<String>,

    /// Regular expression on '<namespace>:<release>', only matches are included (can specify multiple)
    #[arg(short, long, value_name = "REGEX")]
    include: Vec<String>,

    /// Regular expression on '<namespace>:<release>', matches are excluded (can specify multiple)
    #[arg(short, long, value_name = "REGEX")]
    exclude: Vec<String>,

    /// Maximum number of releases to fetch
    #[arg(short, long, default_value_t = DEFAULT_MAX)]
    max: usize,

    /// Path to the helm binary
    #[arg(long, env = "HELM_BIN", default_value = "helm")]
    helm_bin: PathBuf,

    /// Show more detailed logs (repeat to show more)
    #[arg(short, action = ArgAction::Count)]
    pub verbosity: u8,
}

impl CommandArgs {
    fn criteria(&self) -> Result<Criteria> {
        Ok(Criteria {
            max_age: self.before,
            include_charts: PatternSet::new(&self.include_chart)?,
            exclude_charts: PatternSet::new(&self.exclude_chart)?,
            include: PatternSet::new(&self.include)?,
            exclude: PatternSet::new(&self.exclude)?,
        })
    }

    fn list_options(&self) -> ListOptions {
        ListOptions {
            all_namespaces: self.all_namespaces,
            max: self.max,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
pub async fn handle(args: CommandArgs) -> Result<()> {
    if !args.all_namespaces {
        debug!("No --all-namespaces given, helm will use the namespace of the current context.");
    }
    let helm = Helm::new(args.helm_bin.clone());
    let mut stdout = io::stdout().lock();
    run(&args, &helm, &mut stdout).await
}

/// Lists the releases matching `args`, then prints or uninstalls them.
///
/// Uninstalls happen one at a time in inventory order and stop at the first
/// failure.
pub async fn run<E: Executor, W: Write>(args: &CommandArgs, helm: &Helm<E>, out: &mut W) -> Result<()> {
    let criteria = args.criteria()?;
    let releases = helm.list_releases(&args.list_options()).await?;
    let selected = select(&releases, &criteria, &Local::now())?;
    info!("There are {} releases, {} matched.", releases.len(), selected.len());

    if args.dry_run {
        info!("Dry run, not uninstalling anything.");
        render(args.output, &selected, out)?;
    } else {
        for release in selected {
            let output = helm.uninstall(release).await?;
            write!(out, "{output}")?;
        }
        info!("Out of date releases uninstalled.");
    }
    Ok(())
}
