//! xcspm CLI
//!
//! Adds and removes Swift package product dependencies in an Xcode project.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use xcspm_cli::output::{format_count, Status};
use xcspm_core::config::Config;
use xcspm_core::error::{exit_codes, Error};
use xcspm_telemetry::{level_for_verbosity, TelemetryConfig, Timer};
use xcspm_xcode::{
    bundle_path, read_manifest, AddOutcome, Dependency, PackageRemoval, ProductRemoval,
    Reconciler, RemoveOutcome, SpmArtifacts, XcodeProject,
};

#[derive(Parser)]
#[command(name = "xcspm")]
#[command(about = "Add and remove Swift package dependencies in Xcode projects")]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Add a dependency
    #[arg(
        short = 'a',
        num_args = 4,
        value_names = ["PROJECT", "URL", "VERSION", "PRODUCT"],
        conflicts_with = "delete"
    )]
    add: Option<Vec<String>>,

    /// Remove a dependency
    #[arg(
        short = 'd',
        num_args = 4,
        value_names = ["PROJECT", "URL", "VERSION", "PRODUCT"]
    )]
    delete: Option<Vec<String>>,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Target to edit (defaults to the first target of the project)
    #[arg(long, global = true)]
    target: Option<String>,

    /// Apply changes in memory and report them without saving
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Add a package product dependency to the target
    Add(DependencyArgs),

    /// Remove a package product dependency from the target
    Remove(DependencyArgs),

    /// List the target's package product dependencies
    List {
        /// Path to the .xcodeproj directory or its project.pbxproj
        project: PathBuf,
    },

    /// Add every dependency declared in the manifest
    Sync {
        /// Path to the .xcodeproj directory or its project.pbxproj
        project: PathBuf,
        /// Manifest file (config.properties)
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Remove every dependency declared in the manifest and clean resolved packages
    Reset {
        /// Path to the .xcodeproj directory or its project.pbxproj
        project: PathBuf,
        /// Manifest file (config.properties)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Derived data directory holding SourcePackages
        #[arg(long)]
        derived_data: Option<PathBuf>,
        /// Leave Package.resolved and SourcePackages in place
        #[arg(long)]
        keep_artifacts: bool,
    },
}

#[derive(Args, Clone)]
struct DependencyArgs {
    /// Path to the .xcodeproj directory or its project.pbxproj
    project: PathBuf,
    /// Package repository URL
    url: String,
    /// Minimum version, up to the next major
    version: String,
    /// Product to link into the target
    product_name: String,
}

impl DependencyArgs {
    fn from_values(values: &[String]) -> xcspm_core::Result<Self> {
        match values {
            [project, url, version, product_name] => Ok(Self {
                project: PathBuf::from(project),
                url: url.clone(),
                version: version.clone(),
                product_name: product_name.clone(),
            }),
            _ => Err(usage_error("Expected <PROJECT> <URL> <VERSION> <PRODUCT>")),
        }
    }
}

/// Options shared by every command
struct Settings<'a> {
    config: &'a Config,
    target: Option<&'a str>,
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::SUCCESS,
                _ => exit_codes::FAILURE,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if cli.no_color {
        owo_colors::set_override(false);
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            Status::error(&e.to_string());
            std::process::exit(exit_codes::FAILURE);
        }
    };

    xcspm_telemetry::init_with_config(TelemetryConfig {
        log_level: level_for_verbosity(cli.verbose, cli.quiet, &config.schema.logging.level),
        ansi: !cli.no_color,
        ..TelemetryConfig::default()
    })?;

    let timer = Timer::start("xcspm");
    let result = run(&cli, &config);
    timer.stop();

    let exit_code = match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            tracing::debug!(report = ?e.to_report(), "Command failed");
            Status::error(&e.to_string());
            exit_codes::FAILURE
        }
    };

    std::process::exit(exit_code);
}

fn usage_error(message: &str) -> Error {
    Error::usage(message).with_suggestion(
        "Use `xcspm -a|-d <PROJECT> <URL> <VERSION> <PRODUCT>` or a subcommand; see --help",
    )
}

/// Resolve the legacy `-a`/`-d` flags and the subcommands into one command
fn resolve_command(cli: &Cli) -> xcspm_core::Result<Commands> {
    match (&cli.command, &cli.add, &cli.delete) {
        (Some(command), None, None) => Ok(command.clone()),
        (None, Some(values), None) => Ok(Commands::Add(DependencyArgs::from_values(values)?)),
        (None, None, Some(values)) => Ok(Commands::Remove(DependencyArgs::from_values(values)?)),
        (Some(_), _, _) => Err(usage_error("-a and -d cannot be combined with a subcommand")),
        _ => Err(usage_error("Missing operation")),
    }
}

fn run(cli: &Cli, config: &Config) -> xcspm_core::Result<()> {
    let settings = Settings {
        config,
        target: cli
            .target
            .as_deref()
            .or(config.schema.project.target.as_deref()),
        dry_run: cli.dry_run,
    };

    match resolve_command(cli)? {
        Commands::Add(args) => run_add(&args, &settings),
        Commands::Remove(args) => run_remove(&args, &settings),
        Commands::List { project } => run_list(&project, &settings),
        Commands::Sync { project, manifest } => run_sync(&project, manifest.as_deref(), &settings),
        Commands::Reset {
            project,
            manifest,
            derived_data,
            keep_artifacts,
        } => run_reset(
            &project,
            manifest.as_deref(),
            derived_data.as_deref(),
            keep_artifacts,
            &settings,
        ),
    }
}

fn ensure_project_exists(path: &Path) -> xcspm_core::Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::project_not_found(path))
    }
}

fn save(project: &XcodeProject, settings: &Settings) -> xcspm_core::Result<()> {
    if settings.dry_run {
        Status::info(&format!("Dry run: {} was not modified", project.display_name()));
        return Ok(());
    }
    project.save()
}

fn manifest_path(flag: Option<&Path>, settings: &Settings) -> PathBuf {
    flag.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&settings.config.schema.manifest.path))
}

fn run_add(args: &DependencyArgs, settings: &Settings) -> xcspm_core::Result<()> {
    ensure_project_exists(&args.project)?;
    let dependency = Dependency::new(&args.url, &args.version, &args.product_name)?;
    let mut project = XcodeProject::open(&args.project)?;
    let name = project.display_name();

    let outcome = Reconciler::new(&mut project, settings.target)?.add(&dependency)?;
    if report_add(&dependency, &outcome) {
        save(&project, settings)?;
        Status::success(&format!(
            "Successfully added SPM dependency '{}' ({} @ {}) to {}",
            dependency.product_name, dependency.url, dependency.version, name
        ));
    }
    Ok(())
}

fn run_remove(args: &DependencyArgs, settings: &Settings) -> xcspm_core::Result<()> {
    ensure_project_exists(&args.project)?;
    let dependency = Dependency::new(&args.url, &args.version, &args.product_name)?;
    let mut project = XcodeProject::open(&args.project)?;
    let name = project.display_name();

    let outcome = Reconciler::new(&mut project, settings.target)?.remove(&dependency)?;
    if report_remove(&dependency, &outcome) {
        save(&project, settings)?;
    }
    Status::success(&format!(
        "Successfully removed SPM dependency '{}' from {}",
        dependency.product_name, name
    ));
    Ok(())
}

fn run_list(path: &Path, settings: &Settings) -> xcspm_core::Result<()> {
    ensure_project_exists(path)?;
    let mut project = XcodeProject::open(path)?;
    let name = project.display_name();
    let listing = Reconciler::new(&mut project, settings.target)?.list();

    Status::header(&format!("{} · target '{}'", name, listing.target.name));
    if listing.dependencies.is_empty() {
        Status::info("No Swift package products");
    }
    for dependency in &listing.dependencies {
        let source = match &dependency.package {
            Some(package) => match &package.requirement {
                Some(requirement) => format!("{} ({})", package.url, requirement),
                None => package.url.clone(),
            },
            None => "unknown package".to_string(),
        };
        let product = dependency
            .product
            .product_name
            .as_deref()
            .unwrap_or("<unnamed product>");
        Status::bullet(&format!("{} from {}", product, source));
    }
    for package in &listing.unused_packages {
        Status::warning(&format!(
            "Package reference '{}' is not used by any product on '{}'",
            package.url, listing.target.name
        ));
    }
    Ok(())
}

fn run_sync(path: &Path, manifest: Option<&Path>, settings: &Settings) -> xcspm_core::Result<()> {
    ensure_project_exists(path)?;
    let manifest = manifest_path(manifest, settings);
    let dependencies = read_manifest(&manifest)?;
    if dependencies.is_empty() {
        Status::warning(&format!(
            "No dependencies found in {}. Skipping SPM update.",
            manifest.display()
        ));
        return Ok(());
    }

    Status::info(&format!(
        "Found {}:",
        format_count(dependencies.len(), "SPM dependency", "SPM dependencies")
    ));
    for dependency in &dependencies {
        Status::bullet(&format!(
            "{} ({} @ {})",
            dependency.product_name, dependency.url, dependency.version
        ));
    }

    let mut project = XcodeProject::open(path)?;
    let mut changed = false;
    {
        let mut reconciler = Reconciler::new(&mut project, settings.target)?;
        for dependency in &dependencies {
            let outcome = reconciler.add(dependency)?;
            changed |= report_add(dependency, &outcome);
        }
    }

    if changed {
        save(&project, settings)?;
    }
    Status::success("SPM update completed.");
    Ok(())
}

fn run_reset(
    path: &Path,
    manifest: Option<&Path>,
    derived_data: Option<&Path>,
    keep_artifacts: bool,
    settings: &Settings,
) -> xcspm_core::Result<()> {
    ensure_project_exists(path)?;
    let manifest = manifest_path(manifest, settings);
    let dependencies = read_manifest(&manifest)?;

    if dependencies.is_empty() {
        Status::warning(&format!(
            "No dependencies found in {}. Skipping dependency removal.",
            manifest.display()
        ));
    } else {
        let mut project = XcodeProject::open(path)?;
        let mut changed = false;
        {
            let mut reconciler = Reconciler::new(&mut project, settings.target)?;
            for dependency in &dependencies {
                let outcome = reconciler.remove(dependency)?;
                changed |= report_remove(dependency, &outcome);
            }
        }
        if changed {
            save(&project, settings)?;
        }
    }

    if keep_artifacts || settings.dry_run {
        Status::info("Keeping resolved package artifacts");
    } else {
        let derived_data = derived_data
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&settings.config.schema.cleanup.derived_data));
        let removed = SpmArtifacts::locate(&bundle_path(path), &derived_data).clean()?;
        for artifact in &removed {
            Status::info(&format!("Removed {}", artifact.display()));
        }
    }

    Status::success("SPM reset completed.");
    Ok(())
}

/// Print what `add` did; true when the project changed
fn report_add(dependency: &Dependency, outcome: &AddOutcome) -> bool {
    match outcome {
        AddOutcome::Added { reused_package, .. } => {
            if *reused_package {
                Status::info(&format!(
                    "Reusing existing package reference for '{}'.",
                    dependency.url
                ));
            }
            true
        }
        AddOutcome::AlreadyPresent { existing_url, .. } => {
            match existing_url {
                Some(url) => Status::warning(&format!(
                    "Product dependency '{}' already exists in the project (from '{}'). Skipping add.",
                    dependency.product_name, url
                )),
                None => Status::warning(&format!(
                    "Product dependency '{}' already exists in the project. Skipping add.",
                    dependency.product_name
                )),
            }
            false
        }
    }
}

/// Print what `remove` did; true when the project changed
fn report_remove(dependency: &Dependency, outcome: &RemoveOutcome) -> bool {
    match outcome.product {
        ProductRemoval::Removed => Status::info(&format!(
            "Removed product dependency '{}'.",
            dependency.product_name
        )),
        ProductRemoval::NotFound => Status::warning(&format!(
            "Product dependency '{}' not found in target. Skipping.",
            dependency.product_name
        )),
    }

    match outcome.package {
        PackageRemoval::Removed => Status::info(&format!(
            "Removed package reference '{}'.",
            dependency.url
        )),
        PackageRemoval::StillInUse => Status::info(&format!(
            "Package reference '{}' is still used by other products. Keeping it.",
            dependency.url
        )),
        PackageRemoval::NotFound => Status::warning(&format!(
            "Package reference '{}' not found in project. Skipping.",
            dependency.url
        )),
    }

    outcome.product == ProductRemoval::Removed || outcome.package == PackageRemoval::Removed
}
