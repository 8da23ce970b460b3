//! wftempl CLI - inspect and instantiate workflow templates

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use wftempl::ast::parameter_schema;
use wftempl::error::{FixSuggestion, WftError};
use wftempl::{
    read_arguments, upload_files, DirectoryTemplateSource, FileResolver, LocalFileResolver,
    OutputFormat, ParameterDeclaration, ParameterSet, SubstitutionMode, Template, TemplateSource,
    WftConfig,
};

#[derive(Parser)]
#[command(name = "wftempl")]
#[command(about = "wftempl - parameterized workflow templates")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a template and report on its parameters
    Check {
        /// Template file, or template id in the configured store
        file: String,
    },

    /// List parameter declarations in presentation order
    Params {
        /// Template file, or template id in the configured store
        file: String,
    },

    /// Validate arguments and print the instantiated document
    Instantiate {
        /// Template file, or template id in the configured store
        file: String,

        #[command(flatten)]
        arguments: ArgumentOpts,

        /// Output format (yaml, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Also substitute references embedded in larger strings
        #[arg(long)]
        interpolate: bool,

        /// Prompt for each argument on the terminal
        #[arg(short, long, conflicts_with_all = ["pairs", "args_file"])]
        interactive: bool,
    },

    /// List files that have to be staged for a run
    Uploads {
        /// Template file, or template id in the configured store
        file: String,

        #[command(flatten)]
        arguments: ArgumentOpts,

        /// Directory relative file arguments are resolved against
        #[arg(long, default_value = ".")]
        base: PathBuf,
    },

    /// Print the parameter declaration JSON Schema
    Schema,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct ArgumentOpts {
    /// Argument as id=value (record children as record.child=value)
    #[arg(short = 'a', long = "arg", value_name = "ID=VALUE")]
    pairs: Vec<String>,

    /// YAML or JSON file with a mapping of arguments
    #[arg(id = "args_file", long = "args", value_name = "FILE")]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the merged configuration
    Show,
    /// Print the config file path
    Path,
}

fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let result = WftConfig::load().map(WftConfig::with_env).and_then(|config| {
        match cli.command {
            Commands::Check { file } => check_template(&file, &config),
            Commands::Params { file } => list_params(&file, &config),
            Commands::Instantiate {
                file,
                arguments,
                format,
                interpolate,
                interactive,
            } => instantiate_template(
                &file,
                &arguments,
                format,
                interpolate,
                interactive,
                &config,
            ),
            Commands::Uploads {
                file,
                arguments,
                base,
            } => list_uploads(&file, &arguments, &base, &config),
            Commands::Schema => print_schema(),
            Commands::Config { action } => handle_config_command(action, &config),
        }
    });

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

/// A path on disk wins; otherwise the name is looked up in the configured store
fn open_template(file: &str, config: &WftConfig) -> Result<Template, WftError> {
    let path = Path::new(file);
    match &config.store.root {
        Some(root) if !path.exists() => DirectoryTemplateSource::new(root).load_template(file),
        _ => Template::load(path),
    }
}

/// Merge `--args` file and `-a id=value` pairs (pairs win)
fn collect_arguments(opts: &ArgumentOpts) -> Result<Value, WftError> {
    let mut arguments = match &opts.file {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            match serde_yaml::from_str::<Value>(&content)? {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                _ => {
                    return Err(WftError::ArgumentsNotMapping {
                        actual: format!("contents of {}", path.display()),
                    })
                }
            }
        }
        None => Map::new(),
    };

    for pair in &opts.pairs {
        insert_pair(&mut arguments, pair)?;
    }
    Ok(Value::Object(arguments))
}

/// Insert `a.b.c=value` as nested mappings; the value stays a string
fn insert_pair(arguments: &mut Map<String, Value>, pair: &str) -> Result<(), WftError> {
    let (key, value) = pair.split_once('=').ok_or_else(|| WftError::ParseError {
        details: format!("argument '{}' is not of the form id=value", pair),
    })?;

    let mut segments: Vec<&str> = key.trim().split('.').collect();
    let last = segments.pop().filter(|s| !s.is_empty()).ok_or_else(|| WftError::ParseError {
        details: format!("argument '{}' has an empty id", pair),
    })?;

    let mut scope = arguments;
    for segment in segments {
        let entry = scope
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        scope = entry.as_object_mut().ok_or_else(|| WftError::ParseError {
            details: format!("argument '{}' nests under a non-record value", pair),
        })?;
    }
    scope.insert(last.to_string(), Value::String(value.to_string()));
    Ok(())
}

fn check_template(file: &str, config: &WftConfig) -> Result<(), WftError> {
    let template = open_template(file, config)?;
    let parameters = template.parameters();
    let records = parameters.iter().filter(|d| d.is_record()).count();

    println!("{} Template is valid: {}", "✓".green(), file.cyan());
    println!(
        "  Version: {}",
        template.version().unwrap_or("(none)").cyan()
    );
    println!(
        "  Parameters: {} ({} records, {} top-level)",
        parameters.len(),
        records,
        parameters.roots().count()
    );
    for id in template.unreferenced() {
        println!("  {} '{}' is never referenced", "⚠".yellow(), id.yellow());
    }
    Ok(())
}

fn list_params(file: &str, config: &WftConfig) -> Result<(), WftError> {
    let template = open_template(file, config)?;
    let parameters = template.parameters();

    if parameters.is_empty() {
        println!("{}", "No parameters declared".dimmed());
        return Ok(());
    }

    for decl in parameters.list_sorted().into_iter().filter(|d| d.parent.is_none()) {
        print_param(parameters, decl, 0);
    }
    Ok(())
}

fn print_param(parameters: &ParameterSet, decl: &ParameterDeclaration, depth: usize) {
    let indent = "  ".repeat(depth);
    let marker = if decl.required { "" } else { " (optional)" };
    println!(
        "{}{} {}{}",
        indent,
        decl.id.cyan().bold(),
        decl.prompt().trim_end(),
        marker.dimmed()
    );
    if decl.description.is_some() {
        println!("{}    {}", indent, decl.description_or_name().dimmed());
    }
    if let Some(values) = &decl.values {
        let labels: Vec<String> = values.iter().map(|v| v.label()).collect();
        println!("{}    one of: {}", indent, labels.join(", "));
    }
    for child in parameters.sorted_children(&decl.id) {
        print_param(parameters, child, depth + 1);
    }
}

fn instantiate_template(
    file: &str,
    opts: &ArgumentOpts,
    format: Option<String>,
    interpolate: bool,
    interactive: bool,
    config: &WftConfig,
) -> Result<(), WftError> {
    let template = open_template(file, config)?;
    let arguments = if interactive {
        // prompts go to stderr so stdout stays the rendered document
        read_arguments(
            template.parameters(),
            &mut std::io::stdin().lock(),
            &mut std::io::stderr(),
        )?
    } else {
        collect_arguments(opts)?
    };

    let format = match format {
        Some(raw) => OutputFormat::parse(&raw).ok_or_else(|| WftError::ConfigError {
            reason: format!("unknown output format '{}' (use yaml or json)", raw),
        })?,
        None => config.output.format,
    };
    let mode = if interpolate {
        SubstitutionMode::Interpolate
    } else {
        config.substitution.mode
    };

    let document = template.instantiate_with(&arguments, mode)?;
    print!("{}", format.render(&document)?);
    if format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

fn list_uploads(
    file: &str,
    opts: &ArgumentOpts,
    base: &Path,
    config: &WftConfig,
) -> Result<(), WftError> {
    let template = open_template(file, config)?;
    let binding = template.bind(&collect_arguments(opts)?)?;
    let uploads = upload_files(template.parameters(), &binding);

    if uploads.is_empty() {
        println!("{}", "No files to stage".dimmed());
        return Ok(());
    }

    let resolver = LocalFileResolver::new(base);
    for upload in uploads {
        let source = resolver.resolve_file_argument(&upload.source)?;
        println!(
            "{} {} → {}",
            upload.parameter_id.cyan(),
            source.display(),
            upload.target.green()
        );
    }
    Ok(())
}

fn print_schema() -> Result<(), WftError> {
    println!("{}", serde_json::to_string_pretty(&parameter_schema()?)?);
    Ok(())
}

fn handle_config_command(action: ConfigAction, config: &WftConfig) -> Result<(), WftError> {
    match action {
        ConfigAction::Path => {
            println!("{}", WftConfig::config_path().display());
        }
        ConfigAction::Show => {
            println!("{}", "Configuration".cyan().bold());
            println!("  File: {}", WftConfig::config_path().display());
            println!("  Output format: {}", config.output.format.to_string().cyan());
            println!(
                "  Substitution: {}",
                config.substitution.mode.to_string().cyan()
            );
            match &config.store.root {
                Some(root) => println!("  Store root: {}", root.display().to_string().cyan()),
                None => println!("  Store root: {}", "(not set)".dimmed()),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pairs_become_string_arguments() {
        let mut args = Map::new();
        insert_pair(&mut args, "codeFile=hello.py").unwrap();
        insert_pair(&mut args, "sleeptime=5").unwrap();
        assert_eq!(
            Value::Object(args),
            json!({"codeFile": "hello.py", "sleeptime": "5"})
        );
    }

    #[test]
    fn dotted_pairs_nest_into_records() {
        let mut args = Map::new();
        insert_pair(&mut args, "output.outputType=7").unwrap();
        insert_pair(&mut args, "output.outputTarget=out.txt").unwrap();
        assert_eq!(
            Value::Object(args),
            json!({"output": {"outputType": "7", "outputTarget": "out.txt"}})
        );
    }

    #[test]
    fn value_may_contain_equals() {
        let mut args = Map::new();
        insert_pair(&mut args, "expr=a=b").unwrap();
        assert_eq!(args["expr"], json!("a=b"));
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        let mut args = Map::new();
        assert!(insert_pair(&mut args, "no-equals").is_err());
        assert!(insert_pair(&mut args, "=value").is_err());
        assert!(insert_pair(&mut args, "record.=value").is_err());
    }

    #[test]
    fn interactive_excludes_supplied_arguments() {
        use clap::Parser;
        assert!(Cli::try_parse_from(["wftempl", "instantiate", "t.yaml", "-i"]).is_ok());
        assert!(
            Cli::try_parse_from(["wftempl", "instantiate", "t.yaml", "-i", "-a", "n=1"]).is_err()
        );
        assert!(Cli::try_parse_from([
            "wftempl",
            "instantiate",
            "t.yaml",
            "--interactive",
            "--args",
            "a.yaml"
        ])
        .is_err());
    }

    #[test]
    fn args_file_is_merged_under_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("args.yaml");
        std::fs::write(&path, "codeFile: a.py\nsleeptime: 3\n").unwrap();

        let opts = ArgumentOpts {
            pairs: vec!["sleeptime=9".into()],
            file: Some(path),
        };
        assert_eq!(
            collect_arguments(&opts).unwrap(),
            json!({"codeFile": "a.py", "sleeptime": "9"})
        );
    }
}
