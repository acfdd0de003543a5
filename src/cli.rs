use crate::settings::Dialect;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// OpenAPI Inspect - Generate Swagger 2.0 / OpenAPI 3.0 documents from REST API descriptors
#[derive(Parser, Debug)]
#[command(name = "openapi-inspect")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Descriptor files, or directories to scan for them
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Document dialect; overrides the settings file
    #[arg(short = 'd', long = "dialect", value_enum)]
    pub dialect: Option<Dialect>,

    /// Generator settings file (YAML or JSON)
    #[arg(short = 's', long = "settings", value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Absolute API URL used for host and schemes
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// API title; replaces the declared info
    #[arg(long = "title")]
    pub title: Option<String>,

    /// API version; replaces the declared info version
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// Generate as a caller holding this permission (repeatable)
    #[arg(short = 'p', long = "permission", value_name = "PERMISSION")]
    pub permissions: Vec<String>,

    /// Include every view regardless of its required permissions
    #[arg(long = "public")]
    pub public: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    for input in &args.inputs {
        if !input.exists() {
            anyhow::bail!("Input does not exist: {}", input.display());
        }
    }
    if args.public && !args.permissions.is_empty() {
        warn!("--permission has no effect together with --public");
    }

    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    use crate::generator::{GenerationRequest, OpenApiSchemaGenerator};
    use crate::loader::DescriptorLoader;
    use crate::openapi::Info;
    use crate::scanner::FileScanner;
    use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
    use crate::settings::GeneratorSettings;

    info!("Starting document generation...");

    // Step 1: Load settings
    let mut settings = match &args.settings {
        Some(path) => GeneratorSettings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => GeneratorSettings::default(),
    };
    if let Some(dialect) = args.dialect {
        settings.dialect = dialect;
    }

    // Step 2: Collect descriptor files
    let mut files = Vec::new();
    for input in &args.inputs {
        if input.is_dir() {
            let scan_result = FileScanner::new(input.clone()).scan()?;
            info!(
                "Found {} descriptor files in {}",
                scan_result.descriptor_files.len(),
                input.display()
            );
            files.extend(scan_result.descriptor_files);
        } else {
            files.push(input.clone());
        }
    }
    if files.is_empty() {
        anyhow::bail!("No descriptor files found");
    }

    // Step 3: Load and merge descriptors
    let api = DescriptorLoader::load_files(&files).context("Failed to load API descriptors")?;
    if api.endpoints.is_empty() {
        warn!("No endpoints declared");
    }

    // Step 4: Generate
    let mut generator = OpenApiSchemaGenerator::new(&api, &settings)?;
    if let Some(title) = &args.title {
        let version = args.api_version.as_deref().unwrap_or("v1");
        generator = generator.with_info(Info::new(title.as_str(), version)?);
    }
    if let Some(version) = &args.api_version {
        generator = generator.with_version(version.as_str());
    }
    if let Some(url) = &args.url {
        generator = generator.with_url(url.as_str());
    }
    let request = (!args.permissions.is_empty())
        .then(|| GenerationRequest::with_permissions(args.permissions.iter().cloned()));

    let document = generator
        .get_schema(request.as_ref(), args.public)
        .context("Failed to generate document")?;
    info!("Generated {:?} document", document.dialect());

    // Step 5: Serialize and write
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };
    if let Some(output_path) = &args.output_path {
        write_to_file(&content, output_path)?;
        info!("Successfully wrote document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    info!("  - Descriptor files: {}", files.len());
    info!("  - Endpoints: {}", api.endpoints.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const API: &str = r#"
info: {title: Pets, version: "1"}
serializers:
  - name: PetSerializer
    fields:
      name: {type: char}
views:
  - name: PetList
    actions: {get: list}
    serializer: PetSerializer
    required_permissions: [view_pet]
endpoints:
  - {path: /pets/, method: get, view: PetList}
"#;

    fn args(inputs: Vec<PathBuf>, output: PathBuf, extra: &[&str]) -> CliArgs {
        let mut argv = vec!["openapi-inspect".to_string()];
        argv.extend(inputs.iter().map(|p| p.display().to_string()));
        argv.push("-o".to_string());
        argv.push(output.display().to_string());
        argv.extend(extra.iter().map(|s| s.to_string()));
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_run_writes_document() {
        let temp_dir = TempDir::new().unwrap();
        let api_dir = temp_dir.path().join("api");
        fs::create_dir(&api_dir).unwrap();
        fs::write(api_dir.join("pets.yaml"), API).unwrap();
        let output = temp_dir.path().join("out/openapi.json");

        let parsed = args(
            vec![api_dir],
            output.clone(),
            &["-f", "json", "-d", "openapi3", "--title", "Pet Store", "--api-version", "2"],
        );
        run(parse_args_from_parsed(parsed).unwrap()).unwrap();

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(document["info"]["title"], "Pet Store");
        assert_eq!(document["info"]["version"], "2");
        assert!(document["paths"]["/pets/"]["get"].is_object());
    }

    #[test]
    fn test_permissions_hide_views() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("pets.yaml");
        fs::write(&input, API).unwrap();
        let output = temp_dir.path().join("swagger.yaml");

        run(args(vec![input.clone()], output.clone(), &["-p", "other"])).unwrap();
        let document: serde_json::Value =
            serde_yaml::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(document["paths"], serde_json::json!({}));

        run(args(vec![input], output.clone(), &["-p", "view_pet"])).unwrap();
        let document: serde_json::Value =
            serde_yaml::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert!(document["paths"]["/pets/"].is_object());
    }

    #[test]
    fn test_missing_input_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let parsed = args(
            vec![temp_dir.path().join("missing.yaml")],
            temp_dir.path().join("out.yaml"),
            &[],
        );
        assert!(parse_args_from_parsed(parsed).is_err());
    }
}
