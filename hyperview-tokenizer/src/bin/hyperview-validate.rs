use hyperview_tokenizer::logging::{init_logging, LogConfig};
use hyperview_tokenizer::{
    default_modules, parse_xml, ApplicationDescription, GlobalContext, ResolvedComponent, RuntimePlatform,
    TokenizationError,
};
use std::env;
use std::fs;
use std::path::Path;
use std::process;

struct Options {
    verbosity: u8,
    config: Option<String>,
    platform: Option<RuntimePlatform>,
    dump: bool,
    files: Vec<String>,
}

fn usage() -> ! {
    eprintln!("Usage: hyperview-validate [-v...] [--config app.yaml] [--platform iOS|tvOS|macOS] [--dump] <file.xml>...");
    eprintln!();
    eprintln!("Files whose root is <styles name=...> or <templates name=...> are loaded as shared groups.");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  hyperview-validate Login.xml");
    eprintln!("  hyperview-validate --config app.yaml styles/*.xml components/*.xml");
    process::exit(1);
}

fn parse_args() -> Options {
    let mut options = Options {
        verbosity: 0,
        config: None,
        platform: None,
        dump: false,
        files: Vec::new(),
    };
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => options.config = Some(args.next().unwrap_or_else(|| usage())),
            "--platform" => {
                let value = args.next().unwrap_or_else(|| usage());
                match value.parse() {
                    Ok(platform) => options.platform = Some(platform),
                    Err(e) => {
                        eprintln!("{}", e);
                        process::exit(1);
                    }
                }
            }
            "--dump" => options.dump = true,
            "-h" | "--help" => usage(),
            flag if flag.starts_with("-v") && flag[1..].chars().all(|c| c == 'v') => {
                options.verbosity = options.verbosity.saturating_add((flag.len() - 1) as u8);
            }
            flag if flag.starts_with('-') => {
                eprintln!("Unknown option: {}", flag);
                usage();
            }
            _ => options.files.push(arg),
        }
    }
    if options.files.is_empty() {
        usage();
    }
    options
}

fn main() {
    let options = parse_args();
    init_logging(&LogConfig::from_verbosity(options.verbosity));

    let mut application = match &options.config {
        Some(path) => match ApplicationDescription::from_file(Path::new(path)) {
            Ok(application) => application,
            Err(e) => {
                eprintln!("✗ {} has errors:", path);
                print_error(&e);
                process::exit(1);
            }
        },
        None => ApplicationDescription::default(),
    };
    if let Some(platform) = options.platform {
        application.platform = platform;
    }

    let mut global = match GlobalContext::new(application, &default_modules()) {
        Ok(global) => global,
        Err(e) => {
            print_error(&e);
            process::exit(1);
        }
    };

    let mut exit_code = 0;
    let mut sources = Vec::new();
    for file_path in &options.files {
        match fs::read_to_string(file_path) {
            Ok(content) => sources.push((file_path.as_str(), content)),
            Err(e) => {
                eprintln!("✗ {}: failed to read file: {}", file_path, e);
                exit_code = 1;
            }
        }
    }

    // Shared groups first so components can resolve against them.
    let mut components = Vec::new();
    for (file_path, content) in &sources {
        match is_group_file(content) {
            Ok(true) => match global.add_group_xml(content) {
                Ok(()) => println!("✓ {} is valid", file_path),
                Err(e) => {
                    eprintln!("✗ {} has errors:", file_path);
                    print_error(&e);
                    exit_code = 1;
                }
            },
            Ok(false) => components.push((*file_path, content.as_str())),
            Err(e) => {
                eprintln!("✗ {} has errors:", file_path);
                print_error(&e);
                exit_code = 1;
            }
        }
    }

    let mut parsed = Vec::new();
    for (file_path, content) in components {
        let stem = Path::new(file_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Component");
        match global.add_component_xml(content, stem) {
            Ok(definition) => parsed.push((file_path, definition.type_name.clone())),
            Err(e) => {
                eprintln!("✗ {} has errors:", file_path);
                print_error(&e);
                exit_code = 1;
            }
        }
    }

    let mut resolved: Vec<ResolvedComponent> = Vec::new();
    for (file_path, type_name) in parsed {
        tracing::info!(file = file_path, component = %type_name, "resolving");
        match global.context(&type_name).and_then(|context| context.resolve()) {
            Ok(component) => {
                println!("✓ {} is valid", file_path);
                resolved.push(component);
            }
            Err(e) => {
                eprintln!("✗ {} has errors:", file_path);
                print_error(&e);
                exit_code = 1;
            }
        }
    }

    if options.dump && !resolved.is_empty() {
        match serde_yaml::to_string(&resolved) {
            Ok(yaml) => println!("{}", yaml),
            Err(e) => {
                eprintln!("Failed to serialize results: {}", e);
                exit_code = 1;
            }
        }
    }

    process::exit(exit_code);
}

fn is_group_file(content: &str) -> Result<bool, TokenizationError> {
    let root = parse_xml(content)?;
    Ok(matches!(root.name.as_str(), "styles" | "templates"))
}

fn print_error(error: &TokenizationError) {
    match error {
        TokenizationError::Xml(message) => {
            eprintln!("  XML error:");
            eprintln!("    {}", message);
        }
        TokenizationError::Config(message) => {
            eprintln!("  Configuration error:");
            eprintln!("    {}", message);
        }
        TokenizationError::StateTypeMismatch { name, types } => {
            eprintln!("  State item '{}' is used with different types:", name);
            eprintln!("    {}", types);
        }
        TokenizationError::ActionSignatureMismatch { action, reason } => {
            eprintln!("  Action '{}' has inconsistent parameters:", action);
            eprintln!("    {}", reason);
        }
        TokenizationError::CyclicComponentReference { path } => {
            eprintln!("  Components reference each other in a cycle:");
            eprintln!("    {}", path);
        }
        TokenizationError::CyclicStyleExtension { name, path } => {
            eprintln!("  Style '{}' extends itself:", name);
            eprintln!("    {}", path);
        }
        TokenizationError::Module(e) => {
            eprintln!("  Module registry error:");
            eprintln!("    {}", e);
        }
        e => {
            eprintln!("  {}", e);
        }
    }
}
