use clap::Parser;
use vbind_site::{BuildMode, Cli, Commands, OutputFormat, PurgeArgs};

fn purge_args(cli: Cli) -> PurgeArgs {
    match cli.command {
        Commands::Purge(args) => args,
        other => panic!("Expected Purge command, got {:?}", other),
    }
}

#[test]
fn test_cli_parse_basic() {
    let cli = Cli::parse_from([
        "vbind-site",
        "purge",
        "-c", "dist/main.css",
        "-o", "dist/main.min.css",
        "--mode", "production",
    ]);
    assert!(!cli.verbose);

    let args = purge_args(cli);
    assert_eq!(args.css.to_str().unwrap(), "dist/main.css");
    assert_eq!(args.output.to_str().unwrap(), "dist/main.min.css");
    assert_eq!(args.mode, BuildMode::Production);
    assert!(args.input.is_empty());
    assert!(args.manifest.is_none());
    assert!(!args.dry_run);
}

#[test]
fn test_cli_parse_with_flags() {
    let cli = Cli::parse_from([
        "vbind-site",
        "purge",
        "-c", "main.css",
        "-i", "src/**/*.vue",
        "-i", "src/**/*.js",
        "-e", "src/vendor/**",
        "-o", "out.css",
        "-m", "report.json",
        "--config", "site.yaml",
        "--root", "/srv/blog",
        "--mode", "development",
        "--dry-run",
        "--no-progress",
        "--allow-symlinks",
        "-j", "4",
        "-v",
    ]);
    assert!(cli.verbose);

    let args = purge_args(cli);
    assert_eq!(args.input, vec!["src/**/*.vue", "src/**/*.js"]);
    assert_eq!(args.exclude, vec!["src/vendor/**"]);
    assert_eq!(args.manifest.unwrap().to_str().unwrap(), "report.json");
    assert_eq!(args.config.unwrap().to_str().unwrap(), "site.yaml");
    assert_eq!(args.root.unwrap().to_str().unwrap(), "/srv/blog");
    assert_eq!(args.mode, BuildMode::Development);
    assert!(args.dry_run);
    assert!(args.no_progress);
    assert!(args.allow_symlinks);
    assert_eq!(args.jobs, Some(4));
}

#[test]
fn test_cli_non_production_modes_are_development() {
    let cli = Cli::parse_from([
        "vbind-site",
        "purge",
        "-c", "a.css",
        "-o", "b.css",
        "--mode", "staging",
    ]);
    assert_eq!(purge_args(cli).mode, BuildMode::Development);

    let cli = Cli::parse_from([
        "vbind-site",
        "purge",
        "-c", "a.css",
        "-o", "b.css",
        "--mode", "PRODUCTION",
    ]);
    assert_eq!(purge_args(cli).mode, BuildMode::Production);
}

#[test]
fn test_cli_mode_from_node_env() {
    // Other tests in this file pass --mode explicitly
    std::env::set_var("NODE_ENV", "test");
    let parsed = Cli::try_parse_from(["vbind-site", "purge", "-c", "a.css", "-o", "b.css"]);
    std::env::set_var("NODE_ENV", "production");
    let production = Cli::try_parse_from(["vbind-site", "purge", "-c", "a.css", "-o", "b.css"]);
    std::env::remove_var("NODE_ENV");

    let args = purge_args(parsed.expect("NODE_ENV=test must not be rejected"));
    assert_eq!(args.mode, BuildMode::Development);
    assert_eq!(purge_args(production.unwrap()).mode, BuildMode::Production);
}

#[test]
fn test_purge_args_validate() {
    let mut args = PurgeArgs {
        css: "main.css".into(),
        input: vec!["src/**/*.vue".to_string()],
        exclude: vec![],
        output: "out.css".into(),
        manifest: Some("report.json".into()),
        config: None,
        root: None,
        mode: BuildMode::Production,
        jobs: None,
        no_progress: true,
        allow_symlinks: false,
        dry_run: false,
    };
    assert!(args.validate().is_ok());

    args.input.push("  ".to_string());
    assert!(args.validate().is_err());
    args.input.pop();

    args.manifest = Some(args.output.clone());
    assert!(args.validate().is_err());
    args.manifest = None;
    assert!(args.validate().is_ok());

    args.output = args.css.clone();
    assert!(args.validate().is_err());
    args.output = "out.css".into();

    args.jobs = Some(0);
    assert!(args.validate().is_err());
    args.jobs = Some(2);
    assert!(args.validate().is_ok());
}

#[test]
fn test_cli_parse_extract() {
    let cli = Cli::parse_from(["vbind-site", "extract"]);
    match cli.command {
        Commands::Extract(args) => assert!(!args.unique),
        other => panic!("Expected Extract command, got {:?}", other),
    }

    let cli = Cli::parse_from(["vbind-site", "extract", "--unique"]);
    match cli.command {
        Commands::Extract(args) => assert!(args.unique),
        other => panic!("Expected Extract command, got {:?}", other),
    }
}

#[test]
fn test_cli_parse_config_and_head() {
    let cli = Cli::parse_from(["vbind-site", "config", "--format", "yaml"]);
    match cli.command {
        Commands::Config(args) => {
            assert_eq!(args.format, OutputFormat::Yaml);
            assert!(args.config.is_none());
        }
        other => panic!("Expected Config command, got {:?}", other),
    }

    let cli = Cli::parse_from(["vbind-site", "head", "--config", "site.json"]);
    match cli.command {
        Commands::Head(args) => assert_eq!(args.config.unwrap().to_str().unwrap(), "site.json"),
        other => panic!("Expected Head command, got {:?}", other),
    }
}
