#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use crate::config::LLMProvider;
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_args_default_values() {
        let args = Args::try_parse_from(["invest-scout"]).unwrap();

        assert!(args.domain.is_none());
        assert!(args.query.is_none());
        assert!(args.config.is_none());
        assert!(!args.stream);
        assert!(!args.viz);
        assert!(!args.trace);
        assert!(!args.trace_json);
        assert!(!args.rediscover_on_hold);
        assert!(!args.no_store);
    }

    #[test]
    fn test_args_short_options() {
        let args = Args::try_parse_from([
            "invest-scout",
            "-d",
            "logistics",
            "-q",
            "AI-powered routing",
            "-o",
            "/tmp/out",
        ])
        .unwrap();

        assert_eq!(args.domain.as_deref(), Some("logistics"));
        assert_eq!(args.query.as_deref(), Some("AI-powered routing"));
        assert_eq!(args.output_path, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_args_flags() {
        let args = Args::try_parse_from([
            "invest-scout",
            "--stream",
            "--viz",
            "--trace",
            "--max-loop-iterations",
            "2",
            "--rediscover-on-hold",
        ])
        .unwrap();

        assert!(args.stream);
        assert!(args.viz);
        assert!(args.trace);
        assert_eq!(args.max_loop_iterations, Some(2));
        assert!(args.rediscover_on_hold);
    }

    #[test]
    fn test_into_config_overrides_file_values() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invest.toml");
        std::fs::write(
            &config_path,
            "domain = \"fintech\"\nquery = \"fraud\"\n[pipeline]\nmax_loop_iterations = 3\n",
        )
        .unwrap();

        let args = Args::try_parse_from([
            "invest-scout",
            "--config",
            config_path.to_str().unwrap(),
            "--query",
            "cold chain",
            "--llm-provider",
            "deepseek",
            "--no-store",
            "--viz",
        ])
        .unwrap();
        let config = args.into_config().unwrap();

        assert_eq!(config.domain, "fintech");
        assert_eq!(config.query, "cold chain");
        assert_eq!(config.pipeline.max_loop_iterations, 3);
        assert_eq!(config.llm.provider, LLMProvider::DeepSeek);
        assert!(!config.store.enabled);
        assert!(config.visualize);
    }

    #[test]
    fn test_into_config_missing_file_is_error() {
        let args = Args::try_parse_from(["invest-scout", "--config", "/nonexistent/invest.toml"]).unwrap();
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_unknown_provider_keeps_default() {
        let args = Args::try_parse_from(["invest-scout", "--llm-provider", "nope"]).unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.llm.provider, LLMProvider::default());
    }
}
