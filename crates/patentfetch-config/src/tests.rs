#[cfg(test)]
mod tests {
    use super::super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_documented_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.retrieval.inter_item_delay(), Duration::from_secs(2));
        assert_eq!(cfg.retrieval.http_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.retrieval.chunk_size, 8192);
        assert_eq!(cfg.output.dir, PathBuf::from("downloaded_patents"));
        assert_eq!(cfg.input.column, "Display Key");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg.retrieval.detail_base_url, "https://patents.google.com/patent/");
        assert_eq!(cfg.retrieval.asset_host, "https://patentimages.storage.googleapis.com");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            [retrieval]
            inter_item_delay_ms = 500

            [input]
            column = "Patent Number"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.retrieval.inter_item_delay_ms, 500);
        assert_eq!(cfg.retrieval.http_timeout_secs, 10);
        assert_eq!(cfg.input.column, "Patent Number");
        assert_eq!(cfg.output.failure_log, PathBuf::from("patent_download_failures.log"));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = Config::from_toml_str("[retrieval]\nchunk_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_non_http_asset_host_rejected() {
        let err = Config::from_toml_str("[retrieval]\nasset_host = \"ftp://example.com\"\n").unwrap_err();
        assert!(err.to_string().contains("asset_host"));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = Config::from_toml_str("[retrieval\nchunk_size = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\ndir = \"pdfs\"").unwrap();
        let cfg = Config::load_from(file.path()).unwrap();
        assert_eq!(cfg.output.dir, PathBuf::from("pdfs"));
    }

    #[test]
    fn test_load_from_missing_file_is_io_error() {
        let err = Config::load_from("/definitely/not/here/patentfetch.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
