use std::path::{Path, PathBuf};
use std::sync::Arc;
use tailpurge::core::interfaces::BuildService;
use tailpurge::core::models::{BuildConfig, PurgeOptions};
use tailpurge::core::services::PurgeBuildService;
use tailpurge::infrastructure::TokioFileSystemService;
use tailpurge::plugins::{StatsPlugin, TailwindPurgePlugin};
use tailpurge::utils::{CliOverrides, ConfigLoader, PurgeError, CONFIG_FILE_NAME};
use tempfile::TempDir;

fn copy_dir(from: &Path, to: &Path) {
    std::fs::create_dir_all(to).unwrap();
    for entry in std::fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            std::fs::copy(entry.path(), target).unwrap();
        }
    }
}

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/two-entries")
}

/// Copy of the fixture project, so builds never rewrite the checked-in files
fn two_entries_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    copy_dir(&fixture_dir(), dir.path());
    dir
}

fn config_for(root: &Path) -> BuildConfig {
    BuildConfig {
        root: root.to_path_buf(),
        outdir: root.join("dist"),
        manifest: PathBuf::from("dist/manifest.json"),
        dry_run: false,
    }
}

fn build_service(options: PurgeOptions) -> PurgeBuildService {
    PurgeBuildService::new(Arc::new(TokioFileSystemService))
        .with_plugin(Arc::new(TailwindPurgePlugin::new(options)))
        .with_plugin(Arc::new(StatsPlugin::new(false)))
}

#[tokio::test]
async fn test_each_entry_keeps_its_own_classes() {
    let project = two_entries_project();
    let config = config_for(project.path());

    let result = build_service(PurgeOptions::new()).build(&config).await;
    assert!(result.is_ok(), "Purge should succeed");

    let build_result = result.unwrap();
    assert!(build_result.success);
    assert_eq!(build_result.report.assets.len(), 2);
    assert_eq!(build_result.output_files.len(), 2, "Only stylesheets are rewritten");

    let one = std::fs::read_to_string(config.outdir.join("one.css")).unwrap();
    assert!(one.contains(".card"));
    assert!(one.contains(".shadow-lg"));
    assert!(!one.contains(".navbar"));

    let two = std::fs::read_to_string(config.outdir.join("two.css")).unwrap();
    assert!(two.contains(".navbar"));
    assert!(two.contains(".nav-link.active"));
    assert!(!two.contains(".card"));

    let bundle = std::fs::read_to_string(config.outdir.join("one.bundle.js")).unwrap();
    assert_eq!(bundle.trim(), r#"console.log("one");"#);
}

#[tokio::test]
async fn test_dry_run_leaves_files_alone() {
    let project = two_entries_project();
    let config = BuildConfig {
        dry_run: true,
        ..config_for(project.path())
    };
    let before = std::fs::read_to_string(config.outdir.join("one.css")).unwrap();

    let result = build_service(PurgeOptions::new()).build(&config).await.unwrap();

    assert_eq!(result.output_files.len(), 2);
    assert!(!result.output_files[0].content.is_empty());
    let after = std::fs::read_to_string(config.outdir.join("one.css")).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_config_file_safelist_applies() {
    let project = two_entries_project();
    std::fs::write(
        project.path().join(CONFIG_FILE_NAME),
        r#"{ "safelist": [".navbar"], "minify": true }"#,
    )
    .unwrap();

    let file_config = ConfigLoader::load_from_file(project.path()).unwrap();
    let (config, options) = ConfigLoader::merge_with_cli(
        file_config,
        project.path().to_path_buf(),
        CliOverrides::default(),
    )
    .unwrap();
    assert!(options.minify);

    build_service(options).build(&config).await.unwrap();

    let one = std::fs::read_to_string(config.outdir.join("one.css")).unwrap();
    assert!(one.contains(".navbar"));
    assert!(one.contains(".card"));
    assert!(!one.contains('\n'), "Minified output should be a single line");
}

#[tokio::test]
async fn test_second_build_changes_nothing() {
    let project = two_entries_project();
    let config = config_for(project.path());
    let service = build_service(PurgeOptions::new());

    service.build(&config).await.unwrap();
    let second = service.build(&config).await.unwrap();

    assert!(second.output_files.is_empty(), "Purged output should be stable");
}

#[tokio::test]
async fn test_missing_manifest_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    let err = build_service(PurgeOptions::new())
        .build(&config)
        .await
        .unwrap_err();

    assert!(matches!(err, PurgeError::Manifest { .. }));
    assert!(err.format_detailed().contains("manifest.json"));
}

#[tokio::test]
async fn test_relative_root_from_cli_defaults() {
    // Project placed under the working directory so it can be named relatively
    let cwd = std::env::current_dir().unwrap();
    let project = tempfile::Builder::new()
        .prefix(".tailpurge-relative-")
        .tempdir_in(&cwd)
        .unwrap();
    copy_dir(&fixture_dir(), project.path());
    let relative_root = PathBuf::from(project.path().file_name().unwrap());
    assert!(relative_root.is_relative());

    let (config, options) =
        ConfigLoader::merge_with_cli(None, relative_root.clone(), CliOverrides::default())
            .unwrap();
    assert_eq!(config.manifest, PathBuf::from("dist/manifest.json"));

    let result = build_service(options).build(&config).await;
    assert!(result.is_ok(), "Relative root should resolve: {:?}", result.err());

    let one = std::fs::read_to_string(relative_root.join("dist/one.css")).unwrap();
    assert!(one.contains(".card"));
    assert!(!one.contains(".navbar"));
}

#[tokio::test]
async fn test_failed_pass_writes_nothing() {
    let project = two_entries_project();
    let config = config_for(project.path());
    std::fs::write(config.outdir.join("two.css"), "..navbar { display: flex; }").unwrap();

    let originals: Vec<(PathBuf, String)> = std::fs::read_dir(&config.outdir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            let content = std::fs::read_to_string(&path).unwrap();
            (path, content)
        })
        .collect();

    let err = build_service(PurgeOptions::new())
        .build(&config)
        .await
        .unwrap_err();
    assert!(matches!(err, PurgeError::Reduction { ref asset, .. } if asset == "two.css"));

    // one.css was purged in memory before two.css failed, but never written
    for (path, before) in originals {
        let after = std::fs::read_to_string(&path).unwrap();
        assert_eq!(before, after, "{} should be untouched", path.display());
    }
}
