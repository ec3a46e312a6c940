use std::sync::Arc;
use tailpurge::core::interfaces::{CssPurger, ExtractorBinding};
use tailpurge::core::models::{
    Chunk, Compilation, ExtractionContent, PurgeOptions, ResolutionStrategy, RuntimeOverrides,
    SourceModule,
};
use tailpurge::core::services::SelectorReducer;
use tailpurge::infrastructure::{LightningCssPurger, RegexExtractor};
use tailpurge::utils::PurgeError;

fn reducer(options: PurgeOptions) -> SelectorReducer {
    let purger: Arc<dyn CssPurger> = Arc::new(LightningCssPurger::new());
    SelectorReducer::new(purger, options)
}

fn single_entry(module_source: &str, css: &str) -> Compilation {
    Compilation::new()
        .with_chunk(
            Chunk::new("main")
                .with_runtime("main")
                .with_files(vec!["main.css".to_string(), "main.js".to_string()])
                .with_entry_module("/src/app/index.js"),
        )
        .with_module(SourceModule::javascript("/src/app/index.js", module_source))
        .with_asset("main.css", css)
}

#[tokio::test]
async fn test_used_classes_survive() {
    let mut compilation = single_entry(
        r#"<div class="text-red-500 hidden">"#,
        ".text-red-500 { color: red; }\n.hidden { display: none; }\n.unused-class { color: blue; }",
    );

    let report = reducer(PurgeOptions::new()).run(&mut compilation).await.unwrap();

    let css = &compilation.asset("main.css").unwrap().source;
    assert!(css.contains(".text-red-500"));
    assert!(css.contains(".hidden"));
    assert!(!css.contains(".unused-class"));
    assert_eq!(report.assets.len(), 1);
    assert_eq!(report.assets[0].module_count, 1);
}

#[tokio::test]
async fn test_safelisted_selector_is_kept() {
    let mut compilation = single_entry(
        "export default 1;",
        ".always-keep { color: red; } .dropped { color: blue; }",
    );

    reducer(PurgeOptions::new().with_safelist([".always-keep"]))
        .run(&mut compilation)
        .await
        .unwrap();

    let css = &compilation.asset("main.css").unwrap().source;
    assert!(css.contains(".always-keep"));
    assert!(!css.contains(".dropped"));
}

#[tokio::test]
async fn test_runtime_peer_supplies_context() {
    let mut compilation = Compilation::new()
        .with_chunk(
            Chunk::new("styles")
                .with_runtime("main")
                .with_files(vec!["styles.css".to_string()]),
        )
        .with_chunk(
            Chunk::new("main")
                .with_runtime("main")
                .with_files(vec!["main.js".to_string()])
                .with_entry_module("/src/app/index.js"),
        )
        .with_module(SourceModule::javascript("/src/app/index.js", "import './widget';"))
        .with_module(SourceModule::javascript(
            "/src/app/widget.js",
            r#"button.className = "btn-primary";"#,
        ))
        .with_asset("styles.css", ".btn-primary { color: white; } .btn-secondary { color: gray; }");

    let report = reducer(PurgeOptions::new()).run(&mut compilation).await.unwrap();

    let css = &compilation.asset("styles.css").unwrap().source;
    assert!(css.contains(".btn-primary"));
    assert!(!css.contains(".btn-secondary"));
    assert_eq!(report.assets[0].chunk, "styles");
    assert_eq!(report.assets[0].module_count, 2);
}

#[tokio::test]
async fn test_runtime_content_is_merged() {
    let options = PurgeOptions::new().with_runtime(
        "main",
        RuntimeOverrides::default()
            .with_content(ExtractionContent::new(".html", r#"<p class="extra-token">"#)),
    );
    let mut compilation = single_entry(
        "export default 1;",
        ".extra-token { margin: 0; } .never-used { margin: 1px; }",
    );

    reducer(options).run(&mut compilation).await.unwrap();

    let css = &compilation.asset("main.css").unwrap().source;
    assert!(css.contains(".extra-token"));
    assert!(!css.contains(".never-used"));
}

#[tokio::test]
async fn test_unresolvable_asset_fails_the_pass() {
    let css = ".a { color: red; }";
    let mut compilation = Compilation::new()
        .with_chunk(Chunk::new("lonely").with_files(vec!["lonely.css".to_string()]))
        .with_asset("lonely.css", css);

    let err = reducer(PurgeOptions::new()).run(&mut compilation).await.unwrap_err();

    assert!(matches!(err, PurgeError::Resolution { ref asset, .. } if asset == "lonely.css"));
    assert_eq!(compilation.asset("lonely.css").unwrap().source, css);
}

#[tokio::test]
async fn test_chunk_modules_strategy() {
    let mut compilation = Compilation::new()
        .with_chunk(
            Chunk::new("admin")
                .with_files(vec!["admin.css".to_string()])
                .with_modules(["/src/admin/panel.js", "/src/shared/table.js"]),
        )
        .with_module(SourceModule::javascript("/src/admin/panel.js", "'panel'"))
        .with_module(SourceModule::javascript("/src/shared/table.js", "'table-striped'"))
        .with_asset(
            "admin.css",
            ".panel { padding: 0; } .table-striped { color: red; } .landing { color: blue; }",
        );

    reducer(PurgeOptions::new().with_strategy(ResolutionStrategy::ChunkModules))
        .run(&mut compilation)
        .await
        .unwrap();

    let css = &compilation.asset("admin.css").unwrap().source;
    assert!(css.contains(".panel"));
    assert!(css.contains(".table-striped"));
    assert!(!css.contains(".landing"));
}

#[tokio::test]
async fn test_custom_extractor_for_extension() {
    let extractor = RegexExtractor::new("data-ui", r#"data-ui="([\w-]+)""#).unwrap();
    let options = PurgeOptions::new().with_runtime(
        "main",
        RuntimeOverrides::default()
            .with_content(ExtractionContent::new(".tpl", r#"<div data-ui="dropdown">"#))
            .with_extractor(ExtractorBinding::new([".tpl"], Arc::new(extractor))),
    );
    let mut compilation = single_entry(
        "export default 1;",
        ".dropdown { display: block; } .ui { display: none; }",
    );

    reducer(options).run(&mut compilation).await.unwrap();

    let css = &compilation.asset("main.css").unwrap().source;
    assert!(css.contains(".dropdown"));
    // the custom extractor yields only the captured value
    assert!(!css.contains(".ui"));
}

#[tokio::test]
async fn test_purge_is_idempotent() {
    let mut compilation = single_entry(
        r#"<a class="link md:hover:underline">"#,
        r#"
        :root { --brand: blue; --unused-color: red; }
        .link { color: var(--brand); }
        @media (min-width: 768px) { .md\:hover\:underline:hover { text-decoration: underline; } }
        @media print { .print-only { display: block; } }
        "#,
    );
    let reducer = reducer(PurgeOptions::new());

    reducer.run(&mut compilation).await.unwrap();
    let first = compilation.asset("main.css").unwrap().source.clone();
    assert!(first.contains("--brand"));
    assert!(!first.contains("--unused-color"));
    assert!(!first.contains("print-only"));
    assert!(!first.contains("@media print"));

    reducer.run(&mut compilation).await.unwrap();
    assert_eq!(compilation.asset("main.css").unwrap().source, first);
}
