//! Integration tests for full crawl runs
//!
//! Most tests drive the manager with a scripted browser so that page timing
//! and readiness can be controlled exactly. The last few run the static HTML
//! page against a wiremock server end-to-end.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use suitecrawl::config::{load_config, RunConfig};
use suitecrawl::output::{BatchWriter, SharedBuffer, Writer};
use suitecrawl::page::{Browser, Page, PageError, PageResult};
use suitecrawl::{run_crawl, CrawlError, LazyValue, Manager, Registry, Suite, SuiteOptions};
use tempfile::TempDir;
use tokio::time::Instant;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Canned expression results for one URL
#[derive(Clone, Default)]
struct Script {
    values: HashMap<String, Value>,
}

impl Script {
    fn new() -> Self {
        Self::default()
    }

    fn with(mut self, expr: &str, value: Value) -> Self {
        self.values.insert(expr.to_string(), value);
        self
    }
}

/// Browser serving scripted pages and recording every open and evaluation
#[derive(Clone, Default)]
struct ScriptedBrowser {
    pages: HashMap<String, Script>,
    log: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl ScriptedBrowser {
    fn new() -> Self {
        Self::default()
    }

    fn page(mut self, url: &str, script: Script) -> Self {
        self.pages.insert(url.to_string(), script);
        self
    }

    fn log(&self) -> Vec<(String, Instant)> {
        self.log.lock().unwrap().clone()
    }

    fn opened(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|(event, _)| event.strip_prefix("open:").map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn new_page(&mut self) -> PageResult<Box<dyn Page>> {
        Ok(Box::new(ScriptedPage {
            pages: self.pages.clone(),
            log: Arc::clone(&self.log),
            current: None,
        }))
    }
}

struct ScriptedPage {
    pages: HashMap<String, Script>,
    log: Arc<Mutex<Vec<(String, Instant)>>>,
    current: Option<Script>,
}

impl ScriptedPage {
    fn record(&self, event: String) {
        self.log.lock().unwrap().push((event, Instant::now()));
    }
}

#[async_trait]
impl Page for ScriptedPage {
    async fn open(&mut self, url: &str) -> PageResult<()> {
        self.record(format!("open:{}", url));
        match self.pages.get(url) {
            Some(script) => {
                self.current = Some(script.clone());
                Ok(())
            }
            None => Err(PageError::Load {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }

    async fn evaluate(&mut self, expr: &str) -> PageResult<Value> {
        self.record(format!("eval:{}", expr));
        let script = self.current.as_ref().ok_or(PageError::NotLoaded)?;
        script
            .values
            .get(expr)
            .cloned()
            .ok_or_else(|| PageError::Evaluate {
                expr: expr.to_string(),
                message: "not scripted".to_string(),
            })
    }

    async fn inject_script(&mut self, path: &Path) -> bool {
        self.record(format!("inject:{}", path.display()));
        true
    }
}

fn memory_registry(buffer: &SharedBuffer) -> Registry {
    let mut registry = Registry::default();
    let sink = buffer.clone();
    registry.register_writer("memory", move |config, formatter| {
        let writer: Box<dyn Writer> = Box::new(BatchWriter::new(
            formatter,
            Box::new(sink.clone()),
            config.batch_size,
        ));
        Ok(writer)
    });
    registry
}

fn run_config(format: &str) -> RunConfig {
    RunConfig {
        writer: "memory".to_string(),
        logger: "none".to_string(),
        format: format.to_string(),
        ..RunConfig::default()
    }
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn scraping(expr: &str) -> SuiteOptions {
    SuiteOptions {
        scrapers: vec![LazyValue::expr(expr)],
        ..SuiteOptions::default()
    }
}

async fn crawl(
    config: RunConfig,
    suites: Vec<Suite>,
    browser: &ScriptedBrowser,
) -> (String, suitecrawl::RunSummary) {
    let buffer = SharedBuffer::new();
    let registry = memory_registry(&buffer);
    let summary = Manager::from_suites(config, suites, &registry, Box::new(browser.clone()))
        .unwrap()
        .run()
        .await
        .unwrap();
    (buffer.contents(), summary)
}

#[tokio::test]
async fn test_two_urls_json_output() {
    let browser = ScriptedBrowser::new()
        .page("https://a.test/1", Script::new().with("item", json!({"id": 1})))
        .page("https://a.test/2", Script::new().with("item", json!({"id": 2})));
    let suite = Suite::new("s", urls(&["https://a.test/1", "https://a.test/2"]), scraping("item"));

    let (output, summary) = crawl(run_config("json"), vec![suite], &browser).await;

    assert_eq!(output, r#"[{"id":1},{"id":2}]"#);
    assert_eq!(summary.items_written, 2);
}

#[tokio::test]
async fn test_failed_load_does_not_stop_the_run() {
    let browser =
        ScriptedBrowser::new().page("https://a.test/2", Script::new().with("item", json!("second")));
    let suite = Suite::new("s", urls(&["https://a.test/1", "https://a.test/2"]), scraping("item"));

    let (output, summary) = crawl(run_config("json"), vec![suite], &browser).await;

    assert_eq!(output, r#"["second"]"#);
    assert_eq!(summary.stats.load_failures, 1);
    assert_eq!(summary.stats.suites_run, 1);
    assert_eq!(browser.opened(), urls(&["https://a.test/1", "https://a.test/2"]));
}

/// Formatted log events collected in memory
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    fn lines_at(&self, level: &str) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .filter(|line| line.contains(level))
            .map(str::to_string)
            .collect()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_failed_load_logs_one_error() {
    let capture = LogCapture::default();
    let sink = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || sink.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let browser =
        ScriptedBrowser::new().page("https://a.test/2", Script::new().with("item", json!("second")));
    let suite = Suite::new("s", urls(&["https://a.test/1", "https://a.test/2"]), scraping("item"));

    let (output, _) = crawl(run_config("json"), vec![suite], &browser).await;

    assert_eq!(output, r#"["second"]"#);
    let errors = capture.lines_at("ERROR");
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert!(errors[0].contains("Failed to load https://a.test/1"));
}

#[tokio::test]
async fn test_child_suite_gets_only_unvisited_urls() {
    let browser = ScriptedBrowser::new()
        .page(
            "https://a.test/",
            Script::new().with(
                "links",
                json!(["https://a.test/x", "https://a.test/", "https://a.test/y"]),
            ),
        )
        .page("https://a.test/x", Script::new().with("links", json!([])))
        .page("https://a.test/y", Script::new().with("links", json!([])));
    let options = SuiteOptions {
        more_urls: Some(LazyValue::expr("links")),
        ..SuiteOptions::default()
    };
    let suite = Suite::new("root", urls(&["https://a.test/"]), options);

    let (_, summary) = crawl(run_config("json"), vec![suite], &browser).await;

    assert_eq!(summary.stats.suites_run, 2);
    assert_eq!(
        browser.opened(),
        urls(&["https://a.test/", "https://a.test/x", "https://a.test/y"])
    );
}

#[tokio::test(start_paused = true)]
async fn test_readiness_timeout_extracts_once_at_the_limit() {
    let browser = ScriptedBrowser::new().page(
        "https://a.test/",
        Script::new()
            .with("ready", json!(false))
            .with("item", json!("late")),
    );
    let options = SuiteOptions {
        ready: LazyValue::expr("ready"),
        ..scraping("item")
    };
    let config = RunConfig {
        poll_interval: 100,
        poll_timeout_limit: 3000,
        ..run_config("json")
    };
    let suite = Suite::new("s", urls(&["https://a.test/"]), options);

    let start = Instant::now();
    let (output, summary) = crawl(config, vec![suite], &browser).await;

    assert_eq!(output, r#"["late"]"#);
    assert_eq!(summary.stats.readiness_timeouts, 1);

    let extractions: Vec<Instant> = browser
        .log()
        .into_iter()
        .filter(|(event, _)| event == "eval:item")
        .map(|(_, at)| at)
        .collect();
    assert_eq!(extractions.len(), 1);
    assert!(extractions[0] - start >= Duration::from_millis(3000));
}

#[tokio::test]
async fn test_csv_with_configured_fields() {
    let browser = ScriptedBrowser::new().page(
        "https://a.test/",
        Script::new().with(
            "rows",
            json!([
                {"name": "bolt", "price": 2},
                {"name": "nut \"hex\"", "color": "red"}
            ]),
        ),
    );
    let config = RunConfig {
        csv_fields: Some(urls(&["name", "price"])),
        ..run_config("csv")
    };
    let suite = Suite::new("s", urls(&["https://a.test/"]), scraping("rows"));

    let (output, _) = crawl(config, vec![suite], &browser).await;

    assert_eq!(
        output,
        "\"name\",\"price\"\r\n\"bolt\",2\r\n\"nut \"\"hex\"\"\",\"\""
    );
}

#[tokio::test]
async fn test_count_matches_items_scraped() {
    let browser = ScriptedBrowser::new()
        .page(
            "https://a.test/1",
            Script::new()
                .with("many", json!([1, 2, 3]))
                .with("one", json!("x")),
        )
        .page(
            "https://a.test/2",
            Script::new()
                .with("many", json!([]))
                .with("one", json!(null)),
        )
        .page(
            "https://a.test/3",
            Script::new()
                .with("scrapable", json!(false))
                .with("many", json!([9, 9])),
        );
    let options = SuiteOptions {
        scrapable: LazyValue::func(|| true),
        scrapers: vec![LazyValue::expr("many"), LazyValue::expr("one")],
        ..SuiteOptions::default()
    };
    let gated = SuiteOptions {
        scrapable: LazyValue::expr("scrapable"),
        ..options.clone()
    };
    let suites = vec![
        Suite::new("open", urls(&["https://a.test/1", "https://a.test/2"]), options),
        Suite::new("gated", urls(&["https://a.test/3"]), gated),
    ];

    let (output, summary) = crawl(run_config("json"), suites, &browser).await;

    assert_eq!(summary.items_written, 4);
    assert_eq!(summary.stats.not_scrapable, 1);
    let parsed: Vec<Value> = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed, vec![json!(1), json!(2), json!(3), json!("x")]);
}

#[tokio::test]
async fn test_no_url_opened_twice() {
    // Every page links to every other page and to itself
    let all = urls(&["https://a.test/1", "https://a.test/2", "https://a.test/3"]);
    let mut browser = ScriptedBrowser::new();
    for url in &all {
        browser = browser.page(url, Script::new().with("links", json!(all)));
    }
    let options = SuiteOptions {
        more_urls: Some(LazyValue::expr("links")),
        ..SuiteOptions::default()
    };
    let suites = vec![
        Suite::new("first", urls(&["https://a.test/1"]), options.clone()),
        Suite::new("second", urls(&["https://a.test/1", "https://a.test/2"]), options),
    ];

    let (_, summary) = crawl(run_config("json"), suites, &browser).await;

    let mut opened = browser.opened();
    assert_eq!(opened.len(), 3);
    opened.sort();
    opened.dedup();
    assert_eq!(opened.len(), 3);

    // first, second, first-sub0 [/2, /3], second-sub1 [/3]
    assert_eq!(summary.stats.suites_run, 4);
    assert_eq!(summary.stats.urls_skipped, 3);
}

#[tokio::test]
async fn test_depth_bound_stops_discovery() {
    // A chain: /0 links to /1, /1 to /2, and so on
    let mut browser = ScriptedBrowser::new();
    for n in 0..6 {
        browser = browser.page(
            &format!("https://a.test/{}", n),
            Script::new().with("links", json!([format!("https://a.test/{}", n + 1)])),
        );
    }
    let options = SuiteOptions {
        more_urls: Some(LazyValue::expr("links")),
        max_depth: Some(2),
        ..SuiteOptions::default()
    };
    let suite = Suite::new("chain", urls(&["https://a.test/0"]), options);

    let (_, summary) = crawl(run_config("json"), vec![suite], &browser).await;

    // Depths 0, 1 and 2 run; the link found at depth 2 is dropped
    assert_eq!(summary.stats.suites_run, 3);
    assert_eq!(
        browser.opened(),
        urls(&["https://a.test/0", "https://a.test/1", "https://a.test/2"])
    );
}

#[tokio::test]
async fn test_batched_output_is_one_array() {
    let mut browser = ScriptedBrowser::new();
    let mut pages = Vec::new();
    for n in 0..5 {
        let url = format!("https://a.test/{}", n);
        browser = browser.page(&url, Script::new().with("item", json!(n)));
        pages.push(url);
    }
    let config = RunConfig {
        batch_size: Some(2),
        ..run_config("json")
    };
    let suite = Suite::new("s", pages, scraping("item"));

    let (output, _) = crawl(config, vec![suite], &browser).await;

    let parsed: Vec<Value> = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
}

#[tokio::test]
async fn test_unknown_formatter_fails_before_any_output() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("items.json");
    let config = RunConfig {
        writer: "file".to_string(),
        format: "yaml".to_string(),
        out_file: Some(out.clone()),
        ..RunConfig::default()
    };
    let suite = Suite::new("s", urls(&["https://a.test/"]), SuiteOptions::default());

    let result = Manager::from_suites(
        config,
        vec![suite],
        &Registry::default(),
        Box::new(ScriptedBrowser::new()),
    );

    assert!(matches!(result, Err(CrawlError::Registry(_))));
    assert!(!out.exists());
}

const INDEX: &str = r#"<html><head><title>Shop</title></head><body>
    <h2 class="product">Bolt</h2><h2 class="product">Nut</h2>
    <a class="next" href="/page/2">next</a>
    <a href="mailto:shop@example.com">mail</a>
</body></html>"#;

const PAGE_TWO: &str = r#"<html><head><title>Shop 2</title></head><body>
    <h2 class="product">Washer</h2>
    <a class="next" href="/">back to start</a>
</body></html>"#;

async fn shop_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(INDEX, "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page/2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE_TWO, "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

fn write_config(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

#[tokio::test]
async fn test_end_to_end_static_pages() {
    let server = shop_server().await;
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out").join("products.json");

    let run = write_config(
        &dir,
        "run.toml",
        &format!(
            r#"
writer = "file"
format = "json"
logger = "none"
outFile = "{}"
batchSize = 1
pollInterval = 10
"#,
            out.display()
        ),
    );
    let suites = write_config(
        &dir,
        "suites.toml",
        &format!(
            r#"
[[suite]]
title = "shop"
urls = ["{base}/gone", "{base}/"]
ready = "exists:h2.product"
scraper = "texts:h2.product"
moreUrls = "links:a.next"
maxDepth = 3
"#,
            base = server.uri()
        ),
    );

    let config = load_config(&[run, suites]).unwrap();
    let summary = run_crawl(config, &Registry::default()).await.unwrap();

    let written: Vec<Value> =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written, vec![json!("Bolt"), json!("Nut"), json!("Washer")]);
    assert_eq!(summary.items_written, 3);
    assert_eq!(summary.stats.load_failures, 1);
    // shop, then shop-sub1 for /page/2; the link back to / is already visited
    assert_eq!(summary.stats.suites_run, 2);
    assert_eq!(summary.stats.urls_opened, 3);
}

#[tokio::test]
async fn test_end_to_end_item_files() {
    let server = shop_server().await;
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("items").join("product-{n}.txt");

    let config_path = write_config(
        &dir,
        "site.toml",
        &format!(
            r#"
writer = "itemfile"
format = "raw"
logger = "none"
outFile = "{}"

[[suite]]
url = "{}/"
scraper = "texts:h2.product"
"#,
            template.display(),
            server.uri()
        ),
    );

    let config = load_config(&[config_path]).unwrap();
    let summary = run_crawl(config, &Registry::default()).await.unwrap();

    assert_eq!(summary.items_written, 2);
    let first = dir.path().join("items").join("product-1.txt");
    let second = dir.path().join("items").join("product-2.txt");
    assert_eq!(std::fs::read_to_string(first).unwrap(), "Bolt");
    assert_eq!(std::fs::read_to_string(second).unwrap(), "Nut");
}
