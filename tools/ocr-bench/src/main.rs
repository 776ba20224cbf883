//! OCR benchmark CLI for Book Scanner.
//!
//! Runs cover images through the remote recognizers and reports latency,
//! extracted character counts and the search query each result would
//! produce. Keys and endpoints come from the same env/keychain settings as
//! the main binary.
//!
//! Usage:
//!   ocr-bench <cover.jpg>                              Single image, OCR_PROVIDER
//!   ocr-bench <cover.jpg> --provider ocr-space         Single image, chosen provider
//!   ocr-bench <cover.jpg> --compare                    Single image, both providers
//!   ocr-bench --batch <directory>                      All images in directory → CSV
//!   ocr-bench --batch <directory> --compare            Batch with both providers
//!   ... --crop 900x900                                 Crop before upload

use book_scanner_lib::capture::{self, CropRegion};
use book_scanner_lib::ocr::heuristics::build_search_query;
use book_scanner_lib::ocr::{OcrProvider, TextRecognizer};
use book_scanner_lib::settings::{self, Settings};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

/// Median latency a provider should stay under for the scan flow to feel live.
const TARGET_MS: f64 = 2000.0;

struct BenchArgs {
    target: String,
    batch: bool,
    compare: bool,
    provider: Option<OcrProvider>,
    crop: Option<CropRegion>,
}

/// One recognition run.
struct BenchResult {
    text: String,
    char_count: usize,
    wall_ms: f64,
    query: String,
    failed: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_file = settings::load_dotenv();
    env_logger::init();
    if let Some(path) = env_file {
        eprintln!("[STARTUP] Loaded {}", path.display());
    }

    let args = match parse_args(std::env::args().skip(1).collect()) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!("Usage:");
            eprintln!("  ocr-bench <cover.jpg> [--provider vision|ocr-space] [--compare] [--crop WxH]");
            eprintln!("  ocr-bench --batch <directory> [--provider ...] [--compare] [--crop WxH]");
            return ExitCode::FAILURE;
        }
    };

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Settings error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let providers = if args.compare {
        vec![OcrProvider::Vision, OcrProvider::OcrSpace]
    } else {
        vec![args.provider.unwrap_or(settings.ocr_provider)]
    };

    let mut recognizers: Vec<Box<dyn TextRecognizer>> = Vec::new();
    for provider in &providers {
        let recognizer = settings
            .http_client()
            .and_then(|http| settings.recognizer(*provider, http));
        match recognizer {
            Ok(r) => recognizers.push(r),
            Err(e) => {
                eprintln!("Cannot benchmark {}: {}", provider, e);
                return ExitCode::FAILURE;
            }
        }
    }

    if args.batch {
        run_batch(&args, &recognizers).await
    } else {
        run_single(&args, &recognizers).await
    }
}

fn parse_args(raw: Vec<String>) -> Result<BenchArgs, String> {
    let mut target = None;
    let mut batch = false;
    let mut compare = false;
    let mut provider = None;
    let mut crop = None;

    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--batch" => batch = true,
            "--compare" => compare = true,
            "--provider" => {
                let value = iter.next().ok_or("--provider requires a value")?;
                provider = Some(value.parse::<OcrProvider>()?);
            }
            "--crop" => {
                let value = iter.next().ok_or("--crop requires WxH")?;
                crop = Some(value.parse::<CropRegion>()?);
            }
            other if other.starts_with("--") => return Err(format!("Unknown flag: {}", other)),
            _ => target = Some(arg),
        }
    }

    let target = target.ok_or_else(|| {
        if batch {
            "--batch requires a directory path".to_string()
        } else {
            "Missing image path".to_string()
        }
    })?;

    Ok(BenchArgs {
        target,
        batch,
        compare,
        provider,
        crop,
    })
}

/// Load, recognize, and time from the Rust side (upload + service + decode).
async fn bench_one(recognizer: &dyn TextRecognizer, image: &[u8]) -> BenchResult {
    let start = Instant::now();
    let outcome = recognizer.recognize(image).await;
    let wall_ms = start.elapsed().as_micros() as f64 / 1000.0;

    let (text, failed) = match outcome {
        Ok(text) => (text.unwrap_or_default(), false),
        Err(e) => {
            eprintln!("  [{}] {}", recognizer.provider(), e);
            (String::new(), true)
        }
    };
    BenchResult {
        char_count: text.chars().count(),
        query: build_search_query(Some(&text)),
        text,
        wall_ms,
        failed,
    }
}

async fn run_single(args: &BenchArgs, recognizers: &[Box<dyn TextRecognizer>]) -> ExitCode {
    let path = Path::new(&args.target);
    let image = match capture::load_cover(path, args.crop).await {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut report = Vec::new();
    for recognizer in recognizers {
        let result = bench_one(recognizer.as_ref(), &image).await;
        let preview: String = result.text.chars().take(200).collect();
        report.push(serde_json::json!({
            "provider": recognizer.provider().id(),
            "wallTimeMs": (result.wall_ms * 100.0).round() / 100.0,
            "charCount": result.char_count,
            "failed": result.failed,
            "query": result.query,
            "textPreview": preview,
        }));
    }

    let output = if report.len() == 1 {
        report.remove(0)
    } else {
        serde_json::Value::Array(report)
    };
    match serde_json::to_string_pretty(&output) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("Failed to format report: {}", e);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

async fn run_batch(args: &BenchArgs, recognizers: &[Box<dyn TextRecognizer>]) -> ExitCode {
    let dir = Path::new(&args.target);
    let read = match std::fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) => {
            eprintln!("Not a readable directory: {} ({})", dir.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut entries: Vec<PathBuf> = read
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .map(|ext| ext == "png" || ext == "jpg" || ext == "jpeg")
                .unwrap_or(false)
        })
        .collect();
    entries.sort();

    if entries.is_empty() {
        eprintln!("No image files found in {}", dir.display());
        return ExitCode::FAILURE;
    }

    let columns: Vec<String> = recognizers
        .iter()
        .flat_map(|r| {
            let id = r.provider().id().replace('-', "_");
            [format!("chars_{}", id), format!("wall_ms_{}", id), format!("query_{}", id)]
        })
        .collect();
    println!("filename,{}", columns.join(","));

    let mut latencies: Vec<Vec<f64>> = vec![Vec::new(); recognizers.len()];
    let mut failures = vec![0usize; recognizers.len()];

    for image_path in &entries {
        let filename = image_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let image = match capture::load_cover(image_path, args.crop).await {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Skipping {}: {}", filename, e);
                continue;
            }
        };

        let mut row = vec![csv_field(&filename)];
        for (i, recognizer) in recognizers.iter().enumerate() {
            let result = bench_one(recognizer.as_ref(), &image).await;
            row.push(result.char_count.to_string());
            row.push(format!("{:.2}", result.wall_ms));
            row.push(csv_field(&result.query));
            if result.failed {
                failures[i] += 1;
            } else {
                latencies[i].push(result.wall_ms);
            }
        }
        println!("{}", row.join(","));
        std::io::stdout().flush().ok();
    }

    eprintln!("\n--- Benchmark Summary ---");
    eprintln!("  Images processed: {}", entries.len());
    for (i, recognizer) in recognizers.iter().enumerate() {
        print_latency_summary(recognizer.provider().id(), &mut latencies[i], failures[i]);
    }
    ExitCode::SUCCESS
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn print_latency_summary(label: &str, latencies: &mut [f64], failures: usize) {
    eprintln!("  [{}]", label);
    eprintln!("    Failures: {}", failures);
    if latencies.is_empty() {
        return;
    }
    latencies.sort_by(|a, b| a.total_cmp(b));
    let median = latencies[latencies.len() / 2];
    let p99_idx = ((latencies.len() as f64 * 0.99).ceil() as usize).min(latencies.len() - 1);
    let p99 = latencies[p99_idx];
    let avg: f64 = latencies.iter().sum::<f64>() / latencies.len() as f64;

    eprintln!("    Median: {:.1}ms", median);
    eprintln!("    Average: {:.1}ms", avg);
    eprintln!("    P99: {:.1}ms", p99);
    eprintln!(
        "    Target (< {:.0}ms): {}",
        TARGET_MS,
        if median < TARGET_MS { "PASS" } else { "FAIL" }
    );
}
